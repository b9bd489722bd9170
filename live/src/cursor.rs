//! Gapless playback cursor for inbound audio.

use std::collections::HashMap;
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use speakboard_audio::{AudioOutput, DeviceError, PcmBuffer, ScheduledSource};
use tracing::debug;

struct CursorInner {
    next_start: f64,
    next_id: u64,
    active: HashMap<u64, Box<dyn ScheduledSource>>,
}

/// Schedules buffers back to back on an output clock.
///
/// The cursor position and the set of playing sources share one lock, so a
/// chunk scheduled concurrently with [`interrupt`](Self::interrupt) either
/// lands before the reset (and is stopped) or after it (and starts at "now").
pub struct PlaybackCursor {
    inner: Mutex<CursorInner>,
}

impl Default for PlaybackCursor {
    fn default() -> Self {
        Self::new()
    }
}

impl PlaybackCursor {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(CursorInner {
                next_start: 0.0,
                next_id: 0,
                active: HashMap::new(),
            }),
        }
    }

    /// Schedules `buffer` at `max(next_start, now)` and advances the cursor
    /// by its duration. Returns the start time used.
    pub fn schedule(
        self: &Arc<Self>,
        output: &dyn AudioOutput,
        buffer: Arc<PcmBuffer>,
    ) -> Result<f64, DeviceError> {
        let mut inner = self.inner.lock();
        let start = inner.next_start.max(output.current_time());
        let duration = buffer.duration_secs();

        let id = inner.next_id;
        inner.next_id += 1;

        let cursor: Weak<Self> = Arc::downgrade(self);
        let source = output.schedule(
            buffer,
            start,
            Box::new(move || {
                if let Some(cursor) = cursor.upgrade() {
                    cursor.finished(id);
                }
            }),
        )?;

        inner.next_start = start + duration;
        inner.active.insert(id, source);
        debug!(id, start, duration, "scheduled inbound audio");
        Ok(start)
    }

    /// Stops every playing source and rewinds the cursor so the next chunk
    /// starts immediately.
    pub fn interrupt(&self) -> usize {
        let stopped: Vec<Box<dyn ScheduledSource>> = {
            let mut inner = self.inner.lock();
            inner.next_start = 0.0;
            inner.active.drain().map(|(_, source)| source).collect()
        };
        for source in &stopped {
            source.stop();
        }
        stopped.len()
    }

    /// Returns where the next chunk would start, before clamping to "now".
    pub fn next_start(&self) -> f64 {
        self.inner.lock().next_start
    }

    /// Returns how many scheduled sources have not finished.
    pub fn active_count(&self) -> usize {
        self.inner.lock().active.len()
    }

    fn finished(&self, id: u64) {
        self.inner.lock().active.remove(&id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use speakboard_audio::Format;
    use speakboard_audio::device::VirtualOutput;

    fn chunk(secs: f64) -> Arc<PcmBuffer> {
        let frames = (secs * 24000.0) as usize;
        Arc::new(PcmBuffer::new(Format::MONO_24K, vec![0.0; frames]))
    }

    #[test]
    fn test_back_to_back() {
        let output = VirtualOutput::new();
        output.set_time(1.0);
        let cursor = Arc::new(PlaybackCursor::new());

        assert_eq!(cursor.schedule(&output, chunk(0.5)).unwrap(), 1.0);
        assert_eq!(cursor.schedule(&output, chunk(0.25)).unwrap(), 1.5);
        assert_eq!(cursor.next_start(), 1.75);
        assert_eq!(cursor.active_count(), 2);
    }

    #[test]
    fn test_late_chunk_starts_now() {
        let output = VirtualOutput::new();
        let cursor = Arc::new(PlaybackCursor::new());

        cursor.schedule(&output, chunk(0.5)).unwrap();
        output.set_time(2.0);
        assert_eq!(cursor.schedule(&output, chunk(0.5)).unwrap(), 2.0);
    }

    #[test]
    fn test_finished_sources_removed() {
        let output = VirtualOutput::new();
        let cursor = Arc::new(PlaybackCursor::new());

        cursor.schedule(&output, chunk(0.5)).unwrap();
        cursor.schedule(&output, chunk(0.5)).unwrap();
        output.set_time(0.6);
        assert_eq!(cursor.active_count(), 1);
        output.set_time(1.0);
        assert_eq!(cursor.active_count(), 0);
    }

    #[test]
    fn test_interrupt_resets() {
        let output = VirtualOutput::new();
        output.set_time(3.0);
        let cursor = Arc::new(PlaybackCursor::new());

        cursor.schedule(&output, chunk(0.5)).unwrap();
        cursor.schedule(&output, chunk(0.5)).unwrap();
        assert_eq!(cursor.interrupt(), 2);
        assert_eq!(cursor.active_count(), 0);
        assert_eq!(cursor.next_start(), 0.0);
        assert_eq!(output.stopped_count(), 2);

        assert_eq!(cursor.schedule(&output, chunk(0.5)).unwrap(), 3.0);
    }

    #[test]
    fn test_closed_output_leaves_cursor() {
        let output = VirtualOutput::new();
        output.close();
        let cursor = Arc::new(PlaybackCursor::new());

        assert!(cursor.schedule(&output, chunk(0.5)).is_err());
        assert_eq!(cursor.next_start(), 0.0);
        assert_eq!(cursor.active_count(), 0);
    }
}
