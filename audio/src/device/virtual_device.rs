//! In-memory devices with a manually driven clock.
//!
//! Nothing here touches hardware: [`VirtualOutput`] records what was
//! scheduled and only advances its clock when told to, and [`VirtualInput`]
//! emits whatever samples are fed to it. Headless runs and tests use them.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use tokio::sync::mpsc;

use super::{
    AudioInput, AudioOutput, CaptureControl, CaptureStream, DeviceError, EndedCallback,
    OutputState, ScheduledSource,
};
use crate::pcm::{Format, PcmBuffer};

/// One `schedule` call observed by a [`VirtualOutput`].
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduledRecord {
    pub id: u64,
    /// Start time requested by the caller.
    pub start_at: f64,
    /// Buffer duration in seconds.
    pub duration: f64,
    pub frames: usize,
}

struct Pending {
    id: u64,
    end: f64,
    on_ended: EndedCallback,
}

struct OutputInner {
    now: f64,
    state: OutputState,
    next_id: u64,
    pending: Vec<Pending>,
    records: Vec<ScheduledRecord>,
    stopped: usize,
}

/// Output device whose clock moves only through [`set_time`](Self::set_time)
/// and [`advance`](Self::advance).
pub struct VirtualOutput {
    inner: Arc<Mutex<OutputInner>>,
}

impl Default for VirtualOutput {
    fn default() -> Self {
        Self::new()
    }
}

impl VirtualOutput {
    /// Creates a running device with its clock at zero.
    pub fn new() -> Self {
        Self::with_state(OutputState::Running)
    }

    /// Creates a device that starts suspended, like a browser context
    /// created before any user gesture.
    pub fn suspended() -> Self {
        Self::with_state(OutputState::Suspended)
    }

    fn with_state(state: OutputState) -> Self {
        Self {
            inner: Arc::new(Mutex::new(OutputInner {
                now: 0.0,
                state,
                next_id: 1,
                pending: Vec::new(),
                records: Vec::new(),
                stopped: 0,
            })),
        }
    }

    /// Moves the clock to `time` and completes every buffer that has ended.
    /// The clock never moves backwards.
    pub fn set_time(&self, time: f64) {
        let finished = {
            let mut inner = self.inner.lock();
            if time > inner.now {
                inner.now = time;
            }
            let now = inner.now;
            let (done, rest): (Vec<_>, Vec<_>) =
                inner.pending.drain(..).partition(|p| p.end <= now);
            inner.pending = rest;
            done
        };

        for pending in finished {
            (pending.on_ended)();
        }
    }

    /// Advances the clock by `seconds`.
    pub fn advance(&self, seconds: f64) {
        let now = self.inner.lock().now;
        self.set_time(now + seconds);
    }

    /// Returns every schedule call in order.
    pub fn scheduled(&self) -> Vec<ScheduledRecord> {
        self.inner.lock().records.clone()
    }

    /// Returns the number of buffers scheduled and neither finished nor stopped.
    pub fn active_count(&self) -> usize {
        self.inner.lock().pending.len()
    }

    /// Returns the number of buffers force-stopped.
    pub fn stopped_count(&self) -> usize {
        self.inner.lock().stopped
    }
}

impl AudioOutput for VirtualOutput {
    fn current_time(&self) -> f64 {
        self.inner.lock().now
    }

    fn state(&self) -> OutputState {
        self.inner.lock().state
    }

    fn resume(&self) -> Result<(), DeviceError> {
        let mut inner = self.inner.lock();
        match inner.state {
            OutputState::Closed => Err(DeviceError::Closed),
            _ => {
                inner.state = OutputState::Running;
                Ok(())
            }
        }
    }

    fn schedule(
        &self,
        buffer: Arc<PcmBuffer>,
        start_at: f64,
        on_ended: EndedCallback,
    ) -> Result<Box<dyn ScheduledSource>, DeviceError> {
        let mut inner = self.inner.lock();
        if inner.state == OutputState::Closed {
            return Err(DeviceError::Closed);
        }

        let id = inner.next_id;
        inner.next_id += 1;

        let duration = buffer.duration_secs();
        let effective_start = start_at.max(inner.now);
        inner.records.push(ScheduledRecord {
            id,
            start_at,
            duration,
            frames: buffer.frames(),
        });
        inner.pending.push(Pending {
            id,
            end: effective_start + duration,
            on_ended,
        });

        Ok(Box::new(VirtualSource {
            id,
            stopped: AtomicBool::new(false),
            inner: Arc::downgrade(&self.inner),
        }))
    }

    fn close(&self) {
        let mut inner = self.inner.lock();
        inner.state = OutputState::Closed;
        inner.pending.clear();
    }
}

struct VirtualSource {
    id: u64,
    stopped: AtomicBool,
    inner: Weak<Mutex<OutputInner>>,
}

impl ScheduledSource for VirtualSource {
    fn stop(&self) {
        if self.stopped.swap(true, Ordering::SeqCst) {
            return;
        }
        if let Some(inner) = self.inner.upgrade() {
            let mut inner = inner.lock();
            let before = inner.pending.len();
            inner.pending.retain(|p| p.id != self.id);
            if inner.pending.len() < before {
                inner.stopped += 1;
            }
        }
    }
}

struct InputInner {
    denied: Option<DeviceError>,
    sender: Option<mpsc::UnboundedSender<Vec<f32>>>,
    frame_samples: usize,
    pending: Vec<f32>,
    opened: usize,
    closed: bool,
}

/// Input device fed by hand through [`feed`](Self::feed).
pub struct VirtualInput {
    inner: Arc<Mutex<InputInner>>,
}

impl Default for VirtualInput {
    fn default() -> Self {
        Self::new()
    }
}

impl VirtualInput {
    /// Creates an input device that grants access.
    pub fn new() -> Self {
        Self::with_denial(None)
    }

    /// Creates an input device that refuses access with a permission error.
    pub fn denied() -> Self {
        Self::with_denial(Some(DeviceError::PermissionDenied(
            "microphone access denied".to_string(),
        )))
    }

    fn with_denial(denied: Option<DeviceError>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(InputInner {
                denied,
                sender: None,
                frame_samples: 0,
                pending: Vec::new(),
                opened: 0,
                closed: false,
            })),
        }
    }

    /// Feeds samples into the active capture and returns how many complete
    /// frames were emitted. Samples are dropped when nothing is capturing.
    pub fn feed(&self, samples: &[f32]) -> usize {
        let mut inner = self.inner.lock();
        if inner.sender.is_none() || inner.frame_samples == 0 {
            return 0;
        }

        inner.pending.extend_from_slice(samples);
        let frame_samples = inner.frame_samples;
        let mut emitted = 0;
        while inner.pending.len() >= frame_samples {
            let frame: Vec<f32> = inner.pending.drain(..frame_samples).collect();
            let sent = inner
                .sender
                .as_ref()
                .is_some_and(|tx| tx.send(frame).is_ok());
            if !sent {
                inner.sender = None;
                break;
            }
            emitted += 1;
        }
        emitted
    }

    /// Returns true while a capture is open and not stopped.
    pub fn is_capturing(&self) -> bool {
        self.inner.lock().sender.is_some()
    }

    /// Returns true once [`AudioInput::close`] ran.
    pub fn is_closed(&self) -> bool {
        self.inner.lock().closed
    }

    /// Returns how many captures were opened.
    pub fn open_count(&self) -> usize {
        self.inner.lock().opened
    }
}

impl AudioInput for VirtualInput {
    fn open_capture(
        &self,
        _format: Format,
        frame_samples: usize,
    ) -> Result<CaptureStream, DeviceError> {
        let mut inner = self.inner.lock();
        if let Some(err) = &inner.denied {
            return Err(err.clone());
        }
        if inner.closed {
            return Err(DeviceError::Closed);
        }

        let (tx, rx) = mpsc::unbounded_channel();
        inner.sender = Some(tx);
        inner.frame_samples = frame_samples.max(1);
        inner.pending.clear();
        inner.opened += 1;

        let control = Arc::new(VirtualCapture {
            inner: Arc::downgrade(&self.inner),
        });
        Ok(CaptureStream::new(rx, control))
    }

    fn close(&self) {
        let mut inner = self.inner.lock();
        inner.sender = None;
        inner.closed = true;
    }
}

struct VirtualCapture {
    inner: Weak<Mutex<InputInner>>,
}

impl CaptureControl for VirtualCapture {
    fn stop(&self) {
        if let Some(inner) = self.inner.upgrade() {
            let mut inner = inner.lock();
            inner.sender = None;
            inner.pending.clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    fn buffer(seconds: f64) -> Arc<PcmBuffer> {
        let frames = (seconds * 24000.0) as usize;
        Arc::new(PcmBuffer::new(Format::MONO_24K, vec![0.0; frames]))
    }

    fn counter() -> (Arc<AtomicUsize>, EndedCallback) {
        let count = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&count);
        (
            count,
            Box::new(move || {
                c.fetch_add(1, Ordering::SeqCst);
            }),
        )
    }

    #[test]
    fn test_schedule_records_and_completes() {
        let output = VirtualOutput::new();
        let (ended, cb) = counter();
        output.schedule(buffer(0.5), 0.0, cb).unwrap();

        assert_eq!(output.scheduled().len(), 1);
        assert_eq!(output.active_count(), 1);

        output.advance(0.25);
        assert_eq!(ended.load(Ordering::SeqCst), 0);

        output.advance(0.25);
        assert_eq!(ended.load(Ordering::SeqCst), 1);
        assert_eq!(output.active_count(), 0);
    }

    #[test]
    fn test_past_start_plays_from_now() {
        let output = VirtualOutput::new();
        output.set_time(2.0);
        let (ended, cb) = counter();
        output.schedule(buffer(0.5), 0.0, cb).unwrap();

        output.set_time(2.4);
        assert_eq!(ended.load(Ordering::SeqCst), 0);
        output.set_time(2.5);
        assert_eq!(ended.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_stop_suppresses_ended() {
        let output = VirtualOutput::new();
        let (ended, cb) = counter();
        let source = output.schedule(buffer(0.5), 0.0, cb).unwrap();
        source.stop();
        source.stop();

        output.advance(1.0);
        assert_eq!(ended.load(Ordering::SeqCst), 0);
        assert_eq!(output.stopped_count(), 1);
    }

    #[test]
    fn test_closed_rejects_schedule_and_resume() {
        let output = VirtualOutput::new();
        output.close();
        assert_eq!(output.state(), OutputState::Closed);
        assert!(matches!(
            output.schedule(buffer(0.1), 0.0, Box::new(|| {})),
            Err(DeviceError::Closed)
        ));
        assert!(output.resume().is_err());
    }

    #[test]
    fn test_clock_is_monotonic() {
        let output = VirtualOutput::new();
        output.set_time(5.0);
        output.set_time(1.0);
        assert_eq!(output.current_time(), 5.0);
    }

    #[tokio::test]
    async fn test_input_frames() {
        let input = VirtualInput::new();
        let mut stream = input.open_capture(Format::MONO_16K, 4).unwrap();

        assert_eq!(input.feed(&[0.1; 10]), 2);
        assert_eq!(stream.next_frame().await.unwrap().len(), 4);
        assert_eq!(stream.next_frame().await.unwrap().len(), 4);

        // the two leftover samples complete a frame with two more
        assert_eq!(input.feed(&[0.2; 2]), 1);
        assert_eq!(stream.next_frame().await.unwrap().len(), 4);
    }

    #[tokio::test]
    async fn test_input_stop_ends_stream() {
        let input = VirtualInput::new();
        let mut stream = input.open_capture(Format::MONO_16K, 4).unwrap();
        stream.control().stop();

        assert!(!input.is_capturing());
        assert_eq!(input.feed(&[0.0; 8]), 0);
        assert!(stream.next_frame().await.is_none());
    }

    #[test]
    fn test_input_denied() {
        let input = VirtualInput::denied();
        let err = input.open_capture(Format::MONO_16K, 4).err().unwrap();
        assert!(err.is_permission_denied());
    }
}
