//! Speaker output via `rodio`.
//!
//! `rodio::OutputStream` is `!Send` on some platforms, so it lives on a
//! dedicated thread for the lifetime of the device. Each scheduled buffer
//! gets its own `Sink` with a start delay computed from the device clock.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, mpsc};
use std::thread;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use rodio::buffer::SamplesBuffer;
use rodio::{OutputStream, OutputStreamHandle, Sink, Source};
use tracing::{debug, info, warn};

use super::{AudioOutput, DeviceError, EndedCallback, OutputState, ScheduledSource};
use crate::pcm::PcmBuffer;

/// Default speaker output.
pub struct RodioOutput {
    handle: OutputStreamHandle,
    epoch: Instant,
    state: Mutex<OutputState>,
    sinks: Mutex<Vec<Arc<RodioSource>>>,
    shutdown_tx: Mutex<Option<mpsc::Sender<()>>>,
}

impl RodioOutput {
    /// Opens the default output device on a dedicated thread.
    pub fn open() -> Result<Self, DeviceError> {
        let (init_tx, init_rx) = mpsc::channel::<Result<OutputStreamHandle, DeviceError>>();
        let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>();

        thread::Builder::new()
            .name("speakboard-output".into())
            .spawn(move || {
                let (_stream, handle) = match OutputStream::try_default() {
                    Ok(pair) => pair,
                    Err(e) => {
                        let _ = init_tx.send(Err(DeviceError::Unavailable(e.to_string())));
                        return;
                    }
                };
                if init_tx.send(Ok(handle)).is_err() {
                    return;
                }
                // Hold the stream until close() drops the sender.
                let _ = shutdown_rx.recv();
                debug!("output thread exiting");
            })
            .map_err(|e| DeviceError::Backend(format!("spawn output thread: {e}")))?;

        let handle = init_rx
            .recv()
            .map_err(|_| DeviceError::Backend("output thread died".to_string()))??;

        info!("audio output opened on default device");

        Ok(Self {
            handle,
            epoch: Instant::now(),
            state: Mutex::new(OutputState::Running),
            sinks: Mutex::new(Vec::new()),
            shutdown_tx: Mutex::new(Some(shutdown_tx)),
        })
    }
}

impl AudioOutput for RodioOutput {
    fn current_time(&self) -> f64 {
        self.epoch.elapsed().as_secs_f64()
    }

    fn state(&self) -> OutputState {
        *self.state.lock()
    }

    fn resume(&self) -> Result<(), DeviceError> {
        let mut state = self.state.lock();
        match *state {
            OutputState::Closed => Err(DeviceError::Closed),
            _ => {
                *state = OutputState::Running;
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
        if self.state() == OutputState::Closed {
            return Err(DeviceError::Closed);
        }

        let sink = Sink::try_new(&self.handle).map_err(|e| DeviceError::Backend(e.to_string()))?;
        let delay = (start_at - self.current_time()).max(0.0);
        let format = buffer.format();
        let source = SamplesBuffer::new(format.channels, format.sample_rate, buffer.samples().to_vec())
            .delay(Duration::from_secs_f64(delay));
        sink.append(source);

        let scheduled = Arc::new(RodioSource {
            sink: Arc::new(sink),
            stopped: Arc::new(AtomicBool::new(false)),
        });
        self.sinks.lock().push(Arc::clone(&scheduled));
        self.sinks.lock().retain(|s| !s.sink.empty());

        let sink = Arc::clone(&scheduled.sink);
        let stopped = Arc::clone(&scheduled.stopped);
        thread::spawn(move || {
            sink.sleep_until_end();
            if !stopped.swap(true, Ordering::SeqCst) {
                on_ended();
            }
        });

        Ok(Box::new(RodioHandle(scheduled)))
    }

    fn close(&self) {
        {
            let mut state = self.state.lock();
            if *state == OutputState::Closed {
                return;
            }
            *state = OutputState::Closed;
        }
        for source in self.sinks.lock().drain(..) {
            source.stop();
        }
        if self.shutdown_tx.lock().take().is_none() {
            warn!("output thread already released");
        }
        info!("audio output closed");
    }
}

struct RodioSource {
    sink: Arc<Sink>,
    stopped: Arc<AtomicBool>,
}

impl RodioSource {
    fn stop(&self) {
        if !self.stopped.swap(true, Ordering::SeqCst) {
            self.sink.stop();
        }
    }
}

struct RodioHandle(Arc<RodioSource>);

impl ScheduledSource for RodioHandle {
    fn stop(&self) {
        self.0.stop();
    }
}
