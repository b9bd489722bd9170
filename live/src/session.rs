//! Live session lifecycle.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use speakboard_audio::{
    AudioInput, AudioOutput, CaptureControl, DeviceError, FrameGrabber, OutputState, PcmBuffer,
    VideoInput,
};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::config::LiveConfig;
use crate::cursor::PlaybackCursor;
use crate::error::{LiveError, Result};
use crate::transport::{LiveConnector, LiveTransport};
use crate::types::{InboundMessage, LiveEvent, LiveState, OutboundFrame};
use crate::video::encode_jpeg;

/// Devices a live session owns for its lifetime.
pub struct LiveDevices {
    pub output: Arc<dyn AudioOutput>,
    pub input: Arc<dyn AudioInput>,
    /// Only opened when video is enabled.
    pub camera: Option<Arc<dyn VideoInput>>,
}

type SharedGrabber = Arc<Mutex<Box<dyn FrameGrabber>>>;

struct SessionInner {
    state: LiveState,
    transport: Option<Arc<dyn LiveTransport>>,
    capture: Option<Arc<dyn CaptureControl>>,
    grabber: Option<SharedGrabber>,
    tasks: Vec<JoinHandle<()>>,
}

struct Shared {
    config: LiveConfig,
    devices: LiveDevices,
    cursor: Arc<PlaybackCursor>,
    events: mpsc::UnboundedSender<LiveEvent>,
    inner: Mutex<SessionInner>,
}

/// A bidirectional voice session.
///
/// Microphone frames stream out while the session is open, inbound audio is
/// scheduled gaplessly on the output clock, and an interruption from the
/// service flushes everything still queued. Any transport failure closes the
/// session; a new one must be started explicitly.
///
/// Dropping the session closes it.
pub struct LiveSession {
    shared: Arc<Shared>,
}

impl LiveSession {
    /// Creates an idle session and the receiver for its events.
    pub fn new(
        config: LiveConfig,
        devices: LiveDevices,
    ) -> (Self, mpsc::UnboundedReceiver<LiveEvent>) {
        let (events, rx) = mpsc::unbounded_channel();
        let shared = Arc::new(Shared {
            config,
            devices,
            cursor: Arc::new(PlaybackCursor::new()),
            events,
            inner: Mutex::new(SessionInner {
                state: LiveState::Idle,
                transport: None,
                capture: None,
                grabber: None,
                tasks: Vec::new(),
            }),
        });
        (Self { shared }, rx)
    }

    /// Connects, opens the microphone (and camera when enabled) and starts
    /// streaming.
    ///
    /// A refused microphone closes the session and returns
    /// [`LiveError::Permission`]. A refused camera only emits a notice; the
    /// session continues audio-only.
    pub async fn start(&self, connector: &dyn LiveConnector) -> Result<()> {
        let shared = &self.shared;
        {
            let mut inner = shared.inner.lock();
            if inner.state != LiveState::Idle {
                return Err(LiveError::InvalidState(format!(
                    "cannot start a session in state {:?}",
                    inner.state
                )));
            }
            shared.transition(&mut inner, LiveState::Connecting);
        }

        let transport = match connector.connect(&shared.config).await {
            Ok(transport) => transport,
            Err(err) => {
                warn!(error = %err, "live connection failed");
                shared.close(format!("connection failed: {}", err));
                return Err(err);
            }
        };

        {
            let mut inner = shared.inner.lock();
            if inner.state == LiveState::Closed {
                drop(inner);
                spawn_transport_close(transport);
                return Err(LiveError::SessionClosed);
            }
            inner.transport = Some(Arc::clone(&transport));
        }

        if let Err(err) = shared.prepare_output() {
            shared.close(format!("audio output unavailable: {}", err));
            return Err(err);
        }

        let capture = match shared
            .devices
            .input
            .open_capture(shared.config.input_format, shared.config.frame_samples)
        {
            Ok(capture) => capture,
            Err(err) => {
                let err = LiveError::from(err);
                if err.is_permission_denied() {
                    shared.notify(LiveEvent::Notice(
                        "Microphone access was denied. Allow it to start a live session.".into(),
                    ));
                }
                shared.close(format!("microphone unavailable: {}", err));
                return Err(err);
            }
        };

        let grabber = if shared.config.video_enabled {
            shared.open_camera()
        } else {
            None
        };

        let mut inner = shared.inner.lock();
        if inner.state == LiveState::Closed {
            drop(inner);
            capture.control().stop();
            if let Some(grabber) = grabber {
                grabber.lock().stop();
            }
            return Err(LiveError::SessionClosed);
        }

        let (frames, control) = capture.into_parts();
        inner.capture = Some(control);
        inner
            .tasks
            .push(tokio::spawn(capture_loop(Arc::clone(shared), frames)));

        if let Some(grabber) = grabber {
            let period = shared.config.video_interval.max(Duration::from_millis(1));
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            inner.grabber = Some(Arc::clone(&grabber));
            inner
                .tasks
                .push(tokio::spawn(video_loop(Arc::clone(shared), grabber, ticker)));
        }

        inner
            .tasks
            .push(tokio::spawn(inbound_loop(Arc::clone(shared), transport)));

        shared.transition(&mut inner, LiveState::Open);
        info!(video = inner.grabber.is_some(), "live session open");
        Ok(())
    }

    /// Applies one inbound message.
    ///
    /// Audio chunks are scheduled at `max(next_start, now)`; an interruption
    /// stops everything queued and rewinds the cursor. Messages arriving
    /// after close are rejected with [`LiveError::SessionClosed`].
    pub fn handle_message(&self, message: InboundMessage) -> Result<()> {
        self.shared.handle_message(message)
    }

    /// Tears the session down. Idempotent; safe from any thread.
    ///
    /// Devices are released before this returns. The transport close is
    /// spawned and not awaited.
    pub fn close(&self) {
        self.shared.close("closed by user".to_string());
    }

    pub fn state(&self) -> LiveState {
        self.shared.inner.lock().state
    }

    /// Returns how many inbound buffers are scheduled and not finished.
    pub fn active_sources(&self) -> usize {
        self.shared.cursor.active_count()
    }

    /// Returns the playback cursor position.
    pub fn next_start_time(&self) -> f64 {
        self.shared.cursor.next_start()
    }

    pub fn config(&self) -> &LiveConfig {
        &self.shared.config
    }
}

impl Drop for LiveSession {
    fn drop(&mut self) {
        self.shared.close("session dropped".to_string());
    }
}

impl Shared {
    fn notify(&self, event: LiveEvent) {
        let _ = self.events.send(event);
    }

    fn transition(&self, inner: &mut SessionInner, state: LiveState) {
        if inner.state == state {
            return;
        }
        debug!(from = ?inner.state, to = ?state, "live state");
        inner.state = state;
        self.notify(LiveEvent::StateChanged(state));
    }

    fn prepare_output(&self) -> Result<()> {
        match self.devices.output.state() {
            OutputState::Running => Ok(()),
            OutputState::Suspended => Ok(self.devices.output.resume()?),
            OutputState::Closed => Err(LiveError::Device(DeviceError::Closed)),
        }
    }

    fn open_camera(&self) -> Option<SharedGrabber> {
        let Some(camera) = &self.devices.camera else {
            self.notify(LiveEvent::Notice(
                "No camera available. Continuing with audio only.".into(),
            ));
            return None;
        };
        match camera.open_camera() {
            Ok(grabber) => Some(Arc::new(Mutex::new(grabber))),
            Err(err) => {
                warn!(error = %err, "camera unavailable, continuing audio-only");
                let notice = if err.is_permission_denied() {
                    "Camera access was denied. Continuing with audio only."
                } else {
                    "Camera unavailable. Continuing with audio only."
                };
                self.notify(LiveEvent::Notice(notice.into()));
                None
            }
        }
    }

    fn transport(&self) -> Option<Arc<dyn LiveTransport>> {
        let inner = self.inner.lock();
        if inner.state.is_streaming() {
            inner.transport.clone()
        } else {
            None
        }
    }

    fn handle_message(&self, message: InboundMessage) -> Result<()> {
        match message {
            InboundMessage::AudioChunk { data, format } => {
                if self.inner.lock().state == LiveState::Closed {
                    return Err(LiveError::SessionClosed);
                }
                let buffer = PcmBuffer::from_pcm16_base64(format, &data)?;
                if buffer.is_empty() {
                    return Ok(());
                }

                // Hold the session lock across scheduling so a concurrent
                // close cannot slip between the state check and the cursor.
                let mut inner = self.inner.lock();
                if inner.state == LiveState::Closed {
                    return Err(LiveError::SessionClosed);
                }
                if let Err(err) = self
                    .cursor
                    .schedule(self.devices.output.as_ref(), Arc::new(buffer))
                {
                    drop(inner);
                    self.close(format!("audio output failed: {}", err));
                    return Err(err.into());
                }
                if inner.state == LiveState::Interrupted {
                    self.transition(&mut inner, LiveState::Open);
                }
                Ok(())
            }
            InboundMessage::Interrupted => {
                let mut inner = self.inner.lock();
                if inner.state == LiveState::Closed {
                    return Err(LiveError::SessionClosed);
                }
                let stopped = self.cursor.interrupt();
                debug!(stopped, "playback interrupted");
                if inner.state.is_streaming() {
                    self.transition(&mut inner, LiveState::Interrupted);
                }
                Ok(())
            }
            InboundMessage::Other(value) => {
                debug!(message = %value, "ignoring live message");
                Ok(())
            }
        }
    }

    fn close(&self, reason: String) {
        let (transport, capture, grabber, tasks) = {
            let mut inner = self.inner.lock();
            if inner.state == LiveState::Closed {
                return;
            }
            self.transition(&mut inner, LiveState::Closed);
            (
                inner.transport.take(),
                inner.capture.take(),
                inner.grabber.take(),
                std::mem::take(&mut inner.tasks),
            )
        };

        if let Some(capture) = capture {
            capture.stop();
        }
        if let Some(grabber) = grabber {
            grabber.lock().stop();
        }
        for task in tasks {
            task.abort();
        }
        self.cursor.interrupt();
        self.devices.output.close();
        self.devices.input.close();
        if let Some(transport) = transport {
            spawn_transport_close(transport);
        }

        info!(reason = %reason, "live session closed");
        self.notify(LiveEvent::Closed { reason });
    }
}

fn spawn_transport_close(transport: Arc<dyn LiveTransport>) {
    match tokio::runtime::Handle::try_current() {
        Ok(handle) => {
            handle.spawn(async move {
                if let Err(err) = transport.close().await {
                    debug!(error = %err, "live transport close failed");
                }
            });
        }
        Err(_) => debug!("no runtime available, dropping live transport"),
    }
}

async fn capture_loop(shared: Arc<Shared>, mut frames: mpsc::UnboundedReceiver<Vec<f32>>) {
    let format = shared.config.input_format;
    while let Some(frame) = frames.recv().await {
        let Some(transport) = shared.transport() else {
            continue;
        };
        if let Err(err) = transport.send(OutboundFrame::audio(&frame, format)) {
            shared.close(format!("failed to send audio: {}", err));
            return;
        }
    }
    debug!("microphone capture ended");
}

async fn video_loop(
    shared: Arc<Shared>,
    grabber: SharedGrabber,
    mut ticker: tokio::time::Interval,
) {
    let quality = shared.config.jpeg_quality;
    loop {
        ticker.tick().await;
        let Some(transport) = shared.transport() else {
            continue;
        };

        let frame = grabber.lock().grab();
        let frame = match frame {
            Ok(frame) => frame,
            Err(DeviceError::Closed) => {
                debug!("camera closed, stopping video frames");
                return;
            }
            Err(err) => {
                warn!(error = %err, "failed to grab camera frame");
                continue;
            }
        };

        match encode_jpeg(&frame, quality) {
            Ok(jpeg) => {
                if let Err(err) = transport.send(OutboundFrame::image(&jpeg)) {
                    shared.close(format!("failed to send video: {}", err));
                    return;
                }
            }
            Err(err) => warn!(error = %err, "failed to encode camera frame"),
        }
    }
}

async fn inbound_loop(shared: Arc<Shared>, transport: Arc<dyn LiveTransport>) {
    while let Some(result) = transport.recv().await {
        let outcome = result.and_then(|message| shared.handle_message(message));
        match outcome {
            Ok(()) => {}
            Err(err) if err.is_malformed_message() => {
                warn!(error = %err, "skipping malformed live message");
            }
            Err(LiveError::SessionClosed) => return,
            Err(err) => {
                shared.close(format!("live transport error: {}", err));
                return;
            }
        }
    }
    shared.close("server ended the session".to_string());
}
