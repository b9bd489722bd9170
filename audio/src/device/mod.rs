//! Audio device seams.
//!
//! Output devices expose a monotonic clock (seconds) and accept buffers
//! scheduled at absolute clock times, which is what gapless streaming needs.
//! Input devices deliver fixed-size frames over a channel. Cameras hand out
//! RGB frames on demand.
//!
//! - [`AudioOutput`]: a playback context with its own clock
//! - [`AudioInput`]: a capture context producing [`CaptureStream`]s
//! - [`SharedOutput`]: lazily-initialized, explicitly torn down output owner
//! - [`VirtualOutput`] / [`VirtualInput`]: deterministic in-memory devices

mod shared;
mod video;
mod virtual_device;

#[cfg(feature = "cpal")]
mod cpal_input;
#[cfg(feature = "rodio")]
mod rodio_output;

pub use shared::{OutputFactory, SharedOutput};
pub use video::{FrameGrabber, VideoFrame, VideoInput, VirtualCamera};
pub use virtual_device::{ScheduledRecord, VirtualInput, VirtualOutput};

#[cfg(feature = "cpal")]
pub use cpal_input::CpalInput;
#[cfg(feature = "rodio")]
pub use rodio_output::RodioOutput;

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::pcm::{Format, PcmBuffer};

/// Error type for device operations.
#[derive(Debug, Clone, thiserror::Error)]
pub enum DeviceError {
    #[error("permission denied: {0}")]
    PermissionDenied(String),
    #[error("device unavailable: {0}")]
    Unavailable(String),
    #[error("device closed")]
    Closed,
    #[error("backend error: {0}")]
    Backend(String),
}

impl DeviceError {
    /// Returns true if the user or platform refused access to the device.
    pub fn is_permission_denied(&self) -> bool {
        matches!(self, DeviceError::PermissionDenied(_))
    }
}

/// Lifecycle state of an output context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputState {
    Running,
    Suspended,
    Closed,
}

/// Invoked once when a scheduled buffer finishes playing on its own.
/// Sources stopped through [`ScheduledSource::stop`] never invoke it.
pub type EndedCallback = Box<dyn FnOnce() + Send + 'static>;

/// A buffer that has been handed to an output device.
pub trait ScheduledSource: Send + Sync {
    /// Stops playback immediately. Calling it more than once is a no-op.
    fn stop(&self);
}

/// A playback context with its own clock.
pub trait AudioOutput: Send + Sync {
    /// Returns the device clock in seconds.
    fn current_time(&self) -> f64;

    /// Returns the lifecycle state.
    fn state(&self) -> OutputState;

    /// Resumes a suspended context.
    fn resume(&self) -> Result<(), DeviceError>;

    /// Schedules `buffer` to start at `start_at` seconds on the device clock.
    /// A start time in the past plays immediately.
    fn schedule(
        &self,
        buffer: Arc<PcmBuffer>,
        start_at: f64,
        on_ended: EndedCallback,
    ) -> Result<Box<dyn ScheduledSource>, DeviceError>;

    /// Stops everything and releases the device. Idempotent.
    fn close(&self);
}

/// Stops an active capture (the equivalent of stopping the media tracks).
pub trait CaptureControl: Send + Sync {
    fn stop(&self);
}

/// Frames captured from an input device.
pub struct CaptureStream {
    frames: mpsc::UnboundedReceiver<Vec<f32>>,
    control: Arc<dyn CaptureControl>,
}

impl CaptureStream {
    /// Creates a stream from a frame receiver and its control handle.
    pub fn new(frames: mpsc::UnboundedReceiver<Vec<f32>>, control: Arc<dyn CaptureControl>) -> Self {
        Self { frames, control }
    }

    /// Returns the next frame, or `None` once capture stopped.
    pub async fn next_frame(&mut self) -> Option<Vec<f32>> {
        self.frames.recv().await
    }

    /// Returns a handle that stops the capture.
    pub fn control(&self) -> Arc<dyn CaptureControl> {
        Arc::clone(&self.control)
    }

    /// Splits the stream into its receiver and control handle.
    pub fn into_parts(self) -> (mpsc::UnboundedReceiver<Vec<f32>>, Arc<dyn CaptureControl>) {
        (self.frames, self.control)
    }
}

/// A capture context.
pub trait AudioInput: Send + Sync {
    /// Opens the default microphone, delivering mono frames of
    /// `frame_samples` samples at `format.sample_rate`.
    fn open_capture(&self, format: Format, frame_samples: usize)
    -> Result<CaptureStream, DeviceError>;

    /// Releases the capture context. Idempotent.
    fn close(&self);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_error_display() {
        let err = DeviceError::PermissionDenied("microphone".to_string());
        assert!(err.to_string().contains("microphone"));
        assert!(err.is_permission_denied());
        assert!(!DeviceError::Closed.is_permission_denied());
    }
}
