//! Camera seam used by live sessions with video enabled.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use super::DeviceError;

/// One raw camera frame, packed RGB8.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoFrame {
    pub width: u32,
    pub height: u32,
    pub rgb: Vec<u8>,
}

impl VideoFrame {
    /// Creates a frame filled with a single color.
    pub fn solid(width: u32, height: u32, color: [u8; 3]) -> Self {
        let pixels = (width as usize) * (height as usize);
        let mut rgb = Vec::with_capacity(pixels * 3);
        for _ in 0..pixels {
            rgb.extend_from_slice(&color);
        }
        Self { width, height, rgb }
    }
}

/// An open camera.
pub trait FrameGrabber: Send {
    /// Grabs the current frame.
    fn grab(&mut self) -> Result<VideoFrame, DeviceError>;

    /// Stops the camera tracks. Idempotent.
    fn stop(&mut self);
}

/// A camera provider.
pub trait VideoInput: Send + Sync {
    fn open_camera(&self) -> Result<Box<dyn FrameGrabber>, DeviceError>;
}

/// Camera that produces a solid test pattern.
pub struct VirtualCamera {
    denied: bool,
    width: u32,
    height: u32,
    grabs: Arc<AtomicUsize>,
    stopped: Arc<AtomicBool>,
}

impl VirtualCamera {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            denied: false,
            width,
            height,
            grabs: Arc::new(AtomicUsize::new(0)),
            stopped: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Creates a camera that refuses access.
    pub fn denied() -> Self {
        Self {
            denied: true,
            ..Self::new(0, 0)
        }
    }

    /// Returns how many frames were grabbed across all opens.
    pub fn grab_count(&self) -> usize {
        self.grabs.load(Ordering::SeqCst)
    }

    /// Returns true once an opened grabber was stopped.
    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }
}

impl VideoInput for VirtualCamera {
    fn open_camera(&self) -> Result<Box<dyn FrameGrabber>, DeviceError> {
        if self.denied {
            return Err(DeviceError::PermissionDenied(
                "camera access denied".to_string(),
            ));
        }
        self.stopped.store(false, Ordering::SeqCst);
        Ok(Box::new(VirtualGrabber {
            width: self.width,
            height: self.height,
            grabs: Arc::clone(&self.grabs),
            stopped: Arc::clone(&self.stopped),
        }))
    }
}

struct VirtualGrabber {
    width: u32,
    height: u32,
    grabs: Arc<AtomicUsize>,
    stopped: Arc<AtomicBool>,
}

impl FrameGrabber for VirtualGrabber {
    fn grab(&mut self) -> Result<VideoFrame, DeviceError> {
        if self.stopped.load(Ordering::SeqCst) {
            return Err(DeviceError::Closed);
        }
        self.grabs.fetch_add(1, Ordering::SeqCst);
        Ok(VideoFrame::solid(self.width, self.height, [32, 96, 160]))
    }

    fn stop(&mut self) {
        self.stopped.store(true, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_solid_frame_size() {
        let frame = VideoFrame::solid(4, 2, [1, 2, 3]);
        assert_eq!(frame.rgb.len(), 24);
        assert_eq!(&frame.rgb[..3], &[1, 2, 3]);
    }

    #[test]
    fn test_virtual_camera() {
        let camera = VirtualCamera::new(8, 8);
        let mut grabber = camera.open_camera().unwrap();
        grabber.grab().unwrap();
        grabber.grab().unwrap();
        assert_eq!(camera.grab_count(), 2);

        grabber.stop();
        assert!(camera.is_stopped());
        assert!(grabber.grab().is_err());
    }

    #[test]
    fn test_denied_camera() {
        let err = VirtualCamera::denied().open_camera().err().unwrap();
        assert!(err.is_permission_denied());
    }
}
