//! Audio foundation for speakboard.
//!
//! This crate provides:
//!
//! - `pcm`: format arithmetic, decoded sample buffers and 16-bit PCM codecs
//! - `device`: output, input and camera seams, the shared output accessor and
//!   in-memory virtual devices
//!
//! # Example
//!
//! ```rust
//! use speakboard_audio::pcm::{Format, PcmBuffer};
//! use std::time::Duration;
//!
//! // 24kHz mono, the format the synthesis service answers with
//! let format = Format::MONO_24K;
//!
//! // 20ms of sample frames
//! assert_eq!(format.duration_of_frames(480), Duration::from_millis(20));
//!
//! // Half a second of silence
//! let buffer = PcmBuffer::new(format, vec![0.0; 12000]);
//! assert_eq!(buffer.duration(), Duration::from_millis(500));
//! ```

pub mod device;
pub mod pcm;

pub use device::{
    AudioInput, AudioOutput, CaptureControl, CaptureStream, DeviceError, EndedCallback,
    FrameGrabber, OutputState, ScheduledSource, SharedOutput, VideoFrame, VideoInput,
};
pub use pcm::{Format, PcmBuffer, PcmError};
