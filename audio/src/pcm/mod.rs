//! PCM (Pulse Code Modulation) audio handling.
//!
//! # Key Types
//!
//! - [`Format`]: sample rate and channel count, with byte/duration arithmetic
//! - [`PcmBuffer`]: decoded f32 samples tagged with their format
//!
//! The wire representation used by every remote collaborator is 16-bit signed
//! little-endian PCM, usually base64 encoded inside JSON. The helpers in
//! [`convert`] move between that representation and f32 samples.

mod buffer;
pub mod convert;
mod format;

pub use buffer::PcmBuffer;
pub use convert::{
    decode_pcm16, decode_pcm16_base64, encode_pcm16, encode_pcm16_base64, f32_to_i16, i16_to_f32,
};
pub use format::Format;

/// Error type for PCM decoding.
#[derive(Debug, thiserror::Error)]
pub enum PcmError {
    #[error("pcm16 payload has odd length {0}")]
    OddLength(usize),
    #[error("base64 decode error: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("invalid format: {0}")]
    InvalidFormat(String),
}
