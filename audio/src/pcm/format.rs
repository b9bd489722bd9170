//! PCM audio format definitions.

use std::time::Duration;

/// Describes a 16-bit PCM audio format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Format {
    /// Sample rate in Hz (e.g., 16000, 24000).
    pub sample_rate: u32,
    /// Number of interleaved channels.
    pub channels: u16,
}

impl Format {
    /// Creates a new format with the given sample rate and channel count.
    pub const fn new(sample_rate: u32, channels: u16) -> Self {
        Self {
            sample_rate,
            channels,
        }
    }

    /// Creates a new mono format with the given sample rate.
    pub const fn mono(sample_rate: u32) -> Self {
        Self::new(sample_rate, 1)
    }

    /// Returns the duration of `frames` sample frames.
    pub fn duration_of_frames(&self, frames: u64) -> Duration {
        if self.sample_rate == 0 {
            return Duration::ZERO;
        }
        Duration::from_nanos(frames * 1_000_000_000 / self.sample_rate as u64)
    }

    /// Returns the MIME type used when this format travels as raw PCM.
    pub fn mime_type(&self) -> String {
        format!("audio/pcm;rate={}", self.sample_rate)
    }
}

// Common format presets
impl Format {
    /// 16kHz mono, microphone uplink.
    pub const MONO_16K: Format = Format::mono(16000);
    /// 24kHz mono, synthesis and live downlink.
    pub const MONO_24K: Format = Format::mono(24000);
}
