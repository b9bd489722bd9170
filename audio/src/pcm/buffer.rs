//! Decoded PCM buffers.

use std::time::Duration;

use super::{Format, PcmError, convert};

/// A block of decoded audio: interleaved f32 samples in `[-1.0, 1.0]`.
#[derive(Debug, Clone, PartialEq)]
pub struct PcmBuffer {
    samples: Vec<f32>,
    format: Format,
}

impl PcmBuffer {
    /// Creates a buffer from interleaved samples.
    pub fn new(format: Format, samples: Vec<f32>) -> Self {
        Self { samples, format }
    }

    /// Decodes base64-encoded 16-bit little-endian PCM.
    pub fn from_pcm16_base64(format: Format, encoded: &str) -> Result<Self, PcmError> {
        if format.channels == 0 || format.sample_rate == 0 {
            return Err(PcmError::InvalidFormat(format!("{:?}", format)));
        }
        Ok(Self::new(format, convert::decode_pcm16_base64(encoded)?))
    }

    /// Returns the audio format.
    pub fn format(&self) -> Format {
        self.format
    }

    /// Returns the interleaved samples.
    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    /// Returns the number of sample frames.
    pub fn frames(&self) -> usize {
        self.samples.len() / self.format.channels.max(1) as usize
    }

    /// Returns true if the buffer holds no samples.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Returns the playback duration.
    pub fn duration(&self) -> Duration {
        self.format.duration_of_frames(self.frames() as u64)
    }

    /// Returns the playback duration in seconds, the unit device clocks use.
    pub fn duration_secs(&self) -> f64 {
        if self.format.sample_rate == 0 {
            return 0.0;
        }
        self.frames() as f64 / self.format.sample_rate as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buffer_duration() {
        let buffer = PcmBuffer::new(Format::MONO_24K, vec![0.0; 24000]);
        assert_eq!(buffer.frames(), 24000);
        assert_eq!(buffer.duration(), Duration::from_secs(1));
        assert!((buffer.duration_secs() - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_buffer_stereo_frames() {
        let buffer = PcmBuffer::new(Format::new(48000, 2), vec![0.0; 960]);
        assert_eq!(buffer.frames(), 480);
        assert_eq!(buffer.duration(), Duration::from_millis(10));
    }

    #[test]
    fn test_from_base64_rejects_odd_length() {
        let err = PcmBuffer::from_pcm16_base64(Format::MONO_24K, "AAEC").unwrap_err();
        assert!(matches!(err, PcmError::OddLength(3)));
    }

    #[test]
    fn test_from_base64_rejects_zero_rate() {
        let err = PcmBuffer::from_pcm16_base64(Format::mono(0), "AAA=").unwrap_err();
        assert!(matches!(err, PcmError::InvalidFormat(_)));
    }

    #[test]
    fn test_from_base64_decodes() {
        // 0x4000, 0xC000
        let buffer = PcmBuffer::from_pcm16_base64(Format::MONO_16K, "AEAAwA==").unwrap();
        assert_eq!(buffer.samples(), &[0.5, -0.5]);
    }
}
