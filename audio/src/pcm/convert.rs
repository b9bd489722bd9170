//! Conversions between f32 samples and 16-bit little-endian PCM.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use super::PcmError;

/// Converts one f32 sample to i16.
///
/// Uses the same 0x8000 scale as [`i16_to_f32`]; `1.0` and above saturate
/// to `i16::MAX`.
#[inline]
pub fn f32_to_i16(sample: f32) -> i16 {
    (sample.clamp(-1.0, 1.0) * 32768.0) as i16
}

/// Converts one i16 sample to f32 in `[-1.0, 1.0)`.
#[inline]
pub fn i16_to_f32(sample: i16) -> f32 {
    f32::from(sample) / 32768.0
}

/// Encodes f32 samples as 16-bit little-endian PCM bytes.
pub fn encode_pcm16(samples: &[f32]) -> Vec<u8> {
    let mut data = Vec::with_capacity(samples.len() * 2);
    for &sample in samples {
        data.extend_from_slice(&f32_to_i16(sample).to_le_bytes());
    }
    data
}

/// Decodes 16-bit little-endian PCM bytes into f32 samples.
pub fn decode_pcm16(data: &[u8]) -> Result<Vec<f32>, PcmError> {
    if data.len() % 2 != 0 {
        return Err(PcmError::OddLength(data.len()));
    }
    Ok(data
        .chunks_exact(2)
        .map(|bytes| i16_to_f32(i16::from_le_bytes([bytes[0], bytes[1]])))
        .collect())
}

/// Encodes f32 samples as base64 16-bit PCM.
pub fn encode_pcm16_base64(samples: &[f32]) -> String {
    STANDARD.encode(encode_pcm16(samples))
}

/// Decodes base64 16-bit PCM into f32 samples.
pub fn decode_pcm16_base64(encoded: &str) -> Result<Vec<f32>, PcmError> {
    let data = STANDARD.decode(encoded)?;
    decode_pcm16(&data)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_f32_to_i16_extremes() {
        assert_eq!(f32_to_i16(1.0), i16::MAX);
        assert_eq!(f32_to_i16(-1.0), i16::MIN);
        assert_eq!(f32_to_i16(0.0), 0);
    }

    #[test]
    fn test_f32_to_i16_clamps() {
        assert_eq!(f32_to_i16(3.5), i16::MAX);
        assert_eq!(f32_to_i16(-7.0), i16::MIN);
    }

    #[test]
    fn test_i16_to_f32() {
        assert_eq!(i16_to_f32(i16::MIN), -1.0);
        assert_eq!(i16_to_f32(0), 0.0);
        assert!(i16_to_f32(i16::MAX) < 1.0);
    }

    #[test]
    fn test_decode_little_endian() {
        // 0x4000 = 16384 -> 0.5
        let samples = decode_pcm16(&[0x00, 0x40, 0x00, 0xC0]).unwrap();
        assert_eq!(samples, vec![0.5, -0.5]);
    }

    #[test]
    fn test_decode_base64_invalid() {
        assert!(matches!(
            decode_pcm16_base64("not base64!"),
            Err(PcmError::Base64(_))
        ));
    }

    #[test]
    fn test_base64_preserves_samples() {
        let samples = vec![0.0, 0.5, -0.5, -1.0, 0.9, 0.25, -0.3];
        let decoded = decode_pcm16_base64(&encode_pcm16_base64(&samples)).unwrap();
        assert_eq!(decoded.len(), samples.len());
        for (a, b) in decoded.iter().zip(&samples) {
            assert!((a - b).abs() <= 1.0 / 32768.0, "{} vs {}", a, b);
        }
    }

    #[test]
    fn test_positive_samples_do_not_shrink() {
        let mut sample = 0.9f32;
        for _ in 0..4 {
            sample = i16_to_f32(f32_to_i16(sample));
        }
        assert!((sample - 0.9).abs() <= 1.0 / 32768.0, "{}", sample);
        assert_eq!(i16_to_f32(f32_to_i16(0.5)), 0.5);
    }
}
