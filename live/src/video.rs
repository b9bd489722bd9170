//! Camera frame encoding.

use image::ExtendedColorType;
use image::codecs::jpeg::JpegEncoder;
use speakboard_audio::VideoFrame;

use crate::error::{LiveError, Result};

/// Encodes an RGB frame as JPEG.
pub fn encode_jpeg(frame: &VideoFrame, quality: u8) -> Result<Vec<u8>> {
    let expected = frame.width as usize * frame.height as usize * 3;
    if frame.width == 0 || frame.height == 0 || frame.rgb.len() != expected {
        return Err(LiveError::Encode(format!(
            "frame {}x{} has {} bytes, expected {}",
            frame.width,
            frame.height,
            frame.rgb.len(),
            expected
        )));
    }

    let mut jpeg = Vec::new();
    JpegEncoder::new_with_quality(&mut jpeg, quality.clamp(1, 100))
        .encode(&frame.rgb, frame.width, frame.height, ExtendedColorType::Rgb8)
        .map_err(|e| LiveError::Encode(e.to_string()))?;
    Ok(jpeg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_jpeg() {
        let frame = VideoFrame::solid(8, 8, [200, 10, 10]);
        let jpeg = encode_jpeg(&frame, 80).unwrap();
        assert_eq!(&jpeg[..2], &[0xff, 0xd8]);
    }

    #[test]
    fn test_encode_rejects_short_buffer() {
        let frame = VideoFrame {
            width: 4,
            height: 4,
            rgb: vec![0; 10],
        };
        assert!(matches!(encode_jpeg(&frame, 80), Err(LiveError::Encode(_))));
    }
}
