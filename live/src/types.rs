//! Wire messages and session notifications.

use base64::Engine;
use serde::{Deserialize, Serialize};
use speakboard_audio::Format;
use speakboard_audio::pcm::encode_pcm16_base64;

use crate::error::Result;

/// MIME type of image frames.
pub const MIME_JPEG: &str = "image/jpeg";

/// A frame pushed to the live service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutboundFrame {
    /// Base64 16-bit PCM.
    Audio { data: String, format: Format },
    /// Base64 JPEG.
    Image { data: String },
}

#[derive(Serialize)]
struct Envelope<'a> {
    media: Media<'a>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Media<'a> {
    data: &'a str,
    mime_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    sample_rate: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    channels: Option<u16>,
}

impl OutboundFrame {
    /// Encodes float samples as a PCM frame.
    pub fn audio(samples: &[f32], format: Format) -> Self {
        OutboundFrame::Audio {
            data: encode_pcm16_base64(samples),
            format,
        }
    }

    /// Encodes JPEG bytes as an image frame.
    pub fn image(jpeg: &[u8]) -> Self {
        OutboundFrame::Image {
            data: base64::engine::general_purpose::STANDARD.encode(jpeg),
        }
    }

    pub fn is_audio(&self) -> bool {
        matches!(self, OutboundFrame::Audio { .. })
    }

    /// Serializes to `{"media":{...}}`.
    pub fn to_json(&self) -> Result<String> {
        let media = match self {
            OutboundFrame::Audio { data, format } => Media {
                data,
                mime_type: format.mime_type(),
                sample_rate: Some(format.sample_rate),
                channels: Some(format.channels),
            },
            OutboundFrame::Image { data } => Media {
                data,
                mime_type: MIME_JPEG.to_string(),
                sample_rate: None,
                channels: None,
            },
        };
        Ok(serde_json::to_string(&Envelope { media })?)
    }
}

/// A message received from the live service.
#[derive(Debug, Clone, PartialEq)]
pub enum InboundMessage {
    /// Base64 16-bit PCM to schedule for playback.
    AudioChunk { data: String, format: Format },
    /// The user started talking over the assistant.
    Interrupted,
    /// Anything else (setup acknowledgements, transcripts).
    Other(serde_json::Value),
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawInbound {
    audio_chunk: Option<String>,
    sample_rate: Option<u32>,
    channels: Option<u16>,
    #[serde(default)]
    interrupted: bool,
}

impl InboundMessage {
    /// Parses one inbound text message. Audio without an explicit format
    /// takes `default_format`.
    pub fn parse(text: &str, default_format: Format) -> Result<Self> {
        let value: serde_json::Value = serde_json::from_str(text)?;
        let raw: RawInbound = serde_json::from_value(value.clone())?;

        if raw.interrupted {
            return Ok(InboundMessage::Interrupted);
        }
        match raw.audio_chunk {
            Some(data) => Ok(InboundMessage::AudioChunk {
                data,
                format: Format::new(
                    raw.sample_rate.unwrap_or(default_format.sample_rate),
                    raw.channels.unwrap_or(default_format.channels),
                ),
            }),
            None => Ok(InboundMessage::Other(value)),
        }
    }
}

/// Session lifecycle.
///
/// `Idle -> Connecting -> Open <-> Interrupted -> Closed`; `Connecting` may
/// go straight to `Closed`. `Closed` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LiveState {
    Idle,
    Connecting,
    Open,
    Interrupted,
    Closed,
}

impl LiveState {
    /// Returns true while audio flows in both directions.
    pub fn is_streaming(&self) -> bool {
        matches!(self, LiveState::Open | LiveState::Interrupted)
    }
}

/// Notifications for the UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LiveEvent {
    StateChanged(LiveState),
    /// User-visible message, e.g. a refused camera.
    Notice(String),
    /// Emitted once when the session closes.
    Closed { reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_audio_frame_json() {
        let frame = OutboundFrame::audio(&[0.0, 0.0], Format::MONO_16K);
        let json: serde_json::Value = serde_json::from_str(&frame.to_json().unwrap()).unwrap();
        assert_eq!(json["media"]["data"], "AAAAAA==");
        assert_eq!(json["media"]["mimeType"], "audio/pcm;rate=16000");
        assert_eq!(json["media"]["sampleRate"], 16000);
        assert_eq!(json["media"]["channels"], 1);
    }

    #[test]
    fn test_image_frame_json() {
        let frame = OutboundFrame::image(&[0xff, 0xd8]);
        let json: serde_json::Value = serde_json::from_str(&frame.to_json().unwrap()).unwrap();
        assert_eq!(json["media"]["data"], "/9g=");
        assert_eq!(json["media"]["mimeType"], "image/jpeg");
        assert!(json["media"].get("sampleRate").is_none());
        assert!(!frame.is_audio());
    }

    #[test]
    fn test_parse_audio_chunk() {
        let msg = InboundMessage::parse(
            r#"{"audioChunk":"AAAA","sampleRate":24000,"channels":1}"#,
            Format::MONO_24K,
        )
        .unwrap();
        assert_eq!(
            msg,
            InboundMessage::AudioChunk {
                data: "AAAA".into(),
                format: Format::MONO_24K
            }
        );
    }

    #[test]
    fn test_parse_audio_chunk_default_format() {
        let msg = InboundMessage::parse(r#"{"audioChunk":"AAAA"}"#, Format::MONO_24K).unwrap();
        match msg {
            InboundMessage::AudioChunk { format, .. } => assert_eq!(format, Format::MONO_24K),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_parse_interrupted() {
        let msg = InboundMessage::parse(r#"{"interrupted":true}"#, Format::MONO_24K).unwrap();
        assert_eq!(msg, InboundMessage::Interrupted);
    }

    #[test]
    fn test_parse_other_and_malformed() {
        let msg = InboundMessage::parse(r#"{"setupComplete":{}}"#, Format::MONO_24K).unwrap();
        assert!(matches!(msg, InboundMessage::Other(_)));

        assert!(InboundMessage::parse("not json", Format::MONO_24K).is_err());
    }

    #[test]
    fn test_streaming_states() {
        assert!(LiveState::Open.is_streaming());
        assert!(LiveState::Interrupted.is_streaming());
        assert!(!LiveState::Connecting.is_streaming());
        assert!(!LiveState::Closed.is_streaming());
    }
}
