//! Wire types for the synthesis service.

use serde::{Deserialize, Serialize};
use speakboard_audio::Format;

/// Sample rate the service answers with when the response omits it.
pub const DEFAULT_SAMPLE_RATE: u32 = 24000;

/// Channel count the service answers with when the response omits it.
pub const DEFAULT_CHANNELS: u16 = 1;

/// One synthesis request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SynthesisRequest {
    pub text: String,
    pub voice: String,
}

impl SynthesisRequest {
    pub fn new(text: impl Into<String>, voice: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            voice: voice.into(),
        }
    }
}

/// Raw synthesis response.
///
/// A successful response carries `audio_payload`; a refusal carries a
/// `text_payload` and/or a `completion_reason` instead.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SynthesisResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_payload: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sample_rate: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channels: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_payload: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completion_reason: Option<String>,
}

/// Interpreted synthesis response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Base64 16-bit PCM in `format`.
    Audio { pcm_base64: String, format: Format },
    /// The service answered without speech.
    Rejected {
        text_payload: Option<String>,
        completion_reason: Option<String>,
    },
}

impl Outcome {
    /// Returns true for [`Outcome::Rejected`].
    pub fn is_rejected(&self) -> bool {
        matches!(self, Outcome::Rejected { .. })
    }
}

impl SynthesisResponse {
    /// Returns true if the completion reason is absent or a normal stop.
    pub fn completed_normally(&self) -> bool {
        match self.completion_reason.as_deref() {
            None => true,
            Some(reason) => reason.eq_ignore_ascii_case("stop"),
        }
    }

    /// Classifies the response.
    ///
    /// Audio is accepted only with a normal completion; a text payload, a
    /// missing or empty audio payload, or an unrecognized completion reason
    /// is a rejection.
    pub fn outcome(&self) -> Outcome {
        match self.audio_payload.as_deref() {
            Some(payload) if !payload.is_empty() && self.completed_normally() => Outcome::Audio {
                pcm_base64: payload.to_string(),
                format: Format::new(
                    self.sample_rate.unwrap_or(DEFAULT_SAMPLE_RATE),
                    self.channels.unwrap_or(DEFAULT_CHANNELS),
                ),
            },
            _ => Outcome::Rejected {
                text_payload: self.text_payload.clone(),
                completion_reason: self.completion_reason.clone(),
            },
        }
    }
}

/// Error body returned with non-success statuses.
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    pub error: Option<ErrorDetail>,
    pub message: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ErrorDetail {
    pub message: Option<String>,
}

impl ErrorBody {
    pub fn into_message(self) -> Option<String> {
        self.error.and_then(|e| e.message).or(self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_audio_outcome() {
        let resp: SynthesisResponse = serde_json::from_str(
            r#"{"audioPayload":"AAAA","sampleRate":24000,"channels":1}"#,
        )
        .unwrap();
        assert_eq!(
            resp.outcome(),
            Outcome::Audio {
                pcm_base64: "AAAA".to_string(),
                format: Format::MONO_24K,
            }
        );
    }

    #[test]
    fn test_missing_format_defaults() {
        let resp: SynthesisResponse = serde_json::from_str(r#"{"audioPayload":"AAAA"}"#).unwrap();
        match resp.outcome() {
            Outcome::Audio { format, .. } => assert_eq!(format, Format::MONO_24K),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_text_payload_is_rejection() {
        let resp: SynthesisResponse =
            serde_json::from_str(r#"{"textPayload":"I can't say that"}"#).unwrap();
        let outcome = resp.outcome();
        assert!(outcome.is_rejected());
        match outcome {
            Outcome::Rejected { text_payload, .. } => {
                assert_eq!(text_payload.as_deref(), Some("I can't say that"))
            }
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_unrecognized_completion_reason_is_rejection() {
        let resp: SynthesisResponse = serde_json::from_str(
            r#"{"audioPayload":"AAAA","completionReason":"OTHER"}"#,
        )
        .unwrap();
        assert!(resp.outcome().is_rejected());

        let resp: SynthesisResponse = serde_json::from_str(
            r#"{"audioPayload":"AAAA","completionReason":"STOP"}"#,
        )
        .unwrap();
        assert!(!resp.outcome().is_rejected());
    }

    #[test]
    fn test_request_serialization() {
        let json = serde_json::to_string(&SynthesisRequest::new("Hello", "Kore")).unwrap();
        assert_eq!(json, r#"{"text":"Hello","voice":"Kore"}"#);
    }

    #[test]
    fn test_error_body_message() {
        let body: ErrorBody =
            serde_json::from_str(r#"{"error":{"message":"quota exceeded"}}"#).unwrap();
        assert_eq!(body.into_message().as_deref(), Some("quota exceeded"));

        let body: ErrorBody = serde_json::from_str(r#"{"message":"flat"}"#).unwrap();
        assert_eq!(body.into_message().as_deref(), Some("flat"));
    }
}
