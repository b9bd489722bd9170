//! Remote synthesis seam.

use async_trait::async_trait;
use speakboard_audio::{Format, PcmBuffer};
use speakboard_synthapi::{Client, Outcome, SynthesisRequest};
use tracing::debug;

use crate::error::BackendError;

/// Undecoded audio returned by a backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawAudio {
    /// Base64 16-bit little-endian PCM.
    pub pcm_base64: String,
    pub format: Format,
}

impl RawAudio {
    pub fn new(pcm_base64: impl Into<String>, format: Format) -> Self {
        Self {
            pcm_base64: pcm_base64.into(),
            format,
        }
    }

    /// Decodes the payload into a playable buffer.
    pub fn decode(&self) -> Result<PcmBuffer, BackendError> {
        let buffer = PcmBuffer::from_pcm16_base64(self.format, &self.pcm_base64)
            .map_err(|e| BackendError::Decode(e.to_string()))?;
        if buffer.is_empty() {
            return Err(BackendError::Decode("empty audio payload".to_string()));
        }
        Ok(buffer)
    }
}

/// A one-shot text-to-speech service. One call is one attempt.
#[async_trait]
pub trait SpeechBackend: Send + Sync {
    async fn synthesize(&self, text: &str, voice: &str) -> Result<RawAudio, BackendError>;
}

/// [`SpeechBackend`] over the remote synthesis service.
pub struct RemoteBackend {
    client: Client,
}

impl RemoteBackend {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &Client {
        &self.client
    }
}

#[async_trait]
impl SpeechBackend for RemoteBackend {
    async fn synthesize(&self, text: &str, voice: &str) -> Result<RawAudio, BackendError> {
        let request = SynthesisRequest::new(text, voice);
        let response = self
            .client
            .speech()
            .synthesize(&request)
            .await
            .map_err(|e| {
                if e.is_retryable() {
                    BackendError::Transient(e.to_string())
                } else {
                    BackendError::Fatal(e.to_string())
                }
            })?;

        match response.outcome() {
            Outcome::Audio { pcm_base64, format } => {
                debug!(voice, bytes = pcm_base64.len(), "remote synthesis returned audio");
                Ok(RawAudio { pcm_base64, format })
            }
            Outcome::Rejected {
                text_payload,
                completion_reason,
            } => Err(BackendError::ContentRejected {
                text_payload,
                completion_reason,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use speakboard_audio::pcm::encode_pcm16_base64;

    #[test]
    fn test_decode_raw_audio() {
        let raw = RawAudio::new(encode_pcm16_base64(&[0.0; 2400]), Format::MONO_24K);
        let buffer = raw.decode().unwrap();
        assert_eq!(buffer.frames(), 2400);
        assert_eq!(buffer.format(), Format::MONO_24K);
    }

    #[test]
    fn test_decode_rejects_garbage() {
        let raw = RawAudio::new("not base64!", Format::MONO_24K);
        assert!(matches!(raw.decode(), Err(BackendError::Decode(_))));

        let raw = RawAudio::new("", Format::MONO_24K);
        assert!(matches!(raw.decode(), Err(BackendError::Decode(_))));
    }
}
