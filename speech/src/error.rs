//! Error types for speech synthesis.

/// Failure of one backend attempt.
#[derive(Debug, Clone, thiserror::Error)]
pub enum BackendError {
    /// Server error, transport failure or malformed response.
    #[error("transient service error: {0}")]
    Transient(String),

    /// The service answered with text or no audio instead of speech.
    #[error("content rejected (reason={completion_reason:?}): {text_payload:?}")]
    ContentRejected {
        text_payload: Option<String>,
        completion_reason: Option<String>,
    },

    /// The service rejected the request permanently (auth, bad request).
    #[error("request failed: {0}")]
    Fatal(String),

    /// The audio payload could not be decoded.
    #[error("decode error: {0}")]
    Decode(String),
}

impl BackendError {
    /// Returns true if the service declined to produce speech.
    pub fn is_content_rejected(&self) -> bool {
        matches!(self, BackendError::ContentRejected { .. })
    }

    /// Returns true if repeating the same request may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, BackendError::Transient(_) | BackendError::Decode(_))
    }
}

/// Every attempt for one utterance failed.
#[derive(Debug, Clone, thiserror::Error)]
#[error("synthesis failed for {voice}:{text:?} after {attempts} attempts: {source}")]
pub struct SynthesisError {
    pub text: String,
    pub voice: String,
    pub attempts: usize,
    /// The last underlying error.
    #[source]
    pub source: BackendError,
}

impl SynthesisError {
    /// Returns true if the last attempt was a content rejection.
    pub fn is_content_rejected(&self) -> bool {
        self.source.is_content_rejected()
    }
}

/// Error type for the offline fallback voice.
#[derive(Debug, thiserror::Error)]
pub enum OfflineVoiceError {
    #[error("offline voice unavailable: {0}")]
    Unavailable(String),
    #[error("offline voice failed: {0}")]
    Failed(String),
}

/// Error type for vocabulary loading.
#[derive(Debug, thiserror::Error)]
pub enum VocabularyError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}
