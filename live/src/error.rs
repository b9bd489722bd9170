//! Error types for live sessions.

use speakboard_audio::{DeviceError, PcmError};
use thiserror::Error;

/// Result type for live session operations.
pub type Result<T> = std::result::Result<T, LiveError>;

/// Errors that can occur during a live session.
#[derive(Error, Debug)]
pub enum LiveError {
    /// Could not establish the connection.
    #[error("connection error: {0}")]
    Connection(String),

    /// WebSocket error.
    #[error("websocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    /// JSON serialization/deserialization error.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// Microphone or camera access was refused.
    #[error("permission denied: {0}")]
    Permission(String),

    /// Audio or video device failure.
    #[error("device error: {0}")]
    Device(DeviceError),

    /// An inbound audio payload could not be decoded.
    #[error("decode error: {0}")]
    Decode(#[from] PcmError),

    /// Image encoding failed.
    #[error("encode error: {0}")]
    Encode(String),

    /// The session is closed.
    #[error("session closed")]
    SessionClosed,

    /// Operation not valid in the current state.
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// Invalid configuration.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl From<DeviceError> for LiveError {
    fn from(err: DeviceError) -> Self {
        match err {
            DeviceError::PermissionDenied(msg) => LiveError::Permission(msg),
            other => LiveError::Device(other),
        }
    }
}

impl LiveError {
    /// Returns true if access to a device was refused.
    pub fn is_permission_denied(&self) -> bool {
        matches!(self, LiveError::Permission(_))
    }

    /// Returns true if the error only affects one inbound message.
    pub fn is_malformed_message(&self) -> bool {
        matches!(self, LiveError::Json(_) | LiveError::Decode(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_permission_maps_to_permission() {
        let err: LiveError = DeviceError::PermissionDenied("mic".into()).into();
        assert!(err.is_permission_denied());

        let err: LiveError = DeviceError::Closed.into();
        assert!(matches!(err, LiveError::Device(DeviceError::Closed)));
    }

    #[test]
    fn test_malformed_message_errors() {
        let err: LiveError = serde_json::from_str::<serde_json::Value>("{")
            .unwrap_err()
            .into();
        assert!(err.is_malformed_message());
        assert!(LiveError::Decode(PcmError::OddLength(3)).is_malformed_message());
        assert!(!LiveError::SessionClosed.is_malformed_message());
    }
}
