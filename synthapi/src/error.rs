//! Error types for the synthesis service client.

use thiserror::Error;

/// Result type alias for synthesis service operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for synthesis service operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Non-success HTTP status returned by the service.
    #[error("synthapi: {message} (http={http_status})")]
    Api { http_status: u16, message: String },

    /// HTTP transport error.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Response body was not the expected JSON.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid configuration.
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl Error {
    /// Creates a new API error.
    pub fn api(http_status: u16, message: impl Into<String>) -> Self {
        Error::Api {
            http_status,
            message: message.into(),
        }
    }

    /// Returns the HTTP status for API errors.
    pub fn http_status(&self) -> Option<u16> {
        match self {
            Error::Api { http_status, .. } => Some(*http_status),
            Error::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Returns true if this is a rate limit error.
    pub fn is_rate_limit(&self) -> bool {
        self.http_status() == Some(429)
    }

    /// Returns true if this is an invalid API key error.
    pub fn is_invalid_api_key(&self) -> bool {
        matches!(self.http_status(), Some(401) | Some(403))
    }

    /// Returns true if this is a server-side error.
    pub fn is_server_error(&self) -> bool {
        self.http_status().is_some_and(|s| s >= 500)
    }

    /// Returns true if the request can be retried.
    ///
    /// Transport failures and malformed bodies count as transient.
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Http(_) | Error::Json(_) => true,
            Error::Api { .. } => self.is_rate_limit() || self.is_server_error(),
            Error::Config(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_statuses() {
        assert!(Error::api(429, "slow down").is_retryable());
        assert!(Error::api(500, "boom").is_retryable());
        assert!(Error::api(503, "unavailable").is_retryable());
        assert!(!Error::api(400, "bad request").is_retryable());
        assert!(!Error::api(401, "no key").is_retryable());
        assert!(!Error::Config("empty key".into()).is_retryable());
    }

    #[test]
    fn test_malformed_body_is_retryable() {
        let err: Error = serde_json::from_str::<serde_json::Value>("{")
            .unwrap_err()
            .into();
        assert!(err.is_retryable());
    }

    #[test]
    fn test_classification() {
        let err = Error::api(401, "unauthorized");
        assert!(err.is_invalid_api_key());
        assert!(!err.is_server_error());
        assert_eq!(err.to_string(), "synthapi: unauthorized (http=401)");
    }
}
