//! HTTP client implementation for the synthesis service.

use std::time::Duration;

use reqwest::{
    Client as ReqwestClient, Response,
    header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue, USER_AGENT},
};
use serde::{Serialize, de::DeserializeOwned};
use tracing::debug;

use super::{
    error::{Error, Result},
    types::ErrorBody,
};

const USER_AGENT_VALUE: &str = "speakboard-synthapi-rust/0.1";

/// HTTP client for the synthesis service.
///
/// Every call is a single attempt; retries belong to the caller.
pub struct HttpClient {
    client: ReqwestClient,
    base_url: String,
    headers: HeaderMap,
}

impl HttpClient {
    /// Creates a new HTTP client.
    pub fn new(base_url: String, api_key: &str, timeout: Duration) -> Result<Self> {
        let client = ReqwestClient::builder().timeout(timeout).build()?;

        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", api_key))
                .map_err(|e| Error::Config(format!("invalid api key: {e}")))?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_VALUE));

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            headers,
        })
    }

    /// Returns the base URL without a trailing slash.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Sends a JSON POST and decodes the JSON response.
    pub async fn post<T, R>(&self, path: &str, body: &T) -> Result<R>
    where
        T: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url, path);
        debug!(%url, "synthapi request");

        let response = self
            .client
            .post(&url)
            .headers(self.headers.clone())
            .json(body)
            .send()
            .await?;

        self.handle_response(response).await
    }

    /// Handles the API response.
    async fn handle_response<R>(&self, response: Response) -> Result<R>
    where
        R: DeserializeOwned,
    {
        let status = response.status();
        let body = response.bytes().await?;

        if !status.is_success() {
            return Err(parse_error(&body, status.as_u16()));
        }

        serde_json::from_slice(&body).map_err(Error::from)
    }
}

/// Parses an error response body.
fn parse_error(body: &[u8], http_status: u16) -> Error {
    let message = serde_json::from_slice::<ErrorBody>(body)
        .ok()
        .and_then(ErrorBody::into_message)
        .unwrap_or_else(|| String::from_utf8_lossy(body).trim().to_string());

    Error::api(http_status, message)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_json() {
        let err = parse_error(br#"{"error":{"message":"overloaded"}}"#, 503);
        match err {
            Error::Api {
                http_status,
                message,
            } => {
                assert_eq!(http_status, 503);
                assert_eq!(message, "overloaded");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_parse_error_plain_text() {
        let err = parse_error(b"Bad Gateway\n", 502);
        assert_eq!(err.to_string(), "synthapi: Bad Gateway (http=502)");
        assert!(err.is_retryable());
    }

    #[test]
    fn test_base_url_trailing_slash() {
        let http =
            HttpClient::new("http://localhost:9/".to_string(), "k", Duration::from_secs(1))
                .unwrap();
        assert_eq!(http.base_url(), "http://localhost:9");
    }
}
