//! Speech synthesis service.

use std::sync::Arc;

use super::{
    error::Result,
    http::HttpClient,
    types::{SynthesisRequest, SynthesisResponse},
};

/// Path of the one-shot synthesis endpoint.
pub const SYNTHESIZE_PATH: &str = "/v1/speech:synthesize";

/// Speech synthesis service.
pub struct SpeechService {
    http: Arc<HttpClient>,
}

impl SpeechService {
    pub(crate) fn new(http: Arc<HttpClient>) -> Self {
        Self { http }
    }

    /// Performs one synthesis call.
    ///
    /// A refusal is still `Ok`; inspect [`SynthesisResponse::outcome`].
    ///
    /// # Example
    ///
    /// ```rust,no_run
    /// # async fn run() -> speakboard_synthapi::Result<()> {
    /// use speakboard_synthapi::{Client, Outcome, SynthesisRequest};
    ///
    /// let client = Client::new("your-api-key")?;
    /// let request = SynthesisRequest::new("Hello", "Kore");
    /// let response = client.speech().synthesize(&request).await?;
    ///
    /// if let Outcome::Audio { pcm_base64, format } = response.outcome() {
    ///     println!("{} bytes of base64 at {}Hz", pcm_base64.len(), format.sample_rate);
    /// }
    /// # Ok(())
    /// # }
    /// ```
    pub async fn synthesize(&self, request: &SynthesisRequest) -> Result<SynthesisResponse> {
        self.http.post(SYNTHESIZE_PATH, request).await
    }
}
