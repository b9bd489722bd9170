//! Client for the one-shot remote speech synthesis service.
//!
//! `POST /v1/speech:synthesize` with `{text, voice}` answers either with
//! base64 16-bit PCM or, when the service declines, with a text payload and
//! a completion reason. This crate makes exactly one attempt per call.

mod client;
mod error;
pub mod http;
mod speech;
mod types;

pub use client::{Client, ClientBuilder, DEFAULT_BASE_URL, DEFAULT_TIMEOUT};
pub use error::{Error, Result};
pub use speech::{SYNTHESIZE_PATH, SpeechService};
pub use types::{
    DEFAULT_CHANNELS, DEFAULT_SAMPLE_RATE, Outcome, SynthesisRequest, SynthesisResponse,
};
