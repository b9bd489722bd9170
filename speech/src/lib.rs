//! Speech core for a tile-based speaking board.
//!
//! This crate provides:
//! - [`normalize`]: cache-key and request canonicalization
//! - [`SpeechCache`]: unbounded session cache keyed by voice and text
//! - [`SynthesisClient`]: cached remote synthesis with retry, backoff and
//!   punctuation fallback over a [`SpeechBackend`]
//! - [`PlaybackEngine`]: immediate playback with an [`OfflineVoice`] fallback
//! - [`BulkPreloader`]: batched cache warm-up for a whole [`Vocabulary`]
//!
//! # Example
//!
//! ```rust,ignore
//! use speakboard_speech::{RemoteBackend, SynthesisClient};
//! use speakboard_synthapi::Client;
//!
//! let backend = RemoteBackend::new(Client::new("your-api-key")?);
//! let synthesis = SynthesisClient::new(Arc::new(backend));
//!
//! let speech = synthesis.synthesize("HELLO", "Kore").await?;
//! assert!(synthesis.is_cached("Hello", "Kore"));
//! ```

mod backend;
mod cache;
mod error;
mod normalizer;
mod offline;
mod playback;
mod preload;
mod synthesis;
mod vocabulary;

pub use backend::*;
pub use cache::*;
pub use error::*;
pub use normalizer::*;
pub use offline::*;
pub use playback::*;
pub use preload::*;
pub use synthesis::*;
pub use vocabulary::*;
