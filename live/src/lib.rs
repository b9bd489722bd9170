//! Live conversational sessions for speakboard.
//!
//! A live session streams microphone audio (and optionally camera frames) to
//! a remote service and plays the audio it answers with. Inbound chunks are
//! scheduled back to back on the output device clock so playback has no gaps,
//! and a barge-in from the service flushes whatever is still queued.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use speakboard_audio::device::{VirtualInput, VirtualOutput};
//! use speakboard_live::{LiveConfig, LiveDevices, LiveEvent, LiveSession, WebSocketConnector};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = LiveConfig::new("wss://api.speakboard.app/v1/live", "your-api-key");
//!     let devices = LiveDevices {
//!         output: Arc::new(VirtualOutput::new()),
//!         input: Arc::new(VirtualInput::new()),
//!         camera: None,
//!     };
//!
//!     let (session, mut events) = LiveSession::new(config, devices);
//!     session.start(&WebSocketConnector::new()).await?;
//!
//!     while let Some(event) = events.recv().await {
//!         if let LiveEvent::Closed { reason } = event {
//!             println!("closed: {}", reason);
//!             break;
//!         }
//!     }
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod cursor;
pub mod error;
pub mod session;
pub mod transport;
pub mod types;
pub mod video;

pub use config::{DEFAULT_LIVE_URL, LiveConfig};
pub use cursor::PlaybackCursor;
pub use error::{LiveError, Result};
pub use session::{LiveDevices, LiveSession};
pub use transport::{LiveConnector, LiveTransport, WebSocketConnector, WebSocketTransport};
pub use types::{InboundMessage, LiveEvent, LiveState, MIME_JPEG, OutboundFrame};
pub use video::encode_jpeg;
