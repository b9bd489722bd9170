//! Transport seam and the WebSocket implementation.

use std::sync::Arc;

use async_trait::async_trait;
use futures::SinkExt;
use futures::stream::StreamExt;
use http::HeaderValue;
use serde_json::json;
use speakboard_audio::Format;
use tokio::sync::{Mutex, mpsc};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{debug, error, info};

use crate::config::LiveConfig;
use crate::error::{LiveError, Result};
use crate::types::{InboundMessage, OutboundFrame};

/// An established bidirectional stream.
#[async_trait]
pub trait LiveTransport: Send + Sync {
    /// Queues a frame without waiting on the network.
    fn send(&self, frame: OutboundFrame) -> Result<()>;

    /// Returns the next inbound message, or `None` once the stream ended.
    async fn recv(&self) -> Option<Result<InboundMessage>>;

    /// Closes the stream.
    async fn close(&self) -> Result<()>;
}

/// Opens [`LiveTransport`]s.
#[async_trait]
pub trait LiveConnector: Send + Sync {
    async fn connect(&self, config: &LiveConfig) -> Result<Arc<dyn LiveTransport>>;
}

type WsStream = WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>;

/// Connects over WebSocket and sends a setup message first.
#[derive(Debug, Default, Clone, Copy)]
pub struct WebSocketConnector;

impl WebSocketConnector {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl LiveConnector for WebSocketConnector {
    async fn connect(&self, config: &LiveConfig) -> Result<Arc<dyn LiveTransport>> {
        let transport = WebSocketTransport::connect(config).await?;
        Ok(Arc::new(transport))
    }
}

/// WebSocket-based live transport.
pub struct WebSocketTransport {
    write_tx: mpsc::UnboundedSender<Message>,
    inbound_rx: Mutex<mpsc::UnboundedReceiver<Result<InboundMessage>>>,
    _read_handle: tokio::task::JoinHandle<()>,
    _write_handle: tokio::task::JoinHandle<()>,
}

impl WebSocketTransport {
    /// Connects to `config.url`.
    pub async fn connect(config: &LiveConfig) -> Result<Self> {
        let url = url::Url::parse(&config.url)
            .map_err(|e| LiveError::InvalidConfig(format!("invalid url {}: {}", config.url, e)))?;
        if !matches!(url.scheme(), "ws" | "wss") {
            return Err(LiveError::InvalidConfig(format!(
                "unsupported scheme: {}",
                url.scheme()
            )));
        }
        debug!(url = %url, "connecting live session");

        let mut request = url
            .as_str()
            .into_client_request()
            .map_err(|e| LiveError::Connection(format!("failed to build request: {}", e)))?;
        if !config.api_key.is_empty() {
            let auth = HeaderValue::from_str(&format!("Bearer {}", config.api_key))
                .map_err(|e| LiveError::InvalidConfig(format!("invalid api key: {}", e)))?;
            request.headers_mut().insert(http::header::AUTHORIZATION, auth);
        }

        let (ws_stream, _response) = connect_async(request)
            .await
            .map_err(|e| LiveError::Connection(format!("failed to connect: {}", e)))?;
        info!(url = %url, "live session connected");

        let (write, read) = ws_stream.split();

        let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();
        let (write_tx, write_rx) = mpsc::unbounded_channel();

        let write_handle = tokio::spawn(write_loop(write, write_rx));
        let read_handle = tokio::spawn(read_loop(read, inbound_tx, config.output_format));

        let setup = setup_message(config);
        write_tx
            .send(Message::Text(setup.to_string().into()))
            .map_err(|_| LiveError::SessionClosed)?;

        Ok(Self {
            write_tx,
            inbound_rx: Mutex::new(inbound_rx),
            _read_handle: read_handle,
            _write_handle: write_handle,
        })
    }
}

#[async_trait]
impl LiveTransport for WebSocketTransport {
    fn send(&self, frame: OutboundFrame) -> Result<()> {
        let text = frame.to_json()?;
        self.write_tx
            .send(Message::Text(text.into()))
            .map_err(|_| LiveError::SessionClosed)
    }

    async fn recv(&self) -> Option<Result<InboundMessage>> {
        self.inbound_rx.lock().await.recv().await
    }

    async fn close(&self) -> Result<()> {
        let _ = self.write_tx.send(Message::Close(None));
        Ok(())
    }
}

fn setup_message(config: &LiveConfig) -> serde_json::Value {
    let mut setup = json!({
        "inputAudio": {
            "sampleRate": config.input_format.sample_rate,
            "channels": config.input_format.channels,
        },
        "outputAudio": {
            "sampleRate": config.output_format.sample_rate,
            "channels": config.output_format.channels,
        },
        "video": config.video_enabled,
    });
    if let Some(ref voice) = config.voice {
        setup["voice"] = json!(voice);
    }
    json!({ "setup": setup })
}

async fn write_loop(
    mut write: futures::stream::SplitSink<WsStream, Message>,
    mut rx: mpsc::UnboundedReceiver<Message>,
) {
    while let Some(msg) = rx.recv().await {
        if let Message::Close(_) = msg {
            let _ = write.close().await;
            break;
        }
        if let Err(e) = write.send(msg).await {
            error!("live write error: {}", e);
            break;
        }
    }
}

async fn read_loop(
    mut read: futures::stream::SplitStream<WsStream>,
    tx: mpsc::UnboundedSender<Result<InboundMessage>>,
    default_format: Format,
) {
    while let Some(result) = read.next().await {
        let text = match result {
            Ok(Message::Text(text)) => text.as_str().to_string(),
            Ok(Message::Binary(data)) => match String::from_utf8(data.to_vec()) {
                Ok(text) => text,
                Err(_) => {
                    debug!(len = data.len(), "ignoring non-utf8 binary message");
                    continue;
                }
            },
            Ok(Message::Close(_)) => {
                debug!("live session closed by server");
                break;
            }
            Ok(_) => continue,
            Err(e) => {
                error!("live read error: {}", e);
                let _ = tx.send(Err(LiveError::WebSocket(e)));
                break;
            }
        };

        debug!("received: {}", truncate_for_log(&text, 200));
        if tx.send(InboundMessage::parse(&text, default_format)).is_err() {
            break;
        }
    }
}

fn truncate_for_log(s: &str, max_len: usize) -> &str {
    if s.len() <= max_len {
        return s;
    }
    let mut end = max_len;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_setup_message() {
        let config = LiveConfig::new("wss://example.test/live", "key").with_voice("Puck");
        let setup = setup_message(&config);
        assert_eq!(setup["setup"]["voice"], "Puck");
        assert_eq!(setup["setup"]["inputAudio"]["sampleRate"], 16000);
        assert_eq!(setup["setup"]["outputAudio"]["sampleRate"], 24000);
        assert_eq!(setup["setup"]["video"], false);
    }

    #[test]
    fn test_setup_without_voice() {
        let setup = setup_message(&LiveConfig::default());
        assert!(setup["setup"].get("voice").is_none());
    }

    #[test]
    fn test_truncate_for_log() {
        assert_eq!(truncate_for_log("hello", 10), "hello");
        assert_eq!(truncate_for_log("hello", 3), "hel");
        assert_eq!(truncate_for_log("héllo", 2), "h");
    }

    #[tokio::test]
    async fn test_rejects_non_websocket_url() {
        let config = LiveConfig::new("https://example.test/live", "key");
        let err = WebSocketTransport::connect(&config).await.err().unwrap();
        assert!(matches!(err, LiveError::InvalidConfig(_)));
    }
}
