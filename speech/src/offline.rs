//! Local fallback voices used when remote synthesis is exhausted.

use parking_lot::Mutex;
use tracing::info;

use crate::error::OfflineVoiceError;

/// A lower-quality voice that works without the network.
pub trait OfflineVoice: Send + Sync {
    /// Starts speaking `text`, interrupting any current utterance.
    fn speak(&self, text: &str) -> Result<(), OfflineVoiceError>;

    /// Silences the current utterance.
    fn stop(&self) -> Result<(), OfflineVoiceError> {
        Ok(())
    }
}

/// Headless fallback: logs each utterance and keeps a transcript.
#[derive(Default)]
pub struct LoggingVoice {
    spoken: Mutex<Vec<String>>,
}

impl LoggingVoice {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns every utterance spoken so far.
    pub fn spoken(&self) -> Vec<String> {
        self.spoken.lock().clone()
    }
}

impl OfflineVoice for LoggingVoice {
    fn speak(&self, text: &str) -> Result<(), OfflineVoiceError> {
        info!(text, "offline voice");
        self.spoken.lock().push(text.to_string());
        Ok(())
    }
}

#[cfg(feature = "native-tts")]
pub use native::NativeVoice;

#[cfg(feature = "native-tts")]
mod native {
    use std::sync::mpsc;
    use std::thread;

    use parking_lot::Mutex;
    use tracing::{debug, error};

    use super::OfflineVoice;
    use crate::error::OfflineVoiceError;

    enum Command {
        Speak(String),
        Stop,
    }

    /// Platform speech engine (Speech Dispatcher, AVFoundation, SAPI) via
    /// the `tts` crate.
    ///
    /// The engine handle is not guaranteed `Send`, so it lives on its own
    /// thread and receives commands over a channel.
    pub struct NativeVoice {
        tx: Mutex<mpsc::Sender<Command>>,
    }

    impl NativeVoice {
        pub fn new() -> Result<Self, OfflineVoiceError> {
            let (tx, rx) = mpsc::channel::<Command>();
            let (init_tx, init_rx) = mpsc::channel::<Result<(), OfflineVoiceError>>();

            thread::Builder::new()
                .name("speakboard-tts".into())
                .spawn(move || {
                    let mut engine = match tts::Tts::default() {
                        Ok(engine) => engine,
                        Err(e) => {
                            let _ = init_tx.send(Err(OfflineVoiceError::Unavailable(e.to_string())));
                            return;
                        }
                    };
                    if init_tx.send(Ok(())).is_err() {
                        return;
                    }
                    while let Ok(cmd) = rx.recv() {
                        let result = match cmd {
                            Command::Speak(text) => engine.speak(text, true).map(|_| ()),
                            Command::Stop => engine.stop().map(|_| ()),
                        };
                        if let Err(e) = result {
                            error!(error = %e, "native tts command failed");
                        }
                    }
                    debug!("native tts thread exiting");
                })
                .map_err(|e| OfflineVoiceError::Unavailable(e.to_string()))?;

            init_rx
                .recv()
                .map_err(|_| OfflineVoiceError::Unavailable("tts thread died".to_string()))??;

            Ok(Self { tx: Mutex::new(tx) })
        }

        fn send(&self, cmd: Command) -> Result<(), OfflineVoiceError> {
            self.tx
                .lock()
                .send(cmd)
                .map_err(|_| OfflineVoiceError::Failed("tts thread stopped".to_string()))
        }
    }

    impl OfflineVoice for NativeVoice {
        fn speak(&self, text: &str) -> Result<(), OfflineVoiceError> {
            if text.is_empty() {
                return Ok(());
            }
            self.send(Command::Speak(text.to_string()))
        }

        fn stop(&self) -> Result<(), OfflineVoiceError> {
            self.send(Command::Stop)
        }
    }
}
