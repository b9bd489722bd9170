//! "Speak now" playback with an offline fallback.

use std::sync::Arc;

use parking_lot::Mutex;
use speakboard_audio::{DeviceError, ScheduledSource, SharedOutput};
use tracing::{debug, warn};

use crate::cache::SpeechAsset;
use crate::offline::OfflineVoice;
use crate::synthesis::SynthesisClient;

/// How an utterance ended up being voiced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Spoken {
    /// Remote speech played through the output device.
    Remote,
    /// The offline voice was used instead.
    Offline,
    /// Nothing could be voiced; logged only.
    Silent,
}

/// Plays one utterance immediately on the shared output device.
///
/// [`speak`](Self::speak) never fails: when synthesis is exhausted or the
/// device refuses the buffer, the offline voice speaks the text instead.
/// Starting a new utterance stops the previous one.
pub struct PlaybackEngine {
    synthesis: Arc<SynthesisClient>,
    output: Arc<SharedOutput>,
    offline: Arc<dyn OfflineVoice>,
    current: Mutex<Option<Box<dyn ScheduledSource>>>,
}

impl PlaybackEngine {
    pub fn new(
        synthesis: Arc<SynthesisClient>,
        output: Arc<SharedOutput>,
        offline: Arc<dyn OfflineVoice>,
    ) -> Self {
        Self {
            synthesis,
            output,
            offline,
            current: Mutex::new(None),
        }
    }

    pub fn synthesis(&self) -> &Arc<SynthesisClient> {
        &self.synthesis
    }

    /// Speaks `text` in `voice`.
    pub async fn speak(&self, text: &str, voice: &str) -> Spoken {
        let asset = match self.synthesis.synthesize(text, voice).await {
            Ok(asset) => asset,
            Err(err) => {
                warn!(voice, text, error = %err, "remote speech unavailable, using offline voice");
                return self.speak_offline(text);
            }
        };

        match self.play(asset) {
            Ok(()) => Spoken::Remote,
            Err(err) => {
                warn!(voice, text, error = %err, "output device refused speech, using offline voice");
                self.speak_offline(text)
            }
        }
    }

    /// Plays an already-decoded asset now.
    pub fn play(&self, asset: SpeechAsset) -> Result<(), DeviceError> {
        let output = self.output.get()?;
        let start_at = output.current_time();
        let duration = asset.duration_secs();

        let mut current = self.current.lock();
        if let Some(previous) = current.take() {
            previous.stop();
        }
        let source = output.schedule(
            asset,
            start_at,
            Box::new(move || debug!(duration, "utterance finished")),
        )?;
        *current = Some(source);
        Ok(())
    }

    fn speak_offline(&self, text: &str) -> Spoken {
        match self.offline.speak(text) {
            Ok(()) => Spoken::Offline,
            Err(err) => {
                warn!(text, error = %err, "offline voice failed");
                Spoken::Silent
            }
        }
    }

    /// Silences the current utterance.
    pub fn stop(&self) {
        if let Some(source) = self.current.lock().take() {
            source.stop();
        }
        if let Err(err) = self.offline.stop() {
            debug!(error = %err, "offline voice stop failed");
        }
    }

    /// Stops playback and releases the output device.
    pub fn shutdown(&self) {
        self.stop();
        self.output.shutdown();
    }
}
