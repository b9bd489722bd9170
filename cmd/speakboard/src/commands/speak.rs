//! Speak a phrase now.

use std::sync::Arc;

use clap::Args;
use serde::Serialize;
use speakboard_audio::SharedOutput;
use speakboard_speech::{PlaybackEngine, Spoken, SynthesisClient};

use super::{
    create_synthesis, get_context, offline_voice, open_output, output_result, plays_on_device,
    print_verbose, resolve_voice, write_wav,
};
use crate::Cli;

/// Speak a phrase through the cached synthesis pipeline.
///
/// Falls back to the offline voice when remote speech is unavailable.
#[derive(Args)]
pub struct SpeakCommand {
    /// Text to speak
    text: String,

    /// Voice to use (default: the context's default_voice)
    #[arg(long)]
    voice: Option<String>,

    /// Also write the synthesized audio to a WAV file
    #[arg(long)]
    wav: Option<String>,
}

#[derive(Serialize)]
struct SpeakResult {
    text: String,
    voice: String,
    spoken: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    duration_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    wav: Option<String>,
}

impl SpeakCommand {
    pub async fn run(&self, cli: &Cli) -> anyhow::Result<()> {
        let ctx = get_context(cli)?;
        let voice = resolve_voice(self.voice.as_deref(), &ctx)?;
        print_verbose(cli, &format!("Using context: {}", ctx.name));
        print_verbose(cli, &format!("Voice: {}", voice));

        let synthesis = create_synthesis(&ctx)?;
        let engine = PlaybackEngine::new(
            Arc::clone(&synthesis),
            Arc::new(SharedOutput::new(open_output)),
            offline_voice(),
        );

        let spoken = engine.speak(&self.text, &voice).await;
        let asset = synthesis
            .cache()
            .get(&SynthesisClient::cache_key(&self.text, &voice));

        if let (Some(path), Some(asset)) = (self.wav.as_deref(), asset.as_ref()) {
            write_wav(path, asset)?;
            print_verbose(cli, &format!("Audio saved to: {}", path));
        }

        if spoken == Spoken::Remote && plays_on_device() {
            if let Some(asset) = asset.as_ref() {
                tokio::time::sleep(asset.duration()).await;
            }
        }
        engine.shutdown();

        let result = SpeakResult {
            text: self.text.clone(),
            voice,
            spoken: match spoken {
                Spoken::Remote => "remote",
                Spoken::Offline => "offline",
                Spoken::Silent => "silent",
            },
            duration_ms: asset.as_ref().map(|a| a.duration().as_millis() as u64),
            wav: self.wav.clone().filter(|_| asset.is_some()),
        };
        output_result(cli, &result)
    }
}
