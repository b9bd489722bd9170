//! Utility functions for CLI commands.

use std::path::Path;
use std::sync::Arc;

use speakboard_audio::pcm::f32_to_i16;
use speakboard_audio::{AudioInput, AudioOutput, DeviceError, PcmBuffer, VideoInput};
use speakboard_cli::{Config, Context, Output, OutputFormat, load_config};
use speakboard_speech::{OfflineVoice, RemoteBackend, SynthesisClient, SynthesisConfig};
use speakboard_synthapi::Client;

use crate::Cli;

const APP_NAME: &str = "speakboard";

/// Gets the global configuration.
pub fn get_config(cli: &Cli) -> anyhow::Result<Config> {
    load_config(APP_NAME, cli.config.as_deref())
}

/// Gets the context configuration to use.
pub fn get_context(cli: &Cli) -> anyhow::Result<Context> {
    let cfg = get_config(cli)?;
    match (cfg.resolve_context(cli.context.as_deref()), cli.context.as_deref()) {
        (Some(ctx), _) => Ok(ctx.clone()),
        (None, Some(name)) => anyhow::bail!("context '{}' not found", name),
        (None, None) => anyhow::bail!(
            "no context specified. Use -c flag or set a default context with 'speakboard config use-context'"
        ),
    }
}

/// Picks the voice from the flag or the context default.
pub fn resolve_voice(flag: Option<&str>, ctx: &Context) -> anyhow::Result<String> {
    ctx.voice_or_default(flag)
        .map(str::to_string)
        .ok_or_else(|| {
            anyhow::anyhow!("no voice specified. Use --voice or set default_voice on the context")
        })
}

/// Creates a synthesis service client from context configuration.
pub fn create_client(ctx: &Context) -> anyhow::Result<Client> {
    let mut builder = Client::builder(&ctx.api_key);
    if !ctx.base_url.is_empty() {
        builder = builder.base_url(&ctx.base_url);
    }
    if let Some(timeout) = ctx.timeout() {
        builder = builder.timeout(timeout);
    }
    Ok(builder.build()?)
}

/// Creates the cached synthesis pipeline for a context.
pub fn create_synthesis(ctx: &Context) -> anyhow::Result<Arc<SynthesisClient>> {
    let backend = Arc::new(RemoteBackend::new(create_client(ctx)?));
    let mut config = SynthesisConfig::default();
    if let Some(attempts) = ctx.max_attempts() {
        config = config.with_max_attempts(attempts);
    }
    Ok(Arc::new(SynthesisClient::new(backend).with_config(config)))
}

/// Opens the output device playback goes to.
#[cfg(feature = "device")]
pub fn open_output() -> Result<Arc<dyn AudioOutput>, DeviceError> {
    Ok(Arc::new(speakboard_audio::device::RodioOutput::open()?))
}

/// Opens the output device playback goes to.
#[cfg(not(feature = "device"))]
pub fn open_output() -> Result<Arc<dyn AudioOutput>, DeviceError> {
    Ok(Arc::new(speakboard_audio::device::VirtualOutput::new()))
}

/// Returns the microphone provider.
#[cfg(feature = "device")]
pub fn open_input() -> Arc<dyn AudioInput> {
    Arc::new(speakboard_audio::device::CpalInput::new())
}

/// Returns the microphone provider.
#[cfg(not(feature = "device"))]
pub fn open_input() -> Arc<dyn AudioInput> {
    Arc::new(speakboard_audio::device::VirtualInput::new())
}

/// Returns the camera provider, if this build has one.
#[cfg(feature = "device")]
pub fn open_camera() -> Option<Arc<dyn VideoInput>> {
    None
}

/// Returns the camera provider, if this build has one.
#[cfg(not(feature = "device"))]
pub fn open_camera() -> Option<Arc<dyn VideoInput>> {
    Some(Arc::new(speakboard_audio::device::VirtualCamera::new(320, 240)))
}

/// Returns the voice used when remote speech is unavailable.
#[cfg(feature = "native-tts")]
pub fn offline_voice() -> Arc<dyn OfflineVoice> {
    match speakboard_speech::NativeVoice::new() {
        Ok(voice) => Arc::new(voice),
        Err(err) => {
            tracing::warn!(error = %err, "platform speech engine unavailable, logging instead");
            Arc::new(speakboard_speech::LoggingVoice::new())
        }
    }
}

/// Returns the voice used when remote speech is unavailable.
#[cfg(not(feature = "native-tts"))]
pub fn offline_voice() -> Arc<dyn OfflineVoice> {
    Arc::new(speakboard_speech::LoggingVoice::new())
}

/// Returns true when playback goes to a real device and should be waited on.
pub fn plays_on_device() -> bool {
    cfg!(feature = "device")
}

/// Writes a decoded asset as 16-bit WAV.
pub fn write_wav(path: impl AsRef<Path>, buffer: &PcmBuffer) -> anyhow::Result<()> {
    let format = buffer.format();
    let spec = hound::WavSpec {
        channels: format.channels,
        sample_rate: format.sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec)?;
    for &sample in buffer.samples() {
        writer.write_sample(f32_to_i16(sample))?;
    }
    writer.finalize()?;
    Ok(())
}

/// Outputs result as JSON or YAML.
pub fn output_result<T: serde::Serialize>(cli: &Cli, result: &T) -> anyhow::Result<()> {
    Output::new(OutputFormat::from_json_flag(cli.json), cli.output.clone()).write(result)
}

/// Prints verbose output if enabled.
pub fn print_verbose(cli: &Cli, msg: &str) {
    if cli.verbose {
        eprintln!("[verbose] {}", msg);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use speakboard_audio::Format;

    #[test]
    fn test_write_wav() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hello.wav");
        let buffer = PcmBuffer::new(Format::MONO_24K, vec![0.0, 0.5, -0.5, 1.0]);

        write_wav(&path, &buffer).unwrap();

        let reader = hound::WavReader::open(&path).unwrap();
        assert_eq!(reader.spec().sample_rate, 24000);
        assert_eq!(reader.spec().channels, 1);
        let samples: Vec<i16> = reader.into_samples().map(|s| s.unwrap()).collect();
        assert_eq!(samples.len(), 4);
        assert_eq!(samples[0], 0);
        assert_eq!(samples[3], i16::MAX);
    }

    #[test]
    fn test_resolve_voice() {
        let ctx = Context {
            default_voice: "Kore".into(),
            ..Default::default()
        };
        assert_eq!(resolve_voice(Some("Puck"), &ctx).unwrap(), "Puck");
        assert_eq!(resolve_voice(None, &ctx).unwrap(), "Kore");
        assert!(resolve_voice(None, &Context::default()).is_err());
    }

    #[test]
    fn test_create_synthesis_applies_attempts() {
        let ctx = Context {
            api_key: "key".into(),
            max_retries: 5,
            ..Default::default()
        };
        let synthesis = create_synthesis(&ctx).unwrap();
        assert_eq!(synthesis.config().max_attempts, 5);
    }
}
