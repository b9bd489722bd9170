//! Live session configuration.

use std::time::Duration;

use speakboard_audio::Format;

/// Default live service endpoint.
pub const DEFAULT_LIVE_URL: &str = "wss://api.speakboard.app/v1/live";

/// Configuration for one live session.
#[derive(Debug, Clone)]
pub struct LiveConfig {
    pub url: String,
    pub api_key: String,
    pub voice: Option<String>,
    /// Microphone format sent upstream.
    pub input_format: Format,
    /// Format assumed for inbound audio that does not state one.
    pub output_format: Format,
    /// Samples per outbound microphone frame.
    pub frame_samples: usize,
    pub video_enabled: bool,
    pub video_interval: Duration,
    /// JPEG quality, 1-100.
    pub jpeg_quality: u8,
}

impl Default for LiveConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_LIVE_URL.to_string(),
            api_key: String::new(),
            voice: None,
            input_format: Format::MONO_16K,
            output_format: Format::MONO_24K,
            frame_samples: 4096,
            video_enabled: false,
            video_interval: Duration::from_secs(1),
            jpeg_quality: 80,
        }
    }
}

impl LiveConfig {
    pub fn new(url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            api_key: api_key.into(),
            ..Default::default()
        }
    }

    pub fn with_voice(mut self, voice: impl Into<String>) -> Self {
        self.voice = Some(voice.into());
        self
    }

    pub fn with_video(mut self, enabled: bool) -> Self {
        self.video_enabled = enabled;
        self
    }

    pub fn with_video_interval(mut self, interval: Duration) -> Self {
        self.video_interval = interval;
        self
    }

    pub fn with_frame_samples(mut self, samples: usize) -> Self {
        self.frame_samples = samples.max(1);
        self
    }

    pub fn with_jpeg_quality(mut self, quality: u8) -> Self {
        self.jpeg_quality = quality.clamp(1, 100);
        self
    }
}
