//! Live voice session.

use clap::Args;
use speakboard_cli::{print_info, print_warning};
use speakboard_live::{
    DEFAULT_LIVE_URL, LiveConfig, LiveDevices, LiveEvent, LiveSession, WebSocketConnector,
};

use super::{get_context, open_camera, open_input, open_output, print_verbose};
use crate::Cli;

/// Start a live voice session and print its events. Ctrl-C ends it.
#[derive(Args)]
pub struct LiveCommand {
    /// Also send a camera frame every second
    #[arg(long)]
    video: bool,

    /// Voice for the assistant
    #[arg(long)]
    voice: Option<String>,
}

impl LiveCommand {
    pub async fn run(&self, cli: &Cli) -> anyhow::Result<()> {
        let ctx = get_context(cli)?;
        let url = if ctx.live_url.is_empty() {
            DEFAULT_LIVE_URL
        } else {
            ctx.live_url.as_str()
        };

        let mut config = LiveConfig::new(url, &ctx.api_key).with_video(self.video);
        if let Some(voice) = ctx.voice_or_default(self.voice.as_deref()) {
            config = config.with_voice(voice);
        }
        print_verbose(cli, &format!("Connecting to {}", config.url));

        let devices = LiveDevices {
            output: open_output()?,
            input: open_input(),
            camera: if self.video { open_camera() } else { None },
        };
        let (session, mut events) = LiveSession::new(config, devices);
        session.start(&WebSocketConnector::new()).await?;
        print_info("Live session open. Press Ctrl-C to stop.");

        loop {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => session.close(),
                event = events.recv() => match event {
                    Some(LiveEvent::StateChanged(state)) => {
                        print_verbose(cli, &format!("State: {:?}", state));
                    }
                    Some(LiveEvent::Notice(message)) => print_warning(&message),
                    Some(LiveEvent::Closed { reason }) => {
                        print_info(&format!("Live session closed: {}", reason));
                        break;
                    }
                    None => break,
                },
            }
        }
        Ok(())
    }
}
