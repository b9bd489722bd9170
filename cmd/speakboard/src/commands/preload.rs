//! Warm the speech cache for a vocabulary.

use std::path::PathBuf;

use clap::Args;
use speakboard_cli::print_warning;
use speakboard_speech::{BulkPreloader, PreloadConfig, load_vocabulary};

use super::{create_synthesis, get_context, output_result, print_verbose, resolve_voice};
use crate::Cli;

/// Synthesize every speakable tile of a vocabulary file.
///
/// The file maps category names to tile lists:
/// `{"food": [{"id": "apple", "label": "Apple", "textToSpeak": "I want an apple"}]}`
#[derive(Args)]
pub struct PreloadCommand {
    /// Vocabulary JSON file
    vocabulary: PathBuf,

    /// Voice to use (default: the context's default_voice)
    #[arg(long)]
    voice: Option<String>,

    /// Requests in flight per batch
    #[arg(long)]
    batch_size: Option<usize>,
}

impl PreloadCommand {
    pub async fn run(&self, cli: &Cli) -> anyhow::Result<()> {
        let ctx = get_context(cli)?;
        let voice = resolve_voice(self.voice.as_deref(), &ctx)?;
        let vocabulary = load_vocabulary(&self.vocabulary)?;
        print_verbose(
            cli,
            &format!("Loaded {} categories from {}", vocabulary.len(), self.vocabulary.display()),
        );

        let mut config = PreloadConfig::default();
        if let Some(size) = self.batch_size {
            config = config.with_batch_size(size);
        }
        let preloader = BulkPreloader::new(create_synthesis(&ctx)?).with_config(config);

        let report = preloader
            .preload(&vocabulary, &voice, |completed, total| {
                eprintln!("[{}/{}] preloading", completed, total);
            })
            .await;

        if !report.failed.is_empty() {
            print_warning(&format!("{} phrases could not be synthesized", report.failed.len()));
        }
        output_result(cli, &report)
    }
}
