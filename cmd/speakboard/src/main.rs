//! Speakboard CLI - speak tiles, warm the speech cache and run live sessions.

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

use commands::{ConfigCommand, LiveCommand, PreloadCommand, SpeakCommand};

/// Speakboard CLI - a command line front-end for the speakboard speech core.
///
/// This tool lets you:
///   - Speak a phrase through the cached synthesis pipeline
///   - Preload a whole vocabulary into the speech cache
///   - Hold a live voice conversation
///
/// Configuration is stored in ~/.speakboard/speakboard/ and supports multiple
/// contexts, similar to kubectl's context management.
#[derive(Parser)]
#[command(name = "speakboard")]
#[command(about = "Speakboard speech CLI tool")]
#[command(version)]
pub struct Cli {
    /// Config file (default is ~/.speakboard/speakboard/config.yaml)
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// Context name to use
    #[arg(short = 'c', long, global = true)]
    pub context: Option<String>,

    /// Output file (default: stdout)
    #[arg(short = 'o', long, global = true)]
    pub output: Option<String>,

    /// Output as JSON (for piping)
    #[arg(long, global = true)]
    pub json: bool,

    /// Verbose output
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Manage CLI configuration
    Config(ConfigCommand),
    /// Speak a phrase now
    Speak(SpeakCommand),
    /// Warm the speech cache for a vocabulary file
    Preload(PreloadCommand),
    /// Start a live voice session
    Live(LiveCommand),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match &cli.command {
        Commands::Config(cmd) => cmd.run(&cli).await,
        Commands::Speak(cmd) => cmd.run(&cli).await,
        Commands::Preload(cmd) => cmd.run(&cli).await,
        Commands::Live(cmd) => cmd.run(&cli).await,
    }
}
