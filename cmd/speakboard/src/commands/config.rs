//! Configuration management commands.

use clap::{Args, Subcommand};

use speakboard_cli::{Context as CliContext, mask_api_key, print_success};

use super::get_config;
use crate::Cli;

/// Manage CLI configuration.
///
/// Contexts allow you to manage multiple service configurations,
/// similar to kubectl's context management.
///
/// Configuration is stored in ~/.speakboard/speakboard/config.yaml
#[derive(Args)]
pub struct ConfigCommand {
    #[command(subcommand)]
    command: ConfigSubcommand,
}

#[derive(Subcommand)]
enum ConfigSubcommand {
    /// Add a new context
    #[command(name = "add-context")]
    AddContext {
        /// Context name
        name: String,
        /// API key (required)
        #[arg(long)]
        api_key: String,
        /// Synthesis service base URL
        #[arg(long)]
        base_url: Option<String>,
        /// Live session WebSocket URL
        #[arg(long)]
        live_url: Option<String>,
        /// Request timeout in seconds
        #[arg(long)]
        timeout: Option<u64>,
        /// Synthesis attempts per phrase
        #[arg(long)]
        max_retries: Option<u64>,
        /// Default voice
        #[arg(long)]
        default_voice: Option<String>,
    },
    /// Delete a context
    #[command(name = "delete-context")]
    DeleteContext {
        /// Context name
        name: String,
    },
    /// Set the current context
    #[command(name = "use-context")]
    UseContext {
        /// Context name
        name: String,
    },
    /// Display the current context
    #[command(name = "get-context")]
    GetContext,
    /// List all contexts
    #[command(name = "list-contexts", alias = "get-contexts")]
    ListContexts,
    /// View the current configuration
    View,
}

impl ConfigCommand {
    pub async fn run(&self, cli: &Cli) -> anyhow::Result<()> {
        match &self.command {
            ConfigSubcommand::AddContext {
                name,
                api_key,
                base_url,
                live_url,
                timeout,
                max_retries,
                default_voice,
            } => {
                let ctx = CliContext {
                    api_key: api_key.clone(),
                    default_voice: default_voice.clone().unwrap_or_default(),
                    base_url: base_url.clone().unwrap_or_default(),
                    live_url: live_url.clone().unwrap_or_default(),
                    timeout: timeout.unwrap_or_default(),
                    max_retries: max_retries.unwrap_or_default(),
                    ..Default::default()
                };
                let mut cfg = get_config(cli)?;
                let becomes_current = cfg.current_context.is_empty();
                cfg.add_context(name, ctx)?;
                if becomes_current {
                    print_success(&format!("Added \"{}\" and made it the current context", name));
                } else {
                    print_success(&format!("Added context \"{}\"", name));
                }
                Ok(())
            }

            ConfigSubcommand::DeleteContext { name } => {
                let mut cfg = get_config(cli)?;
                cfg.delete_context(name)?;
                print_success(&format!("Context \"{}\" deleted", name));
                Ok(())
            }

            ConfigSubcommand::UseContext { name } => {
                let mut cfg = get_config(cli)?;
                cfg.use_context(name)?;
                print_success(&format!("Switched to context \"{}\"", name));
                Ok(())
            }

            ConfigSubcommand::GetContext => {
                let cfg = get_config(cli)?;
                if cfg.current_context.is_empty() {
                    println!("No current context set");
                } else {
                    println!("{}", cfg.current_context);
                }
                Ok(())
            }

            ConfigSubcommand::ListContexts => {
                let cfg = get_config(cli)?;
                if cfg.contexts.is_empty() {
                    println!("No contexts configured");
                    return Ok(());
                }
                println!("{:<2} {:<20} {:<12} {}", "", "NAME", "VOICE", "ENDPOINTS");
                for name in cfg.list_contexts() {
                    if let Some(ctx) = cfg.get_context(name) {
                        let marker = if name == cfg.current_context { "*" } else { "" };
                        let voice = or_dash(&ctx.default_voice);
                        println!("{:<2} {:<20} {:<12} {}", marker, name, voice, endpoints(ctx));
                    }
                }
                Ok(())
            }

            ConfigSubcommand::View => {
                let cfg = get_config(cli)?;
                println!("# {}", cfg.path().display());
                println!("current: {}", or_dash(&cfg.current_context));
                for name in cfg.list_contexts() {
                    if let Some(ctx) = cfg.get_context(name) {
                        print_context(name, ctx);
                    }
                }
                Ok(())
            }
        }
    }
}

fn or_dash(value: &str) -> &str {
    if value.is_empty() { "-" } else { value }
}

/// Summarizes which synthesis and live endpoints a context talks to.
fn endpoints(ctx: &CliContext) -> String {
    let speech = if ctx.base_url.is_empty() { "default" } else { &ctx.base_url };
    let live = if ctx.live_url.is_empty() { "default" } else { &ctx.live_url };
    format!("speech={} live={}", speech, live)
}

fn print_context(name: &str, ctx: &CliContext) {
    println!();
    println!("[{}]", name);
    println!("  api_key       {}", mask_api_key(&ctx.api_key));
    println!("  default_voice {}", or_dash(&ctx.default_voice));
    println!("  endpoints     {}", endpoints(ctx));
    match ctx.timeout() {
        Some(timeout) => println!("  timeout       {}s", timeout.as_secs()),
        None => println!("  timeout       -"),
    }
    match ctx.max_attempts() {
        Some(attempts) => println!("  attempts      {}", attempts),
        None => println!("  attempts      -"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoints_summary() {
        let ctx = CliContext {
            live_url: "wss://live.example/v1".into(),
            ..Default::default()
        };
        assert_eq!(endpoints(&ctx), "speech=default live=wss://live.example/v1");
    }

    #[test]
    fn test_or_dash() {
        assert_eq!(or_dash(""), "-");
        assert_eq!(or_dash("Kore"), "Kore");
    }
}
