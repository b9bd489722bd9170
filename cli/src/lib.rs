//! Shared command-line plumbing for speakboard tools.
//!
//! Context configuration lives in `config`, result printing in `output`.

pub mod config;
pub mod output;

pub use config::{Config, Context, load_config, mask_api_key};
pub use output::{Output, OutputFormat, print_info, print_success, print_warning};
