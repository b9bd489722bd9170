//! CLI commands module.

mod config;
mod live;
mod preload;
mod speak;
mod util;

pub use config::ConfigCommand;
pub use live::LiveCommand;
pub use preload::PreloadCommand;
pub use speak::SpeakCommand;

pub(crate) use util::*;
