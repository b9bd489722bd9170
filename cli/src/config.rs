//! Context configuration for the speakboard command line.
//!
//! Configuration is stored in ~/.speakboard/{app_name}/config.yaml and holds
//! any number of named contexts, one of which is current.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default base configuration directory name.
pub const DEFAULT_BASE_DIR: &str = ".speakboard";
/// Default configuration filename.
pub const DEFAULT_CONFIG_FILE: &str = "config.yaml";

/// CLI configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Application name (not serialized).
    #[serde(skip)]
    pub app_name: String,

    /// Name of the currently active context.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub current_context: String,

    /// Map of context name to context configuration.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub contexts: HashMap<String, Context>,

    /// Path to the config file (not serialized).
    #[serde(skip)]
    config_path: PathBuf,
}

/// One set of service credentials and defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Context {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub api_key: String,

    /// Synthesis service base URL (default if empty).
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub base_url: String,

    /// Live session WebSocket URL (default if empty).
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub live_url: String,

    /// Request timeout in seconds.
    #[serde(default, skip_serializing_if = "is_zero")]
    pub timeout: u64,

    /// Synthesis attempts per text.
    #[serde(default, skip_serializing_if = "is_zero")]
    pub max_retries: u64,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub default_voice: String,

    /// Application-specific settings.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub extra: HashMap<String, String>,
}

fn is_zero(n: &u64) -> bool {
    *n == 0
}

impl Config {
    /// Gets the default config directory.
    pub fn default_config_dir(app_name: &str) -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(DEFAULT_BASE_DIR).join(app_name))
    }

    /// Gets the default config file path.
    pub fn default_config_path(app_name: &str) -> Option<PathBuf> {
        Self::default_config_dir(app_name).map(|dir| dir.join(DEFAULT_CONFIG_FILE))
    }

    /// Returns the config file path.
    pub fn path(&self) -> &Path {
        &self.config_path
    }

    /// Saves the configuration to disk.
    pub fn save(&self) -> anyhow::Result<()> {
        let content = serde_yaml::to_string(self)?;
        std::fs::write(&self.config_path, content)?;
        Ok(())
    }

    /// Adds or replaces a context.
    pub fn add_context(&mut self, name: &str, mut ctx: Context) -> anyhow::Result<()> {
        ctx.name = name.to_string();
        self.contexts.insert(name.to_string(), ctx);
        if self.current_context.is_empty() {
            self.current_context = name.to_string();
        }
        self.save()
    }

    /// Deletes a context.
    pub fn delete_context(&mut self, name: &str) -> anyhow::Result<()> {
        if self.contexts.remove(name).is_none() {
            anyhow::bail!("context '{}' not found", name);
        }
        if self.current_context == name {
            self.current_context.clear();
        }
        self.save()
    }

    /// Sets the current context.
    pub fn use_context(&mut self, name: &str) -> anyhow::Result<()> {
        if !self.contexts.contains_key(name) {
            anyhow::bail!("context '{}' not found", name);
        }
        self.current_context = name.to_string();
        self.save()
    }

    pub fn get_context(&self, name: &str) -> Option<&Context> {
        self.contexts.get(name)
    }

    pub fn get_current_context(&self) -> Option<&Context> {
        if self.current_context.is_empty() {
            return None;
        }
        self.contexts.get(&self.current_context)
    }

    /// Resolves the context by name, or the current context if no name is given.
    pub fn resolve_context(&self, name: Option<&str>) -> Option<&Context> {
        match name {
            Some(n) if !n.is_empty() => self.get_context(n),
            _ => self.get_current_context(),
        }
    }

    /// Lists context names in sorted order.
    pub fn list_contexts(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.contexts.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }
}

impl Context {
    /// Returns the request timeout, if one is configured.
    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout > 0).then(|| Duration::from_secs(self.timeout))
    }

    /// Returns the configured attempt count, if any.
    pub fn max_attempts(&self) -> Option<usize> {
        (self.max_retries > 0).then_some(self.max_retries as usize)
    }

    /// Returns `voice` if given, else the context default.
    pub fn voice_or_default<'a>(&'a self, voice: Option<&'a str>) -> Option<&'a str> {
        match voice {
            Some(v) if !v.is_empty() => Some(v),
            _ if !self.default_voice.is_empty() => Some(&self.default_voice),
            _ => None,
        }
    }

    pub fn get_extra(&self, key: &str) -> Option<&str> {
        self.extra.get(key).map(|s| s.as_str())
    }

    pub fn set_extra(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.extra.insert(key.into(), value.into());
    }
}

/// Loads configuration for `app_name`, creating an empty file on first use.
pub fn load_config(app_name: &str, custom_path: Option<&str>) -> anyhow::Result<Config> {
    let config_path = match custom_path {
        Some(p) => PathBuf::from(p),
        None => Config::default_config_path(app_name)
            .ok_or_else(|| anyhow::anyhow!("cannot determine config path"))?,
    };

    if let Some(parent) = config_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let mut cfg: Config = if config_path.exists() {
        let content = std::fs::read_to_string(&config_path)?;
        if content.trim().is_empty() {
            Config::default()
        } else {
            serde_yaml::from_str(&content)?
        }
    } else {
        let cfg = Config::default();
        std::fs::write(&config_path, serde_yaml::to_string(&cfg)?)?;
        cfg
    };

    cfg.app_name = app_name.to_string();
    cfg.config_path = config_path;
    Ok(cfg)
}

/// Masks the API key for display.
pub fn mask_api_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() <= 8 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}{}{}", head, "*".repeat(chars.len() - 8), tail)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_config(dir: &tempfile::TempDir) -> Config {
        let path = dir.path().join("nested").join("config.yaml");
        load_config("speakboard", path.to_str()).unwrap()
    }

    #[test]
    fn test_load_creates_file() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = temp_config(&dir);
        assert!(cfg.path().exists());
        assert!(cfg.contexts.is_empty());
        assert_eq!(cfg.app_name, "speakboard");
    }

    #[test]
    fn test_context_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let mut cfg = temp_config(&dir);

        let ctx = Context {
            api_key: "sk-test-1234567890".into(),
            live_url: "wss://live.example/v1".into(),
            timeout: 10,
            default_voice: "Kore".into(),
            ..Default::default()
        };
        cfg.add_context("home", ctx).unwrap();
        assert_eq!(cfg.current_context, "home");

        let reloaded = load_config("speakboard", cfg.path().to_str()).unwrap();
        let ctx = reloaded.get_current_context().unwrap();
        assert_eq!(ctx.name, "home");
        assert_eq!(ctx.live_url, "wss://live.example/v1");
        assert_eq!(ctx.timeout(), Some(Duration::from_secs(10)));
        assert_eq!(ctx.max_attempts(), None);
    }

    #[test]
    fn test_use_and_delete_context() {
        let dir = tempfile::tempdir().unwrap();
        let mut cfg = temp_config(&dir);
        cfg.add_context("a", Context::default()).unwrap();
        cfg.add_context("b", Context::default()).unwrap();

        cfg.use_context("b").unwrap();
        assert_eq!(cfg.current_context, "b");
        assert!(cfg.use_context("missing").is_err());

        cfg.delete_context("b").unwrap();
        assert!(cfg.current_context.is_empty());
        assert!(cfg.delete_context("b").is_err());
        assert_eq!(cfg.list_contexts(), vec!["a"]);
    }

    #[test]
    fn test_resolve_context() {
        let dir = tempfile::tempdir().unwrap();
        let mut cfg = temp_config(&dir);
        cfg.add_context("a", Context::default()).unwrap();
        cfg.add_context("b", Context::default()).unwrap();

        assert_eq!(cfg.resolve_context(None).unwrap().name, "a");
        assert_eq!(cfg.resolve_context(Some("b")).unwrap().name, "b");
        assert!(cfg.resolve_context(Some("c")).is_none());
    }

    #[test]
    fn test_voice_or_default() {
        let ctx = Context {
            default_voice: "Kore".into(),
            ..Default::default()
        };
        assert_eq!(ctx.voice_or_default(Some("Puck")), Some("Puck"));
        assert_eq!(ctx.voice_or_default(None), Some("Kore"));
        assert_eq!(Context::default().voice_or_default(None), None);
    }

    #[test]
    fn test_mask_api_key() {
        assert_eq!(mask_api_key("short"), "*****");
        assert_eq!(mask_api_key("sk-1234567890"), "sk-1*****7890");
    }
}
