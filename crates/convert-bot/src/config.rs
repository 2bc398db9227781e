//! Configuration management for convert-bot

#[cfg(test)]
#[path = "config_tests.rs"]
mod config_tests;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use convert_core::RouterConfig;

/// Complete bot configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub telegram: TelegramConfig,
    #[serde(default)]
    pub features: FeatureConfig,
    #[serde(default)]
    pub sessions: SessionConfig,
    #[serde(default)]
    pub converters: ConverterConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramConfig {
    /// Bot token from BotFather
    #[serde(default = "default_bot_token")]
    pub bot_token: String,
}

/// Optional behaviours.
///
/// `links`, `magnets` and `free_text` hand work to an external command and are
/// off unless enabled alongside their `converters.commands` entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FeatureConfig {
    /// Relay messages behind `https://t.me/` links (`fetch_link` command)
    #[serde(default)]
    pub links: bool,
    /// Fetch `magnet:?` URIs (`fetch_magnet` command)
    #[serde(default)]
    pub magnets: bool,
    /// Pass session-less private text to the `other` command
    #[serde(default)]
    pub free_text: bool,
    #[serde(default = "default_true")]
    pub make: bool,
    #[serde(default = "default_true")]
    pub rename: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionConfig {
    /// Pending sessions expire after this many seconds; unset keeps them until replaced
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ttl_secs: Option<u64>,
    /// How often expired sessions are purged
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ConverterConfig {
    /// Scratch space for downloads and outputs
    #[serde(default = "default_work_dir")]
    pub work_dir: PathBuf,
    /// Per-command time limit
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Operation key → command template.
    ///
    /// Templates are split on whitespace and each argument may use the
    /// `{input}`, `{output}`, `{ext}`, `{url}`, `{dir}` and `{name}` placeholders.
    #[serde(default)]
    pub commands: HashMap<String, String>,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file(path: &str) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path))?;

        Ok(config)
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let bot_token =
            std::env::var("TELEGRAM_BOT_TOKEN").context("TELEGRAM_BOT_TOKEN not set")?;

        let ttl_secs = env_u64("CONVERT_SESSION_TTL_SECS")?;
        let timeout_secs = env_u64("CONVERT_JOB_TIMEOUT_SECS")?.unwrap_or_else(default_timeout_secs);
        let work_dir = std::env::var("CONVERT_WORK_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| default_work_dir());

        Ok(Config {
            telegram: TelegramConfig { bot_token },
            features: FeatureConfig::default(),
            sessions: SessionConfig {
                ttl_secs,
                ..SessionConfig::default()
            },
            converters: ConverterConfig {
                work_dir,
                timeout_secs,
                commands: HashMap::new(),
            },
        })
    }

    /// Reject configurations the bot cannot start with
    pub fn validate(&self) -> Result<()> {
        if self.telegram.bot_token.trim().is_empty() {
            bail!("Telegram bot token is empty; set telegram.bot_token or TELEGRAM_BOT_TOKEN");
        }
        if self.converters.timeout_secs == 0 {
            bail!("converters.timeout_secs must be greater than zero");
        }
        if self.sessions.sweep_interval_secs == 0 {
            bail!("sessions.sweep_interval_secs must be greater than zero");
        }
        for (key, template) in &self.converters.commands {
            if template.split_whitespace().next().is_none() {
                bail!("converters.commands.{} is empty", key);
            }
        }
        for (feature, key) in self.features.required_commands() {
            if !self.converters.commands.contains_key(key) {
                bail!(
                    "features.{} is enabled but converters.commands.{} is not configured",
                    feature,
                    key
                );
            }
        }
        Ok(())
    }
}

impl FeatureConfig {
    /// `(feature, operation key)` for every enabled feature backed by an external command
    pub fn required_commands(&self) -> Vec<(&'static str, &'static str)> {
        [
            (self.links, "links", "fetch_link"),
            (self.magnets, "magnets", "fetch_magnet"),
            (self.free_text, "free_text", "other"),
        ]
        .into_iter()
        .filter(|(enabled, _, _)| *enabled)
        .map(|(_, feature, key)| (feature, key))
        .collect()
    }

    pub fn router_config(&self) -> RouterConfig {
        RouterConfig {
            links: self.links,
            magnets: self.magnets,
            free_text: self.free_text,
            make: self.make,
            rename: self.rename,
        }
    }
}

impl SessionConfig {
    pub fn ttl(&self) -> Option<Duration> {
        self.ttl_secs.map(Duration::from_secs)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }
}

impl ConverterConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn env_u64(name: &str) -> Result<Option<u64>> {
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .with_context(|| format!("{} must be a whole number of seconds, got '{}'", name, raw)),
        Err(_) => Ok(None),
    }
}

fn default_bot_token() -> String {
    std::env::var("TELEGRAM_BOT_TOKEN").unwrap_or_default()
}

fn default_true() -> bool {
    true
}

fn default_sweep_interval() -> u64 {
    60
}

fn default_work_dir() -> PathBuf {
    std::env::temp_dir().join("convert-bot")
}

fn default_timeout_secs() -> u64 {
    600
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            links: false,
            magnets: false,
            free_text: false,
            make: true,
            rename: true,
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            ttl_secs: None,
            sweep_interval_secs: default_sweep_interval(),
        }
    }
}

impl Default for ConverterConfig {
    fn default() -> Self {
        Self {
            work_dir: default_work_dir(),
            timeout_secs: default_timeout_secs(),
            commands: HashMap::new(),
        }
    }
}
