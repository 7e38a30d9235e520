//! Configuration file.
//!
//! Every field has a default, so an empty file is valid (it tracks no new
//! feeds and posts to empty channel names).  Example:
//!
//! ```toml
//! [feeds]
//! urls = ["https://example.com/index.rdf"]
//!
//! [slack]
//! channel = "C0123456"
//! token = "xoxb-..."
//!
//! [discord]
//! channel_id = "1234567890"
//! token = "..."
//! ```

use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::digest::DEFAULT_MAX_LENGTH;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub poll: PollConfig,
    #[serde(default)]
    pub feeds: FeedsConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub slack: SlackConfig,
    #[serde(default)]
    pub discord: DiscordConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Read and parse the TOML file at `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("invalid config file {}", path.display()))
    }

    pub fn parse(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }
}

/// Polling schedule and HTTP client behaviour.
#[derive(Debug, Clone, Deserialize)]
pub struct PollConfig {
    /// Seconds between timer-triggered passes.
    #[serde(default = "default_interval")]
    pub interval_secs: u64,
    /// Sent with every request and matched against robots.txt groups.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Upper bound on any single outbound request.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_interval() -> u64 {
    600
}

fn default_user_agent() -> String {
    concat!("rss-relay/", env!("CARGO_PKG_VERSION")).to_string()
}

fn default_request_timeout() -> u64 {
    30
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval(),
            user_agent: default_user_agent(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

/// Feeds to start tracking.  Feeds already in the store are tracked whether
/// or not they are listed here.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FeedsConfig {
    #[serde(default)]
    pub urls: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    #[serde(default = "default_store_path")]
    pub path: String,
}

fn default_store_path() -> String {
    "data/cursors.json".to_string()
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: default_store_path(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SlackConfig {
    #[serde(default)]
    pub channel: String,
    #[serde(default = "default_slack_api_url")]
    pub api_url: String,
    #[serde(default)]
    pub token: Option<String>,
}

fn default_slack_api_url() -> String {
    "https://slack.com/api/chat.postMessage".to_string()
}

impl Default for SlackConfig {
    fn default() -> Self {
        Self {
            channel: String::new(),
            api_url: default_slack_api_url(),
            token: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DiscordConfig {
    #[serde(default)]
    pub channel_id: String,
    #[serde(default = "default_discord_api_base")]
    pub api_base: String,
    #[serde(default)]
    pub token: Option<String>,
    /// Digest size threshold in characters.
    #[serde(default = "default_max_message_length")]
    pub max_message_length: usize,
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
}

fn default_discord_api_base() -> String {
    "https://discord.com/api/v10".to_string()
}

fn default_max_message_length() -> usize {
    DEFAULT_MAX_LENGTH
}

fn default_queue_capacity() -> usize {
    64
}

impl Default for DiscordConfig {
    fn default() -> Self {
        Self {
            channel_id: String::new(),
            api_base: default_discord_api_base(),
            token: None,
            max_message_length: default_max_message_length(),
            queue_capacity: default_queue_capacity(),
        }
    }
}

/// HTTP trigger.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_server_enabled")]
    pub enabled: bool,
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_server_enabled() -> bool {
    true
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8787
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            enabled: default_server_enabled(),
            host: default_host(),
            port: default_port(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}
