//! Configuration management for vidcast.
//!
//! Configuration is read from `~/.config/vidcast/config.toml` at startup.
//! If the file doesn't exist, a default configuration with comments is created.

use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::domain::{FeedConfig, Provider};
use crate::downloader::DownloaderConfig;
use crate::fetcher::parallel::DEFAULT_WORKERS;

/// Main configuration struct.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub tokens: Tokens,
    pub downloader: DownloaderConfig,
    pub update: UpdateConfig,
    pub feeds: BTreeMap<String, FeedConfig>,
}

/// Platform credentials, one per provider that takes one.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Tokens {
    /// YouTube Data API key, only needed for @handle links
    pub youtube: String,
    /// Vimeo personal access token
    pub vimeo: String,
    /// SoundCloud client id, discovered when empty
    pub soundcloud: String,
    /// Twitch `client_id:client_secret`
    pub twitch: String,
}

impl Tokens {
    pub fn key_for(&self, provider: Provider) -> &str {
        match provider {
            Provider::YouTube => &self.youtube,
            Provider::Vimeo => &self.vimeo,
            Provider::SoundCloud => &self.soundcloud,
            Provider::Twitch => &self.twitch,
            Provider::Bilibili => "",
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UpdateConfig {
    /// Feeds built concurrently by `vidcast update`
    pub workers: usize,
}

impl Default for UpdateConfig {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKERS,
        }
    }
}

impl Config {
    /// Load configuration from the default path.
    ///
    /// If the config file doesn't exist, creates a default one with comments.
    /// Missing fields in the config file will use default values.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::default_config_path()?;

        if !config_path.exists() {
            Self::create_default_config(&config_path)?;
            return Ok(Self::default());
        }

        Self::load_from(&config_path)
    }

    /// Load configuration from an explicit path, which must exist.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        let mut config: Config = toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            source: e,
        })?;

        // Table keys double as feed ids
        for (key, feed) in config.feeds.iter_mut() {
            if feed.id.is_empty() {
                feed.id = key.clone();
            }
        }

        Ok(config)
    }

    /// Get the default config file path: `~/.config/vidcast/config.toml`
    pub fn default_config_path() -> Result<PathBuf, ConfigError> {
        let config_dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(config_dir.join("vidcast").join("config.toml"))
    }

    /// Configured feeds in id order.
    pub fn feed_configs(&self) -> Vec<FeedConfig> {
        self.feeds.values().cloned().collect()
    }

    /// Create a default config file with comments.
    fn create_default_config(path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::Io {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        let mut file = fs::File::create(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        file.write_all(Self::default_config_content().as_bytes())
            .map_err(|e| ConfigError::Io {
                path: path.to_path_buf(),
                source: e,
            })?;

        tracing::info!("Created default config at {}", path.display());
        Ok(())
    }

    /// Generate the default config file content with comments.
    fn default_config_content() -> String {
        r##"# vidcast configuration

[tokens]
# YouTube Data API key. Only needed to resolve @handle links.
youtube = ""

# Vimeo personal access token (required for Vimeo feeds)
vimeo = ""

# SoundCloud client id. Discovered from the web app when empty.
soundcloud = ""

# Twitch application credentials as "client_id:client_secret"
twitch = ""

[downloader]
# Resolve direct media streams for YouTube episodes with yt-dlp
enabled = false

# Path or name of the yt-dlp executable
path = "yt-dlp"

# Per-video timeout in seconds
timeout_secs = 120

# Maximum concurrent yt-dlp processes per feed
max_concurrency = 4

# Extra arguments passed to yt-dlp
extra_args = []

[update]
# Feeds built concurrently by `vidcast update`
workers = 4

# One table per feed. The table key is the feed id.
#
# [feeds.rust]
# url = "https://www.youtube.com/@rustvideos"
# page_size = 50        # episodes kept per feed
# format = "video"      # "audio" or "video"
# quality = "high"      # "high" or "low"
# max_height = 720      # video height cap
"##
        .to_string()
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Could not determine config directory")]
    NoConfigDir,

    #[error("Failed to read/write config file at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}
