use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Configuration for media stream resolution
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DownloaderConfig {
    /// Resolve direct media streams for YouTube episodes (default: false)
    pub enabled: bool,

    /// Path or name of the yt-dlp executable (default: "yt-dlp")
    pub path: PathBuf,

    /// Per-video resolution timeout in seconds (default: 120)
    pub timeout_secs: u64,

    /// Maximum concurrent yt-dlp processes per feed (default: 4)
    pub max_concurrency: usize,

    /// Extra arguments passed to yt-dlp before the video URL
    pub extra_args: Vec<String>,
}

impl Default for DownloaderConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            path: PathBuf::from("yt-dlp"),
            timeout_secs: 120,
            max_concurrency: 4,
            extra_args: Vec::new(),
        }
    }
}

impl DownloaderConfig {
    /// Get the resolution timeout as a Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}
