//! Media stream resolution.
//!
//! The YouTube builder hands every episode page to a [`Downloader`] to
//! find the direct media stream that podcast clients will fetch.

mod config;
mod ytdlp;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::app::Result;
use crate::domain::{FeedConfig, Format, Quality};

pub use config::DownloaderConfig;
pub use ytdlp::YtDlp;

/// Which stream to pick for an episode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamRequest {
    pub format: Format,
    pub quality: Quality,
    pub max_height: Option<u32>,
}

impl StreamRequest {
    /// yt-dlp style format selector.
    pub fn selector(&self) -> String {
        match (self.format, self.quality) {
            (Format::Audio, Quality::High) => "bestaudio".to_string(),
            (Format::Audio, Quality::Low) => "worstaudio".to_string(),
            (Format::Video, quality) => {
                let height = self
                    .max_height
                    .map(|h| format!("[height<={}]", h))
                    .unwrap_or_default();
                let pick = match quality {
                    Quality::High => "best",
                    Quality::Low => "worst",
                };
                format!(
                    "{pick}video[ext=mp4][vcodec^=avc1]{height}+{pick}audio[ext=m4a]/{pick}[ext=mp4]{height}/{pick}{height}",
                    pick = pick,
                    height = height
                )
            }
        }
    }
}

impl From<&FeedConfig> for StreamRequest {
    fn from(config: &FeedConfig) -> Self {
        Self {
            format: config.format,
            quality: config.quality,
            max_height: config.max_height,
        }
    }
}

/// A directly downloadable media stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaStream {
    pub url: String,
    pub ext: String,
    /// Size in bytes when the platform reports one.
    pub size: Option<u64>,
    /// Duration in seconds.
    pub duration: Option<u64>,
}

#[async_trait]
pub trait Downloader: Send + Sync {
    async fn resolve(
        &self,
        cancel: &CancellationToken,
        video_url: &str,
        request: &StreamRequest,
    ) -> Result<MediaStream>;

    /// How many streams a single feed may resolve at once.
    fn max_concurrency(&self) -> usize {
        4
    }
}
