use std::sync::Arc;

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use serde::Deserialize;
use tokio_util::sync::CancellationToken;

use crate::app::{Result, VidcastError};
use crate::builder::{cancellable, endpoint, resolve_info, Builder};
use crate::domain::{Feed, FeedConfig, LinkKind, Provider};
use crate::downloader::{Downloader, StreamRequest};
use crate::fetcher::{fetch_json, FetchRequest, Fetcher};
use crate::normalizer::Normalizer;

const FEED_URL: &str = "https://www.youtube.com/feeds/videos.xml";
const API_URL: &str = "https://www.googleapis.com/youtube/v3";

/// Builds YouTube feeds from the public Atom listings.
///
/// The API key is only needed to resolve `@handle` links to channels.
pub struct YouTubeBuilder {
    key: String,
    downloader: Option<Arc<dyn Downloader>>,
    fetcher: Arc<dyn Fetcher>,
    normalizer: Normalizer,
}

#[derive(Debug, Deserialize)]
struct ChannelList {
    #[serde(default)]
    items: Vec<ChannelItem>,
}

#[derive(Debug, Deserialize)]
struct ChannelItem {
    id: String,
}

impl YouTubeBuilder {
    pub fn new(
        key: &str,
        downloader: Option<Arc<dyn Downloader>>,
        fetcher: Arc<dyn Fetcher>,
    ) -> Self {
        Self {
            key: key.trim().to_string(),
            downloader,
            fetcher,
            normalizer: Normalizer::new(),
        }
    }

    async fn resolve_handle(&self, handle: &str) -> Result<String> {
        if self.key.is_empty() {
            return Err(VidcastError::Credential(
                "a YouTube API key is required to resolve @handle links".to_string(),
            ));
        }

        let handle = format!("@{}", handle);
        let url = endpoint(
            &format!("{}/channels", API_URL),
            &[
                ("part", "id"),
                ("forHandle", handle.as_str()),
                ("key", self.key.as_str()),
            ],
        );
        let list: ChannelList = fetch_json(self.fetcher.as_ref(), &FetchRequest::get(url)).await?;

        list.items
            .into_iter()
            .next()
            .map(|item| item.id)
            .ok_or_else(|| VidcastError::api(Provider::YouTube, format!("no channel for {}", handle)))
    }

    async fn resolve_streams(
        &self,
        cancel: &CancellationToken,
        downloader: &dyn Downloader,
        config: &FeedConfig,
        feed: &mut Feed,
    ) -> Result<()> {
        let request = StreamRequest::from(config);
        let request = &request;
        let limit = downloader.max_concurrency().max(1);
        let urls: Vec<String> = feed.episodes.iter().map(|e| e.video_url.clone()).collect();

        let results: Vec<Result<_>> = stream::iter(urls)
            .map(|url| async move { downloader.resolve(cancel, &url, request).await })
            .buffered(limit)
            .collect()
            .await;

        for (episode, result) in feed.episodes.iter_mut().zip(results) {
            match result {
                Ok(media) => {
                    episode.media_url = Some(media.url);
                    if let Some(size) = media.size {
                        episode.size = size;
                    }
                    if let Some(duration) = media.duration {
                        episode.duration = duration;
                    }
                }
                Err(VidcastError::Cancelled) => return Err(VidcastError::Cancelled),
                Err(e) => {
                    tracing::warn!("Could not resolve stream for {}: {}", episode.video_url, e);
                }
            }
        }

        Ok(())
    }
}

#[async_trait]
impl Builder for YouTubeBuilder {
    fn provider(&self) -> Provider {
        Provider::YouTube
    }

    async fn build(&self, cancel: &CancellationToken, config: &FeedConfig) -> Result<Feed> {
        let info = resolve_info(config, Provider::YouTube)?;

        let (param, value) = match info.kind {
            LinkKind::Channel => ("channel_id", info.id.clone()),
            LinkKind::Playlist => ("playlist_id", info.id.clone()),
            LinkKind::User => ("user", info.id.clone()),
            LinkKind::Handle => {
                let channel_id = cancellable(cancel, self.resolve_handle(&info.id)).await?;
                ("channel_id", channel_id)
            }
            LinkKind::Group => {
                return Err(VidcastError::UnsupportedKind {
                    provider: Provider::YouTube,
                    kind: info.kind,
                })
            }
        };

        let url = endpoint(FEED_URL, &[(param, value.as_str())]);
        let body = cancellable(cancel, self.fetcher.fetch(&FetchRequest::get(url))).await?;
        let (meta, episodes) = self.normalizer.normalize(&body)?;

        let mut feed = Feed::new(config, &info);
        feed.title = meta.title.unwrap_or_else(|| info.id.clone());
        feed.description = meta
            .description
            .unwrap_or_else(|| format!("{} on YouTube", feed.title));
        feed.author = meta.author;
        feed.cover_art = episodes.first().and_then(|e| e.thumbnail.clone());
        feed.set_episodes(episodes);

        if let Some(downloader) = &self.downloader {
            self.resolve_streams(cancel, downloader.as_ref(), config, &mut feed)
                .await?;
        }

        tracing::info!(
            "Built YouTube feed {} with {} episodes",
            feed.display_title(),
            feed.episodes.len()
        );
        Ok(feed)
    }
}
