use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tokio_util::sync::CancellationToken;

use crate::app::{Result, VidcastError};
use crate::builder::{cancellable, endpoint, resolve_info, Builder};
use crate::domain::{Episode, Feed, FeedConfig, LinkKind, Provider};
use crate::fetcher::{fetch_json, FetchRequest, Fetcher};

const API_URL: &str = "https://api.vimeo.com";
const ACCEPT: &str = "application/vnd.vimeo.*+json;version=3.4";
const MAX_PER_PAGE: usize = 100;

pub struct VimeoBuilder {
    token: String,
    fetcher: Arc<dyn Fetcher>,
}

#[derive(Debug, Deserialize)]
struct Resource {
    name: String,
    #[serde(alias = "bio")]
    description: Option<String>,
    link: Option<String>,
    pictures: Option<Pictures>,
}

#[derive(Debug, Deserialize)]
struct Pictures {
    #[serde(default)]
    sizes: Vec<PictureSize>,
}

#[derive(Debug, Deserialize)]
struct PictureSize {
    link: String,
}

#[derive(Debug, Deserialize)]
struct VideoPage {
    #[serde(default)]
    data: Vec<Video>,
}

#[derive(Debug, Deserialize)]
struct Video {
    uri: String,
    name: String,
    description: Option<String>,
    link: String,
    #[serde(default)]
    duration: u64,
    created_time: Option<DateTime<Utc>>,
    release_time: Option<DateTime<Utc>>,
    pictures: Option<Pictures>,
}

impl Pictures {
    /// Sizes are listed smallest first.
    fn largest(&self) -> Option<String> {
        self.sizes.last().map(|s| s.link.clone())
    }
}

impl VimeoBuilder {
    /// Fails on an empty token and validates it against the API before
    /// returning.
    pub async fn new(
        cancel: &CancellationToken,
        token: &str,
        fetcher: Arc<dyn Fetcher>,
    ) -> Result<Self> {
        let token = token.trim();
        if token.is_empty() {
            return Err(VidcastError::Credential(
                "empty Vimeo access token".to_string(),
            ));
        }

        let builder = Self {
            token: token.to_string(),
            fetcher,
        };
        cancellable(cancel, builder.verify()).await?;
        Ok(builder)
    }

    fn request(&self, url: String) -> FetchRequest {
        FetchRequest::get(url)
            .header("Accept", ACCEPT)
            .bearer(&self.token)
    }

    async fn verify(&self) -> Result<()> {
        let request = self.request(format!("{}/oauth/verify", API_URL));
        match self.fetcher.fetch(&request).await {
            Ok(_) => Ok(()),
            Err(VidcastError::Http(e)) if e.status().is_some_and(|s| s.as_u16() == 401) => Err(
                VidcastError::Credential("Vimeo rejected the access token".to_string()),
            ),
            Err(e) => Err(e),
        }
    }
}

#[async_trait]
impl Builder for VimeoBuilder {
    fn provider(&self) -> Provider {
        Provider::Vimeo
    }

    async fn build(&self, cancel: &CancellationToken, config: &FeedConfig) -> Result<Feed> {
        let info = resolve_info(config, Provider::Vimeo)?;

        let path = match info.kind {
            LinkKind::User => format!("{}/users/{}", API_URL, info.id),
            LinkKind::Channel => format!("{}/channels/{}", API_URL, info.id),
            LinkKind::Group => format!("{}/groups/{}", API_URL, info.id),
            kind => {
                return Err(VidcastError::UnsupportedKind {
                    provider: Provider::Vimeo,
                    kind,
                })
            }
        };

        let resource: Resource = cancellable(
            cancel,
            fetch_json(self.fetcher.as_ref(), &self.request(path.clone())),
        )
        .await?;

        let per_page = config.page_size.clamp(1, MAX_PER_PAGE).to_string();
        let videos_url = endpoint(
            &format!("{}/videos", path),
            &[
                ("per_page", per_page.as_str()),
                ("sort", "date"),
                ("direction", "desc"),
            ],
        );
        let page: VideoPage = cancellable(
            cancel,
            fetch_json(self.fetcher.as_ref(), &self.request(videos_url)),
        )
        .await?;

        let mut feed = Feed::new(config, &info);
        feed.title = resource.name;
        feed.description = resource.description.unwrap_or_default();
        feed.author = Some(feed.title.clone());
        feed.cover_art = resource.pictures.as_ref().and_then(Pictures::largest);
        if let Some(link) = resource.link {
            feed.link = link;
        }

        let episodes = page
            .data
            .into_iter()
            .map(|video| {
                let id = video.uri.rsplit('/').next().unwrap_or_default().to_string();
                let mut episode = Episode::new(id, video.link);
                episode.title = video.name;
                episode.description = video.description.unwrap_or_default();
                episode.duration = video.duration;
                episode.pub_date = video.release_time.or(video.created_time);
                episode.thumbnail = video.pictures.as_ref().and_then(Pictures::largest);
                episode
            })
            .collect();
        feed.set_episodes(episodes);

        tracing::info!(
            "Built Vimeo feed {} with {} episodes",
            feed.display_title(),
            feed.episodes.len()
        );
        Ok(feed)
    }
}
