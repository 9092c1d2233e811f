use std::sync::Arc;

use async_trait::async_trait;
use chrono::DateTime;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tokio_util::sync::CancellationToken;

use crate::app::{Result, VidcastError};
use crate::builder::{cancellable, endpoint, resolve_info, Builder};
use crate::domain::{Episode, Feed, FeedConfig, Info, LinkKind, Provider};
use crate::fetcher::{fetch_json, FetchRequest, Fetcher};

const API_URL: &str = "https://api.bilibili.com";
const VIDEO_URL: &str = "https://www.bilibili.com/video";
const REFERER: &str = "https://www.bilibili.com";

/// Builds feeds from Bilibili user spaces and collections. No credential
/// is needed.
pub struct BilibiliBuilder {
    fetcher: Arc<dyn Fetcher>,
}

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    code: i64,
    #[serde(default)]
    message: String,
    data: Option<T>,
}

#[derive(Debug, Deserialize)]
struct Space {
    name: String,
    #[serde(default)]
    sign: String,
    face: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ArcSearch {
    list: ArcList,
}

#[derive(Debug, Deserialize)]
struct ArcList {
    #[serde(default)]
    vlist: Vec<SpaceVideo>,
}

#[derive(Debug, Deserialize)]
struct SpaceVideo {
    bvid: String,
    title: String,
    #[serde(default)]
    description: String,
    pic: Option<String>,
    /// `mm:ss` or `h:mm:ss`.
    #[serde(default)]
    length: String,
    created: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct Collection {
    #[serde(default)]
    archives: Vec<Archive>,
    meta: CollectionMeta,
}

#[derive(Debug, Deserialize)]
struct CollectionMeta {
    name: String,
    #[serde(default)]
    description: String,
    cover: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Archive {
    bvid: String,
    title: String,
    pic: Option<String>,
    #[serde(default)]
    duration: u64,
    pubdate: Option<i64>,
}

impl BilibiliBuilder {
    pub fn new(fetcher: Arc<dyn Fetcher>) -> Self {
        Self { fetcher }
    }

    async fn call<T: DeserializeOwned>(&self, path: &str, params: &[(&str, &str)]) -> Result<T> {
        let url = endpoint(&format!("{}{}", API_URL, path), params);
        let request = FetchRequest::get(url).header("Referer", REFERER);
        let envelope: Envelope<T> = fetch_json(self.fetcher.as_ref(), &request).await?;

        if envelope.code != 0 {
            return Err(VidcastError::api(
                Provider::Bilibili,
                format!("{} (code {})", envelope.message, envelope.code),
            ));
        }
        envelope
            .data
            .ok_or_else(|| VidcastError::api(Provider::Bilibili, "response without data"))
    }

    async fn build_user(&self, config: &FeedConfig, info: &Info) -> Result<Feed> {
        let mid = info.id.as_str();
        let space: Space = self.call("/x/space/acc/info", &[("mid", mid)]).await?;

        let page_size = config.page_size.max(1).to_string();
        let search: ArcSearch = self
            .call(
                "/x/space/arc/search",
                &[
                    ("mid", mid),
                    ("ps", page_size.as_str()),
                    ("pn", "1"),
                    ("order", "pubdate"),
                ],
            )
            .await?;

        let mut feed = Feed::new(config, info);
        feed.title = space.name;
        feed.description = space.sign;
        feed.author = Some(feed.title.clone());
        feed.cover_art = space.face.map(absolute);

        let episodes = search
            .list
            .vlist
            .into_iter()
            .map(|video| {
                let mut episode = Episode::new(video.bvid.clone(), video_url(&video.bvid));
                episode.title = video.title;
                episode.description = video.description;
                episode.thumbnail = video.pic.map(absolute);
                episode.duration = parse_length(&video.length).unwrap_or_default();
                episode.pub_date = video.created.and_then(|t| DateTime::from_timestamp(t, 0));
                episode
            })
            .collect();
        feed.set_episodes(episodes);
        Ok(feed)
    }

    async fn build_collection(&self, config: &FeedConfig, info: &Info) -> Result<Feed> {
        let (mid, sid) = info.bilibili_channel().ok_or_else(|| {
            VidcastError::api(Provider::Bilibili, format!("malformed collection id {}", info.id))
        })?;

        let page_size = config.page_size.max(1).to_string();
        let collection: Collection = self
            .call(
                "/x/polymer/web-space/seasons_archives_list",
                &[
                    ("mid", mid),
                    ("season_id", sid),
                    ("sort_reverse", "false"),
                    ("page_num", "1"),
                    ("page_size", page_size.as_str()),
                ],
            )
            .await?;

        let mut feed = Feed::new(config, info);
        feed.title = collection.meta.name;
        feed.description = collection.meta.description;
        feed.cover_art = collection.meta.cover.map(absolute);

        let episodes = collection
            .archives
            .into_iter()
            .map(|archive| {
                let mut episode = Episode::new(archive.bvid.clone(), video_url(&archive.bvid));
                episode.title = archive.title;
                episode.thumbnail = archive.pic.map(absolute);
                episode.duration = archive.duration;
                episode.pub_date = archive.pubdate.and_then(|t| DateTime::from_timestamp(t, 0));
                episode
            })
            .collect();
        feed.set_episodes(episodes);
        Ok(feed)
    }
}

fn video_url(bvid: &str) -> String {
    format!("{}/{}", VIDEO_URL, bvid)
}

/// Images are often served protocol-relative.
fn absolute(link: String) -> String {
    if link.starts_with("//") {
        format!("https:{}", link)
    } else {
        link
    }
}

fn parse_length(s: &str) -> Option<u64> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    s.split(':')
        .try_fold(0u64, |total, part| {
            let value = part.parse::<u64>().ok()?;
            total.checked_mul(60)?.checked_add(value)
        })
}

#[async_trait]
impl Builder for BilibiliBuilder {
    fn provider(&self) -> Provider {
        Provider::Bilibili
    }

    async fn build(&self, cancel: &CancellationToken, config: &FeedConfig) -> Result<Feed> {
        let info = resolve_info(config, Provider::Bilibili)?;

        let feed = match info.kind {
            LinkKind::User => cancellable(cancel, self.build_user(config, &info)).await?,
            LinkKind::Channel => cancellable(cancel, self.build_collection(config, &info)).await?,
            kind => {
                return Err(VidcastError::UnsupportedKind {
                    provider: Provider::Bilibili,
                    kind,
                })
            }
        };

        tracing::info!(
            "Built Bilibili feed {} with {} episodes",
            feed.display_title(),
            feed.episodes.len()
        );
        Ok(feed)
    }
}
