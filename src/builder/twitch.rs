use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tokio_util::sync::CancellationToken;

use crate::app::{Result, VidcastError};
use crate::builder::{cancellable, endpoint, resolve_info, Builder};
use crate::domain::{Episode, Feed, FeedConfig, LinkKind, Provider};
use crate::fetcher::{fetch_json, FetchRequest, Fetcher};

const TOKEN_URL: &str = "https://id.twitch.tv/oauth2/token";
const API_URL: &str = "https://api.twitch.tv/helix";
const MAX_PER_PAGE: usize = 100;
const THUMBNAIL_SIZE: (&str, &str) = ("640", "360");

/// Builds feeds from the archived broadcasts of a Twitch user.
///
/// The key is `client_id:client_secret`; an app access token is obtained
/// once at construction.
pub struct TwitchBuilder {
    client_id: String,
    access_token: String,
    fetcher: Arc<dyn Fetcher>,
}

#[derive(Debug, Deserialize)]
struct Token {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct Page<T> {
    #[serde(default = "Vec::new")]
    data: Vec<T>,
}

#[derive(Debug, Deserialize)]
struct User {
    id: String,
    display_name: String,
    #[serde(default)]
    description: String,
    profile_image_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Video {
    id: String,
    title: String,
    #[serde(default)]
    description: String,
    url: String,
    thumbnail_url: Option<String>,
    #[serde(default)]
    duration: String,
    published_at: Option<DateTime<Utc>>,
    created_at: Option<DateTime<Utc>>,
}

impl TwitchBuilder {
    pub async fn new(
        cancel: &CancellationToken,
        key: &str,
        fetcher: Arc<dyn Fetcher>,
    ) -> Result<Self> {
        let (client_id, client_secret) = key
            .trim()
            .split_once(':')
            .filter(|(id, secret)| !id.is_empty() && !secret.is_empty())
            .ok_or_else(|| {
                VidcastError::Credential(
                    "Twitch key must be in the form client_id:client_secret".to_string(),
                )
            })?;

        let url = endpoint(
            TOKEN_URL,
            &[
                ("client_id", client_id),
                ("client_secret", client_secret),
                ("grant_type", "client_credentials"),
            ],
        );
        let token: Token = cancellable(
            cancel,
            fetch_json(fetcher.as_ref(), &FetchRequest::post(url)),
        )
        .await
        .map_err(|e| match e {
            VidcastError::Http(e) if e.status().is_some_and(|s| s.is_client_error()) => {
                VidcastError::Credential("Twitch rejected the client credentials".to_string())
            }
            e => e,
        })?;
        tracing::debug!("Obtained Twitch app access token");

        Ok(Self {
            client_id: client_id.to_string(),
            access_token: token.access_token,
            fetcher,
        })
    }

    fn request(&self, url: String) -> FetchRequest {
        FetchRequest::get(url)
            .header("Client-Id", self.client_id.as_str())
            .bearer(&self.access_token)
    }

    async fn user(&self, login: &str) -> Result<User> {
        let url = endpoint(&format!("{}/users", API_URL), &[("login", login)]);
        let page: Page<User> = fetch_json(self.fetcher.as_ref(), &self.request(url)).await?;
        page.data
            .into_iter()
            .next()
            .ok_or_else(|| VidcastError::api(Provider::Twitch, format!("no such user: {}", login)))
    }

    async fn videos(&self, user_id: &str, page_size: usize) -> Result<Vec<Video>> {
        let first = page_size.clamp(1, MAX_PER_PAGE).to_string();
        let url = endpoint(
            &format!("{}/videos", API_URL),
            &[
                ("user_id", user_id),
                ("type", "archive"),
                ("first", first.as_str()),
            ],
        );
        let page: Page<Video> = fetch_json(self.fetcher.as_ref(), &self.request(url)).await?;
        Ok(page.data)
    }
}

/// Parse Helix durations such as `1h2m3s` into seconds.
fn parse_duration(s: &str) -> Option<u64> {
    let mut total: u64 = 0;
    let mut digits = String::new();

    for c in s.trim().chars() {
        if c.is_ascii_digit() {
            digits.push(c);
            continue;
        }
        let value: u64 = digits.parse().ok()?;
        digits.clear();
        let unit = match c {
            'h' => 3600,
            'm' => 60,
            's' => 1,
            _ => return None,
        };
        total = total.checked_add(value.checked_mul(unit)?)?;
    }

    if digits.is_empty() {
        Some(total)
    } else {
        None
    }
}

fn thumbnail(template: &str) -> Option<String> {
    if template.is_empty() {
        // Still processing
        return None;
    }
    Some(
        template
            .replace("%{width}", THUMBNAIL_SIZE.0)
            .replace("%{height}", THUMBNAIL_SIZE.1),
    )
}

#[async_trait]
impl Builder for TwitchBuilder {
    fn provider(&self) -> Provider {
        Provider::Twitch
    }

    async fn build(&self, cancel: &CancellationToken, config: &FeedConfig) -> Result<Feed> {
        let info = resolve_info(config, Provider::Twitch)?;
        if info.kind != LinkKind::User {
            return Err(VidcastError::UnsupportedKind {
                provider: Provider::Twitch,
                kind: info.kind,
            });
        }

        let user = cancellable(cancel, self.user(&info.id)).await?;
        let videos = cancellable(cancel, self.videos(&user.id, config.page_size)).await?;

        let mut feed = Feed::new(config, &info);
        feed.title = user.display_name;
        feed.description = user.description;
        feed.author = Some(feed.title.clone());
        feed.cover_art = user.profile_image_url;

        let episodes = videos
            .into_iter()
            .map(|video| {
                let mut episode = Episode::new(video.id, video.url);
                episode.title = video.title;
                episode.description = video.description;
                episode.thumbnail = video.thumbnail_url.as_deref().and_then(thumbnail);
                episode.duration = parse_duration(&video.duration).unwrap_or_default();
                episode.pub_date = video.published_at.or(video.created_at);
                episode
            })
            .collect();
        feed.set_episodes(episodes);

        tracing::info!(
            "Built Twitch feed {} with {} episodes",
            feed.display_title(),
            feed.episodes.len()
        );
        Ok(feed)
    }
}
