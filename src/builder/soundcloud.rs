use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tokio::sync::OnceCell;
use tokio_util::sync::CancellationToken;

use crate::app::{Result, VidcastError};
use crate::builder::{cancellable, endpoint, resolve_info, Builder};
use crate::domain::{Episode, Feed, FeedConfig, LinkKind, Provider};
use crate::fetcher::{fetch_json, FetchRequest, Fetcher};
use crate::link::normalize;

const API_URL: &str = "https://api-v2.soundcloud.com";
const WEB_URL: &str = "https://soundcloud.com";
const ASSETS_PREFIX: &str = "https://a-v2.sndcdn.com/assets/";

/// Builds feeds from SoundCloud sets.
///
/// The public web client id is discovered on first use unless one is
/// configured.
pub struct SoundCloudBuilder {
    client_id: OnceCell<String>,
    fetcher: Arc<dyn Fetcher>,
}

#[derive(Debug, Deserialize)]
struct Playlist {
    title: String,
    description: Option<String>,
    artwork_url: Option<String>,
    permalink_url: Option<String>,
    user: Option<User>,
    #[serde(default)]
    tracks: Vec<Track>,
}

#[derive(Debug, Deserialize)]
struct User {
    username: String,
    avatar_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Track {
    id: u64,
    // Tracks past the first few come back as id-only stubs
    title: Option<String>,
    description: Option<String>,
    permalink_url: Option<String>,
    artwork_url: Option<String>,
    /// Milliseconds.
    full_duration: Option<u64>,
    duration: Option<u64>,
    display_date: Option<DateTime<Utc>>,
    created_at: Option<DateTime<Utc>>,
}

impl SoundCloudBuilder {
    pub fn new(client_id: &str, fetcher: Arc<dyn Fetcher>) -> Self {
        let client_id = client_id.trim();
        let cell = if client_id.is_empty() {
            OnceCell::new()
        } else {
            OnceCell::new_with(Some(client_id.to_string()))
        };

        Self {
            client_id: cell,
            fetcher,
        }
    }

    async fn client_id(&self) -> Result<&str> {
        self.client_id
            .get_or_try_init(|| self.discover_client_id())
            .await
            .map(String::as_str)
    }

    async fn discover_client_id(&self) -> Result<String> {
        tracing::debug!("Discovering SoundCloud client id");
        let page = self.fetcher.fetch(&FetchRequest::get(WEB_URL)).await?;
        let page = String::from_utf8_lossy(&page);

        // The id lives in one of the last app bundles
        for script in script_sources(&page).into_iter().rev() {
            let body = match self.fetcher.fetch(&FetchRequest::get(script.as_str())).await {
                Ok(body) => body,
                Err(e) => {
                    tracing::debug!("Skipping SoundCloud bundle {}: {}", script, e);
                    continue;
                }
            };
            if let Some(id) = find_client_id(&String::from_utf8_lossy(&body)) {
                return Ok(id);
            }
        }

        Err(VidcastError::Credential(
            "could not discover a SoundCloud client id".to_string(),
        ))
    }
}

fn script_sources(page: &str) -> Vec<String> {
    page.split("src=\"")
        .skip(1)
        .filter_map(|rest| rest.split('"').next())
        .filter(|src| src.starts_with(ASSETS_PREFIX) && src.ends_with(".js"))
        .map(String::from)
        .collect()
}

fn find_client_id(script: &str) -> Option<String> {
    let start = script.find("client_id:\"")? + "client_id:\"".len();
    let id = script[start..].split('"').next()?;
    if id.is_empty() {
        None
    } else {
        Some(id.to_string())
    }
}

#[async_trait]
impl Builder for SoundCloudBuilder {
    fn provider(&self) -> Provider {
        Provider::SoundCloud
    }

    async fn build(&self, cancel: &CancellationToken, config: &FeedConfig) -> Result<Feed> {
        let info = resolve_info(config, Provider::SoundCloud)?;
        if info.kind != LinkKind::Playlist {
            return Err(VidcastError::UnsupportedKind {
                provider: Provider::SoundCloud,
                kind: info.kind,
            });
        }

        let client_id = cancellable(cancel, self.client_id()).await?;
        let link = normalize(&config.url)?;
        let url = endpoint(
            &format!("{}/resolve", API_URL),
            &[("url", link.as_str()), ("client_id", client_id)],
        );
        let playlist: Playlist = cancellable(
            cancel,
            fetch_json(self.fetcher.as_ref(), &FetchRequest::get(url)),
        )
        .await?;

        let mut feed = Feed::new(config, &info);
        feed.title = playlist.title;
        feed.description = playlist.description.unwrap_or_default();
        feed.author = playlist.user.as_ref().map(|u| u.username.clone());
        feed.cover_art = playlist
            .artwork_url
            .or_else(|| playlist.user.and_then(|u| u.avatar_url));
        if let Some(permalink) = playlist.permalink_url {
            feed.link = permalink;
        }

        let episodes = playlist
            .tracks
            .into_iter()
            .filter_map(|track| {
                let title = track.title?;
                let mut episode = Episode::new(track.id.to_string(), track.permalink_url?);
                episode.title = title;
                episode.description = track.description.unwrap_or_default();
                episode.thumbnail = track.artwork_url;
                episode.duration = track.full_duration.or(track.duration).unwrap_or_default() / 1000;
                episode.pub_date = track.display_date.or(track.created_at);
                Some(episode)
            })
            .collect();
        feed.set_episodes(episodes);

        tracing::info!(
            "Built SoundCloud feed {} with {} episodes",
            feed.display_title(),
            feed.episodes.len()
        );
        Ok(feed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetcher::stub::StubFetcher;

    const PAGE: &str = r#"<html><body>
<script crossorigin src="https://a-v2.sndcdn.com/assets/0-abc.js"></script>
<script crossorigin src="https://a-v2.sndcdn.com/assets/49-def.js"></script>
<script src="https://widget.sndcdn.com/other.js"></script>
</body></html>"#;

    const PLAYLIST: &str = r#"{
        "title": "Night Mix",
        "description": "Late tunes",
        "artwork_url": null,
        "permalink_url": "https://soundcloud.com/dj/sets/night-mix",
        "user": {"username": "dj", "avatar_url": "https://i1.sndcdn.com/avatar.jpg"},
        "tracks": [
            {
                "id": 11,
                "title": "Track one",
                "permalink_url": "https://soundcloud.com/dj/track-one",
                "full_duration": 180500,
                "display_date": "2024-02-01T00:00:00Z"
            },
            {"id": 12}
        ]
    }"#;

    #[test]
    fn test_script_sources() {
        let sources = script_sources(PAGE);
        assert_eq!(
            sources,
            vec![
                "https://a-v2.sndcdn.com/assets/0-abc.js".to_string(),
                "https://a-v2.sndcdn.com/assets/49-def.js".to_string(),
            ]
        );
    }

    #[test]
    fn test_find_client_id() {
        assert_eq!(
            find_client_id(r#"e.exports={client_id:"AbC123",env:"production"}"#),
            Some("AbC123".to_string())
        );
        assert_eq!(find_client_id("nothing here"), None);
        assert_eq!(find_client_id(r#"client_id:"""#), None);
    }

    #[tokio::test]
    async fn test_build_discovers_client_id_once() {
        let fetcher = Arc::new(
            StubFetcher::new()
                .route("https://soundcloud.com", PAGE)
                .route("https://a-v2.sndcdn.com/assets/0-abc.js", "var a=1;")
                .route(
                    "https://a-v2.sndcdn.com/assets/49-def.js",
                    r#"{client_id:"discovered"}"#,
                )
                .route("https://api-v2.soundcloud.com/resolve", PLAYLIST),
        );
        let builder = SoundCloudBuilder::new("", fetcher.clone());
        let cancel = CancellationToken::new();
        let config = FeedConfig::from_url("soundcloud.com/dj/sets/night-mix");

        let feed = builder.build(&cancel, &config).await.unwrap();
        builder.build(&cancel, &config).await.unwrap();

        assert_eq!(feed.title, "Night Mix");
        assert_eq!(feed.author, Some("dj".into()));
        assert_eq!(feed.cover_art, Some("https://i1.sndcdn.com/avatar.jpg".into()));
        assert_eq!(feed.link, "https://soundcloud.com/dj/sets/night-mix");
        assert_eq!(feed.episodes.len(), 1);
        assert_eq!(feed.episodes[0].duration, 180);

        let requests = fetcher.requests();
        let page_fetches = requests
            .iter()
            .filter(|r| r.url == "https://soundcloud.com")
            .count();
        assert_eq!(page_fetches, 1);
        assert!(requests
            .iter()
            .any(|r| r.url.contains("client_id=discovered")));
    }

    #[tokio::test]
    async fn test_configured_client_id_skips_discovery() {
        let fetcher = Arc::new(
            StubFetcher::new().route("https://api-v2.soundcloud.com/resolve", PLAYLIST),
        );
        let builder = SoundCloudBuilder::new("configured", fetcher.clone());
        let config = FeedConfig::from_url("https://soundcloud.com/dj/sets/night-mix");

        builder.build(&CancellationToken::new(), &config).await.unwrap();

        let requests = fetcher.requests();
        assert_eq!(requests.len(), 1);
        assert!(requests[0].url.contains("client_id=configured"));
    }

    #[tokio::test]
    async fn test_discovery_skips_unreachable_bundle() {
        // No route for the last bundle, so its fetch fails
        let fetcher = Arc::new(
            StubFetcher::new()
                .route("https://soundcloud.com", PAGE)
                .route(
                    "https://a-v2.sndcdn.com/assets/0-abc.js",
                    r#"{client_id:"fallback"}"#,
                )
                .route("https://api-v2.soundcloud.com/resolve", PLAYLIST),
        );
        let builder = SoundCloudBuilder::new("", fetcher.clone());
        let config = FeedConfig::from_url("https://soundcloud.com/dj/sets/night-mix");

        builder.build(&CancellationToken::new(), &config).await.unwrap();

        let requests = fetcher.requests();
        assert!(requests
            .iter()
            .any(|r| r.url == "https://a-v2.sndcdn.com/assets/49-def.js"));
        assert!(requests
            .iter()
            .any(|r| r.url.contains("client_id=fallback")));
    }

    #[tokio::test]
    async fn test_discovery_failure() {
        let fetcher = Arc::new(
            StubFetcher::new()
                .route("https://soundcloud.com", PAGE)
                .route("https://a-v2.sndcdn.com/assets/", "var a=1;"),
        );
        let builder = SoundCloudBuilder::new("", fetcher);
        let config = FeedConfig::from_url("https://soundcloud.com/dj/sets/night-mix");

        let err = builder
            .build(&CancellationToken::new(), &config)
            .await
            .unwrap_err();
        assert!(matches!(err, VidcastError::Credential(_)));
    }
}
