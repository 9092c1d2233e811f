use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::domain::info::{Info, LinkKind, Provider};

pub const DEFAULT_PAGE_SIZE: usize = 50;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    Audio,
    #[default]
    Video,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Quality {
    #[default]
    High,
    Low,
}

impl FromStr for Format {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "audio" => Ok(Format::Audio),
            "video" => Ok(Format::Video),
            other => Err(format!("unknown format: {} (expected audio or video)", other)),
        }
    }
}

impl FromStr for Quality {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "high" => Ok(Quality::High),
            "low" => Ok(Quality::Low),
            other => Err(format!("unknown quality: {} (expected high or low)", other)),
        }
    }
}

/// Per-feed settings, usually read from the `[feeds.<id>]` config tables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedConfig {
    #[serde(default)]
    pub id: String,
    pub url: String,
    #[serde(default = "default_page_size")]
    pub page_size: usize,
    #[serde(default)]
    pub format: Format,
    #[serde(default)]
    pub quality: Quality,
    /// Upper bound on video height, ignored for audio feeds.
    #[serde(default)]
    pub max_height: Option<u32>,
}

fn default_page_size() -> usize {
    DEFAULT_PAGE_SIZE
}

impl FeedConfig {
    pub fn from_url(url: impl Into<String>) -> Self {
        let url = url.into();
        Self {
            id: Self::generate_id(&url),
            url,
            page_size: DEFAULT_PAGE_SIZE,
            format: Format::default(),
            quality: Quality::default(),
            max_height: None,
        }
    }

    /// Generate a short deterministic ID from the feed URL
    pub fn generate_id(url: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(url.trim().as_bytes());
        let mut id = hex::encode(hasher.finalize());
        id.truncate(12);
        id
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Episode {
    pub id: String,
    pub title: String,
    pub description: String,
    pub thumbnail: Option<String>,
    /// Duration in seconds, zero when unknown.
    pub duration: u64,
    pub video_url: String,
    /// Direct media stream, when one was resolved.
    pub media_url: Option<String>,
    pub pub_date: Option<DateTime<Utc>>,
    /// Media size in bytes, zero when unknown.
    pub size: u64,
    pub order: usize,
}

impl Episode {
    pub fn new(id: impl Into<String>, video_url: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: String::new(),
            description: String::new(),
            thumbnail: None,
            duration: 0,
            video_url: video_url.into(),
            media_url: None,
            pub_date: None,
            size: 0,
            order: 0,
        }
    }

    pub fn display_title(&self) -> &str {
        if self.title.is_empty() {
            "(Untitled)"
        } else {
            &self.title
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Feed {
    pub id: String,
    pub provider: Provider,
    pub kind: LinkKind,
    pub item_id: String,
    pub title: String,
    pub description: String,
    pub author: Option<String>,
    pub link: String,
    pub cover_art: Option<String>,
    pub format: Format,
    pub quality: Quality,
    pub page_size: usize,
    pub episodes: Vec<Episode>,
    pub updated_at: DateTime<Utc>,
}

impl Feed {
    pub fn new(config: &FeedConfig, info: &Info) -> Self {
        let link = info
            .canonical_url()
            .map(|u| u.to_string())
            .unwrap_or_else(|| config.url.clone());

        Self {
            id: config.id.clone(),
            provider: info.provider,
            kind: info.kind,
            item_id: info.id.clone(),
            title: String::new(),
            description: String::new(),
            author: None,
            link,
            cover_art: None,
            format: config.format,
            quality: config.quality,
            page_size: config.page_size,
            episodes: Vec::new(),
            updated_at: Utc::now(),
        }
    }

    pub fn display_title(&self) -> &str {
        if self.title.is_empty() {
            &self.link
        } else {
            &self.title
        }
    }

    /// Keep at most `page_size` episodes and number them in feed order.
    pub fn set_episodes(&mut self, mut episodes: Vec<Episode>) {
        episodes.truncate(self.page_size);
        for (order, episode) in episodes.iter_mut().enumerate() {
            episode.order = order;
        }
        self.episodes = episodes;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_generation_deterministic() {
        let id1 = FeedConfig::generate_id("https://vimeo.com/groups/abc");
        let id2 = FeedConfig::generate_id("https://vimeo.com/groups/abc");
        assert_eq!(id1, id2);
        assert_eq!(id1.len(), 12);
    }

    #[test]
    fn test_id_generation_unique() {
        let id1 = FeedConfig::generate_id("https://vimeo.com/groups/abc");
        let id2 = FeedConfig::generate_id("https://vimeo.com/groups/abd");
        assert_ne!(id1, id2);
    }

    #[test]
    fn test_feed_config_defaults_from_toml() {
        let config: FeedConfig = toml::from_str(r#"url = "https://twitch.tv/foo""#).unwrap();
        assert_eq!(config.page_size, DEFAULT_PAGE_SIZE);
        assert_eq!(config.format, Format::Video);
        assert_eq!(config.quality, Quality::High);
        assert!(config.max_height.is_none());
    }

    #[test]
    fn test_format_and_quality_from_str() {
        assert_eq!("Audio".parse::<Format>().unwrap(), Format::Audio);
        assert_eq!("low".parse::<Quality>().unwrap(), Quality::Low);
        assert!("flac".parse::<Format>().is_err());
    }

    #[test]
    fn test_set_episodes_truncates_and_orders() {
        let mut config = FeedConfig::from_url("https://twitch.tv/foo");
        config.page_size = 2;
        let info = Info::new(Provider::Twitch, LinkKind::User, "foo");
        let mut feed = Feed::new(&config, &info);

        feed.set_episodes(vec![
            Episode::new("a", "https://example.com/a"),
            Episode::new("b", "https://example.com/b"),
            Episode::new("c", "https://example.com/c"),
        ]);

        assert_eq!(feed.episodes.len(), 2);
        assert_eq!(feed.episodes[0].order, 0);
        assert_eq!(feed.episodes[1].id, "b");
        assert_eq!(feed.episodes[1].order, 1);
    }

    #[test]
    fn test_feed_link_falls_back_to_config_url() {
        let config = FeedConfig::from_url("https://soundcloud.com/user/sets/mix");
        let info = Info::new(Provider::SoundCloud, LinkKind::Playlist, "mix");
        let feed = Feed::new(&config, &info);
        assert_eq!(feed.link, "https://soundcloud.com/user/sets/mix");
        assert_eq!(feed.display_title(), "https://soundcloud.com/user/sets/mix");
    }
}
