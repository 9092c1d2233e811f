use chrono::Utc;
use feed_rs::model::Entry;
use feed_rs::parser;
use html_escape::decode_html_entities;

use crate::app::{Result, VidcastError};
use crate::domain::Episode;

#[derive(Debug, Clone, Default)]
pub struct FeedMeta {
    pub title: Option<String>,
    pub description: Option<String>,
    pub author: Option<String>,
    pub link: Option<String>,
}

/// Converts Atom/RSS video listings into episodes.
#[derive(Clone)]
pub struct Normalizer;

impl Default for Normalizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Normalizer {
    pub fn new() -> Self {
        Self
    }

    pub fn normalize(&self, body: &[u8]) -> Result<(FeedMeta, Vec<Episode>)> {
        let feed = parser::parse(body).map_err(|e| VidcastError::FeedParse(e.to_string()))?;

        let meta = FeedMeta {
            title: feed.title.map(|t| decode(&t.content)),
            description: feed.description.map(|d| decode(&d.content)),
            author: feed.authors.first().map(|a| a.name.clone()),
            link: feed
                .links
                .iter()
                .find(|l| l.rel.as_deref() == Some("alternate"))
                .or_else(|| feed.links.first())
                .map(|l| l.href.clone()),
        };

        let episodes = feed
            .entries
            .into_iter()
            .filter_map(|entry| self.episode(entry))
            .collect();

        Ok((meta, episodes))
    }

    fn episode(&self, entry: Entry) -> Option<Episode> {
        let link = entry.links.first().map(|l| l.href.clone());
        let id = match entry.id.strip_prefix("yt:video:") {
            Some(video_id) => video_id.to_string(),
            None if !entry.id.is_empty() => entry.id.clone(),
            None => link.clone()?,
        };

        let mut episode = Episode::new(id, link.unwrap_or_default());
        episode.title = entry.title.map(|t| decode(&t.content)).unwrap_or_default();
        episode.pub_date = entry
            .published
            .or(entry.updated)
            .map(|dt| dt.with_timezone(&Utc));

        let media = entry.media.first();
        episode.description = media
            .and_then(|m| m.description.as_ref())
            .map(|d| decode(&d.content))
            .or_else(|| entry.summary.map(|s| decode(&s.content)))
            .unwrap_or_default();
        episode.thumbnail = media
            .and_then(|m| m.thumbnails.first())
            .map(|t| t.image.uri.clone());
        episode.duration = media
            .and_then(|m| m.duration)
            .map(|d| d.as_secs())
            .unwrap_or_default();

        Some(episode)
    }
}

fn decode(text: &str) -> String {
    decode_html_entities(text).trim().to_string()
}
