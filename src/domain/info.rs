use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::app::VidcastError;

/// Video hosting platform a link belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    YouTube,
    Vimeo,
    SoundCloud,
    Twitch,
    Bilibili,
}

impl Provider {
    /// All providers in host-matching priority order.
    pub const ALL: [Provider; 5] = [
        Provider::Bilibili,
        Provider::YouTube,
        Provider::Vimeo,
        Provider::SoundCloud,
        Provider::Twitch,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::YouTube => "youtube",
            Provider::Vimeo => "vimeo",
            Provider::SoundCloud => "soundcloud",
            Provider::Twitch => "twitch",
            Provider::Bilibili => "bilibili",
        }
    }

    /// Registered domain of the platform.
    pub fn domain(&self) -> &'static str {
        match self {
            Provider::YouTube => "youtube.com",
            Provider::Vimeo => "vimeo.com",
            Provider::SoundCloud => "soundcloud.com",
            Provider::Twitch => "twitch.tv",
            Provider::Bilibili => "bilibili.com",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Provider {
    type Err = VidcastError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "youtube" => Ok(Provider::YouTube),
            "vimeo" => Ok(Provider::Vimeo),
            "soundcloud" => Ok(Provider::SoundCloud),
            "twitch" => Ok(Provider::Twitch),
            "bilibili" => Ok(Provider::Bilibili),
            _ => Err(VidcastError::UnsupportedProvider(s.to_string())),
        }
    }
}

/// Category of resource a link identifies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkKind {
    Playlist,
    Channel,
    User,
    Group,
    Handle,
}

impl LinkKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            LinkKind::Playlist => "playlist",
            LinkKind::Channel => "channel",
            LinkKind::User => "user",
            LinkKind::Group => "group",
            LinkKind::Handle => "handle",
        }
    }
}

impl fmt::Display for LinkKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resource descriptor produced by [`parse_url`](crate::link::parse_url).
///
/// The shape of `id` depends on the provider and kind. Bilibili channels
/// use the composite form `"<mid>:<sid>"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Info {
    pub provider: Provider,
    pub kind: LinkKind,
    pub id: String,
}

impl Info {
    pub fn new(provider: Provider, kind: LinkKind, id: impl Into<String>) -> Self {
        Self {
            provider,
            kind,
            id: id.into(),
        }
    }

    /// Split a Bilibili channel id into `(mid, sid)`.
    pub fn bilibili_channel(&self) -> Option<(&str, &str)> {
        if self.provider != Provider::Bilibili || self.kind != LinkKind::Channel {
            return None;
        }
        self.id.split_once(':')
    }

    /// A link that parses back into this descriptor.
    ///
    /// SoundCloud playlists return `None`: the set owner is not part of
    /// the descriptor.
    pub fn canonical_url(&self) -> Option<Url> {
        let id = &self.id;
        // Query values are decoded when parsed, so they must be re-encoded
        let with_query = |base: &str, name: &str, value: &str| {
            let mut url = Url::parse(base).ok()?;
            url.query_pairs_mut().append_pair(name, value);
            Some(url)
        };

        let link = match (self.provider, self.kind) {
            (Provider::YouTube, LinkKind::Playlist) => {
                return with_query("https://www.youtube.com/playlist", "list", id.as_str());
            }
            (Provider::YouTube, LinkKind::Channel) => {
                format!("https://www.youtube.com/channel/{}", id)
            }
            (Provider::YouTube, LinkKind::User) => format!("https://www.youtube.com/user/{}", id),
            (Provider::YouTube, LinkKind::Handle) => format!("https://www.youtube.com/@{}", id),
            (Provider::Vimeo, LinkKind::Group) => format!("https://vimeo.com/groups/{}", id),
            (Provider::Vimeo, LinkKind::Channel) => format!("https://vimeo.com/channels/{}", id),
            (Provider::Vimeo, LinkKind::User) => format!("https://vimeo.com/{}", id),
            (Provider::Twitch, LinkKind::User) => format!("https://www.twitch.tv/{}", id),
            (Provider::Bilibili, LinkKind::User) => format!("https://space.bilibili.com/{}", id),
            (Provider::Bilibili, LinkKind::Channel) => {
                let (mid, sid) = self.bilibili_channel()?;
                return with_query(
                    &format!("https://space.bilibili.com/{}/channel/collectiondetail", mid),
                    "sid",
                    sid,
                );
            }
            _ => return None,
        };
        Url::parse(&link).ok()
    }
}

impl fmt::Display for Info {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.provider, self.kind, self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_from_str() {
        assert_eq!("youtube".parse::<Provider>().unwrap(), Provider::YouTube);
        assert_eq!("SoundCloud".parse::<Provider>().unwrap(), Provider::SoundCloud);
        assert_eq!(" bilibili ".parse::<Provider>().unwrap(), Provider::Bilibili);
    }

    #[test]
    fn test_unknown_provider_rejected() {
        let err = "unknown-provider".parse::<Provider>().unwrap_err();
        assert!(matches!(err, VidcastError::UnsupportedProvider(ref name) if name == "unknown-provider"));
        assert!(err.to_string().contains("unknown-provider"));
    }

    #[test]
    fn test_provider_serde_names() {
        for provider in Provider::ALL {
            let json = serde_json::to_string(&provider).unwrap();
            assert_eq!(json, format!("\"{}\"", provider.as_str()));
            let back: Provider = serde_json::from_str(&json).unwrap();
            assert_eq!(back, provider);
        }
    }

    #[test]
    fn test_bilibili_channel_split() {
        let info = Info::new(Provider::Bilibili, LinkKind::Channel, "123:456");
        assert_eq!(info.bilibili_channel(), Some(("123", "456")));

        let user = Info::new(Provider::Bilibili, LinkKind::User, "123");
        assert_eq!(user.bilibili_channel(), None);
    }

    #[test]
    fn test_soundcloud_has_no_canonical_url() {
        let info = Info::new(Provider::SoundCloud, LinkKind::Playlist, "my-set");
        assert!(info.canonical_url().is_none());
    }

    #[test]
    fn test_display() {
        let info = Info::new(Provider::YouTube, LinkKind::Handle, "someuser");
        assert_eq!(info.to_string(), "youtube/handle/someuser");
    }
}
