//! Link resolution.
//!
//! Turns a user supplied link into an [`Info`] descriptor:
//!
//! ```text
//! raw string → normalize → host router → platform path parser → Info
//! ```
//!
//! Everything in here is pure and synchronous.

mod bilibili;
mod soundcloud;
mod twitch;
mod vimeo;
mod youtube;

use url::Url;

use crate::app::LinkError;
use crate::domain::{Info, LinkKind, Provider};

type PathParser = fn(&Url) -> Result<(LinkKind, String), LinkError>;

/// Host routing table in priority order. The first matching domain wins.
const ROUTES: [(Provider, PathParser); 5] = [
    (Provider::Bilibili, bilibili::parse),
    (Provider::YouTube, youtube::parse),
    (Provider::Vimeo, vimeo::parse),
    (Provider::SoundCloud, soundcloud::parse),
    (Provider::Twitch, twitch::parse),
];

/// Resolve a link into its provider, kind and platform identifier.
///
/// # Examples
///
/// ```
/// use vidcast::domain::{LinkKind, Provider};
/// use vidcast::link::parse_url;
///
/// let info = parse_url("youtube.com/playlist?list=PL123").unwrap();
/// assert_eq!(info.provider, Provider::YouTube);
/// assert_eq!(info.kind, LinkKind::Playlist);
/// assert_eq!(info.id, "PL123");
///
/// assert!(parse_url("https://example.com/feed").is_err());
/// ```
pub fn parse_url(link: &str) -> Result<Info, LinkError> {
    let parsed = normalize(link)?;
    let host = parsed.host_str().unwrap_or_default();

    for (provider, parser) in ROUTES {
        if !host_matches(host, provider.domain()) {
            continue;
        }

        tracing::debug!("Routing {} to {} parser", link, provider);
        let (kind, id) = parser(&parsed)?;
        return Ok(Info::new(provider, kind, id));
    }

    Err(LinkError::UnsupportedHost {
        link: link.to_string(),
        host: host.to_string(),
    })
}

/// Coerce a raw string into a URL, assuming `https` when no scheme is given.
pub fn normalize(link: &str) -> Result<Url, LinkError> {
    let trimmed = link.trim();
    let with_scheme = if has_http_scheme(trimmed) {
        trimmed.to_string()
    } else {
        format!("https://{}", trimmed)
    };

    Url::parse(&with_scheme).map_err(|source| LinkError::InvalidUrl {
        link: link.to_string(),
        source,
    })
}

fn has_http_scheme(link: &str) -> bool {
    let lower = link.get(..8).unwrap_or(link).to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

/// Exact domain or any subdomain of it. `evil-youtube.com` does not match.
fn host_matches(host: &str, domain: &str) -> bool {
    match host.strip_suffix(domain) {
        Some("") => true,
        Some(prefix) => prefix.ends_with('.'),
        None => false,
    }
}

/// Path split on `/`, keeping the empty leading segment.
fn segments(url: &Url) -> Vec<&str> {
    url.path().split('/').collect()
}

/// Value of the first occurrence of a query parameter. Empty counts as absent.
fn query_param(url: &Url, name: &str) -> Option<String> {
    url.query_pairs()
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.into_owned())
        .filter(|value| !value.is_empty())
}
