use url::Url;

use super::segments;
use crate::app::LinkError;
use crate::domain::{LinkKind, Provider};

// - https://soundcloud.com/{user}/sets/{name}
pub(super) fn parse(url: &Url) -> Result<(LinkKind, String), LinkError> {
    let parts = segments(url);
    if parts.len() < 4 || parts[2] != "sets" {
        return Err(LinkError::UnsupportedLinkFormat {
            provider: Provider::SoundCloud,
            path: url.path().to_string(),
        });
    }

    let id = parts[3];
    if id.is_empty() {
        return Err(LinkError::MissingIdentifier {
            provider: Provider::SoundCloud,
            path: url.path().to_string(),
        });
    }

    Ok((LinkKind::Playlist, id.to_string()))
}
