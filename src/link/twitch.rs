use url::Url;

use super::segments;
use crate::app::LinkError;
use crate::domain::{LinkKind, Provider};

// - https://www.twitch.tv/samueletienne
pub(super) fn parse(url: &Url) -> Result<(LinkKind, String), LinkError> {
    let parts = segments(url);
    if parts.len() != 2 {
        return Err(LinkError::UnsupportedLinkFormat {
            provider: Provider::Twitch,
            path: url.path().to_string(),
        });
    }

    let id = parts[1];
    if id.is_empty() {
        return Err(LinkError::MissingIdentifier {
            provider: Provider::Twitch,
            path: url.path().to_string(),
        });
    }

    Ok((LinkKind::User, id.to_string()))
}
