use url::Url;

use super::segments;
use crate::app::LinkError;
use crate::domain::{LinkKind, Provider};

// - https://vimeo.com/groups/{id}
// - https://vimeo.com/channels/{id}
// - https://vimeo.com/{user}
pub(super) fn parse(url: &Url) -> Result<(LinkKind, String), LinkError> {
    let parts = segments(url);
    let first = parts.get(1).copied().unwrap_or_default();

    let (kind, id) = match first {
        "groups" => (LinkKind::Group, parts.get(2).copied().unwrap_or_default()),
        "channels" => (LinkKind::Channel, parts.get(2).copied().unwrap_or_default()),
        user => (LinkKind::User, user),
    };

    if id.is_empty() {
        return Err(LinkError::MissingIdentifier {
            provider: Provider::Vimeo,
            path: url.path().to_string(),
        });
    }

    Ok((kind, id.to_string()))
}
