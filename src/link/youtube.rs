use url::Url;

use super::{query_param, segments};
use crate::app::LinkError;
use crate::domain::{LinkKind, Provider};

// Shapes are checked in order:
// - https://www.youtube.com/playlist?list=PLCB9F975ECF01953C
// - https://www.youtube.com/watch?v=rbCbho7aLYw&list=PLMpEfaKcGjpWEgNtdnsvLX6LzQL0UC0EM
// - https://www.youtube.com/channel/UCrlakW-ewUT8sOod6Wmzyow/videos
// - https://www.youtube.com/user/fxigr1
// - https://www.youtube.com/@username/videos
pub(super) fn parse(url: &Url) -> Result<(LinkKind, String), LinkError> {
    let parts = segments(url);
    let first = parts.get(1).copied().unwrap_or_default();

    match first {
        "playlist" | "watch" => {
            let id = query_param(url, "list").ok_or(LinkError::MissingQueryParam {
                provider: Provider::YouTube,
                param: "list",
            })?;
            Ok((LinkKind::Playlist, id))
        }
        "channel" => Ok((LinkKind::Channel, second_segment(url, &parts)?)),
        "user" => Ok((LinkKind::User, second_segment(url, &parts)?)),
        handle if handle.starts_with('@') => {
            let id = &handle[1..];
            if id.is_empty() {
                return Err(missing_identifier(url));
            }
            Ok((LinkKind::Handle, id.to_string()))
        }
        _ => Err(LinkError::UnsupportedLinkFormat {
            provider: Provider::YouTube,
            path: url.path().to_string(),
        }),
    }
}

fn second_segment(url: &Url, parts: &[&str]) -> Result<String, LinkError> {
    match parts.get(2) {
        Some(id) if !id.is_empty() => Ok(id.to_string()),
        _ => Err(missing_identifier(url)),
    }
}

fn missing_identifier(url: &Url) -> LinkError {
    LinkError::MissingIdentifier {
        provider: Provider::YouTube,
        path: url.path().to_string(),
    }
}
