use url::Url;

use super::{query_param, segments};
use crate::app::LinkError;
use crate::domain::{LinkKind, Provider};

// Only user spaces are feeds:
// - https://space.bilibili.com/{mid}
// - https://space.bilibili.com/{mid}/channel/collectiondetail?sid={sid}
pub(super) fn parse(url: &Url) -> Result<(LinkKind, String), LinkError> {
    let subdomain = url
        .host_str()
        .and_then(|host| host.split('.').next())
        .unwrap_or_default();
    if subdomain != "space" {
        return Err(unsupported(url));
    }

    let parts = segments(url);
    let mid = parts.get(1).copied().unwrap_or_default();
    if mid.is_empty() {
        return Err(LinkError::MissingIdentifier {
            provider: Provider::Bilibili,
            path: url.path().to_string(),
        });
    }

    if parts.len() == 2 {
        return Ok((LinkKind::User, mid.to_string()));
    }

    if parts[2] == "channel" {
        let sid = query_param(url, "sid").ok_or(LinkError::MissingQueryParam {
            provider: Provider::Bilibili,
            param: "sid",
        })?;
        return Ok((LinkKind::Channel, format!("{}:{}", mid, sid)));
    }

    Err(unsupported(url))
}

fn unsupported(url: &Url) -> LinkError {
    LinkError::UnsupportedLinkFormat {
        provider: Provider::Bilibili,
        path: url.path().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_str(link: &str) -> Result<(LinkKind, String), LinkError> {
        parse(&Url::parse(link).unwrap())
    }

    #[test]
    fn test_user_space() {
        let (kind, id) = parse_str("https://space.bilibili.com/123").unwrap();
        assert_eq!(kind, LinkKind::User);
        assert_eq!(id, "123");
    }

    #[test]
    fn test_collection() {
        let (kind, id) =
            parse_str("https://space.bilibili.com/123/channel/collectiondetail?sid=456").unwrap();
        assert_eq!(kind, LinkKind::Channel);
        assert_eq!(id, "123:456");
    }

    #[test]
    fn test_collection_missing_sid() {
        let err = parse_str("https://space.bilibili.com/123/channel/collectiondetail").unwrap_err();
        assert_eq!(
            err,
            LinkError::MissingQueryParam {
                provider: Provider::Bilibili,
                param: "sid"
            }
        );
        assert!(parse_str("https://space.bilibili.com/123/channel/collectiondetail?sid=").is_err());
    }

    #[test]
    fn test_requires_space_subdomain() {
        assert!(matches!(
            parse_str("https://www.bilibili.com/123"),
            Err(LinkError::UnsupportedLinkFormat { .. })
        ));
        assert!(parse_str("https://bilibili.com/123").is_err());
    }

    #[test]
    fn test_empty_path() {
        assert!(matches!(
            parse_str("https://space.bilibili.com/"),
            Err(LinkError::MissingIdentifier { .. })
        ));
    }

    #[test]
    fn test_unsupported_format() {
        assert!(matches!(
            parse_str("https://space.bilibili.com/123/video"),
            Err(LinkError::UnsupportedLinkFormat { .. })
        ));
    }
}
