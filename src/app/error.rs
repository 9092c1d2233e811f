use thiserror::Error;

use crate::domain::{LinkKind, Provider};

/// Failures while resolving a link into a resource descriptor.
///
/// All of these are deterministic for a given input and never worth
/// retrying.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LinkError {
    #[error("Invalid URL {link:?}: {source}")]
    InvalidUrl {
        link: String,
        #[source]
        source: url::ParseError,
    },

    #[error("Unsupported URL host {host:?} in {link:?}")]
    UnsupportedHost { link: String, host: String },

    #[error("Unsupported {provider} link format: {path}")]
    UnsupportedLinkFormat { provider: Provider, path: String },

    #[error("Missing identifier in {provider} link path: {path}")]
    MissingIdentifier { provider: Provider, path: String },

    #[error("Missing query parameter '{param}' in {provider} link")]
    MissingQueryParam {
        provider: Provider,
        param: &'static str,
    },
}

#[derive(Error, Debug)]
pub enum VidcastError {
    #[error(transparent)]
    Link(#[from] LinkError),

    #[error("Unsupported provider {0:?}")]
    UnsupportedProvider(String),

    #[error("Unsupported {provider} link type: {kind}")]
    UnsupportedKind { provider: Provider, kind: LinkKind },

    #[error("Feed URL belongs to {actual}, but the builder serves {expected}")]
    ProviderMismatch { expected: Provider, actual: Provider },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid JSON response: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Feed parsing error: {0}")]
    FeedParse(String),

    #[error("{provider} API error: {message}")]
    Api { provider: Provider, message: String },

    #[error("Credential error: {0}")]
    Credential(String),

    #[error("Downloader error: {0}")]
    Downloader(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Operation cancelled")]
    Cancelled,

    #[error("{0}")]
    Other(String),
}

impl VidcastError {
    pub fn api(provider: Provider, message: impl Into<String>) -> Self {
        VidcastError::Api {
            provider,
            message: message.into(),
        }
    }

    /// Whether retrying the same operation later may succeed.
    ///
    /// Network and remote API failures are transient; parse, credential
    /// format and configuration failures are not.
    pub fn is_transient(&self) -> bool {
        match self {
            VidcastError::Http(e) => {
                e.is_timeout()
                    || e.is_connect()
                    || e.is_request()
                    || e.status().is_some_and(|s| s.is_server_error() || s.as_u16() == 429)
            }
            VidcastError::Api { .. } | VidcastError::Io(_) => true,
            VidcastError::Link(_)
            | VidcastError::UnsupportedProvider(_)
            | VidcastError::UnsupportedKind { .. }
            | VidcastError::ProviderMismatch { .. }
            | VidcastError::Json(_)
            | VidcastError::FeedParse(_)
            | VidcastError::Credential(_)
            | VidcastError::Downloader(_)
            | VidcastError::Config(_)
            | VidcastError::Cancelled
            | VidcastError::Other(_) => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, VidcastError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_link_errors_are_not_transient() {
        let err: VidcastError = LinkError::UnsupportedHost {
            link: "https://example.com".into(),
            host: "example.com".into(),
        }
        .into();
        assert!(!err.is_transient());
        assert!(!VidcastError::UnsupportedProvider("x".into()).is_transient());
    }

    #[test]
    fn test_api_errors_are_transient() {
        let err = VidcastError::api(Provider::Bilibili, "code -799");
        assert!(err.is_transient());
        assert_eq!(err.to_string(), "bilibili API error: code -799");
    }

    #[test]
    fn test_link_error_keeps_input() {
        let err = LinkError::InvalidUrl {
            link: "https://exa mple.com".into(),
            source: url::ParseError::InvalidDomainCharacter,
        };
        assert!(err.to_string().contains("exa mple.com"));
    }
}
