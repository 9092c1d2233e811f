//! Provider specific feed builders.
//!
//! [`new_builder`] picks the strategy for a [`Provider`]; the returned
//! [`Builder`] turns a [`FeedConfig`] into a [`Feed`]. Builders are
//! shared across refresh cycles and must tolerate concurrent `build`
//! calls.
//!
//! ```rust,ignore
//! use tokio_util::sync::CancellationToken;
//! use vidcast::builder::new_builder;
//! use vidcast::domain::{FeedConfig, Provider};
//!
//! let cancel = CancellationToken::new();
//! let builder = new_builder(&cancel, Provider::Bilibili, "", None).await?;
//! let feed = builder
//!     .build(&cancel, &FeedConfig::from_url("https://space.bilibili.com/123"))
//!     .await?;
//! ```

mod bilibili;
mod soundcloud;
mod twitch;
mod vimeo;
mod youtube;

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::app::{Result, VidcastError};
use crate::domain::{Feed, FeedConfig, Info, Provider};
use crate::downloader::Downloader;
use crate::fetcher::{Fetcher, HttpFetcher};
use crate::link::parse_url;

pub use bilibili::BilibiliBuilder;
pub use soundcloud::SoundCloudBuilder;
pub use twitch::TwitchBuilder;
pub use vimeo::VimeoBuilder;
pub use youtube::YouTubeBuilder;

#[async_trait]
pub trait Builder: Send + Sync {
    fn provider(&self) -> Provider;

    async fn build(&self, cancel: &CancellationToken, config: &FeedConfig) -> Result<Feed>;
}

/// Create the builder for `provider` with the default HTTP client.
///
/// `key` is the platform credential (may be empty for providers that
/// need none). Vimeo and Twitch validate it against the network before
/// returning.
pub async fn new_builder(
    cancel: &CancellationToken,
    provider: Provider,
    key: &str,
    downloader: Option<Arc<dyn Downloader>>,
) -> Result<Arc<dyn Builder>> {
    let fetcher: Arc<dyn Fetcher> = Arc::new(HttpFetcher::new()?);
    new_builder_with(cancel, provider, key, downloader, fetcher).await
}

/// Same as [`new_builder`] for a provider given by name, as stored in
/// configuration. Unknown names fail with
/// [`VidcastError::UnsupportedProvider`].
pub async fn new_builder_by_name(
    cancel: &CancellationToken,
    provider: &str,
    key: &str,
    downloader: Option<Arc<dyn Downloader>>,
) -> Result<Arc<dyn Builder>> {
    let provider: Provider = provider.parse()?;
    new_builder(cancel, provider, key, downloader).await
}

pub async fn new_builder_with(
    cancel: &CancellationToken,
    provider: Provider,
    key: &str,
    downloader: Option<Arc<dyn Downloader>>,
    fetcher: Arc<dyn Fetcher>,
) -> Result<Arc<dyn Builder>> {
    tracing::debug!("Creating {} builder", provider);

    let builder: Arc<dyn Builder> = match provider {
        Provider::YouTube => Arc::new(YouTubeBuilder::new(key, downloader, fetcher)),
        Provider::Vimeo => Arc::new(VimeoBuilder::new(cancel, key, fetcher).await?),
        Provider::SoundCloud => Arc::new(SoundCloudBuilder::new(key, fetcher)),
        Provider::Twitch => Arc::new(TwitchBuilder::new(cancel, key, fetcher).await?),
        Provider::Bilibili => Arc::new(BilibiliBuilder::new(fetcher)),
    };

    Ok(builder)
}

/// Race `future` against cancellation. Cancellation wins ties.
pub(crate) async fn cancellable<T, F>(cancel: &CancellationToken, future: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(VidcastError::Cancelled),
        result = future => result,
    }
}

/// Parse the feed URL and check it belongs to `expected`.
pub(crate) fn resolve_info(config: &FeedConfig, expected: Provider) -> Result<Info> {
    let info = parse_url(&config.url)?;
    if info.provider != expected {
        return Err(VidcastError::ProviderMismatch {
            expected,
            actual: info.provider,
        });
    }
    Ok(info)
}

/// `base?k=v&...` with form encoding.
pub(crate) fn endpoint(base: &str, params: &[(&str, &str)]) -> String {
    let query = url::form_urlencoded::Serializer::new(String::new())
        .extend_pairs(params)
        .finish();
    format!("{}?{}", base, query)
}
