use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::OnceCell;
use tokio_util::sync::CancellationToken;

use crate::app::error::Result;
use crate::builder::{new_builder_with, Builder};
use crate::config::Config;
use crate::domain::Provider;
use crate::downloader::{Downloader, YtDlp};
use crate::fetcher::http_fetcher::HttpFetcher;
use crate::fetcher::parallel::ParallelBuilder;
use crate::fetcher::Fetcher;

pub struct AppContext {
    pub config: Config,
    pub fetcher: Arc<dyn Fetcher>,
    pub downloader: Option<Arc<dyn Downloader>>,
    pub parallel_builder: ParallelBuilder,
    builders: HashMap<Provider, OnceCell<Arc<dyn Builder>>>,
}

impl AppContext {
    pub fn new(config: Config) -> Result<Self> {
        let workers = config.update.workers;
        Self::with_workers(config, workers)
    }

    pub fn with_workers(config: Config, workers: usize) -> Result<Self> {
        let fetcher: Arc<dyn Fetcher> = Arc::new(HttpFetcher::new()?);
        Ok(Self::with_fetcher(config, fetcher, workers))
    }

    pub fn with_fetcher(config: Config, fetcher: Arc<dyn Fetcher>, workers: usize) -> Self {
        let downloader: Option<Arc<dyn Downloader>> = if config.downloader.enabled {
            Some(Arc::new(YtDlp::new(config.downloader.clone())))
        } else {
            None
        };
        let builders = Provider::ALL
            .into_iter()
            .map(|provider| (provider, OnceCell::new()))
            .collect();

        Self {
            config,
            fetcher,
            downloader,
            parallel_builder: ParallelBuilder::with_workers(workers),
            builders,
        }
    }

    /// The shared builder for `provider`, created on first use.
    ///
    /// Failed constructions are not cached, so a later call retries.
    pub async fn builder(
        &self,
        cancel: &CancellationToken,
        provider: Provider,
    ) -> Result<Arc<dyn Builder>> {
        let key = self.config.tokens.key_for(provider);
        let init = || {
            new_builder_with(
                cancel,
                provider,
                key,
                self.downloader.clone(),
                self.fetcher.clone(),
            )
        };

        match self.builders.get(&provider) {
            Some(cell) => cell.get_or_try_init(init).await.cloned(),
            None => init().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::VidcastError;
    use crate::fetcher::stub::StubFetcher;

    #[tokio::test]
    async fn test_builder_is_cached_per_provider() {
        let ctx = AppContext::with_fetcher(Config::default(), Arc::new(StubFetcher::new()), 2);
        let cancel = CancellationToken::new();

        let first = ctx.builder(&cancel, Provider::Bilibili).await.unwrap();
        let second = ctx.builder(&cancel, Provider::Bilibili).await.unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.provider(), Provider::Bilibili);
    }

    #[tokio::test]
    async fn test_builder_uses_configured_tokens() {
        let mut config = Config::default();
        config.tokens.vimeo = "token".into();
        let fetcher = Arc::new(StubFetcher::new().route("https://api.vimeo.com/oauth/verify", "{}"));
        let ctx = AppContext::with_fetcher(config, fetcher.clone(), 2);

        ctx.builder(&CancellationToken::new(), Provider::Vimeo)
            .await
            .unwrap();

        let requests = fetcher.requests();
        assert!(requests[0]
            .headers
            .contains(&("Authorization".to_string(), "Bearer token".to_string())));
    }

    #[tokio::test]
    async fn test_failed_builder_is_retried() {
        let ctx = AppContext::with_fetcher(Config::default(), Arc::new(StubFetcher::new()), 2);
        let cancel = CancellationToken::new();

        for _ in 0..2 {
            let result = ctx.builder(&cancel, Provider::Twitch).await;
            assert!(matches!(result, Err(VidcastError::Credential(_))));
        }
    }

    #[test]
    fn test_downloader_follows_config() {
        let ctx = AppContext::with_fetcher(Config::default(), Arc::new(StubFetcher::new()), 1);
        assert!(ctx.downloader.is_none());

        let mut config = Config::default();
        config.downloader.enabled = true;
        let ctx = AppContext::with_fetcher(config, Arc::new(StubFetcher::new()), 1);
        assert!(ctx.downloader.is_some());
    }
}
