use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;

use crate::app::{AppContext, Result, VidcastError};
use crate::domain::{Feed, FeedConfig};
use crate::link::parse_url;

pub const DEFAULT_WORKERS: usize = 4;

/// Builds many configured feeds concurrently.
pub struct ParallelBuilder {
    semaphore: Arc<Semaphore>,
}

impl Default for ParallelBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ParallelBuilder {
    pub fn new() -> Self {
        Self::with_workers(DEFAULT_WORKERS)
    }

    pub fn with_workers(workers: usize) -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(workers.max(1))),
        }
    }

    /// Build every feed, returning one result per feed id in input order.
    pub async fn build_all(
        &self,
        ctx: Arc<AppContext>,
        cancel: CancellationToken,
        feeds: Vec<FeedConfig>,
    ) -> Vec<(String, Result<Feed>)> {
        let mut handles = Vec::new();

        for config in feeds {
            let ctx = ctx.clone();
            let cancel = cancel.clone();
            let semaphore = self.semaphore.clone();

            let handle = tokio::spawn(async move {
                let result = match semaphore.acquire().await {
                    Ok(_permit) => build_single_feed(&ctx, &cancel, &config).await,
                    Err(_) => Err(VidcastError::Cancelled),
                };
                (config.id, result)
            });

            handles.push(handle);
        }

        let mut results = Vec::new();
        for handle in handles {
            match handle.await {
                Ok(result) => results.push(result),
                Err(e) => {
                    tracing::error!("Task join error: {}", e);
                }
            }
        }

        results
    }
}

async fn build_single_feed(
    ctx: &AppContext,
    cancel: &CancellationToken,
    config: &FeedConfig,
) -> Result<Feed> {
    if cancel.is_cancelled() {
        return Err(VidcastError::Cancelled);
    }

    let info = parse_url(&config.url)?;
    tracing::debug!("Building feed {} ({})", config.id, info);

    let builder = ctx.builder(cancel, info.provider).await?;
    builder.build(cancel, config).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::fetcher::stub::StubFetcher;

    const SPACE: &str = r#"{"code":0,"message":"0","data":{"name":"UP","sign":"","face":null}}"#;
    const VIDEOS: &str = r#"{"code":0,"message":"0","data":{"list":{"vlist":[
        {"bvid":"BV1","title":"One","length":"1:00","created":1704067200}
    ]}}}"#;

    fn context() -> Arc<AppContext> {
        let fetcher = Arc::new(
            StubFetcher::new()
                .route("https://api.bilibili.com/x/space/acc/info", SPACE)
                .route("https://api.bilibili.com/x/space/arc/search", VIDEOS),
        );
        Arc::new(AppContext::with_fetcher(Config::default(), fetcher, 2))
    }

    fn feed(id: &str, url: &str) -> FeedConfig {
        let mut config = FeedConfig::from_url(url);
        config.id = id.to_string();
        config
    }

    #[tokio::test]
    async fn test_build_all_reports_per_feed() {
        let ctx = context();
        let feeds = vec![
            feed("a", "https://space.bilibili.com/1"),
            feed("bad", "https://example.com/nope"),
            feed("b", "https://space.bilibili.com/2"),
        ];

        let results = ctx
            .parallel_builder
            .build_all(ctx.clone(), CancellationToken::new(), feeds)
            .await;

        assert_eq!(results.len(), 3);
        assert_eq!(results[0].0, "a");
        assert_eq!(results[0].1.as_ref().unwrap().episodes.len(), 1);
        assert!(matches!(results[1].1, Err(VidcastError::Link(_))));
        assert_eq!(results[2].0, "b");
        tokio_test::assert_ok!(&results[2].1);
    }

    #[tokio::test]
    async fn test_build_all_cancelled() {
        let ctx = context();
        let cancel = CancellationToken::new();
        cancel.cancel();

        let results = ctx
            .parallel_builder
            .build_all(ctx.clone(), cancel, vec![feed("a", "https://space.bilibili.com/1")])
            .await;

        assert!(matches!(results[0].1, Err(VidcastError::Cancelled)));
    }

    #[tokio::test]
    async fn test_build_all_empty() {
        let ctx = context();
        let results = ctx
            .parallel_builder
            .build_all(ctx.clone(), CancellationToken::new(), Vec::new())
            .await;
        assert!(results.is_empty());
    }
}
