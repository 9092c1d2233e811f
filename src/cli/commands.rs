use std::fs;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::app::{AppContext, Result, VidcastError};
use crate::domain::{Feed, FeedConfig, Provider};
use crate::link::parse_url;

/// Describe what a link resolves to, as text or JSON.
pub fn parse_link(url: &str, json: bool) -> Result<String> {
    let info = parse_url(url)?;

    if json {
        return Ok(serde_json::to_string_pretty(&info)?);
    }

    let mut out = format!(
        "provider: {}\nkind:     {}\nid:       {}",
        info.provider, info.kind, info.id
    );
    if let Some(canonical) = info.canonical_url() {
        out.push_str(&format!("\nlink:     {}", canonical));
    }
    Ok(out)
}

pub fn list_providers() -> String {
    Provider::ALL
        .iter()
        .map(|p| format!("{:<12}{}", p.as_str(), p.domain()))
        .collect::<Vec<_>>()
        .join("\n")
}

pub async fn build_feed(
    ctx: &AppContext,
    cancel: &CancellationToken,
    config: &FeedConfig,
) -> Result<Feed> {
    let info = parse_url(&config.url)?;
    let builder = ctx.builder(cancel, info.provider).await?;
    builder.build(cancel, config).await
}

/// Build one feed and write it as JSON to `output` or stdout.
pub async fn build_and_dump(
    ctx: &AppContext,
    cancel: &CancellationToken,
    config: &FeedConfig,
    output: Option<&Path>,
) -> Result<()> {
    let feed = build_feed(ctx, cancel, config).await?;

    match output {
        Some(path) => {
            write_feed(&feed, path)?;
            println!(
                "Wrote {} ({} episodes) to {}",
                feed.display_title(),
                feed.episodes.len(),
                path.display()
            );
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            serde_json::to_writer_pretty(&mut stdout, &feed)?;
            writeln!(stdout)?;
        }
    }

    Ok(())
}

/// Totals reported by [`update_feeds`].
#[derive(Debug, Default, PartialEq, Eq)]
pub struct UpdateSummary {
    pub episodes: usize,
    pub errors: usize,
}

/// Build every configured feed. Failures of one feed, including writing
/// its file, are reported and counted without stopping the others.
pub async fn update_feeds(
    ctx: Arc<AppContext>,
    cancel: &CancellationToken,
    output_dir: Option<&Path>,
) -> Result<UpdateSummary> {
    let feeds = ctx.config.feed_configs();

    if feeds.is_empty() {
        println!("No feeds configured");
        return Ok(UpdateSummary::default());
    }

    if let Some(dir) = output_dir {
        fs::create_dir_all(dir)?;
    }

    println!("Updating {} feeds...", feeds.len());

    let results = ctx
        .parallel_builder
        .build_all(ctx.clone(), cancel.clone(), feeds)
        .await;

    let mut total_episodes = 0;
    let mut errors = 0;

    for (id, result) in results {
        match result {
            Ok(feed) => {
                total_episodes += feed.episodes.len();
                println!("  {} episodes in {}", feed.episodes.len(), feed.display_title());
                if let Some(dir) = output_dir {
                    let path = dir.join(format!("{}.json", id));
                    if let Err(e) = write_feed(&feed, &path) {
                        errors += 1;
                        tracing::error!("Could not write {}: {}", path.display(), e);
                        eprintln!("  Error writing {}: {}", path.display(), e);
                    }
                }
            }
            Err(VidcastError::Cancelled) => {
                errors += 1;
                eprintln!("  Cancelled {}", id);
            }
            Err(e) => {
                errors += 1;
                eprintln!("  Error updating {}: {}", id, e);
            }
        }
    }

    println!(
        "Update complete: {} episodes, {} errors",
        total_episodes, errors
    );
    Ok(UpdateSummary {
        episodes: total_episodes,
        errors,
    })
}

fn write_feed(feed: &Feed, path: &Path) -> Result<()> {
    let json = serde_json::to_vec_pretty(feed)?;
    fs::write(path, json)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::fetcher::stub::StubFetcher;

    const COLLECTION: &str = r#"{"code":0,"message":"0","data":{
        "archives": [{"bvid": "BV1aa", "title": "Part 1", "duration": 300, "pubdate": 1704067200}],
        "meta": {"name": "Series", "description": "", "cover": null}
    }}"#;

    fn context(config: Config) -> AppContext {
        let fetcher = Arc::new(StubFetcher::new().route(
            "https://api.bilibili.com/x/polymer/web-space/seasons_archives_list",
            COLLECTION,
        ));
        AppContext::with_fetcher(config, fetcher, 2)
    }

    #[test]
    fn test_parse_link_text() {
        let out = parse_link("youtube.com/@someuser", false).unwrap();
        assert!(out.contains("provider: youtube"));
        assert!(out.contains("kind:     handle"));
        assert!(out.contains("id:       someuser"));
        assert!(out.contains("https://www.youtube.com/@someuser"));
    }

    #[test]
    fn test_parse_link_json() {
        let out = parse_link("https://vimeo.com/groups/motion", true).unwrap();
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value["provider"], "vimeo");
        assert_eq!(value["kind"], "group");
        assert_eq!(value["id"], "motion");
    }

    #[test]
    fn test_parse_link_error() {
        let err = parse_link("https://example.com/foo", false).unwrap_err();
        assert!(matches!(err, VidcastError::Link(_)));
    }

    #[test]
    fn test_list_providers_in_priority_order() {
        let out = list_providers();
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 5);
        assert!(lines[0].starts_with("bilibili"));
        assert!(lines[4].ends_with("twitch.tv"));
    }

    #[tokio::test]
    async fn test_build_and_dump_to_file() {
        let ctx = context(Config::default());
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("feed.json");
        let config =
            FeedConfig::from_url("https://space.bilibili.com/1/channel/collectiondetail?sid=2");

        build_and_dump(&ctx, &CancellationToken::new(), &config, Some(&path))
            .await
            .unwrap();

        let feed: Feed = serde_json::from_slice(&fs::read(&path).unwrap()).unwrap();
        assert_eq!(feed.title, "Series");
        assert_eq!(feed.episodes[0].id, "BV1aa");
    }

    #[tokio::test]
    async fn test_update_writes_one_file_per_feed() {
        let mut config = Config::default();
        let mut feed = FeedConfig::from_url(
            "https://space.bilibili.com/1/channel/collectiondetail?sid=2",
        );
        feed.id = "series".into();
        config.feeds.insert("series".into(), feed);
        let ctx = Arc::new(context(config));
        let dir = tempfile::tempdir().unwrap();

        let summary = update_feeds(ctx, &CancellationToken::new(), Some(dir.path()))
            .await
            .unwrap();

        assert!(dir.path().join("series.json").exists());
        assert_eq!(summary, UpdateSummary { episodes: 1, errors: 0 });
    }

    #[tokio::test]
    async fn test_update_continues_after_write_failure() {
        let url = "https://space.bilibili.com/1/channel/collectiondetail?sid=2";
        let mut config = Config::default();
        for id in ["blocked", "series"] {
            let mut feed = FeedConfig::from_url(url);
            feed.id = id.into();
            config.feeds.insert(id.into(), feed);
        }
        let ctx = Arc::new(context(config));
        let dir = tempfile::tempdir().unwrap();
        // A directory in the way makes the file write fail
        fs::create_dir(dir.path().join("blocked.json")).unwrap();

        let summary = update_feeds(ctx, &CancellationToken::new(), Some(dir.path()))
            .await
            .unwrap();

        assert!(dir.path().join("series.json").is_file());
        assert_eq!(summary, UpdateSummary { episodes: 2, errors: 1 });
    }

    #[tokio::test]
    async fn test_update_without_feeds() {
        let ctx = Arc::new(context(Config::default()));
        let summary = update_feeds(ctx, &CancellationToken::new(), None)
            .await
            .unwrap();
        assert_eq!(summary, UpdateSummary::default());
    }
}
