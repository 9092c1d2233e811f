use std::sync::Arc;

use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use vidcast::app::AppContext;
use vidcast::cli::{commands, Cli, Commands};
use vidcast::config::Config;
use vidcast::domain::FeedConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    if let Commands::Parse { url, json } = &cli.command {
        println!("{}", commands::parse_link(url, *json)?);
        return Ok(());
    }
    if let Commands::Providers = &cli.command {
        println!("{}", commands::list_providers());
        return Ok(());
    }

    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    let workers = cli.workers.unwrap_or(config.update.workers);
    let ctx = Arc::new(AppContext::with_workers(config, workers)?);

    let cancel = CancellationToken::new();
    tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("Interrupted, cancelling");
                cancel.cancel();
            }
        }
    });

    match cli.command {
        Commands::Build {
            url,
            page_size,
            format,
            quality,
            max_height,
            output,
        } => {
            let mut feed = FeedConfig::from_url(url);
            feed.page_size = page_size;
            feed.format = format;
            feed.quality = quality;
            feed.max_height = max_height;
            commands::build_and_dump(&ctx, &cancel, &feed, output.as_deref()).await?;
        }
        Commands::Update { output_dir } => {
            commands::update_feeds(ctx.clone(), &cancel, output_dir.as_deref()).await?;
        }
        Commands::Parse { .. } | Commands::Providers => {}
    }

    Ok(())
}
