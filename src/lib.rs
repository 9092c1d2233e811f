//! # vidcast
//!
//! Turns links to video platform channels, playlists, users and groups
//! into podcast-style feeds.
//!
//! ## Architecture
//!
//! ```text
//! link → Info → Builder (Fetcher, Normalizer, Downloader) → Feed
//! ```
//!
//! - [`link`]: Normalizes a pasted link and routes it to a platform parser
//! - [`builder`]: One feed builder per platform, chosen by [`builder::new_builder`]
//! - [`fetcher`]: HTTP access to platform APIs
//! - [`downloader`]: Direct media stream resolution through yt-dlp
//!
//! ## Quick Start
//!
//! ```bash
//! # What does a link point at?
//! vidcast parse https://www.youtube.com/@someuser
//!
//! # Build one feed as JSON
//! vidcast build https://vimeo.com/groups/motion --format audio
//!
//! # Build every feed listed in the config
//! vidcast update --output-dir feeds/
//! ```

/// Application context and error handling.
///
/// The [`AppContext`](app::AppContext) struct wires together config,
/// fetcher, downloader and the per-provider builders.
pub mod app;

/// Provider specific feed builders and the builder factory.
pub mod builder;

/// Command-line interface using clap.
///
/// - `parse <url> [--json]` - Show the descriptor for a link
/// - `build <url>` - Build one feed and dump it as JSON
/// - `update` - Build all configured feeds
/// - `providers` - List supported platforms
pub mod cli;

/// Configuration loaded from `~/.config/vidcast/config.toml`.
pub mod config;

/// Core domain models.
///
/// - [`Info`](domain::Info): What a link identifies
/// - [`FeedConfig`](domain::FeedConfig): Per-feed settings
/// - [`Feed`](domain::Feed) and [`Episode`](domain::Episode): Build output
pub mod domain;

pub mod downloader;

/// HTTP fetching.
///
/// - [`Fetcher`](fetcher::Fetcher): Async trait for platform requests
/// - [`HttpFetcher`](fetcher::http_fetcher::HttpFetcher): reqwest-based implementation
/// - [`ParallelBuilder`](fetcher::parallel::ParallelBuilder): Concurrent feed builds with a semaphore
pub mod fetcher;

/// Link parsing: URL normalization, host routing and per-platform path
/// parsers.
pub mod link;

/// Atom/RSS parsing into episodes.
pub mod normalizer;
