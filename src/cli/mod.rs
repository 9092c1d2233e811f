pub mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::domain::{Format, Quality, DEFAULT_PAGE_SIZE};

#[derive(Parser)]
#[command(name = "vidcast")]
#[command(about = "Turn video platform links into podcast feeds", long_about = None)]
pub struct Cli {
    /// Config file (default: ~/.config/vidcast/config.toml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Number of feeds built in parallel (default: from config)
    #[arg(short, long, global = true)]
    pub workers: Option<usize>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show what a link resolves to
    Parse {
        /// Link to a channel, playlist, user or group
        url: String,

        /// Print the descriptor as JSON
        #[arg(long)]
        json: bool,
    },
    /// Build a single feed and dump it as JSON
    Build {
        /// Link to a channel, playlist, user or group
        url: String,

        /// Maximum number of episodes
        #[arg(long, default_value_t = DEFAULT_PAGE_SIZE)]
        page_size: usize,

        /// "audio" or "video"
        #[arg(long, default_value = "video")]
        format: Format,

        /// "high" or "low"
        #[arg(long, default_value = "high")]
        quality: Quality,

        /// Video height cap
        #[arg(long)]
        max_height: Option<u32>,

        /// Write to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Build every configured feed
    Update {
        /// Write one <id>.json per feed into this directory
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
    },
    /// List supported providers in matching order
    Providers,
}
