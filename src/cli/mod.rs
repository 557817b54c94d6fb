//! CLI module for hent.

pub mod commands;
mod output;
pub mod preflight;

pub use output::Output;

use clap::{Args, Parser, Subcommand};

/// hent - fetch songs and albums as tagged audio files
///
/// Searches YouTube for each song, lets a language model pick the best
/// upload, then downloads, converts and tags it. Without songs or albums
/// hent starts an interactive prompt.
#[derive(Parser, Debug)]
#[command(name = "hent")]
#[command(version, about, long_about = None)]
#[command(args_conflicts_with_subcommands = true)]
pub struct Cli {
    /// Increase verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    #[command(flatten)]
    pub download: DownloadArgs,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Arguments for the default download mode.
#[derive(Args, Debug, Default, Clone)]
pub struct DownloadArgs {
    /// Songs to download, e.g. "Eagles - Hotel California"
    #[arg(short, long, num_args = 1..)]
    pub songs: Vec<String>,

    /// Albums to download
    #[arg(short, long, num_args = 1..)]
    pub albums: Vec<String>,

    /// Artist name (optional, improves album search accuracy)
    #[arg(long)]
    pub artist: Option<String>,

    /// Directory to save downloaded songs
    #[arg(short, long)]
    pub directory: Option<String>,

    /// Run in batch mode (non-interactive)
    #[arg(long)]
    pub batch: bool,

    /// Output format (mp3, m4a, ...)
    #[arg(short, long)]
    pub format: Option<String>,

    /// Audio quality (high, medium, low)
    #[arg(short, long)]
    pub quality: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Check system requirements and configuration
    Doctor,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Show configuration file path
    Path,

    /// Write a configuration file with the current values
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}
