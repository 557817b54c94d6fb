//! hent - fetch songs and albums as tagged audio files
//!
//! A CLI tool that turns song and album queries into tagged audio files.
//!
//! The name "hent" is the Norwegian word for "fetch."
//!
//! # Overview
//!
//! For every song hent:
//! - Searches YouTube and collects engagement statistics for each result
//! - Asks a language model to pick the best upload and normalize its title
//! - Downloads the audio with yt-dlp and converts it with ffmpeg
//! - Writes title, artist, album and source tags
//!
//! Albums are first resolved to their track list through MusicBrainz.
//!
//! # Architecture
//!
//! - `config` - Settings and prompt templates
//! - `catalog` - Album to track list resolution
//! - `search` - Candidate search with statistics
//! - `matching` - LLM-assisted match selection
//! - `audio` - Download, transcode and tag backends
//! - `pipeline` - Fetch-and-transcode for one selected candidate
//! - `orchestrator` - Per-song, batch and album coordination
//! - `testing` - Mock backends and fixtures
//!
//! # Example
//!
//! ```rust,no_run
//! use hent::config::Settings;
//! use hent::orchestrator::Orchestrator;
//! use hent::query::SongQuery;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let orchestrator = Orchestrator::new(&settings)?;
//!
//!     let report = orchestrator
//!         .process_songs(&[SongQuery::new("Eagles - Hotel California")], &settings.download_dir())
//!         .await;
//!     println!("Downloaded {} songs", report.downloaded().len());
//!
//!     Ok(())
//! }
//! ```

pub mod audio;
pub mod catalog;
pub mod cli;
pub mod config;
pub mod error;
pub mod matching;
pub mod openai;
pub mod orchestrator;
pub mod pipeline;
pub mod query;
pub mod retry;
pub mod search;
pub mod testing;

pub use error::{HentError, Result};
