//! Audio acquisition: download, transcode and tag.

pub mod downloader;
pub mod tagging;
pub mod transcode;

pub use downloader::{AudioDownloader, YtDlpDownloader};
pub use tagging::{LoftyTagWriter, TagWriter, TrackTags};
pub use transcode::{codec_for, FfmpegTranscoder, Quality, Transcoder};
