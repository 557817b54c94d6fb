//! Transcoding downloaded streams with ffmpeg.

use crate::error::{HentError, Result};
use async_trait::async_trait;
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, instrument};

/// Output bitrate tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quality {
    High,
    Medium,
    Low,
}

impl Quality {
    /// Parse a tier name. Unknown names map to `Low`.
    pub fn parse(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "high" => Self::High,
            "medium" => Self::Medium,
            _ => Self::Low,
        }
    }

    /// ffmpeg bitrate argument for this tier.
    pub fn bitrate(self) -> &'static str {
        match self {
            Self::High => "320k",
            Self::Medium => "192k",
            Self::Low => "128k",
        }
    }
}

/// Audio codec used for an output format.
pub fn codec_for(format: &str) -> &'static str {
    if format.eq_ignore_ascii_case("mp3") {
        "libmp3lame"
    } else {
        "aac"
    }
}

/// Trait for audio transcoders.
#[async_trait]
pub trait Transcoder: Send + Sync {
    /// Re-encode `input` into `output` with the given codec and bitrate.
    /// Fails rather than replacing an existing `output`.
    async fn transcode(&self, input: &Path, output: &Path, codec: &str, bitrate: &str) -> Result<()>;
}

/// ffmpeg backed transcoder.
pub struct FfmpegTranscoder {
    ffmpeg_path: String,
}

impl FfmpegTranscoder {
    pub fn new(ffmpeg_path: &str) -> Self {
        Self {
            ffmpeg_path: ffmpeg_path.to_string(),
        }
    }
}

impl Default for FfmpegTranscoder {
    fn default() -> Self {
        Self::new("ffmpeg")
    }
}

#[async_trait]
impl Transcoder for FfmpegTranscoder {
    #[instrument(skip(self))]
    async fn transcode(&self, input: &Path, output: &Path, codec: &str, bitrate: &str) -> Result<()> {
        debug!("Transcoding {:?} -> {:?} ({} @ {})", input, output, codec, bitrate);

        let result = Command::new(&self.ffmpeg_path)
            .arg("-n")
            .arg("-loglevel").arg("error")
            .arg("-i").arg(input)
            .arg("-vn")
            .arg("-acodec").arg(codec)
            .arg("-b:a").arg(bitrate)
            .arg(output)
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .await;

        match result {
            Ok(out) if out.status.success() => Ok(()),
            Ok(out) => {
                let err = String::from_utf8_lossy(&out.stderr);
                Err(HentError::Transcode(format!("ffmpeg failed: {}", err.trim())))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(HentError::ToolNotFound(self.ffmpeg_path.clone()))
            }
            Err(e) => Err(HentError::Transcode(format!("ffmpeg error: {e}"))),
        }
    }
}
