//! Mock downloader, transcoder and tag writer.

use super::lock;
use crate::audio::{AudioDownloader, TagWriter, Transcoder, TrackTags};
use crate::error::{HentError, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Writes a small fake stream instead of running yt-dlp.
#[derive(Debug, Default)]
pub struct MockDownloader {
    fail_first: u32,
    attempts: Mutex<u32>,
    urls: Mutex<Vec<String>>,
}

impl MockDownloader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the first `n` download attempts.
    pub fn failing_first(n: u32) -> Self {
        Self {
            fail_first: n,
            ..Self::default()
        }
    }

    /// Number of download calls, including failed ones.
    pub fn attempts(&self) -> u32 {
        *lock(&self.attempts)
    }

    /// URLs of successful downloads, in call order.
    pub fn recorded_urls(&self) -> Vec<String> {
        lock(&self.urls).clone()
    }
}

#[async_trait]
impl AudioDownloader for MockDownloader {
    async fn download(&self, url: &str, work_dir: &Path, stem: &str, _label: &str) -> Result<PathBuf> {
        let attempt = {
            let mut attempts = lock(&self.attempts);
            *attempts += 1;
            *attempts
        };
        if attempt <= self.fail_first {
            return Err(HentError::AudioDownload(format!("simulated failure {}", attempt)));
        }

        std::fs::create_dir_all(work_dir)?;
        let path = work_dir.join(format!("{}.webm", stem));
        std::fs::write(&path, format!("audio from {}", url))?;
        lock(&self.urls).push(url.to_string());
        Ok(path)
    }
}

/// One recorded transcode call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscodeCall {
    pub input: PathBuf,
    pub output: PathBuf,
    pub codec: String,
    pub bitrate: String,
}

/// Copies the input to the output instead of running ffmpeg.
#[derive(Debug, Default)]
pub struct MockTranscoder {
    fail: bool,
    calls: Mutex<Vec<TranscodeCall>>,
}

impl MockTranscoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Leave a partial output behind and fail every call.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn recorded_calls(&self) -> Vec<TranscodeCall> {
        lock(&self.calls).clone()
    }
}

#[async_trait]
impl Transcoder for MockTranscoder {
    async fn transcode(&self, input: &Path, output: &Path, codec: &str, bitrate: &str) -> Result<()> {
        lock(&self.calls).push(TranscodeCall {
            input: input.to_path_buf(),
            output: output.to_path_buf(),
            codec: codec.to_string(),
            bitrate: bitrate.to_string(),
        });

        if self.fail {
            std::fs::write(output, b"partial")?;
            return Err(HentError::Transcode("simulated ffmpeg failure".to_string()));
        }

        std::fs::copy(input, output)?;
        Ok(())
    }
}

/// Records tags instead of writing them.
#[derive(Debug, Default)]
pub struct MockTagWriter {
    fail: bool,
    written: Mutex<Vec<(PathBuf, TrackTags)>>,
}

impl MockTagWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    /// Every write call as (path, tags), including failed ones.
    pub fn recorded_tags(&self) -> Vec<(PathBuf, TrackTags)> {
        lock(&self.written).clone()
    }
}

impl TagWriter for MockTagWriter {
    fn write(&self, path: &Path, tags: &TrackTags) -> Result<()> {
        lock(&self.written).push((path.to_path_buf(), tags.clone()));
        if self.fail {
            return Err(HentError::Tagging("simulated tag failure".to_string()));
        }
        Ok(())
    }
}
