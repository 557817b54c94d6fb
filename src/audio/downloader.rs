//! Audio download via yt-dlp.
//!
//! Fetches the best audio-only stream for a URL into a work directory and
//! reports byte progress while it runs.

use crate::error::{HentError, Result};
use async_trait::async_trait;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tokio::process::Command;
use tracing::{debug, info, instrument};

/// Prefix of the progress lines we ask yt-dlp to print.
const PROGRESS_MARKER: &str = "[hent-progress]";

/// Trait for audio downloaders.
#[async_trait]
pub trait AudioDownloader: Send + Sync {
    /// Download the best audio stream of `url` into `work_dir`, naming the file `{stem}.{ext}`.
    ///
    /// `label` identifies the song in logs and progress output.
    async fn download(&self, url: &str, work_dir: &Path, stem: &str, label: &str) -> Result<PathBuf>;
}

/// yt-dlp backed downloader.
pub struct YtDlpDownloader {
    ytdlp_path: String,
    show_progress: bool,
}

impl YtDlpDownloader {
    pub fn new(ytdlp_path: &str, show_progress: bool) -> Self {
        Self {
            ytdlp_path: ytdlp_path.to_string(),
            show_progress,
        }
    }

    fn progress_bar(&self, label: &str) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }

        let pb = ProgressBar::new(0);
        let style = ProgressStyle::default_bar()
            .template("  {msg:30!} [{bar:30.cyan/blue}] {bytes}/{total_bytes} ({bytes_per_sec})")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▓░");
        pb.set_style(style);
        pb.set_message(label.to_string());
        pb
    }
}

impl Default for YtDlpDownloader {
    fn default() -> Self {
        Self::new("yt-dlp", true)
    }
}

#[async_trait]
impl AudioDownloader for YtDlpDownloader {
    #[instrument(skip(self, work_dir), fields(label = %label))]
    async fn download(&self, url: &str, work_dir: &Path, stem: &str, label: &str) -> Result<PathBuf> {
        std::fs::create_dir_all(work_dir)?;
        info!("[{}] Downloading from URL: {}", label, url);

        let template = work_dir.join(format!("{}.%(ext)s", stem));
        let progress_template = format!(
            "download:{} %(progress.downloaded_bytes)s %(progress.total_bytes)s %(progress.total_bytes_estimate)s",
            PROGRESS_MARKER
        );

        let spawned = Command::new(&self.ytdlp_path)
            .arg("--format").arg("bestaudio")
            .arg("--no-playlist")
            .arg("--no-warnings")
            .arg("--newline")
            .arg("--progress-template").arg(&progress_template)
            .arg("--output").arg(&template)
            .arg(url)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn();

        let mut child = match spawned {
            Ok(child) => child,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(HentError::ToolNotFound(self.ytdlp_path.clone()));
            }
            Err(e) => {
                return Err(HentError::AudioDownload(format!("yt-dlp execution failed: {e}")));
            }
        };

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| HentError::AudioDownload("yt-dlp stdout unavailable".into()))?;
        let mut stderr = child
            .stderr
            .take()
            .ok_or_else(|| HentError::AudioDownload("yt-dlp stderr unavailable".into()))?;

        let stderr_task = tokio::spawn(async move {
            let mut buf = String::new();
            let _ = stderr.read_to_string(&mut buf).await;
            buf
        });

        let pb = self.progress_bar(label);
        let mut lines = BufReader::new(stdout).lines();
        while let Some(line) = lines.next_line().await? {
            match parse_progress(&line) {
                Some((downloaded, total)) => {
                    if let Some(total) = total {
                        pb.set_length(total);
                    }
                    pb.set_position(downloaded);
                }
                None => debug!("yt-dlp: {}", line),
            }
        }

        let status = child.wait().await?;
        let stderr_text = stderr_task.await.unwrap_or_default();

        if !status.success() {
            pb.abandon();
            return Err(HentError::AudioDownload(format!(
                "yt-dlp failed: {}",
                stderr_text.trim()
            )));
        }
        pb.finish_and_clear();

        let downloaded = find_downloaded_file(work_dir, stem)?;
        info!("[{}] Downloaded audio file: {}", label, downloaded.display());
        Ok(downloaded)
    }
}

/// Parse one of our progress lines into (downloaded, total) bytes.
fn parse_progress(line: &str) -> Option<(u64, Option<u64>)> {
    let rest = line.trim().strip_prefix(PROGRESS_MARKER)?;
    let mut fields = rest.split_whitespace().map(parse_bytes);
    let downloaded = fields.next()??;
    let total = fields.next().flatten();
    let estimate = fields.next().flatten();
    Some((downloaded, total.or(estimate)))
}

/// yt-dlp prints integers, floats, or "NA".
fn parse_bytes(field: &str) -> Option<u64> {
    field
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite() && *v >= 0.0)
        .map(|v| v as u64)
}

/// Locate the finished download for a stem, ignoring partial files.
fn find_downloaded_file(dir: &Path, stem: &str) -> Result<PathBuf> {
    let entries = std::fs::read_dir(dir)
        .map_err(|e| HentError::AudioDownload(format!("Cannot read directory: {e}")))?;

    for entry in entries.flatten() {
        let path = entry.path();
        let matches_stem = path.file_stem().and_then(|s| s.to_str()) == Some(stem);
        let partial = matches!(
            path.extension().and_then(|e| e.to_str()),
            Some("part") | Some("ytdl") | None
        );
        if matches_stem && !partial {
            return Ok(path);
        }
    }

    Err(HentError::AudioDownload("Audio file not found after download".into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_progress() {
        assert_eq!(
            parse_progress("[hent-progress] 1024 4096 NA"),
            Some((1024, Some(4096)))
        );
        assert_eq!(
            parse_progress("[hent-progress] 2048 NA 8192.5"),
            Some((2048, Some(8192)))
        );
        assert_eq!(parse_progress("[hent-progress] 10 NA NA"), Some((10, None)));
        assert_eq!(parse_progress("[hent-progress] NA NA NA"), None);
        assert_eq!(parse_progress("[youtube] Extracting URL"), None);
    }

    #[test]
    fn test_find_downloaded_file_skips_partials() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("abc-1.webm.part"), b"partial").unwrap();
        std::fs::write(dir.path().join("other.webm"), b"other").unwrap();
        assert!(find_downloaded_file(dir.path(), "abc-1").is_err());

        std::fs::write(dir.path().join("abc-1.webm"), b"audio").unwrap();
        let found = find_downloaded_file(dir.path(), "abc-1").unwrap();
        assert_eq!(found, dir.path().join("abc-1.webm"));
    }

    #[tokio::test]
    async fn test_missing_binary_is_tool_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let downloader = YtDlpDownloader::new("/nonexistent/bin/yt-dlp", false);
        let result = downloader
            .download("https://www.youtube.com/watch?v=x", dir.path(), "x", "test")
            .await;
        assert!(matches!(result, Err(HentError::ToolNotFound(_))));
    }
}
