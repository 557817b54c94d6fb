//! Fetch-and-transcode pipeline.
//!
//! Takes a selected candidate to a tagged audio file named
//! `{output_dir}/{Artist - Title}.{format}`.

use crate::audio::{codec_for, AudioDownloader, Quality, TagWriter, Transcoder, TrackTags};
use crate::matching::SelectedCandidate;
use crate::query::SongQuery;
use crate::retry::Backoff;
use regex::Regex;
use std::fs::OpenOptions;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

const MAX_NAME_ATTEMPTS: u32 = 1000;

/// Downloads, transcodes and tags one selected candidate.
pub struct FetchPipeline {
    downloader: Arc<dyn AudioDownloader>,
    transcoder: Arc<dyn Transcoder>,
    tagger: Arc<dyn TagWriter>,
    backoff: Backoff,
    temp_dir: PathBuf,
}

impl FetchPipeline {
    pub fn new(
        downloader: Arc<dyn AudioDownloader>,
        transcoder: Arc<dyn Transcoder>,
        tagger: Arc<dyn TagWriter>,
        backoff: Backoff,
        temp_dir: PathBuf,
    ) -> Self {
        Self {
            downloader,
            transcoder,
            tagger,
            backoff,
            temp_dir,
        }
    }

    /// Fetch the selected candidate and return the final file path.
    ///
    /// The download is retried with backoff. A transcode failure ends the song
    /// immediately. Tagging failures are logged and the file is kept. When
    /// the target name is taken, a numbered name is used instead.
    #[instrument(skip_all, fields(query = %query.text, video_id = %selected.candidate.video_id))]
    pub async fn fetch(
        &self,
        query: &SongQuery,
        selected: &SelectedCandidate,
        output_dir: &Path,
        format: &str,
        quality: Quality,
    ) -> Option<PathBuf> {
        let label = query.text.as_str();
        let candidate = &selected.candidate;

        let (artist, title) = match split_title(&selected.normalized_title) {
            Some(parts) => parts,
            None => {
                let artist = fallback_artist(&candidate.channel_title);
                warn!(
                    "[{}] Title '{}' has no ' - ' separator, using '{}' as artist",
                    label, selected.normalized_title, artist
                );
                (artist, selected.normalized_title.trim().to_string())
            }
        };

        if let Err(e) = std::fs::create_dir_all(output_dir) {
            warn!("[{}] Cannot create output directory {}: {}", label, output_dir.display(), e);
            return None;
        }

        let stem = format!("{}-{}", candidate.video_id, Uuid::new_v4().simple());
        let downloaded = match self
            .backoff
            .retry(label, |_| {
                self.downloader
                    .download(&candidate.url, &self.temp_dir, &stem, label)
            })
            .await
        {
            Ok(path) => path,
            Err(_) => return None,
        };

        let mut base = clean_filename(&format!("{} - {}", artist, title));
        if base.is_empty() {
            base = candidate.video_id.clone();
        }
        let staged = self.temp_dir.join(format!("{}.{}", stem, format));

        info!("[{}] Converting to {} at {}", label, format, quality.bitrate());
        if let Err(e) = self
            .transcoder
            .transcode(&downloaded, &staged, codec_for(format), quality.bitrate())
            .await
        {
            warn!("[{}] Error converting audio: {}", label, e);
            remove_quietly(&downloaded);
            remove_quietly(&staged);
            return None;
        }
        remove_quietly(&downloaded);

        let output = match place_output(&staged, output_dir, &base, format) {
            Ok(path) => path,
            Err(e) => {
                warn!("[{}] Cannot move converted file into {}: {}", label, output_dir.display(), e);
                remove_quietly(&staged);
                return None;
            }
        };
        if output.file_stem().map_or(false, |s| s != base.as_str()) {
            info!("[{}] '{}.{}' already exists, saving as {}", label, base, format, output.display());
        }

        let tags = TrackTags {
            title,
            artist,
            album: query.album.as_ref().map(|a| a.title.clone()),
            year: query.album.as_ref().and_then(|a| a.year.clone()),
            source_url: Some(candidate.url.clone()),
        };
        self.write_tags(label, &output, tags).await;

        info!("[{}] Saved {}", label, output.display());
        Some(output)
    }

    async fn write_tags(&self, label: &str, path: &Path, tags: TrackTags) {
        let tagger = Arc::clone(&self.tagger);
        let path_buf = path.to_path_buf();
        let result = tokio::task::spawn_blocking(move || tagger.write(&path_buf, &tags)).await;

        match result {
            Ok(Ok(())) => debug!("[{}] Metadata added", label),
            Ok(Err(e)) => warn!("[{}] Error adding metadata: {}", label, e),
            Err(e) => warn!("[{}] Tagging task failed: {}", label, e),
        }
    }
}

/// Split a normalized "Artist - Title" string on its first separator.
pub fn split_title(normalized: &str) -> Option<(String, String)> {
    let (artist, title) = normalized.split_once(" - ")?;
    let (artist, title) = (artist.trim(), title.trim());
    if artist.is_empty() || title.is_empty() {
        return None;
    }
    Some((artist.to_string(), title.to_string()))
}

/// Artist name derived from an uploading channel.
pub fn fallback_artist(channel: &str) -> String {
    let channel = channel.trim();
    channel
        .strip_suffix(" - Topic")
        .unwrap_or(channel)
        .trim()
        .to_string()
}

/// Strip characters that are invalid in filenames and collapse whitespace.
pub fn clean_filename(name: &str) -> String {
    static INVALID: OnceLock<Regex> = OnceLock::new();
    static WHITESPACE: OnceLock<Regex> = OnceLock::new();

    let invalid = INVALID.get_or_init(|| Regex::new(r#"[\\/*?:"<>|]"#).expect("Invalid regex"));
    let whitespace = WHITESPACE.get_or_init(|| Regex::new(r"\s+").expect("Invalid regex"));

    let stripped = invalid.replace_all(name, "");
    whitespace.replace_all(&stripped, " ").trim().to_string()
}

/// Move `staged` to the first free `{base}.{ext}`, `{base} (2).{ext}`, ...
/// in `dir`. Existing files are never replaced.
fn place_output(staged: &Path, dir: &Path, base: &str, format: &str) -> io::Result<PathBuf> {
    for n in 1..=MAX_NAME_ATTEMPTS {
        let name = if n == 1 {
            format!("{}.{}", base, format)
        } else {
            format!("{} ({}).{}", base, n, format)
        };
        let target = dir.join(name);

        // Claim the name first so concurrent songs cannot pick it as well
        match OpenOptions::new().write(true).create_new(true).open(&target) {
            Ok(_) => {
                if let Err(e) = move_file(staged, &target) {
                    remove_quietly(&target);
                    return Err(e);
                }
                return Ok(target);
            }
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => continue,
            Err(e) => return Err(e),
        }
    }

    Err(io::Error::new(
        io::ErrorKind::AlreadyExists,
        format!("no free file name for '{}.{}'", base, format),
    ))
}

fn move_file(from: &Path, to: &Path) -> io::Result<()> {
    if std::fs::rename(from, to).is_ok() {
        return Ok(());
    }
    // The temp dir may live on another filesystem
    std::fs::copy(from, to)?;
    std::fs::remove_file(from)
}

fn remove_quietly(path: &Path) {
    if path.exists() {
        if let Err(e) = std::fs::remove_file(path) {
            debug!("Could not remove {}: {}", path.display(), e);
        }
    }
}
