//! Pipeline orchestrator for hent.
//!
//! Coordinates catalog resolution, candidate search, match selection and the
//! fetch pipeline for single songs, song batches and albums.

use crate::audio::{
    AudioDownloader, FfmpegTranscoder, LoftyTagWriter, Quality, TagWriter, Transcoder,
    YtDlpDownloader,
};
use crate::catalog::{CatalogBackend, CatalogResolver, MusicBrainzCatalog};
use crate::config::{Prompts, Settings};
use crate::error::Result;
use crate::matching::{DecisionBackend, MatchSelector, OpenAiDecisionBackend};
use crate::pipeline::FetchPipeline;
use crate::query::{AlbumContext, SongQuery};
use crate::retry::Backoff;
use crate::search::{CandidateSearch, VideoSearchBackend, YoutubeSearch};
use futures::stream::{self, StreamExt};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, instrument, warn};

/// Output and batching options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchOptions {
    /// Output extension, e.g. "mp3".
    pub format: String,
    pub quality: Quality,
    /// Search results considered per song.
    pub max_results: u32,
    /// Songs processed at once within a batch.
    pub concurrency: usize,
}

impl FetchOptions {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            format: settings.download.format.clone(),
            quality: Quality::parse(&settings.download.quality),
            max_results: settings.youtube.max_results,
            concurrency: settings.download.concurrent_downloads,
        }
    }
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self::from_settings(&Settings::default())
    }
}

/// What happened to one song.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SongOutcome {
    Downloaded(PathBuf),
    NoResults,
    NoMatch,
    FetchFailed,
}

impl SongOutcome {
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::Downloaded(path) => Some(path),
            _ => None,
        }
    }

    /// Short reason shown for skipped songs.
    pub fn reason(&self) -> &'static str {
        match self {
            Self::Downloaded(_) => "downloaded",
            Self::NoResults => "no search results",
            Self::NoMatch => "no suitable match",
            Self::FetchFailed => "download or conversion failed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SongReport {
    pub query: String,
    pub outcome: SongOutcome,
}

/// Per-song outcomes of a batch, in input order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub songs: Vec<SongReport>,
}

impl BatchReport {
    pub fn is_empty(&self) -> bool {
        self.songs.is_empty()
    }

    pub fn len(&self) -> usize {
        self.songs.len()
    }

    /// Paths of every file written.
    pub fn downloaded(&self) -> Vec<&Path> {
        self.songs.iter().filter_map(|s| s.outcome.path()).collect()
    }

    pub fn skipped(&self) -> Vec<&SongReport> {
        self.songs
            .iter()
            .filter(|s| s.outcome.path().is_none())
            .collect()
    }

    pub fn extend(&mut self, other: BatchReport) {
        self.songs.extend(other.songs);
    }
}

/// The main orchestrator for the hent pipeline.
pub struct Orchestrator {
    options: FetchOptions,
    resolver: CatalogResolver,
    search: CandidateSearch,
    selector: MatchSelector,
    pipeline: FetchPipeline,
}

impl Orchestrator {
    /// Create an orchestrator with the production backends.
    pub fn new(settings: &Settings) -> Result<Self> {
        let prompts = Prompts::load(settings.prompts.custom_dir.as_deref())?;

        let catalog: Arc<dyn CatalogBackend> = Arc::new(MusicBrainzCatalog::new(&settings.catalog)?);
        let search: Arc<dyn VideoSearchBackend> = Arc::new(YoutubeSearch::new(&settings.youtube)?);
        let decision: Arc<dyn DecisionBackend> =
            Arc::new(OpenAiDecisionBackend::new(&settings.llm, &prompts.matching)?);
        let downloader: Arc<dyn AudioDownloader> = Arc::new(YtDlpDownloader::new(
            &settings.download.ytdlp_path,
            settings.download.show_progress,
        ));
        let transcoder: Arc<dyn Transcoder> =
            Arc::new(FfmpegTranscoder::new(&settings.download.ffmpeg_path));
        let tagger: Arc<dyn TagWriter> = Arc::new(LoftyTagWriter::new());

        Self::with_components(
            settings, &prompts, catalog, search, decision, downloader, transcoder, tagger,
        )
    }

    /// Create an orchestrator with custom components.
    #[allow(clippy::too_many_arguments)]
    pub fn with_components(
        settings: &Settings,
        prompts: &Prompts,
        catalog: Arc<dyn CatalogBackend>,
        search: Arc<dyn VideoSearchBackend>,
        decision: Arc<dyn DecisionBackend>,
        downloader: Arc<dyn AudioDownloader>,
        transcoder: Arc<dyn Transcoder>,
        tagger: Arc<dyn TagWriter>,
    ) -> Result<Self> {
        let temp_dir = settings.temp_dir();
        std::fs::create_dir_all(&temp_dir)?;

        let backoff = Backoff::new(
            settings.download.max_retries,
            Duration::from_millis(settings.download.backoff_base_ms),
        );

        Ok(Self {
            options: FetchOptions::from_settings(settings),
            resolver: CatalogResolver::new(catalog),
            search: CandidateSearch::new(search, backoff),
            selector: MatchSelector::new(decision, prompts),
            pipeline: FetchPipeline::new(downloader, transcoder, tagger, backoff, temp_dir),
        })
    }

    /// Replace the output and batching options.
    pub fn with_options(mut self, options: FetchOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &FetchOptions {
        &self.options
    }

    /// Search, select and fetch one song.
    #[instrument(skip(self, output_dir), fields(query = %query.text))]
    pub async fn process_song(&self, query: &SongQuery, output_dir: &Path) -> SongOutcome {
        let label = query.text.as_str();
        info!("[{}] Processing", label);

        let candidates = self.search.search(label, self.options.max_results).await;
        if candidates.is_empty() {
            warn!("[{}] No results found", label);
            return SongOutcome::NoResults;
        }

        let Some(selected) = self.selector.select(label, &candidates).await else {
            warn!("[{}] No suitable match found", label);
            return SongOutcome::NoMatch;
        };

        match self
            .pipeline
            .fetch(
                query,
                &selected,
                output_dir,
                &self.options.format,
                self.options.quality,
            )
            .await
        {
            Some(path) => SongOutcome::Downloaded(path),
            None => {
                warn!("[{}] Failed to download", label);
                SongOutcome::FetchFailed
            }
        }
    }

    /// Process songs, at most `concurrency` at a time, reporting in input order.
    pub async fn process_songs(&self, queries: &[SongQuery], output_dir: &Path) -> BatchReport {
        let concurrency = self.options.concurrency.max(1);
        info!("Processing {} songs ({} at a time)", queries.len(), concurrency);

        let songs = stream::iter(queries)
            .map(|query| async move {
                SongReport {
                    query: query.text.clone(),
                    outcome: self.process_song(query, output_dir).await,
                }
            })
            .buffered(concurrency)
            .collect::<Vec<_>>()
            .await;

        BatchReport { songs }
    }

    /// Resolve an album and process each of its tracks.
    #[instrument(skip(self, output_dir))]
    pub async fn process_album(
        &self,
        album: &str,
        artist: Option<&str>,
        output_dir: &Path,
    ) -> BatchReport {
        let Some(resolved) = self.resolver.resolve_album(album, artist).await else {
            warn!("No tracks found for album: {}", album);
            return BatchReport::default();
        };

        info!(
            "Album '{}' by {} resolved to {} tracks",
            resolved.title,
            resolved.artist,
            resolved.tracks.len()
        );

        let context = AlbumContext {
            title: resolved.title,
            artist: resolved.artist,
            year: resolved.year,
        };
        let queries: Vec<SongQuery> = resolved
            .tracks
            .into_iter()
            .map(|track| SongQuery::new(track).with_album(context.clone()))
            .collect();

        self.process_songs(&queries, output_dir).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{
        fixtures, MockCatalog, MockDecisionBackend, MockDownloader, MockTagWriter,
        MockTranscoder, MockVideoSearch,
    };

    struct Harness {
        catalog: Arc<MockCatalog>,
        search: Arc<MockVideoSearch>,
        decision: Arc<MockDecisionBackend>,
        downloader: Arc<MockDownloader>,
        tagger: Arc<MockTagWriter>,
        temp: tempfile::TempDir,
        out: tempfile::TempDir,
    }

    impl Harness {
        fn new() -> Self {
            Self {
                catalog: Arc::new(MockCatalog::new()),
                search: Arc::new(MockVideoSearch::new()),
                decision: Arc::new(MockDecisionBackend::new()),
                downloader: Arc::new(MockDownloader::new()),
                tagger: Arc::new(MockTagWriter::new()),
                temp: tempfile::tempdir().unwrap(),
                out: tempfile::tempdir().unwrap(),
            }
        }

        fn orchestrator(&self, concurrency: usize) -> Orchestrator {
            let mut settings = Settings::default();
            settings.general.temp_dir = self.temp.path().to_string_lossy().into_owned();
            settings.download.concurrent_downloads = concurrency;
            settings.download.backoff_base_ms = 1;

            Orchestrator::with_components(
                &settings,
                &Prompts::default(),
                self.catalog.clone(),
                self.search.clone(),
                self.decision.clone(),
                self.downloader.clone(),
                Arc::new(MockTranscoder::new()),
                self.tagger.clone(),
            )
            .unwrap()
        }
    }

    #[tokio::test]
    async fn test_process_song_downloads_selected_candidate() {
        let h = Harness::new();
        h.search.set_hits(vec![fixtures::search_hit("v1", "Eagles - Hotel California", "Eagles")]);

        let outcome = h
            .orchestrator(1)
            .process_song(&SongQuery::new("Eagles - Hotel California"), h.out.path())
            .await;

        assert_eq!(
            outcome,
            SongOutcome::Downloaded(h.out.path().join("Eagles - Hotel California.mp3"))
        );
    }

    #[tokio::test]
    async fn test_no_results_skips_selector() {
        let h = Harness::new();
        let outcome = h
            .orchestrator(1)
            .process_song(&SongQuery::new("zzzz"), h.out.path())
            .await;

        assert_eq!(outcome, SongOutcome::NoResults);
        assert!(h.decision.recorded_requests().is_empty());
    }

    #[tokio::test]
    async fn test_batch_continues_after_skip() {
        let h = Harness::new();
        h.search.set_hits(vec![fixtures::search_hit("v1", "Song", "Channel")]);
        h.decision.set_decision(fixtures::decision(7, "Nobody - Nothing"));

        let report = h
            .orchestrator(1)
            .process_songs(&[SongQuery::new("a"), SongQuery::new("b")], h.out.path())
            .await;

        assert_eq!(report.len(), 2);
        assert!(report.downloaded().is_empty());
        assert_eq!(report.skipped().len(), 2);
        assert_eq!(report.songs[0].outcome, SongOutcome::NoMatch);
        assert_eq!(h.decision.recorded_requests().len(), 2);
    }

    #[tokio::test]
    async fn test_concurrent_batch_keeps_input_order() {
        let h = Harness::new();
        h.search.set_hits(vec![fixtures::search_hit("v1", "Song", "Channel")]);
        let queries: Vec<SongQuery> = (1..=4)
            .map(|i| SongQuery::new(format!("Artist {} - Song {}", i, i)))
            .collect();

        let report = h.orchestrator(3).process_songs(&queries, h.out.path()).await;

        let names: Vec<String> = report
            .downloaded()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(
            names,
            vec![
                "Artist 1 - Song 1.mp3",
                "Artist 2 - Song 2.mp3",
                "Artist 3 - Song 3.mp3",
                "Artist 4 - Song 4.mp3",
            ]
        );
    }

    #[tokio::test]
    async fn test_same_title_twice_keeps_both_files() {
        let h = Harness::new();
        h.search.set_hits(vec![fixtures::search_hit("v1", "Eagles - Hotel California", "Eagles")]);
        h.decision.set_decision(fixtures::decision(1, "Eagles - Hotel California"));

        let report = h
            .orchestrator(2)
            .process_songs(
                &[SongQuery::new("hotel california"), SongQuery::new("hotel california live")],
                h.out.path(),
            )
            .await;

        let downloaded = report.downloaded();
        assert_eq!(downloaded.len(), 2);
        assert_ne!(downloaded[0], downloaded[1]);
        assert!(downloaded.iter().all(|p| p.exists()));

        let mut on_disk: Vec<String> = std::fs::read_dir(h.out.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        on_disk.sort();
        assert_eq!(
            on_disk,
            vec!["Eagles - Hotel California (2).mp3", "Eagles - Hotel California.mp3"]
        );
    }

    #[tokio::test]
    async fn test_empty_album_yields_empty_report() {
        let h = Harness::new();
        let report = h
            .orchestrator(1)
            .process_album("Nonexistent", None, h.out.path())
            .await;

        assert!(report.is_empty());
        assert_eq!(h.search.search_attempts(), 0);
    }

    #[tokio::test]
    async fn test_album_tracks_carry_album_tags() {
        let h = Harness::new();
        h.catalog.add_release(
            fixtures::release("r1", "Abbey Road", 100),
            Some(fixtures::release_detail("r1", "The Beatles", "Abbey Road", &["Something"])),
        );
        h.search.set_hits(vec![fixtures::search_hit("v1", "The Beatles - Something", "The Beatles")]);

        let report = h
            .orchestrator(1)
            .process_album("Abbey Road", Some("The Beatles"), h.out.path())
            .await;

        assert_eq!(report.downloaded().len(), 1);
        let tags = &h.tagger.recorded_tags()[0].1;
        assert_eq!(tags.album.as_deref(), Some("Abbey Road"));
        assert_eq!(tags.year.as_deref(), Some("1969"));
        assert_eq!(h.downloader.recorded_urls(), vec![fixtures::watch_url("v1")]);
    }

    #[test]
    fn test_options_from_settings() {
        let mut settings = Settings::default();
        settings.download.quality = "medium".to_string();
        settings.download.format = "m4a".to_string();

        let options = FetchOptions::from_settings(&settings);
        assert_eq!(options.quality, Quality::Medium);
        assert_eq!(options.format, "m4a");
        assert_eq!(options.concurrency, 1);
    }
}
