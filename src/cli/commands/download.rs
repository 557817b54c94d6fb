//! Download command: songs, albums, or the interactive prompt.

use super::interactive::run_interactive;
use crate::audio::Quality;
use crate::cli::preflight::{self, Operation};
use crate::cli::{DownloadArgs, Output};
use crate::config::Settings;
use crate::orchestrator::{BatchReport, FetchOptions, Orchestrator};
use crate::query::SongQuery;
use anyhow::{bail, Result};
use std::path::PathBuf;

/// Run the default download mode.
pub async fn run_download(args: &DownloadArgs, settings: Settings) -> Result<()> {
    if args.batch && args.songs.is_empty() && args.albums.is_empty() {
        bail!("Batch mode requires a list of songs or an album. Use -s/--songs or -a/--albums to specify.");
    }

    if let Err(e) = preflight::check(Operation::Download, &settings) {
        Output::error(&format!("{}", e));
        Output::info("Run 'hent doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    let options = fetch_options(args, &settings);
    let output_dir = output_dir(args, &settings);
    Output::kv("Output", &output_dir.display().to_string());
    Output::kv("Format", &format!("{} ({})", options.format, options.quality.bitrate()));

    let orchestrator = Orchestrator::new(&settings)?.with_options(options);

    if args.songs.is_empty() && args.albums.is_empty() {
        return run_interactive(&orchestrator, &output_dir).await;
    }

    let mut report = BatchReport::default();
    for album in &args.albums {
        Output::info(&format!("Album: {}", album));
        report.extend(
            orchestrator
                .process_album(album, args.artist.as_deref(), &output_dir)
                .await,
        );
    }

    if !args.songs.is_empty() {
        let queries: Vec<SongQuery> = args.songs.iter().map(SongQuery::new).collect();
        report.extend(orchestrator.process_songs(&queries, &output_dir).await);
    }

    Output::report(&report);
    Ok(())
}

/// Settings-derived options with command-line overrides.
fn fetch_options(args: &DownloadArgs, settings: &Settings) -> FetchOptions {
    let mut options = FetchOptions::from_settings(settings);
    if let Some(format) = args.format.as_deref().map(str::trim).filter(|f| !f.is_empty()) {
        options.format = format.trim_start_matches('.').to_ascii_lowercase();
    }
    if let Some(quality) = &args.quality {
        options.quality = Quality::parse(quality);
    }
    options
}

fn output_dir(args: &DownloadArgs, settings: &Settings) -> PathBuf {
    args.directory
        .as_deref()
        .map(Settings::expand_path)
        .unwrap_or_else(|| settings.download_dir())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_batch_without_songs_is_usage_error() {
        let args = DownloadArgs {
            batch: true,
            ..DownloadArgs::default()
        };
        let err = run_download(&args, Settings::default()).await.unwrap_err();
        assert!(err.to_string().contains("Batch mode requires"));
    }

    #[tokio::test]
    async fn test_missing_credentials_fail_before_work() {
        let root = tempfile::tempdir().unwrap();
        let mut settings = Settings::default();
        settings.general.temp_dir = root.path().join("tmp").to_string_lossy().into_owned();
        settings.general.download_dir = root.path().join("music").to_string_lossy().into_owned();
        let args = DownloadArgs {
            songs: vec!["Hotel California".to_string()],
            ..DownloadArgs::default()
        };

        let err = run_download(&args, settings).await.unwrap_err();

        assert!(err.to_string().contains("YOUTUBE_API_KEY"));
        assert_eq!(std::fs::read_dir(root.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_fetch_options_overrides() {
        let args = DownloadArgs {
            format: Some(".M4A".to_string()),
            quality: Some("medium".to_string()),
            ..DownloadArgs::default()
        };
        let options = fetch_options(&args, &Settings::default());
        assert_eq!(options.format, "m4a");
        assert_eq!(options.quality, Quality::Medium);

        let options = fetch_options(&DownloadArgs::default(), &Settings::default());
        assert_eq!(options.format, "mp3");
        assert_eq!(options.quality, Quality::High);
    }

    #[test]
    fn test_output_dir_prefers_argument() {
        let settings = Settings::default();
        let args = DownloadArgs {
            directory: Some("/srv/music".to_string()),
            ..DownloadArgs::default()
        };
        assert_eq!(output_dir(&args, &settings), PathBuf::from("/srv/music"));
        assert_eq!(output_dir(&DownloadArgs::default(), &settings), settings.download_dir());
    }
}
