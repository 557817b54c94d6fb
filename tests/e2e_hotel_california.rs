//! End-to-end song flow with every external service mocked.

use hent::audio::Quality;
use hent::config::{Prompts, Settings};
use hent::orchestrator::{FetchOptions, Orchestrator, SongOutcome};
use hent::query::SongQuery;
use hent::testing::{
    fixtures, MockCatalog, MockDecisionBackend, MockDownloader, MockTagWriter, MockTranscoder,
    MockVideoSearch,
};
use std::sync::Arc;

struct World {
    search: Arc<MockVideoSearch>,
    decision: Arc<MockDecisionBackend>,
    downloader: Arc<MockDownloader>,
    transcoder: Arc<MockTranscoder>,
    tagger: Arc<MockTagWriter>,
    temp: tempfile::TempDir,
    out: tempfile::TempDir,
}

impl World {
    fn new() -> Self {
        Self {
            search: Arc::new(MockVideoSearch::new()),
            decision: Arc::new(MockDecisionBackend::new()),
            downloader: Arc::new(MockDownloader::new()),
            transcoder: Arc::new(MockTranscoder::new()),
            tagger: Arc::new(MockTagWriter::new()),
            temp: tempfile::tempdir().unwrap(),
            out: tempfile::tempdir().unwrap(),
        }
    }

    fn orchestrator(&self, options: FetchOptions) -> Orchestrator {
        let mut settings = Settings::default();
        settings.general.temp_dir = self.temp.path().to_string_lossy().into_owned();

        Orchestrator::with_components(
            &settings,
            &Prompts::default(),
            Arc::new(MockCatalog::new()),
            self.search.clone(),
            self.decision.clone(),
            self.downloader.clone(),
            self.transcoder.clone(),
            self.tagger.clone(),
        )
        .unwrap()
        .with_options(options)
    }
}

fn hotel_california_results(world: &World) {
    world.search.set_hits(vec![
        fixtures::search_hit("live1977", "Eagles - Hotel California (Live 1977)", "Eagles Fan"),
        fixtures::search_hit("BciS5krYL80", "Eagles - Hotel California (Official Audio)", "Eagles"),
        fixtures::search_hit("cover42", "Hotel California - acoustic cover", "Guitar Guy"),
    ]);
    world.search.set_statistics("live1977", fixtures::stats(2_000_000, 10_000, 300));
    world.search.set_statistics("BciS5krYL80", fixtures::stats(150_000_000, 900_000, 12_000));
    world.search.set_statistics("cover42", fixtures::stats(40_000, 900, 20));
}

#[tokio::test]
async fn hotel_california_downloads_the_selected_candidate() {
    let world = World::new();
    hotel_california_results(&world);
    world
        .decision
        .set_decision(fixtures::decision(2, "Eagles - Hotel California"));

    let options = FetchOptions {
        format: "m4a".to_string(),
        quality: Quality::High,
        ..FetchOptions::default()
    };
    let outcome = world
        .orchestrator(options)
        .process_song(&SongQuery::new("Hotel California"), world.out.path())
        .await;

    let expected = world.out.path().join("Eagles - Hotel California.m4a");
    assert_eq!(outcome, SongOutcome::Downloaded(expected.clone()));
    assert!(expected.exists());

    // The second candidate's URL was fetched
    assert_eq!(
        world.downloader.recorded_urls(),
        vec!["https://www.youtube.com/watch?v=BciS5krYL80".to_string()]
    );

    // The selector saw all three candidates with their statistics
    let requests = world.decision.recorded_requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].candidate_count, 3);
    assert!(requests[0].user_prompt.contains("2. Title: Eagles - Hotel California (Official Audio), Channel: Eagles, Views: 150000000"));

    // Converted with the codec for the requested extension, tagged with the LLM title
    assert_eq!(world.transcoder.recorded_calls()[0].codec, "aac");
    let (tagged_path, tags) = &world.tagger.recorded_tags()[0];
    assert_eq!(tagged_path, &expected);
    assert_eq!(tags.artist, "Eagles");
    assert_eq!(tags.title, "Hotel California");
    assert_eq!(tags.album, None);
}

#[tokio::test]
async fn hotel_california_without_a_usable_decision_is_skipped() {
    let world = World::new();
    hotel_california_results(&world);
    world.decision.fail_with("rate limited");

    let report = world
        .orchestrator(FetchOptions::default())
        .process_songs(&[SongQuery::new("Hotel California")], world.out.path())
        .await;

    assert_eq!(report.songs[0].outcome, SongOutcome::NoMatch);
    assert_eq!(world.downloader.attempts(), 0);
    assert_eq!(std::fs::read_dir(world.out.path()).unwrap().count(), 0);
}
