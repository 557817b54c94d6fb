//! Candidate search.
//!
//! Queries a video search backend and enriches every hit with engagement
//! statistics, producing the candidate list handed to the match selector.

mod youtube;

pub use youtube::YoutubeSearch;

use crate::error::Result;
use crate::retry::Backoff;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Default number of search results requested per query.
pub const DEFAULT_MAX_RESULTS: u32 = 10;

/// Engagement counts for a video. All zero when unavailable.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoStatistics {
    pub view_count: u64,
    pub like_count: u64,
    pub dislike_count: u64,
}

/// One raw search hit before statistics are attached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub video_id: String,
    pub title: String,
    pub description: String,
    pub channel_title: String,
    pub published_at: Option<DateTime<Utc>>,
}

/// A search result enriched with statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub video_id: String,
    pub title: String,
    pub description: String,
    pub channel_title: String,
    pub url: String,
    pub statistics: VideoStatistics,
    pub published_at: Option<DateTime<Utc>>,
}

impl Candidate {
    /// Build a candidate from a hit, its watch URL and statistics.
    pub fn from_hit(hit: SearchHit, url: String, statistics: VideoStatistics) -> Self {
        Self {
            video_id: hit.video_id,
            title: hit.title,
            description: hit.description,
            channel_title: hit.channel_title,
            url,
            statistics,
            published_at: hit.published_at,
        }
    }

    /// Publish date as shown to the match selector.
    pub fn published_display(&self) -> String {
        self.published_at
            .map(|d| d.to_rfc3339())
            .unwrap_or_else(|| "unknown".to_string())
    }
}

/// Trait for video search backends.
#[async_trait]
pub trait VideoSearchBackend: Send + Sync {
    /// Search videos, in the backend's relevance order.
    async fn search(&self, query: &str, max_results: u32) -> Result<Vec<SearchHit>>;

    /// Fetch engagement statistics for one video.
    async fn statistics(&self, video_id: &str) -> Result<VideoStatistics>;

    /// Watch URL for a video id.
    fn watch_url(&self, video_id: &str) -> String;
}

/// Searches for candidates with retry on the search call.
pub struct CandidateSearch {
    backend: Arc<dyn VideoSearchBackend>,
    backoff: Backoff,
}

impl CandidateSearch {
    pub fn new(backend: Arc<dyn VideoSearchBackend>, backoff: Backoff) -> Self {
        Self { backend, backoff }
    }

    /// Search for a query and attach statistics to every hit.
    ///
    /// The search call is retried with backoff; statistics failures degrade to
    /// zero counts. Returns an empty list once retries are exhausted.
    #[instrument(skip(self), fields(query = %query))]
    pub async fn search(&self, query: &str, max_results: u32) -> Vec<Candidate> {
        let hits = match self
            .backoff
            .retry(query, |_| self.backend.search(query, max_results))
            .await
        {
            Ok(hits) => hits,
            // The retry loop already logged the final error
            Err(_) => return Vec::new(),
        };

        info!("[{}] Search successful ({} results)", query, hits.len());

        let mut candidates = Vec::with_capacity(hits.len());
        for hit in hits {
            let statistics = match self.backend.statistics(&hit.video_id).await {
                Ok(stats) => stats,
                Err(e) => {
                    warn!("Error getting statistics for video {}: {}", hit.video_id, e);
                    VideoStatistics::default()
                }
            };
            let url = self.backend.watch_url(&hit.video_id);
            debug!("Candidate {} ({} views)", hit.video_id, statistics.view_count);
            candidates.push(Candidate::from_hit(hit, url, statistics));
        }

        candidates
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{fixtures, MockVideoSearch};
    use std::time::Duration;
    use tokio::time::Instant;

    #[tokio::test]
    async fn test_search_attaches_statistics_in_backend_order() {
        let backend = Arc::new(MockVideoSearch::new());
        backend.set_hits(vec![
            fixtures::search_hit("b", "Second by relevance", "Channel B"),
            fixtures::search_hit("a", "First by relevance", "Channel A"),
        ]);
        backend.set_statistics("a", fixtures::stats(100, 10, 1));
        backend.set_statistics("b", fixtures::stats(5_000, 300, 2));

        let search = CandidateSearch::new(backend.clone(), Backoff::default());
        let candidates = search.search("song", DEFAULT_MAX_RESULTS).await;

        let ids: Vec<&str> = candidates.iter().map(|c| c.video_id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a"]);
        assert_eq!(candidates[0].statistics.view_count, 5_000);
        assert_eq!(candidates[1].url, "https://www.youtube.com/watch?v=a");
        assert_eq!(backend.recorded_searches(), vec![("song".to_string(), 10)]);
    }

    #[tokio::test]
    async fn test_statistics_failure_degrades_to_zero() {
        let backend = Arc::new(MockVideoSearch::new());
        backend.set_hits(vec![fixtures::search_hit("x", "Song", "Channel")]);
        backend.fail_statistics("x");

        let search = CandidateSearch::new(backend, Backoff::default());
        let candidates = search.search("song", 5).await;

        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].statistics, VideoStatistics::default());
    }

    #[tokio::test(start_paused = true)]
    async fn test_search_failure_exhausts_retries_then_returns_empty() {
        let backend = Arc::new(MockVideoSearch::new());
        backend.fail_next_searches(u32::MAX);

        let search = CandidateSearch::new(backend.clone(), Backoff::new(3, Duration::from_secs(1)));
        let started = Instant::now();
        let candidates = search.search("song", 10).await;

        assert!(candidates.is_empty());
        assert_eq!(backend.search_attempts(), 3);
        // Slept 1s then 2s between the three attempts
        assert_eq!(started.elapsed(), Duration::from_secs(3));
    }

    #[tokio::test(start_paused = true)]
    async fn test_search_recovers_after_transient_failure() {
        let backend = Arc::new(MockVideoSearch::new());
        backend.set_hits(vec![fixtures::search_hit("x", "Song", "Channel")]);
        backend.fail_next_searches(1);

        let search = CandidateSearch::new(backend.clone(), Backoff::default());
        let candidates = search.search("song", 10).await;

        assert_eq!(candidates.len(), 1);
        assert_eq!(backend.search_attempts(), 2);
    }
}
