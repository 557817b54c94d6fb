//! Mock video search backend.

use super::{fixtures, lock};
use crate::error::{HentError, Result};
use crate::search::{SearchHit, VideoSearchBackend, VideoStatistics};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

/// In-memory video search.
#[derive(Debug, Default)]
pub struct MockVideoSearch {
    hits: Mutex<Vec<SearchHit>>,
    statistics: Mutex<HashMap<String, VideoStatistics>>,
    failing_statistics: Mutex<HashSet<String>>,
    searches: Mutex<Vec<(String, u32)>>,
    /// Searches still to fail before succeeding.
    failures_left: Mutex<u32>,
    attempts: Mutex<u32>,
}

impl MockVideoSearch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hits returned by every successful search.
    pub fn set_hits(&self, hits: Vec<SearchHit>) {
        *lock(&self.hits) = hits;
    }

    pub fn set_statistics(&self, video_id: &str, stats: VideoStatistics) {
        lock(&self.statistics).insert(video_id.to_string(), stats);
    }

    /// Make statistics lookups for this video fail.
    pub fn fail_statistics(&self, video_id: &str) {
        lock(&self.failing_statistics).insert(video_id.to_string());
    }

    /// Fail the next `n` search calls. `u32::MAX` fails forever.
    pub fn fail_next_searches(&self, n: u32) {
        *lock(&self.failures_left) = n;
    }

    /// Number of search calls, including failed ones.
    pub fn search_attempts(&self) -> u32 {
        *lock(&self.attempts)
    }

    /// Successful search calls as (query, max_results).
    pub fn recorded_searches(&self) -> Vec<(String, u32)> {
        lock(&self.searches).clone()
    }
}

#[async_trait]
impl VideoSearchBackend for MockVideoSearch {
    async fn search(&self, query: &str, max_results: u32) -> Result<Vec<SearchHit>> {
        *lock(&self.attempts) += 1;

        {
            let mut failures = lock(&self.failures_left);
            if *failures > 0 {
                if *failures != u32::MAX {
                    *failures -= 1;
                }
                return Err(HentError::Search("503 Service Unavailable".to_string()));
            }
        }

        lock(&self.searches).push((query.to_string(), max_results));
        let hits = lock(&self.hits).clone();
        Ok(hits.into_iter().take(max_results as usize).collect())
    }

    async fn statistics(&self, video_id: &str) -> Result<VideoStatistics> {
        if lock(&self.failing_statistics).contains(video_id) {
            return Err(HentError::Search(format!("no statistics for {}", video_id)));
        }
        Ok(lock(&self.statistics)
            .get(video_id)
            .copied()
            .unwrap_or_default())
    }

    fn watch_url(&self, video_id: &str) -> String {
        fixtures::watch_url(video_id)
    }
}
