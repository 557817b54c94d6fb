//! Mock backends and fixtures for tests.
//!
//! Every external service sits behind a trait; the mocks here implement those
//! traits in memory, record what they were asked, and can be told to fail.
//!
//! # Example
//!
//! ```rust,ignore
//! use hent::testing::{fixtures, MockVideoSearch};
//!
//! let search = MockVideoSearch::new();
//! search.set_hits(vec![fixtures::search_hit("abc", "Eagles - Hotel California", "Eagles")]);
//! search.fail_next_searches(1);
//! ```

mod mock_audio;
mod mock_catalog;
mod mock_decision;
mod mock_video_search;

pub use mock_audio::{MockDownloader, MockTagWriter, MockTranscoder, TranscodeCall};
pub use mock_catalog::MockCatalog;
pub use mock_decision::MockDecisionBackend;
pub use mock_video_search::MockVideoSearch;

use std::sync::{Mutex, MutexGuard};

/// Lock a mock's state, ignoring poisoning from a panicked test thread.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Test fixtures and helper functions.
pub mod fixtures {
    use crate::catalog::{ArtistCredit, Medium, ReleaseDetail, ReleaseSummary, ReleaseTrack};
    use crate::matching::{MatchDecision, SelectedCandidate};
    use crate::search::{Candidate, SearchHit, VideoStatistics};

    /// Watch URL the mocks hand out for a video id.
    pub fn watch_url(video_id: &str) -> String {
        format!("https://www.youtube.com/watch?v={}", video_id)
    }

    /// A search hit with an empty description and no publish date.
    pub fn search_hit(video_id: &str, title: &str, channel: &str) -> SearchHit {
        SearchHit {
            video_id: video_id.to_string(),
            title: title.to_string(),
            description: String::new(),
            channel_title: channel.to_string(),
            published_at: None,
        }
    }

    pub fn stats(views: u64, likes: u64, dislikes: u64) -> VideoStatistics {
        VideoStatistics {
            view_count: views,
            like_count: likes,
            dislike_count: dislikes,
        }
    }

    /// A candidate with zero statistics.
    pub fn candidate(video_id: &str, title: &str, channel: &str) -> Candidate {
        Candidate::from_hit(
            search_hit(video_id, title, channel),
            watch_url(video_id),
            VideoStatistics::default(),
        )
    }

    /// A decision for a one-based index.
    pub fn decision(index: i64, title: &str) -> MatchDecision {
        MatchDecision {
            best_match_index: Some(index),
            correct_title: Some(title.to_string()),
            explanation: Some("Fixture decision".to_string()),
        }
    }

    pub fn selected(candidate: Candidate, normalized_title: &str) -> SelectedCandidate {
        SelectedCandidate {
            candidate,
            normalized_title: normalized_title.to_string(),
            explanation: None,
        }
    }

    /// An official release summary.
    pub fn release(id: &str, title: &str, score: u32) -> ReleaseSummary {
        ReleaseSummary {
            id: id.to_string(),
            score,
            title: Some(title.to_string()),
            status: Some("Official".to_string()),
            date: Some("1969-09-26".to_string()),
        }
    }

    /// A single-medium release credited to one artist.
    pub fn release_detail(id: &str, artist: &str, title: &str, tracks: &[&str]) -> ReleaseDetail {
        ReleaseDetail {
            id: id.to_string(),
            title: Some(title.to_string()),
            date: Some("1969-09-26".to_string()),
            artist_credit: vec![ArtistCredit {
                name: Some(artist.to_string()),
                joinphrase: None,
            }],
            media: vec![Medium {
                tracks: tracks
                    .iter()
                    .map(|t| ReleaseTrack {
                        title: Some(t.to_string()),
                        artist_credit: Vec::new(),
                        recording: None,
                    })
                    .collect(),
            }],
        }
    }
}
