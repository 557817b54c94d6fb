//! Album catalog resolution.
//!
//! Turns an album (and optional artist) into an ordered list of
//! "Artist - Title" track strings, each of which becomes an independent song query.

mod musicbrainz;

pub use musicbrainz::MusicBrainzCatalog;

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

const UNKNOWN_ARTIST: &str = "Unknown Artist";
const UNKNOWN_TITLE: &str = "Unknown Title";

/// A release returned by a catalog search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReleaseSummary {
    pub id: String,
    #[serde(default)]
    pub score: u32,
    #[serde(default)]
    pub title: Option<String>,
    /// Release status such as "Official", "Bootleg" or "Promotion".
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
}

impl ReleaseSummary {
    pub fn is_official(&self) -> bool {
        self.status.as_deref() == Some("Official")
    }
}

/// One credited artist, with the phrase joining it to the next credit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtistCredit {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub joinphrase: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recording {
    #[serde(default)]
    pub title: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReleaseTrack {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(rename = "artist-credit", default)]
    pub artist_credit: Vec<ArtistCredit>,
    #[serde(default)]
    pub recording: Option<Recording>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Medium {
    #[serde(default)]
    pub tracks: Vec<ReleaseTrack>,
}

/// Full release detail including media, tracks and artist credits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReleaseDetail {
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(rename = "artist-credit", default)]
    pub artist_credit: Vec<ArtistCredit>,
    #[serde(default)]
    pub media: Vec<Medium>,
}

impl ReleaseDetail {
    /// Release-level artist, if credited.
    pub fn artist(&self) -> Option<String> {
        credited_name(&self.artist_credit)
    }

    /// Four-digit release year, if the date carries one.
    pub fn year(&self) -> Option<String> {
        let date = self.date.as_deref()?;
        let year = date.get(..4)?;
        year.chars().all(|c| c.is_ascii_digit()).then(|| year.to_string())
    }
}

/// An album expanded into its track queries.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedAlbum {
    pub title: String,
    pub artist: String,
    pub year: Option<String>,
    pub tracks: Vec<String>,
}

/// Trait for album catalog backends.
#[async_trait]
pub trait CatalogBackend: Send + Sync {
    /// Search releases with a catalog query string.
    async fn search_releases(&self, query: &str) -> Result<Vec<ReleaseSummary>>;

    /// Fetch full detail for one release, or None if it does not exist.
    async fn release(&self, id: &str) -> Result<Option<ReleaseDetail>>;
}

/// Build the catalog query string for an album and optional artist.
pub fn build_query(album: &str, artist: Option<&str>) -> String {
    let mut query = format!("release:{}", album.trim());
    if let Some(artist) = artist.map(str::trim).filter(|a| !a.is_empty()) {
        query.push_str(&format!(" AND artist:{}", artist));
    }
    query
}

/// Sort releases by score, then official status, both descending.
///
/// The sort is stable, so equal releases keep the catalog's order.
pub fn rank_releases(releases: &mut [ReleaseSummary]) {
    releases.sort_by(|a, b| {
        (b.score, b.is_official()).cmp(&(a.score, a.is_official()))
    });
}

/// Join artist credits into a display name ("A & B", "A feat. B").
fn credited_name(credits: &[ArtistCredit]) -> Option<String> {
    let name: String = credits
        .iter()
        .filter_map(|c| {
            let name = c.name.as_deref()?;
            Some(format!("{}{}", name, c.joinphrase.as_deref().unwrap_or("")))
        })
        .collect();
    let name = name.trim();
    (!name.is_empty()).then(|| name.to_string())
}

/// Expand a release into "Artist - Title" strings in medium and track order.
pub fn track_strings(release: &ReleaseDetail) -> Vec<String> {
    let release_artist = release.artist();

    release
        .media
        .iter()
        .flat_map(|medium| medium.tracks.iter())
        .map(|track| {
            let artist = credited_name(&track.artist_credit)
                .or_else(|| release_artist.clone())
                .unwrap_or_else(|| UNKNOWN_ARTIST.to_string());
            let title = track
                .title
                .as_deref()
                .or_else(|| track.recording.as_ref().and_then(|r| r.title.as_deref()))
                .filter(|t| !t.trim().is_empty())
                .unwrap_or(UNKNOWN_TITLE);
            format!("{} - {}", artist, title)
        })
        .collect()
}

/// Resolves albums to track lists through a catalog backend.
pub struct CatalogResolver {
    backend: Arc<dyn CatalogBackend>,
}

impl CatalogResolver {
    pub fn new(backend: Arc<dyn CatalogBackend>) -> Self {
        Self { backend }
    }

    /// Resolve an album to its ordered track strings.
    ///
    /// Returns an empty list when nothing is found or the catalog is unreachable.
    pub async fn resolve(&self, album: &str, artist: Option<&str>) -> Vec<String> {
        self.resolve_album(album, artist)
            .await
            .map(|resolved| resolved.tracks)
            .unwrap_or_default()
    }

    /// Resolve an album along with the release title, artist and year.
    #[instrument(skip(self))]
    pub async fn resolve_album(&self, album: &str, artist: Option<&str>) -> Option<ResolvedAlbum> {
        let query = build_query(album, artist);

        let mut releases = match self.backend.search_releases(&query).await {
            Ok(releases) => releases,
            Err(e) => {
                warn!("Error querying catalog for '{}': {}", query, e);
                return None;
            }
        };

        if releases.is_empty() {
            warn!("No album found for query: {}", query);
            return None;
        }

        rank_releases(&mut releases);
        let best = &releases[0];
        debug!(
            "Selected release {} (score {}, status {:?}) out of {}",
            best.id,
            best.score,
            best.status,
            releases.len()
        );

        let detail = match self.backend.release(&best.id).await {
            Ok(Some(detail)) => detail,
            Ok(None) => {
                warn!("No release detail for {}", best.id);
                return None;
            }
            Err(e) => {
                warn!("Error fetching tracks for release {}: {}", best.id, e);
                return None;
            }
        };

        let tracks = track_strings(&detail);
        if tracks.is_empty() {
            warn!("No tracks found for release {}", detail.id);
            return None;
        }

        info!("Found {} tracks for album '{}'", tracks.len(), album);

        Some(ResolvedAlbum {
            title: detail
                .title
                .clone()
                .or_else(|| best.title.clone())
                .unwrap_or_else(|| album.to_string()),
            artist: detail
                .artist()
                .unwrap_or_else(|| UNKNOWN_ARTIST.to_string()),
            year: detail.year(),
            tracks,
        })
    }
}
