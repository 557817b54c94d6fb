//! YouTube Data API v3 search backend.

use super::{SearchHit, VideoSearchBackend, VideoStatistics};
use crate::config::YoutubeSettings;
use crate::error::{HentError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use regex::{Captures, Regex};
use reqwest::Client;
use serde::{Deserialize, Deserializer};
use std::sync::OnceLock;
use std::time::Duration;
use tracing::{debug, instrument};
use url::Url;

const WATCH_URL: &str = "https://www.youtube.com/watch";

/// YouTube search and statistics client.
pub struct YoutubeSearch {
    http: Client,
    api_base: String,
    api_key: String,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    id: SearchItemId,
    snippet: Snippet,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchItemId {
    video_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Snippet {
    #[serde(default)]
    title: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    channel_title: String,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    published_at: Option<DateTime<Utc>>,
}

/// Parse an RFC 3339 timestamp, treating anything unparseable as absent.
fn lenient_timestamp<'de, D>(deserializer: D) -> std::result::Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.and_then(|s| match DateTime::parse_from_rfc3339(&s) {
        Ok(d) => Some(d.with_timezone(&Utc)),
        Err(e) => {
            debug!("Ignoring publish date '{}': {}", s, e);
            None
        }
    }))
}

#[derive(Debug, Deserialize)]
struct VideosResponse {
    #[serde(default)]
    items: Vec<VideoItem>,
}

#[derive(Debug, Deserialize)]
struct VideoItem {
    #[serde(default)]
    statistics: RawStatistics,
}

/// Counts arrive as decimal strings and may be hidden by the uploader.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawStatistics {
    view_count: Option<String>,
    like_count: Option<String>,
    dislike_count: Option<String>,
}

impl From<RawStatistics> for VideoStatistics {
    fn from(raw: RawStatistics) -> Self {
        let count = |v: Option<String>| v.and_then(|s| s.parse().ok()).unwrap_or(0);
        Self {
            view_count: count(raw.view_count),
            like_count: count(raw.like_count),
            dislike_count: count(raw.dislike_count),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiError,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    message: String,
}

impl YoutubeSearch {
    /// Create a client from YouTube settings. Requires an API key.
    pub fn new(settings: &YoutubeSettings) -> Result<Self> {
        let api_key = settings
            .api_key
            .clone()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| HentError::Config("YOUTUBE_API_KEY is not set".to_string()))?;

        let http = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_seconds))
            .build()?;

        Ok(Self {
            http,
            api_base: settings.api_base.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    async fn get<T: serde::de::DeserializeOwned>(
        &self,
        endpoint: &str,
        params: &[(&str, &str)],
    ) -> Result<T> {
        let response = self
            .http
            .get(format!("{}/{}", self.api_base, endpoint))
            .query(params)
            .query(&[("key", self.api_key.as_str())])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ApiErrorBody>(&body)
                .map(|b| b.error.message)
                .unwrap_or(body);
            return Err(HentError::Search(format!("{} returned {}: {}", endpoint, status, message)));
        }

        Ok(response.json().await?)
    }
}

#[async_trait]
impl VideoSearchBackend for YoutubeSearch {
    #[instrument(skip(self))]
    async fn search(&self, query: &str, max_results: u32) -> Result<Vec<SearchHit>> {
        let max_results = max_results.to_string();
        let response: SearchResponse = self
            .get(
                "search",
                &[
                    ("part", "snippet"),
                    ("q", query),
                    ("type", "video"),
                    ("maxResults", max_results.as_str()),
                ],
            )
            .await?;

        let hits: Vec<SearchHit> = response
            .items
            .into_iter()
            .filter_map(|item| {
                let video_id = item.id.video_id?;
                Some(SearchHit {
                    video_id,
                    title: unescape_html(&item.snippet.title),
                    description: unescape_html(&item.snippet.description),
                    channel_title: unescape_html(&item.snippet.channel_title),
                    published_at: item.snippet.published_at,
                })
            })
            .collect();

        debug!("YouTube returned {} videos", hits.len());
        Ok(hits)
    }

    async fn statistics(&self, video_id: &str) -> Result<VideoStatistics> {
        let response: VideosResponse = self
            .get("videos", &[("part", "statistics"), ("id", video_id)])
            .await?;

        Ok(response
            .items
            .into_iter()
            .next()
            .map(|item| item.statistics.into())
            .unwrap_or_default())
    }

    fn watch_url(&self, video_id: &str) -> String {
        watch_url(video_id)
    }
}

/// Build a YouTube watch URL for a video id.
pub(crate) fn watch_url(video_id: &str) -> String {
    Url::parse_with_params(WATCH_URL, &[("v", video_id)])
        .map(|u| u.to_string())
        .unwrap_or_else(|_| format!("{}?v={}", WATCH_URL, video_id))
}

/// Decode the HTML entities the Data API leaves in snippet text.
fn unescape_html(text: &str) -> String {
    static ENTITY: OnceLock<Regex> = OnceLock::new();
    let entity = ENTITY.get_or_init(|| {
        Regex::new(r"&(#[0-9]{1,7}|#[xX][0-9a-fA-F]{1,6}|quot|apos|lt|gt|amp|nbsp);").expect("Invalid regex")
    });

    // Single pass, so "&amp;quot;" decodes to "&quot;" and no further
    entity
        .replace_all(text, |caps: &Captures| {
            let name = &caps[1];
            let decoded = match name {
                "quot" => Some('"'),
                "apos" => Some('\''),
                "lt" => Some('<'),
                "gt" => Some('>'),
                "amp" => Some('&'),
                "nbsp" => Some('\u{a0}'),
                _ => {
                    let code = match name.strip_prefix("#x").or_else(|| name.strip_prefix("#X")) {
                        Some(hex) => u32::from_str_radix(hex, 16).ok(),
                        None => name[1..].parse::<u32>().ok(),
                    };
                    code.and_then(char::from_u32)
                }
            };
            decoded.map_or_else(|| caps[0].to_string(), String::from)
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_response_parsing() {
        let json = r#"{
            "kind": "youtube#searchListResponse",
            "items": [
                {
                    "id": {"kind": "youtube#video", "videoId": "BciS5krYL80"},
                    "snippet": {
                        "publishedAt": "2017-03-07T15:00:06Z",
                        "title": "Eagles - Hotel California (Official Audio)",
                        "description": "Official audio",
                        "channelTitle": "Eagles"
                    }
                },
                {
                    "id": {"kind": "youtube#channel", "channelId": "UC123"},
                    "snippet": {"title": "A channel"}
                }
            ]
        }"#;
        let parsed: SearchResponse = serde_json::from_str(json).unwrap();

        assert_eq!(parsed.items.len(), 2);
        assert_eq!(parsed.items[0].id.video_id.as_deref(), Some("BciS5krYL80"));
        assert!(parsed.items[0].snippet.published_at.is_some());
        assert!(parsed.items[1].id.video_id.is_none());
    }

    #[test]
    fn test_statistics_parsing_with_hidden_counts() {
        let json = r#"{"items": [{"id": "x", "statistics": {"viewCount": "1200345", "likeCount": "5000"}}]}"#;
        let parsed: VideosResponse = serde_json::from_str(json).unwrap();
        let stats: VideoStatistics = parsed.items.into_iter().next().unwrap().statistics.into();

        assert_eq!(stats.view_count, 1_200_345);
        assert_eq!(stats.like_count, 5_000);
        assert_eq!(stats.dislike_count, 0);
    }

    #[test]
    fn test_watch_url() {
        assert_eq!(watch_url("dQw4w9WgXcQ"), "https://www.youtube.com/watch?v=dQw4w9WgXcQ");
    }

    #[test]
    fn test_unescape_html() {
        assert_eq!(
            unescape_html("Guns N&#39; Roses - Sweet Child O&#39; Mine &amp; more"),
            "Guns N' Roses - Sweet Child O' Mine & more"
        );
        assert_eq!(unescape_html("&amp;quot;"), "&quot;");
    }

    #[test]
    fn test_unescape_numeric_entities() {
        assert_eq!(unescape_html("Don&#x27;t Stop Me Now"), "Don't Stop Me Now");
        assert_eq!(unescape_html("Beyonc&#233; &#X2014; Halo"), "Beyonc\u{e9} \u{2014} Halo");
        assert_eq!(unescape_html("&lt;3 &apos;em&apos;"), "<3 'em'");
        // Invalid code points stay as written
        assert_eq!(unescape_html("&#xD800; &unknown;"), "&#xD800; &unknown;");
    }

    #[test]
    fn test_unparseable_publish_date_is_dropped() {
        let json = r#"{
            "items": [
                {
                    "id": {"videoId": "BciS5krYL80"},
                    "snippet": {"publishedAt": "last tuesday", "title": "Eagles - Hotel California"}
                },
                {
                    "id": {"videoId": "09839DpTctU"},
                    "snippet": {"publishedAt": null, "title": "Eagles - Hotel California (Live)"}
                }
            ]
        }"#;
        let parsed: SearchResponse = serde_json::from_str(json).unwrap();

        assert_eq!(parsed.items.len(), 2);
        assert!(parsed.items[0].snippet.published_at.is_none());
        assert!(parsed.items[1].snippet.published_at.is_none());
        assert_eq!(parsed.items[0].snippet.title, "Eagles - Hotel California");
    }

    #[test]
    fn test_new_requires_api_key() {
        let settings = YoutubeSettings::default();
        assert!(matches!(YoutubeSearch::new(&settings), Err(HentError::Config(_))));
    }
}
