//! Configuration settings for hent.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::debug;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub youtube: YoutubeSettings,
    pub llm: LlmSettings,
    pub catalog: CatalogSettings,
    pub download: DownloadSettings,
    pub prompts: PromptSettings,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Default directory for finished audio files.
    pub download_dir: String,
    /// Directory for intermediate downloads.
    pub temp_dir: String,
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            download_dir: "downloads".to_string(),
            temp_dir: "/tmp/hent".to_string(),
            log_level: "warn".to_string(),
        }
    }
}

/// YouTube Data API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct YoutubeSettings {
    /// YouTube Data API key (required).
    pub api_key: Option<String>,
    /// Base URL of the Data API.
    pub api_base: String,
    /// Number of search results handed to the match selector.
    pub max_results: u32,
    /// Request timeout in seconds.
    pub timeout_seconds: u64,
}

impl Default for YoutubeSettings {
    fn default() -> Self {
        Self {
            api_key: None,
            api_base: "https://www.googleapis.com/youtube/v3".to_string(),
            max_results: 10,
            timeout_seconds: 30,
        }
    }
}

/// Language model settings for match selection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmSettings {
    /// OpenAI API key (required).
    pub api_key: Option<String>,
    /// Alternative OpenAI-compatible endpoint.
    pub api_base: Option<String>,
    /// Chat model used for match decisions.
    pub model: String,
    /// Request timeout in seconds.
    pub timeout_seconds: u64,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            api_key: None,
            api_base: None,
            model: "gpt-4o".to_string(),
            timeout_seconds: 120,
        }
    }
}

/// MusicBrainz catalog settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogSettings {
    /// Base URL of the MusicBrainz web service.
    pub base_url: String,
    /// Identifying User-Agent sent with every request.
    pub user_agent: String,
    /// Minimum interval between requests in milliseconds.
    pub min_interval_ms: u64,
    /// Request timeout in seconds.
    pub timeout_seconds: u64,
}

impl Default for CatalogSettings {
    fn default() -> Self {
        Self {
            base_url: "https://musicbrainz.org/ws/2".to_string(),
            user_agent: format!(
                "hent/{} ( https://github.com/hent-cli/hent )",
                env!("CARGO_PKG_VERSION")
            ),
            min_interval_ms: 1000,
            timeout_seconds: 15,
        }
    }
}

/// Download, transcode and retry settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DownloadSettings {
    /// Attempts per search or download before giving up.
    pub max_retries: u32,
    /// Base delay for exponential backoff, in milliseconds.
    pub backoff_base_ms: u64,
    /// Songs processed at the same time within a batch.
    pub concurrent_downloads: usize,
    /// Target container/extension (mp3, m4a, ...).
    pub format: String,
    /// Bitrate tier (high, medium, low).
    pub quality: String,
    /// Path to the ffmpeg binary.
    pub ffmpeg_path: String,
    /// Path to the yt-dlp binary.
    pub ytdlp_path: String,
    /// Show byte progress bars while downloading.
    pub show_progress: bool,
}

impl Default for DownloadSettings {
    fn default() -> Self {
        Self {
            max_retries: 3,
            backoff_base_ms: 1000,
            concurrent_downloads: 1,
            format: "mp3".to_string(),
            quality: "high".to_string(),
            ffmpeg_path: "ffmpeg".to_string(),
            ytdlp_path: "yt-dlp".to_string(),
            show_progress: true,
        }
    }
}

/// Prompt customization settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct PromptSettings {
    /// Directory for custom prompts (overrides defaults).
    pub custom_dir: Option<String>,
}

impl Settings {
    /// Load settings from the default configuration file, then apply the environment.
    pub fn load() -> crate::error::Result<Self> {
        Self::load_from(None)
    }

    /// Load settings from a specific path, or default location if None.
    ///
    /// A `.env` file in the working directory is read first, and environment
    /// variables override values from the file.
    pub fn load_from(path: Option<&PathBuf>) -> crate::error::Result<Self> {
        let config_path = match path {
            Some(p) => p.clone(),
            None => Self::default_config_path(),
        };

        let mut settings = if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            toml::from_str(&content)?
        } else {
            Settings::default()
        };

        if let Ok(env_path) = dotenvy::dotenv() {
            debug!("Loaded environment from {}", env_path.display());
        }

        settings.apply_env(|key| std::env::var(key).ok())?;
        Ok(settings)
    }

    /// Override settings from environment-style lookups.
    pub fn apply_env<F>(&mut self, lookup: F) -> crate::error::Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(key) = get("YOUTUBE_API_KEY") {
            self.youtube.api_key = Some(key);
        }
        if let Some(key) = get("OPENAI_API_KEY") {
            self.llm.api_key = Some(key);
        }
        if let Some(base) = get("OPENAI_BASE_URL") {
            self.llm.api_base = Some(base);
        }
        if let Some(model) = get("OPENAI_MODEL") {
            self.llm.model = model;
        }
        if let Some(path) = get("FFMPEG_PATH") {
            self.download.ffmpeg_path = path;
        }
        if let Some(path) = get("YTDLP_PATH") {
            self.download.ytdlp_path = path;
        }
        if let Some(dir) = get("DEFAULT_DOWNLOAD_DIR") {
            self.general.download_dir = dir;
        }
        if let Some(value) = get("MAX_RETRIES") {
            self.download.max_retries = parse_env("MAX_RETRIES", &value)?;
        }
        if let Some(value) = get("CONCURRENT_DOWNLOADS") {
            self.download.concurrent_downloads = parse_env("CONCURRENT_DOWNLOADS", &value)?;
        }

        Ok(())
    }

    /// Save settings to a specific path.
    pub fn save_to(&self, path: &PathBuf) -> crate::error::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| crate::error::HentError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("hent")
            .join("config.toml")
    }

    /// Expand shell variables in paths (e.g., ~).
    pub fn expand_path(path: &str) -> PathBuf {
        PathBuf::from(shellexpand::tilde(path).to_string())
    }

    /// Get the expanded default download directory.
    pub fn download_dir(&self) -> PathBuf {
        Self::expand_path(&self.general.download_dir)
    }

    /// Get the expanded temp directory path.
    pub fn temp_dir(&self) -> PathBuf {
        Self::expand_path(&self.general.temp_dir)
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, value: &str) -> crate::error::Result<T> {
    value.trim().parse().map_err(|_| {
        crate::error::HentError::Config(format!("{} must be a number, got '{}'", key, value))
    })
}
