//! Error types for hent.

use thiserror::Error;

/// Library-level error type for hent operations.
#[derive(Error, Debug)]
pub enum HentError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Catalog error: {0}")]
    Catalog(String),

    #[error("Video search error: {0}")]
    Search(String),

    #[error("Match selection failed: {0}")]
    Matching(String),

    #[error("Audio download failed: {0}")]
    AudioDownload(String),

    #[error("Transcode failed: {0}")]
    Transcode(String),

    #[error("Tagging failed: {0}")]
    Tagging(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Tag library error: {0}")]
    Lofty(#[from] lofty::error::LoftyError),

    #[error("OpenAI API error: {0}")]
    OpenAI(String),

    #[error("External tool not found: {0}. Please install it and ensure it's in your PATH.")]
    ToolNotFound(String),

    #[error("External tool failed: {0}")]
    ToolFailed(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Result type alias for hent operations.
pub type Result<T> = std::result::Result<T, HentError>;
