//! Pre-flight checks before expensive operations.
//!
//! Validates that required tools and credentials are available
//! before starting work that would otherwise fail midway.

use crate::config::Settings;
use crate::error::{HentError, Result};
use std::process::Command;

/// Requirements for different operations.
#[derive(Debug, Clone, Copy)]
pub enum Operation {
    /// Downloading needs both API keys, yt-dlp and ffmpeg.
    Download,
}

/// Run pre-flight checks for the given operation.
///
/// Returns Ok(()) if all checks pass, or an error describing what's missing.
pub fn check(operation: Operation, settings: &Settings) -> Result<()> {
    match operation {
        Operation::Download => {
            check_api_keys(settings)?;
            check_tool(&settings.download.ytdlp_path)?;
            check_tool(&settings.download.ffmpeg_path)?;
        }
    }
    Ok(())
}

/// Names of required API keys that are missing or blank.
pub fn missing_api_keys(settings: &Settings) -> Vec<&'static str> {
    let blank = |key: &Option<String>| key.as_deref().map_or(true, |k| k.trim().is_empty());

    let mut missing = Vec::new();
    if blank(&settings.youtube.api_key) {
        missing.push("YOUTUBE_API_KEY");
    }
    if blank(&settings.llm.api_key) {
        missing.push("OPENAI_API_KEY");
    }
    missing
}

fn check_api_keys(settings: &Settings) -> Result<()> {
    let missing = missing_api_keys(settings);
    if missing.is_empty() {
        return Ok(());
    }
    Err(HentError::Config(format!(
        "Missing required environment variables: {}. Set them in your environment or in a .env file.",
        missing.join(", ")
    )))
}

/// Check if an external tool is available.
fn check_tool(path: &str) -> Result<()> {
    match Command::new(path).arg(version_arg(path)).output() {
        Ok(output) if output.status.success() => Ok(()),
        Ok(_) => Err(HentError::ToolNotFound(format!(
            "{} is installed but not working correctly",
            path
        ))),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(HentError::ToolNotFound(path.to_string()))
        }
        Err(e) => Err(HentError::ToolNotFound(format!("{}: {}", path, e))),
    }
}

/// ffmpeg uses -version (single dash), others use --version.
pub(crate) fn version_arg(path: &str) -> &'static str {
    let name = std::path::Path::new(path)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(path);
    match name {
        "ffmpeg" | "ffprobe" => "-version",
        _ => "--version",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_keys_are_reported_together() {
        let err = check(Operation::Download, &Settings::default()).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("YOUTUBE_API_KEY"));
        assert!(message.contains("OPENAI_API_KEY"));
    }

    #[test]
    fn test_blank_key_counts_as_missing() {
        let mut settings = Settings::default();
        settings.youtube.api_key = Some("yt-key".to_string());
        settings.llm.api_key = Some("  ".to_string());
        assert_eq!(missing_api_keys(&settings), vec!["OPENAI_API_KEY"]);
    }

    #[test]
    fn test_missing_tool() {
        let mut settings = Settings::default();
        settings.youtube.api_key = Some("yt-key".to_string());
        settings.llm.api_key = Some("sk-test".to_string());
        settings.download.ytdlp_path = "/nonexistent/yt-dlp".to_string();

        let err = check(Operation::Download, &settings).unwrap_err();
        assert!(matches!(err, HentError::ToolNotFound(_)));
    }

    #[test]
    fn test_version_arg() {
        assert_eq!(version_arg("ffmpeg"), "-version");
        assert_eq!(version_arg("/opt/bin/ffmpeg"), "-version");
        assert_eq!(version_arg("yt-dlp"), "--version");
    }
}
