//! OpenAI client configuration with sensible defaults.

use crate::config::LlmSettings;
use crate::error::{HentError, Result};
use async_openai::{config::OpenAIConfig, Client};
use std::time::Duration;

/// Create an OpenAI client from LLM settings.
///
/// Requires an API key; honours a custom API base for compatible endpoints.
pub fn create_client(settings: &LlmSettings) -> Result<Client<OpenAIConfig>> {
    let api_key = settings
        .api_key
        .as_deref()
        .filter(|k| !k.is_empty())
        .ok_or_else(|| HentError::Config("OPENAI_API_KEY is not set".to_string()))?;

    let mut config = OpenAIConfig::new().with_api_key(api_key);
    if let Some(base) = settings.api_base.as_deref().filter(|b| !b.is_empty()) {
        config = config.with_api_base(base);
    }

    create_client_with_timeout(config, Duration::from_secs(settings.timeout_seconds))
}

/// Create an OpenAI client with a custom timeout.
pub fn create_client_with_timeout(
    config: OpenAIConfig,
    timeout: Duration,
) -> Result<Client<OpenAIConfig>> {
    let http_client = reqwest::Client::builder().timeout(timeout).build()?;

    Ok(Client::with_config(config).with_http_client(http_client))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_key_is_config_error() {
        let settings = LlmSettings::default();
        assert!(matches!(create_client(&settings), Err(HentError::Config(_))));
    }

    #[test]
    fn test_client_with_key_and_base() {
        let settings = LlmSettings {
            api_key: Some("sk-test".to_string()),
            api_base: Some("http://localhost:11434/v1".to_string()),
            ..LlmSettings::default()
        };
        assert!(create_client(&settings).is_ok());
    }
}
