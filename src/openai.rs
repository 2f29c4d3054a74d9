//! OpenAI-compatible client configuration.
//!
//! Any provider exposing the OpenAI chat and embeddings endpoints can be used
//! by setting `llm.api_base`.

use crate::config::LlmSettings;
use crate::error::{AssistError, Result};
use async_openai::{config::OpenAIConfig, Client};
use std::time::Duration;

/// Client type shared by the chat and embedding implementations.
pub type OpenAIClient = Client<OpenAIConfig>;

/// Create a client from settings, reading the key from `llm.api_key_env`.
pub fn create_client(settings: &LlmSettings) -> Result<OpenAIClient> {
    let mut config = OpenAIConfig::new();
    if let Some(key) = settings.api_key() {
        config = config.with_api_key(key);
    }
    if let Some(base) = settings.api_base.as_deref() {
        config = config.with_api_base(base);
    }

    create_client_with_timeout(config, Duration::from_secs(settings.timeout_secs))
}

/// Create a client with an explicit config and timeout.
pub fn create_client_with_timeout(config: OpenAIConfig, timeout: Duration) -> Result<OpenAIClient> {
    let http_client = reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| AssistError::Config(format!("Failed to create HTTP client: {}", e)))?;

    Ok(Client::with_config(config).with_http_client(http_client))
}

/// Check that an API key is available before starting work that needs one.
pub fn check_api_key(settings: &LlmSettings) -> Result<()> {
    match settings.api_key() {
        Some(_) => Ok(()),
        None => Err(AssistError::Config(format!(
            "{} not set. Set it with: export {}='...'",
            settings.api_key_env, settings.api_key_env
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_key_is_config_error() {
        let settings = LlmSettings {
            api_key_env: "YTASSIST_TEST_KEY_THAT_IS_NEVER_SET".to_string(),
            ..LlmSettings::default()
        };
        let err = check_api_key(&settings).unwrap_err();
        assert!(err.to_string().contains("YTASSIST_TEST_KEY_THAT_IS_NEVER_SET"));
    }

    #[test]
    fn test_client_builds_with_custom_base() {
        let settings = LlmSettings {
            api_base: Some("http://localhost:11434/v1".to_string()),
            ..LlmSettings::default()
        };
        assert!(create_client(&settings).is_ok());
    }
}
