//! Chat completions client configuration.

use crate::config::LlmSettings;
use crate::error::{DelveError, Result};
use async_openai::{config::OpenAIConfig, Client};
use std::time::Duration;

/// Create a client for the configured OpenAI-compatible endpoint.
///
/// The API key is resolved from the settings and injected here; nothing is read
/// from the environment by the client itself.
pub fn create_client(settings: &LlmSettings) -> Result<Client<OpenAIConfig>> {
    let api_key = settings.resolve_api_key()?;
    create_client_with_key(settings, &api_key)
}

/// Create a client with an already resolved API key.
pub fn create_client_with_key(settings: &LlmSettings, api_key: &str) -> Result<Client<OpenAIConfig>> {
    let http_client = reqwest::Client::builder()
        .timeout(Duration::from_secs(settings.timeout_secs))
        .build()
        .map_err(|e| DelveError::Config(format!("Failed to create HTTP client: {}", e)))?;

    let config = OpenAIConfig::new()
        .with_api_base(settings.api_base.trim_end_matches('/'))
        .with_api_key(api_key);

    Ok(Client::with_config(config).with_http_client(http_client))
}
