//! LLM provider factory.
//!
//! This module provides a factory for creating generation clients based on
//! application configuration.

use crate::client::LlmClient;
use crate::providers::{OllamaClient, OpenAiCompatClient};
use crate::types::ProviderType;
use relief_core::{AppError, AppResult};
use std::sync::Arc;
use std::time::Duration;

/// Create an LLM client based on the provider name.
///
/// # Arguments
/// * `provider` - Provider identifier ("ollama", "openai")
/// * `endpoint` - Optional custom endpoint URL
/// * `api_key` - Optional API key (sent as a bearer token when present)
/// * `timeout` - Optional HTTP timeout for each request
///
/// # Returns
/// A shared trait object implementing `LlmClient`
///
/// # Errors
/// Returns a configuration error if the provider is unknown or the HTTP
/// client cannot be built.
pub fn create_client(
    provider: &str,
    endpoint: Option<&str>,
    api_key: Option<&str>,
    timeout: Option<Duration>,
) -> AppResult<Arc<dyn LlmClient>> {
    let provider_type = ProviderType::parse(provider)
        .ok_or_else(|| AppError::Config(format!("Unknown provider: {}", provider)))?;
    let base_url = endpoint.unwrap_or(provider_type.default_endpoint());

    tracing::debug!(provider = provider_type.as_str(), endpoint = base_url, "Creating generation client");

    match provider_type {
        ProviderType::Ollama => {
            let client = match timeout {
                Some(timeout) => OllamaClient::with_timeout(base_url, timeout)?,
                None => OllamaClient::with_base_url(base_url),
            };
            Ok(Arc::new(client))
        }
        ProviderType::OpenAI => {
            let api_key = api_key.map(str::to_string);
            let client = match timeout {
                Some(timeout) => OpenAiCompatClient::with_timeout(base_url, api_key, timeout)?,
                None => OpenAiCompatClient::new(base_url, api_key),
            };
            Ok(Arc::new(client))
        }
    }
}
