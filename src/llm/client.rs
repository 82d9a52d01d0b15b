use anyhow::{Context, Result};
use async_openai::{Client, config::OpenAIConfig};
use once_cell::sync::Lazy;
use tracing::debug;

use crate::config::EndpointConfig;

static DEFAULT_CLIENT: Lazy<Client<OpenAIConfig>> =
    Lazy::new(|| build_client(&EndpointConfig::default()));

pub fn build_client(config: &EndpointConfig) -> Client<OpenAIConfig> {
    let openai_config = OpenAIConfig::new()
        .with_api_base(config.base_url.as_str())
        .with_api_key(config.api_key.as_str());

    Client::with_config(openai_config)
}

/// Client for the default local endpoint, built on first use and shared for
/// the rest of the process.
pub fn default_client() -> &'static Client<OpenAIConfig> {
    &DEFAULT_CLIENT
}

/// Lists the models the endpoint serves. Fails when the endpoint cannot be
/// reached or answers with something other than a model list.
pub async fn healthcheck_client(client: &Client<OpenAIConfig>) -> Result<Vec<String>> {
    let models = client
        .models()
        .list()
        .await
        .context("Failed to reach the completion endpoint")?;

    let ids: Vec<String> = models.data.into_iter().map(|model| model.id).collect();
    debug!(count = ids.len(), "endpoint healthcheck succeeded");
    Ok(ids)
}
