//! LLM provider implementations.
//!
//! Contains the OpenAI-compatible implementation of the [`LlmProvider`] trait
//! defined in `buddy-core`, plus a factory that builds it from configuration.
//!
//! [`LlmProvider`]: buddy_core::llm::provider::LlmProvider

pub mod openai_compat;

use std::time::Duration;

use secrecy::SecretString;

use buddy_core::llm::box_provider::BoxLlmProvider;
use buddy_core::llm::fallback::ModelFallback;
use buddy_observe::genai_attrs::PROVIDER_GROQ;
use buddy_types::config::LlmConfig;
use buddy_types::llm::LlmError;

use self::openai_compat::OpenAiCompatibleProvider;
use self::openai_compat::config::OpenAiCompatConfig;

/// Create a [`BoxLlmProvider`] for the configured OpenAI-compatible endpoint.
pub fn create_provider(config: &LlmConfig, api_key: SecretString) -> Result<BoxLlmProvider, LlmError> {
    let provider = OpenAiCompatibleProvider::new(OpenAiCompatConfig {
        provider_name: PROVIDER_GROQ.to_string(),
        base_url: config.base_url.clone(),
        api_key,
        timeout: Duration::from_secs(config.request_timeout_secs),
    })?;
    Ok(BoxLlmProvider::new(provider))
}

/// Create the fallback invoker over the configured model list.
pub fn create_fallback(config: &LlmConfig, api_key: SecretString) -> Result<ModelFallback, LlmError> {
    let provider = create_provider(config, api_key)?;
    Ok(ModelFallback::new(provider, config.models.clone()))
}
