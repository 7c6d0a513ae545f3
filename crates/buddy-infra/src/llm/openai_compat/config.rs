//! Configuration and per-provider defaults for OpenAI-compatible providers.

use std::time::Duration;

use secrecy::SecretString;

use buddy_observe::genai_attrs::PROVIDER_GROQ;

/// Default Groq base URL.
pub const GROQ_BASE_URL: &str = "https://api.groq.com/openai/v1";

/// Configuration for an OpenAI-compatible provider.
///
/// Used to construct an [`super::OpenAiCompatibleProvider`]. The model is
/// chosen per request, so it is not part of the configuration.
pub struct OpenAiCompatConfig {
    /// Human-readable provider name (e.g., "groq").
    pub provider_name: String,
    /// Base URL for the API, without the trailing `/chat/completions`.
    pub base_url: String,
    /// API key for bearer authentication.
    pub api_key: SecretString,
    /// Per-request timeout.
    pub timeout: Duration,
}

/// Groq defaults: `https://api.groq.com/openai/v1`, 60 second timeout.
pub fn groq_defaults(api_key: SecretString) -> OpenAiCompatConfig {
    OpenAiCompatConfig {
        provider_name: PROVIDER_GROQ.to_string(),
        base_url: GROQ_BASE_URL.to_string(),
        api_key,
        timeout: Duration::from_secs(60),
    }
}
