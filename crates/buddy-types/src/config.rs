//! Configuration types for Buddy.
//!
//! `BuddyConfig` is the top-level `buddy.toml`. Every section and field has a
//! default, so an empty file (or no file at all) yields a working setup.

use serde::{Deserialize, Serialize};

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BuddyConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub memory: MemoryConfig,
    #[serde(default)]
    pub assistant: AssistantConfig,
}

impl BuddyConfig {
    /// Reject settings that would make every turn fail.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.llm.models.iter().all(|m| m.trim().is_empty()) {
            return Err(ConfigError::Invalid(
                "llm.models must list at least one model".to_string(),
            ));
        }
        if self.llm.max_iterations == 0 {
            return Err(ConfigError::Invalid(
                "llm.max_iterations must be at least 1".to_string(),
            ));
        }
        if self.llm.request_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "llm.request_timeout_secs must be at least 1".to_string(),
            ));
        }
        if self.search.request_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "search.request_timeout_secs must be at least 1".to_string(),
            ));
        }
        if self.memory.ttl_secs == 0 || self.memory.ttl_secs > MAX_TTL_SECS {
            return Err(ConfigError::Invalid(format!(
                "memory.ttl_secs must be between 1 and {MAX_TTL_SECS}"
            )));
        }
        Ok(())
    }
}

/// Errors from loading or validating configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid configuration: {0}")]
    Invalid(String),

    #[error("missing required environment variable(s): {}", .0.join(", "))]
    MissingCredentials(Vec<String>),
}

/// HTTP listener settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Exact origins allowed by CORS.
    #[serde(default = "default_allowed_origins")]
    pub allowed_origins: Vec<String>,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_allowed_origins() -> Vec<String> {
    [
        "https://buddy-ai-frontend.vercel.app",
        "https://kajal-buddy-ai.vercel.app",
        "http://localhost:5173",
        "http://localhost:5174",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            allowed_origins: default_allowed_origins(),
        }
    }
}

/// Model provider settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// OpenAI-compatible API base URL.
    #[serde(default = "default_llm_base_url")]
    pub base_url: String,
    /// Model candidates, most preferred first.
    #[serde(default = "default_models")]
    pub models: Vec<String>,
    /// Maximum model calls per user turn.
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,
    #[serde(default = "default_llm_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_llm_base_url() -> String {
    "https://api.groq.com/openai/v1".to_string()
}

fn default_models() -> Vec<String> {
    [
        "meta-llama/llama-4-maverick-17b-128e-instruct",
        "llama-3.3-70b-versatile",
        "meta-llama/llama-4-scout-17b-16e-instruct",
        "llama-3.1-8b-instant",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

fn default_max_iterations() -> u32 {
    10
}

fn default_llm_timeout_secs() -> u64 {
    60
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: default_llm_base_url(),
            models: default_models(),
            max_iterations: default_max_iterations(),
            request_timeout_secs: default_llm_timeout_secs(),
        }
    }
}

/// Search provider settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    #[serde(default = "default_search_base_url")]
    pub base_url: String,
    #[serde(default = "default_max_results")]
    pub max_results: u32,
    #[serde(default = "default_topic")]
    pub topic: String,
    #[serde(default = "default_search_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_search_base_url() -> String {
    "https://api.tavily.com".to_string()
}

fn default_max_results() -> u32 {
    5
}

fn default_topic() -> String {
    "general".to_string()
}

fn default_search_timeout_secs() -> u64 {
    30
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            base_url: default_search_base_url(),
            max_results: default_max_results(),
            topic: default_topic(),
            request_timeout_secs: default_search_timeout_secs(),
        }
    }
}

/// Longest accepted thread time-to-live: ten years.
pub const MAX_TTL_SECS: u64 = 60 * 60 * 24 * 365 * 10;

/// Conversation memory settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryConfig {
    /// Time-to-live of a thread, refreshed on every write.
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: u64,
    /// How often expired threads are swept in the background.
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,
}

fn default_ttl_secs() -> u64 {
    60 * 60 * 24
}

fn default_sweep_interval_secs() -> u64 {
    600
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            ttl_secs: default_ttl_secs(),
            sweep_interval_secs: default_sweep_interval_secs(),
        }
    }
}

/// Assistant persona settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AssistantConfig {
    /// Replaces the opening line of the system prompt.
    #[serde(default)]
    pub persona: Option<String>,
}
