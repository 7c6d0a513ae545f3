//! LlmProvider trait definition.
//!
//! This is the core abstraction that all chat-completion backends implement.

use buddy_types::llm::{CompletionRequest, CompletionResponse, LlmError};

/// Trait for LLM provider backends (Groq, OpenAI, any OpenAI-compatible API).
///
/// Uses native async fn in traits (RPITIT, Rust 2024 edition). One call is
/// exactly one attempt: retries and fail-over belong to
/// [`ModelFallback`](super::fallback::ModelFallback).
///
/// Implementations live in buddy-infra (e.g., `OpenAiCompatibleProvider`).
pub trait LlmProvider: Send + Sync {
    /// Human-readable provider name (e.g., "groq").
    fn name(&self) -> &str;

    /// Send a completion request and receive the full response.
    fn complete(
        &self,
        request: &CompletionRequest,
    ) -> impl std::future::Future<Output = Result<CompletionResponse, LlmError>> + Send;
}
