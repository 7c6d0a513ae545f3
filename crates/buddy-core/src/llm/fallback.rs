//! Ordered model fallback.
//!
//! Routes a completion through a list of model identifiers, most preferred
//! first. The first success wins and no further candidates are tried; every
//! failure (network, provider, timeout) moves on to the next candidate. Each
//! candidate gets exactly one attempt per invocation.

use std::fmt::Display;
use std::future::Future;

use tracing::{Instrument, Span, debug, field, info_span, warn};

use buddy_observe::genai_attrs::{
    GEN_AI_RESPONSE_FINISH_REASONS, GEN_AI_USAGE_INPUT_TOKENS, GEN_AI_USAGE_OUTPUT_TOKENS, OP_CHAT,
};
use buddy_types::llm::{
    CompletionRequest, CompletionResponse, LlmError, Message, ToolChoice, ToolDefinition,
};

use super::box_provider::BoxLlmProvider;

/// Sampling temperature used for every completion (deterministic decoding).
pub const TEMPERATURE: f64 = 0.0;

/// Result of a successful completion through the fallback list.
#[derive(Debug)]
pub struct FallbackResult {
    /// The completion response from the provider.
    pub response: CompletionResponse,
    /// Model identifier that produced the response.
    pub model: String,
    /// How many candidates were tried, including the successful one.
    pub attempts: usize,
    /// Set when a non-primary model answered.
    pub failover_warning: Option<String>,
}

/// Try `attempt` against each candidate in order and return the first success.
///
/// Returns the index of the winning candidate with its value. When every
/// candidate fails, the error is [`LlmError::AllModelsFailed`] wrapping the
/// last failure. An empty list yields [`LlmError::EmptyCandidateList`].
pub async fn first_success<C, T, F, Fut>(
    candidates: &[C],
    mut attempt: F,
) -> Result<(usize, T), LlmError>
where
    C: Display,
    F: FnMut(&C) -> Fut,
    Fut: Future<Output = Result<T, LlmError>>,
{
    let mut last_error: Option<LlmError> = None;

    for (idx, candidate) in candidates.iter().enumerate() {
        match attempt(candidate).await {
            Ok(value) => return Ok((idx, value)),
            Err(err) => {
                warn!(
                    candidate = %candidate,
                    attempt = idx + 1,
                    error = %err,
                    "Model failed, trying next candidate"
                );
                last_error = Some(err);
            }
        }
    }

    match last_error {
        Some(last) => Err(LlmError::AllModelsFailed {
            attempted: candidates.len(),
            last: Box::new(last),
        }),
        None => Err(LlmError::EmptyCandidateList),
    }
}

/// Fail-over invoker over an ordered, immutable list of model identifiers.
///
/// Built once at startup and shared read-only by every request.
pub struct ModelFallback {
    provider: BoxLlmProvider,
    candidates: Vec<String>,
}

impl ModelFallback {
    /// Create a fallback invoker. Blank model names are dropped.
    pub fn new(provider: BoxLlmProvider, candidates: Vec<String>) -> Self {
        let candidates = candidates
            .into_iter()
            .map(|m| m.trim().to_string())
            .filter(|m| !m.is_empty())
            .collect();

        Self {
            provider,
            candidates,
        }
    }

    /// Model candidates, most preferred first.
    pub fn candidates(&self) -> &[String] {
        &self.candidates
    }

    /// Name of the underlying provider.
    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    /// Build the request sent for one candidate.
    pub fn build_request(
        model: &str,
        messages: &[Message],
        tools: &[ToolDefinition],
    ) -> CompletionRequest {
        CompletionRequest {
            model: model.to_string(),
            messages: messages.to_vec(),
            temperature: TEMPERATURE,
            tool_choice: ToolChoice::Auto,
            tools: tools.to_vec(),
        }
    }

    /// Send the conversation through the candidate list.
    pub async fn complete(
        &self,
        messages: &[Message],
        tools: &[ToolDefinition],
    ) -> Result<FallbackResult, LlmError> {
        let provider = &self.provider;

        let (idx, response) = first_success(&self.candidates, |model| {
            let request = Self::build_request(model, messages, tools);
            let span = info_span!(
                "gen_ai.chat",
                gen_ai.operation.name = OP_CHAT,
                gen_ai.provider.name = provider.name(),
                gen_ai.request.model = %request.model,
                gen_ai.request.temperature = request.temperature,
                gen_ai.request.tools = request.tools.len(),
                gen_ai.usage.input_tokens = field::Empty,
                gen_ai.usage.output_tokens = field::Empty,
                gen_ai.response.finish_reasons = field::Empty,
            );
            async move {
                let response = provider.complete(&request).await?;
                let span = Span::current();
                span.record(GEN_AI_USAGE_INPUT_TOKENS, response.usage.input_tokens);
                span.record(GEN_AI_USAGE_OUTPUT_TOKENS, response.usage.output_tokens);
                span.record(
                    GEN_AI_RESPONSE_FINISH_REASONS,
                    field::display(&response.stop_reason),
                );
                Ok::<_, LlmError>(response)
            }
            .instrument(span)
        })
        .await?;

        let model = self.candidates[idx].clone();
        debug!(
            model = %model,
            input_tokens = response.usage.input_tokens,
            output_tokens = response.usage.output_tokens,
            stop_reason = %response.stop_reason,
            tool_calls = response.tool_calls.len(),
            "Completion received"
        );

        let failover_warning = if idx == 0 {
            None
        } else {
            let warning = format!(
                "Switched to {model} after {idx} failed candidate(s); primary is {}",
                self.candidates[0]
            );
            warn!(%warning, "Failover occurred");
            Some(warning)
        };

        Ok(FallbackResult {
            response,
            model,
            attempts: idx + 1,
            failover_warning,
        })
    }
}
