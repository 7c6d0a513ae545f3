//! OpenAI-compatible LLM provider implementation.
//!
//! A single [`OpenAiCompatibleProvider`] talks to any endpoint that speaks the
//! OpenAI chat-completions protocol with tool calling; Groq is the default.
//!
//! Uses [`async_openai`] for type-safe request/response handling. The client's
//! built-in retry is switched off: the fallback invoker gives every model
//! exactly one attempt.

pub mod config;

use std::time::Duration;

use async_openai::Client;
use async_openai::config::OpenAIConfig;
use async_openai::error::OpenAIError;
use async_openai::types::chat::{
    ChatCompletionMessageToolCall, ChatCompletionMessageToolCalls,
    ChatCompletionRequestAssistantMessage, ChatCompletionRequestAssistantMessageContent,
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessage,
    ChatCompletionRequestSystemMessageContent, ChatCompletionRequestToolMessage,
    ChatCompletionRequestToolMessageContent, ChatCompletionRequestUserMessage,
    ChatCompletionRequestUserMessageContent, ChatCompletionTool, ChatCompletionToolChoiceOption,
    ChatCompletionTools, CreateChatCompletionRequest, CreateChatCompletionResponse, FinishReason,
    FunctionCall, FunctionObject, ToolChoiceOptions,
};
use backoff::ExponentialBackoff;
use secrecy::{ExposeSecret, SecretString};
use tracing::debug;

use buddy_core::llm::provider::LlmProvider;
use buddy_types::llm::{
    CompletionRequest, CompletionResponse, LlmError, Message, StopReason, ToolCall, ToolChoice,
    Usage,
};

use self::config::OpenAiCompatConfig;

/// Provider for any OpenAI-compatible chat-completions API.
///
/// # API Key Security
///
/// Does NOT derive Debug to prevent accidental exposure of the API key
/// stored inside the `async_openai::Client`.
pub struct OpenAiCompatibleProvider {
    client: Client<OpenAIConfig>,
    provider_name: String,
    base_url: String,
}

impl OpenAiCompatibleProvider {
    /// Create a provider from a configuration.
    ///
    /// # Errors
    ///
    /// Fails only if the HTTP client cannot be built (TLS backend unavailable).
    pub fn new(config: OpenAiCompatConfig) -> Result<Self, LlmError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| LlmError::Provider {
                message: format!("failed to create HTTP client: {e}"),
            })?;

        let base_url = config.base_url.trim_end_matches('/').to_string();
        let openai_config = OpenAIConfig::new()
            .with_api_key(config.api_key.expose_secret())
            .with_api_base(&base_url);

        let client = Client::with_config(openai_config)
            .with_http_client(http)
            .with_backoff(single_attempt());

        Ok(Self {
            client,
            provider_name: config.provider_name,
            base_url,
        })
    }

    /// Create a Groq provider with default settings.
    pub fn groq(api_key: SecretString) -> Result<Self, LlmError> {
        Self::new(config::groq_defaults(api_key))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

/// Backoff that gives up after the first failure.
fn single_attempt() -> ExponentialBackoff {
    ExponentialBackoff {
        max_elapsed_time: Some(Duration::ZERO),
        ..Default::default()
    }
}

impl LlmProvider for OpenAiCompatibleProvider {
    fn name(&self) -> &str {
        &self.provider_name
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<CompletionResponse, LlmError> {
        let oai_request = build_request(request);
        debug!(
            model = %oai_request.model,
            messages = oai_request.messages.len(),
            tools = oai_request.tools.as_ref().map_or(0, Vec::len),
            "Sending chat completion"
        );

        let response = self
            .client
            .chat()
            .create(oai_request)
            .await
            .map_err(map_openai_error)?;

        into_completion_response(response)
    }
}

/// Build a [`CreateChatCompletionRequest`] from a generic [`CompletionRequest`].
///
/// `tool_choice` is only sent alongside `tools`; providers reject it on its own.
pub fn build_request(request: &CompletionRequest) -> CreateChatCompletionRequest {
    let tools: Vec<ChatCompletionTools> = request
        .tools
        .iter()
        .map(|def| {
            ChatCompletionTools::Function(ChatCompletionTool {
                function: FunctionObject {
                    name: def.name.clone(),
                    description: Some(def.description.clone()),
                    parameters: Some(def.parameters.clone()),
                    strict: None,
                },
            })
        })
        .collect();

    let tool_choice = (!tools.is_empty()).then(|| {
        ChatCompletionToolChoiceOption::Mode(match request.tool_choice {
            ToolChoice::Auto => ToolChoiceOptions::Auto,
            ToolChoice::None => ToolChoiceOptions::None,
            ToolChoice::Required => ToolChoiceOptions::Required,
        })
    });

    CreateChatCompletionRequest {
        model: request.model.clone(),
        messages: request.messages.iter().map(to_openai_message).collect(),
        temperature: Some(request.temperature as f32),
        tools: (!tools.is_empty()).then_some(tools),
        tool_choice,
        ..Default::default()
    }
}

fn to_openai_message(message: &Message) -> ChatCompletionRequestMessage {
    match message {
        Message::System { content } => {
            ChatCompletionRequestMessage::System(ChatCompletionRequestSystemMessage {
                content: ChatCompletionRequestSystemMessageContent::Text(content.clone()),
                name: None,
            })
        }
        Message::User { content } => {
            ChatCompletionRequestMessage::User(ChatCompletionRequestUserMessage {
                content: ChatCompletionRequestUserMessageContent::Text(content.clone()),
                name: None,
            })
        }
        Message::Assistant {
            content,
            tool_calls,
        } => {
            let calls: Vec<ChatCompletionMessageToolCalls> = tool_calls
                .iter()
                .map(|call| {
                    ChatCompletionMessageToolCalls::Function(ChatCompletionMessageToolCall {
                        id: call.id.clone(),
                        function: FunctionCall {
                            name: call.name.clone(),
                            arguments: call.arguments.clone(),
                        },
                    })
                })
                .collect();

            #[allow(deprecated)]
            ChatCompletionRequestMessage::Assistant(ChatCompletionRequestAssistantMessage {
                content: content
                    .clone()
                    .map(ChatCompletionRequestAssistantMessageContent::Text),
                refusal: None,
                name: None,
                audio: None,
                tool_calls: (!calls.is_empty()).then_some(calls),
                function_call: None,
            })
        }
        // The OpenAI tool message has no name field; the call id links it back.
        Message::Tool {
            tool_call_id,
            content,
            ..
        } => ChatCompletionRequestMessage::Tool(ChatCompletionRequestToolMessage {
            content: ChatCompletionRequestToolMessageContent::Text(content.clone()),
            tool_call_id: tool_call_id.clone(),
        }),
    }
}

/// Convert the response into a [`CompletionResponse`] using the first choice.
pub fn into_completion_response(
    response: CreateChatCompletionResponse,
) -> Result<CompletionResponse, LlmError> {
    let Some(choice) = response.choices.into_iter().next() else {
        return Err(LlmError::Deserialization(
            "response contained no choices".to_string(),
        ));
    };

    let tool_calls: Vec<ToolCall> = choice
        .message
        .tool_calls
        .unwrap_or_default()
        .into_iter()
        .filter_map(|call| match call {
            ChatCompletionMessageToolCalls::Function(call) => Some(ToolCall {
                id: call.id,
                name: call.function.name,
                arguments: call.function.arguments,
            }),
            ChatCompletionMessageToolCalls::Custom(_) => None,
        })
        .collect();

    let stop_reason = match choice.finish_reason {
        Some(FinishReason::ToolCalls | FinishReason::FunctionCall) => StopReason::ToolUse,
        Some(FinishReason::Length) => StopReason::MaxTokens,
        Some(FinishReason::ContentFilter) => StopReason::ContentFilter,
        Some(FinishReason::Stop) => StopReason::EndTurn,
        None if !tool_calls.is_empty() => StopReason::ToolUse,
        None => StopReason::EndTurn,
    };

    let usage = response
        .usage
        .map(|u| Usage {
            input_tokens: u.prompt_tokens,
            output_tokens: u.completion_tokens,
        })
        .unwrap_or_default();

    Ok(CompletionResponse {
        id: response.id,
        model: response.model,
        content: choice.message.content,
        tool_calls,
        stop_reason,
        usage,
    })
}

/// Map an `async_openai::error::OpenAIError` to an [`LlmError`].
pub fn map_openai_error(err: OpenAIError) -> LlmError {
    match &err {
        OpenAIError::ApiError(api_err) => {
            let code = api_err.code.as_deref().unwrap_or("");
            let error_type = api_err.r#type.as_deref().unwrap_or("");
            let message = api_err.message.to_lowercase();

            if code == "invalid_api_key"
                || error_type == "authentication_error"
                || message.contains("invalid api key")
            {
                LlmError::AuthenticationFailed
            } else if code == "rate_limit_exceeded" || error_type == "rate_limit_error" {
                LlmError::RateLimited {
                    retry_after_ms: None,
                }
            } else if code == "server_error"
                || error_type == "overloaded_error"
                || message.contains("over capacity")
            {
                LlmError::Overloaded(api_err.message.clone())
            } else if error_type == "invalid_request_error" {
                LlmError::InvalidRequest(api_err.message.clone())
            } else {
                LlmError::Provider {
                    message: err.to_string(),
                }
            }
        }
        OpenAIError::Reqwest(reqwest_err) => {
            if reqwest_err.is_timeout() {
                return LlmError::Timeout(err.to_string());
            }
            match reqwest_err.status().map(|s| s.as_u16()) {
                Some(401) => LlmError::AuthenticationFailed,
                Some(429) => LlmError::RateLimited {
                    retry_after_ms: None,
                },
                Some(503 | 529) => LlmError::Overloaded(err.to_string()),
                _ => LlmError::Provider {
                    message: format!("HTTP request failed: {err}"),
                },
            }
        }
        OpenAIError::JSONDeserialize(_, content) => {
            LlmError::Deserialization(format!("failed to parse response: {content}"))
        }
        OpenAIError::InvalidArgument(msg) => LlmError::InvalidRequest(msg.clone()),
        _ => LlmError::Provider {
            message: err.to_string(),
        },
    }
}
