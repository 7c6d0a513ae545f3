//! The tool-calling loop.
//!
//! One user turn runs as a small state machine over a working copy of the
//! thread's conversation:
//!
//! ```text
//! AwaitingModel --(assistant asks for tools)--> DispatchingTools --> AwaitingModel
//! AwaitingModel --(plain answer)--------------> Done
//! AwaitingModel --(iteration cap reached)-----> Done (canned answer)
//! any error ----------------------------------> aborted, nothing persisted
//! ```
//!
//! The conversation is written back to the store only on `Done`, so a failed
//! turn leaves the stored history exactly as it was.

use std::sync::Arc;

use tracing::{Instrument, debug, info, info_span, warn};

use buddy_observe::genai_attrs::OP_INVOKE_AGENT;
use buddy_types::chat::{Conversation, TurnReply};
use buddy_types::error::ChatError;
use buddy_types::llm::{Message, ToolCall, ToolDefinition};

use super::prompt::SystemPromptBuilder;
use crate::conversation::store::ConversationStore;
use crate::llm::fallback::ModelFallback;
use crate::tool::registry::ToolRegistry;

/// Model calls allowed per turn unless configured otherwise.
pub const DEFAULT_MAX_ITERATIONS: u32 = 10;

/// Answer returned when the iteration cap is reached without a plain reply.
pub const EXHAUSTED_REPLY: &str = "I could not find the result, please try again";

/// Where the loop is within one turn.
#[derive(Debug)]
enum LoopState {
    AwaitingModel,
    DispatchingTools(Vec<ToolCall>),
    Done { text: String, exhausted: bool },
}

/// Drives user turns through the model, the tools and the conversation store.
///
/// Built once at startup and shared by every request.
pub struct ChatOrchestrator<S> {
    fallback: ModelFallback,
    tools: ToolRegistry,
    store: Arc<S>,
    prompt: SystemPromptBuilder,
    max_iterations: u32,
}

impl<S: ConversationStore> ChatOrchestrator<S> {
    pub fn new(fallback: ModelFallback, tools: ToolRegistry, store: Arc<S>) -> Self {
        Self {
            fallback,
            tools,
            store,
            prompt: SystemPromptBuilder::default(),
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }

    pub fn with_prompt(mut self, prompt: SystemPromptBuilder) -> Self {
        self.prompt = prompt;
        self
    }

    /// Cap on model calls per turn. Zero is treated as one.
    pub fn with_max_iterations(mut self, max_iterations: u32) -> Self {
        self.max_iterations = max_iterations.max(1);
        self
    }

    pub fn max_iterations(&self) -> u32 {
        self.max_iterations
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    pub fn fallback(&self) -> &ModelFallback {
        &self.fallback
    }

    /// Run one user turn on `thread_id` and return the final answer.
    pub async fn respond(&self, thread_id: &str, input: &str) -> Result<TurnReply, ChatError> {
        if input.trim().is_empty() {
            return Err(ChatError::EmptyInput);
        }

        let span = info_span!(
            "gen_ai.invoke_agent",
            gen_ai.operation.name = OP_INVOKE_AGENT,
            thread_id = %thread_id,
        );

        self.run_turn(thread_id, input).instrument(span).await
    }

    /// Forget everything stored for `thread_id`.
    pub async fn reset(&self, thread_id: &str) -> Result<bool, ChatError> {
        let removed = self.store.remove(thread_id).await?;
        info!(thread_id, removed, "Thread reset");
        Ok(removed)
    }

    async fn run_turn(&self, thread_id: &str, input: &str) -> Result<TurnReply, ChatError> {
        let manifest = self.tools.manifest();
        let mut conversation = self.load_or_seed(thread_id, &manifest).await?;
        conversation.push(Message::user(input));

        let mut state = LoopState::AwaitingModel;
        let mut iterations: u32 = 0;
        let mut tool_calls: usize = 0;
        let mut model: Option<String> = None;

        let (text, exhausted) = loop {
            state = match state {
                LoopState::AwaitingModel => {
                    if iterations >= self.max_iterations {
                        warn!(
                            iterations,
                            max_iterations = self.max_iterations,
                            "Iteration cap reached without a final answer"
                        );
                        conversation.push(Message::assistant_text(EXHAUSTED_REPLY));
                        LoopState::Done {
                            text: EXHAUSTED_REPLY.to_string(),
                            exhausted: true,
                        }
                    } else {
                        iterations += 1;
                        let result = self
                            .fallback
                            .complete(conversation.messages(), &manifest)
                            .await?;
                        model = Some(result.model);

                        let message = result.response.into_message();
                        let calls = message.tool_calls().to_vec();
                        let text = message.text().unwrap_or_default().to_string();
                        conversation.push(message);

                        if calls.is_empty() {
                            LoopState::Done {
                                text,
                                exhausted: false,
                            }
                        } else {
                            debug!(iteration = iterations, count = calls.len(), "Model requested tools");
                            LoopState::DispatchingTools(calls)
                        }
                    }
                }
                LoopState::DispatchingTools(calls) => {
                    for call in &calls {
                        let output = self.tools.execute(&call.name, &call.arguments).await?;
                        conversation.push(Message::tool_result(call, output));
                        tool_calls += 1;
                    }
                    LoopState::AwaitingModel
                }
                LoopState::Done { text, exhausted } => break (text, exhausted),
            };
        };

        let stored_messages = conversation.len();
        self.store.put(thread_id, conversation).await?;

        info!(
            iterations,
            tool_calls,
            model = model.as_deref().unwrap_or("-"),
            exhausted,
            stored_messages,
            "Turn complete"
        );

        Ok(TurnReply {
            text,
            iterations,
            tool_calls,
            model,
            exhausted,
        })
    }

    async fn load_or_seed(
        &self,
        thread_id: &str,
        manifest: &[ToolDefinition],
    ) -> Result<Conversation, ChatError> {
        match self.store.get(thread_id).await? {
            Some(conversation) => {
                debug!(messages = conversation.len(), "Resuming thread");
                Ok(conversation)
            }
            None => {
                debug!("Starting new thread");
                Ok(Conversation::seeded(self.prompt.build_now(manifest)))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversation::memory::InMemoryConversationStore;
    use crate::llm::box_provider::BoxLlmProvider;
    use crate::llm::provider::LlmProvider;
    use crate::search::SearchProvider;
    use crate::tool::web_search::WebSearchTool;
    use buddy_types::llm::{
        CompletionRequest, CompletionResponse, LlmError, MessageRole, StopReason, Usage,
    };
    use buddy_types::search::{SearchError, SearchHit, SearchQuery, SearchResults};
    use buddy_types::tool::ToolError;
    use std::collections::VecDeque;
    use std::future::Future;
    use std::sync::Mutex;
    use std::time::Duration;

    // --- Mocks ---

    type Requests = Arc<Mutex<Vec<CompletionRequest>>>;

    /// Pops one scripted result per call, regardless of model.
    struct ScriptedProvider {
        script: Mutex<VecDeque<Result<CompletionResponse, LlmError>>>,
        requests: Requests,
    }

    impl LlmProvider for ScriptedProvider {
        fn name(&self) -> &str {
            "scripted"
        }

        fn complete(
            &self,
            request: &CompletionRequest,
        ) -> impl Future<Output = Result<CompletionResponse, LlmError>> + Send {
            self.requests.lock().unwrap().push(request.clone());
            let next = self.script.lock().unwrap().pop_front().unwrap_or_else(|| {
                Err(LlmError::Provider {
                    message: "script exhausted".to_string(),
                })
            });
            async move { next }
        }
    }

    type Queries = Arc<Mutex<Vec<String>>>;

    /// Returns the same hits for every query (or fails), recording each query.
    struct FixedSearch {
        hits: Vec<&'static str>,
        fail: bool,
        queries: Queries,
    }

    impl SearchProvider for FixedSearch {
        fn name(&self) -> &str {
            "fixed"
        }

        fn search(
            &self,
            query: &SearchQuery,
        ) -> impl Future<Output = Result<SearchResults, SearchError>> + Send {
            self.queries.lock().unwrap().push(query.query.clone());
            let result = if self.fail {
                Err(SearchError::Timeout("search timed out".to_string()))
            } else {
                Ok(SearchResults {
                    query: query.query.clone(),
                    hits: self
                        .hits
                        .iter()
                        .map(|c| SearchHit {
                            title: String::new(),
                            url: String::new(),
                            content: c.to_string(),
                            score: None,
                        })
                        .collect(),
                })
            };
            async move { result }
        }
    }

    fn text_reply(text: &str) -> Result<CompletionResponse, LlmError> {
        Ok(CompletionResponse {
            id: "resp".to_string(),
            model: "m".to_string(),
            content: Some(text.to_string()),
            tool_calls: Vec::new(),
            stop_reason: StopReason::EndTurn,
            usage: Usage::default(),
        })
    }

    fn tool_reply(calls: &[(&str, &str)]) -> Result<CompletionResponse, LlmError> {
        Ok(CompletionResponse {
            id: "resp".to_string(),
            model: "m".to_string(),
            content: None,
            tool_calls: calls
                .iter()
                .map(|(id, args)| ToolCall {
                    id: id.to_string(),
                    name: "webSearch".to_string(),
                    arguments: args.to_string(),
                })
                .collect(),
            stop_reason: StopReason::ToolUse,
            usage: Usage::default(),
        })
    }

    fn failure(message: &str) -> Result<CompletionResponse, LlmError> {
        Err(LlmError::Provider {
            message: message.to_string(),
        })
    }

    struct Harness {
        orchestrator: ChatOrchestrator<InMemoryConversationStore>,
        store: Arc<InMemoryConversationStore>,
        requests: Requests,
        queries: Queries,
    }

    fn harness_with(
        script: Vec<Result<CompletionResponse, LlmError>>,
        models: &[&str],
        store: InMemoryConversationStore,
    ) -> Harness {
        build_harness(script, models, store, false)
    }

    fn build_harness(
        script: Vec<Result<CompletionResponse, LlmError>>,
        models: &[&str],
        store: InMemoryConversationStore,
        search_fails: bool,
    ) -> Harness {
        let requests: Requests = Arc::new(Mutex::new(Vec::new()));
        let queries: Queries = Arc::new(Mutex::new(Vec::new()));
        let provider = ScriptedProvider {
            script: Mutex::new(script.into()),
            requests: Arc::clone(&requests),
        };
        let fallback = ModelFallback::new(
            BoxLlmProvider::new(provider),
            models.iter().map(|m| m.to_string()).collect(),
        );
        let tools = ToolRegistry::new().with_tool(WebSearchTool::new(FixedSearch {
            hits: vec!["headline one", "headline two"],
            fail: search_fails,
            queries: Arc::clone(&queries),
        }));
        let store = Arc::new(store);
        let orchestrator = ChatOrchestrator::new(fallback, tools, Arc::clone(&store));
        Harness {
            orchestrator,
            store,
            requests,
            queries,
        }
    }

    fn harness(script: Vec<Result<CompletionResponse, LlmError>>) -> Harness {
        harness_with(script, &["primary"], InMemoryConversationStore::default())
    }

    fn roles(conversation: &Conversation) -> Vec<MessageRole> {
        conversation.messages().iter().map(Message::role).collect()
    }

    // --- Tests ---

    #[tokio::test]
    async fn test_plain_answer_stores_three_messages() {
        let h = harness(vec![text_reply("4")]);

        let reply = h.orchestrator.respond("t1", "What's 2+2?").await.unwrap();

        assert_eq!(reply.text, "4");
        assert_eq!(reply.iterations, 1);
        assert_eq!(reply.tool_calls, 0);
        assert_eq!(reply.model.as_deref(), Some("primary"));
        assert!(!reply.exhausted);

        let stored = h.store.get("t1").await.unwrap().unwrap();
        assert_eq!(
            roles(&stored),
            vec![MessageRole::System, MessageRole::User, MessageRole::Assistant]
        );
        assert_eq!(stored.messages()[1].text(), Some("What's 2+2?"));
        assert_eq!(h.requests.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_one_tool_round_stores_five_messages() {
        let h = harness(vec![
            tool_reply(&[("call_1", r#"{"query":"latest news"}"#)]),
            text_reply("Here is the news."),
        ]);

        let reply = h.orchestrator.respond("t1", "latest news").await.unwrap();

        assert_eq!(reply.text, "Here is the news.");
        assert_eq!(reply.iterations, 2);
        assert_eq!(reply.tool_calls, 1);

        let stored = h.store.get("t1").await.unwrap().unwrap();
        assert_eq!(
            roles(&stored),
            vec![
                MessageRole::System,
                MessageRole::User,
                MessageRole::Assistant,
                MessageRole::Tool,
                MessageRole::Assistant,
            ]
        );
        assert_eq!(
            stored.messages()[3].text(),
            Some("headline one\n\nheadline two")
        );

        // The second model call saw the tool result.
        let requests = h.requests.lock().unwrap();
        assert_eq!(requests[1].messages.len(), 4);
        assert_eq!(requests[1].messages[3].role(), MessageRole::Tool);
    }

    #[tokio::test]
    async fn test_every_tool_call_gets_a_result_in_order() {
        let h = harness(vec![
            tool_reply(&[
                ("a", r#"{"query":"one"}"#),
                ("b", r#"{"query":"two"}"#),
                ("c", r#"{"query":"three"}"#),
            ]),
            text_reply("done"),
        ]);

        let reply = h.orchestrator.respond("t1", "three things").await.unwrap();
        assert_eq!(reply.tool_calls, 3);

        let stored = h.store.get("t1").await.unwrap().unwrap();
        let ids: Vec<&str> = stored
            .messages()
            .iter()
            .filter_map(|m| match m {
                Message::Tool { tool_call_id, .. } => Some(tool_call_id.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
        assert!(stored.pending_tool_call_ids().is_empty());
    }

    #[tokio::test]
    async fn test_malformed_arguments_abort_without_persisting() {
        let h = harness(vec![
            tool_reply(&[("call_1", "{not json")]),
            text_reply("never reached"),
        ]);

        let err = h.orchestrator.respond("t1", "latest news").await.unwrap_err();

        match err {
            ChatError::Tool(ToolError::MalformedArguments { raw, .. }) => {
                assert_eq!(raw, "{not json");
            }
            other => panic!("expected MalformedArguments, got {other:?}"),
        }
        assert!(h.store.get("t1").await.unwrap().is_none());
        assert_eq!(h.requests.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_malformed_arguments_stop_the_rest_of_the_batch() {
        let h = harness(vec![
            text_reply("first answer"),
            tool_reply(&[
                ("ok", r#"{"query":"fine"}"#),
                ("bad", "{not json"),
                ("skipped", r#"{"query":"never"}"#),
            ]),
        ]);
        h.orchestrator.respond("t1", "hello").await.unwrap();
        let before = h.store.get("t1").await.unwrap().unwrap();

        let err = h.orchestrator.respond("t1", "search please").await.unwrap_err();

        assert!(matches!(
            err,
            ChatError::Tool(ToolError::MalformedArguments { .. })
        ));
        let after = h.store.get("t1").await.unwrap().unwrap();
        assert_eq!(after, before);
        // Only the call ahead of the malformed one reached the search backend.
        assert_eq!(*h.queries.lock().unwrap(), vec!["fine".to_string()]);
    }

    #[tokio::test]
    async fn test_schema_mismatch_reports_the_models_raw_text() {
        let raw = r#"{ "q" : "weather in Pune" }"#;
        let h = harness(vec![tool_reply(&[("call_1", raw)])]);

        let err = h.orchestrator.respond("t1", "weather?").await.unwrap_err();

        match err {
            ChatError::Tool(ToolError::MalformedArguments { raw: reported, .. }) => {
                assert_eq!(reported, raw);
            }
            other => panic!("expected MalformedArguments, got {other:?}"),
        }
        assert!(h.queries.lock().unwrap().is_empty());
        assert!(h.store.get("t1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_search_failure_aborts_turn_and_keeps_history() {
        let h = build_harness(
            vec![
                text_reply("first answer"),
                tool_reply(&[("call_1", r#"{"query":"latest news"}"#)]),
                text_reply("never reached"),
            ],
            &["primary"],
            InMemoryConversationStore::default(),
            true,
        );
        h.orchestrator.respond("t1", "hello").await.unwrap();
        let before = h.store.get("t1").await.unwrap().unwrap();

        let err = h.orchestrator.respond("t1", "latest news").await.unwrap_err();

        match err {
            ChatError::Tool(ToolError::ExecutionFailed { tool, message }) => {
                assert_eq!(tool, "webSearch");
                assert!(message.contains("search timed out"));
            }
            other => panic!("expected ExecutionFailed, got {other:?}"),
        }
        assert_eq!(h.store.get("t1").await.unwrap().unwrap(), before);
        assert_eq!(*h.queries.lock().unwrap(), vec!["latest news".to_string()]);
        assert_eq!(h.requests.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_search_failure_on_new_thread_stores_nothing() {
        let h = build_harness(
            vec![tool_reply(&[("call_1", r#"{"query":"x"}"#)])],
            &["primary"],
            InMemoryConversationStore::default(),
            true,
        );

        let err = h.orchestrator.respond("t1", "search x").await.unwrap_err();

        assert!(matches!(
            err,
            ChatError::Tool(ToolError::ExecutionFailed { .. })
        ));
        assert!(h.store.get("t1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_all_models_failed_references_last_error() {
        let h = harness_with(
            vec![failure("primary is down"), failure("backup is down")],
            &["primary", "backup"],
            InMemoryConversationStore::default(),
        );

        let err = h.orchestrator.respond("t1", "hi").await.unwrap_err();

        match &err {
            ChatError::Model(LlmError::AllModelsFailed { attempted, .. }) => {
                assert_eq!(*attempted, 2);
            }
            other => panic!("expected AllModelsFailed, got {other:?}"),
        }
        assert!(err.to_string().contains("backup is down"));
        assert!(h.store.get("t1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_failover_mid_turn_still_answers() {
        let h = harness_with(
            vec![failure("primary is down"), text_reply("from backup")],
            &["primary", "backup"],
            InMemoryConversationStore::default(),
        );

        let reply = h.orchestrator.respond("t1", "hi").await.unwrap();

        assert_eq!(reply.text, "from backup");
        assert_eq!(reply.model.as_deref(), Some("backup"));
        assert_eq!(reply.iterations, 1);
    }

    #[tokio::test]
    async fn test_iteration_cap_returns_canned_answer() {
        let script = (0..10)
            .map(|i| tool_reply(&[(&*format!("call_{i}"), r#"{"query":"again"}"#)]))
            .collect();
        let h = harness(script);
        let orchestrator = h.orchestrator.with_max_iterations(3);

        let reply = orchestrator.respond("t1", "loop forever").await.unwrap();

        assert_eq!(reply.text, EXHAUSTED_REPLY);
        assert!(reply.exhausted);
        assert_eq!(reply.iterations, 3);
        assert_eq!(reply.tool_calls, 3);
        assert_eq!(h.requests.lock().unwrap().len(), 3);

        let stored = h.store.get("t1").await.unwrap().unwrap();
        // system + user + 3 x (assistant + tool) + canned assistant
        assert_eq!(stored.len(), 9);
        assert_eq!(stored.last_assistant_text(), Some(EXHAUSTED_REPLY));
    }

    #[tokio::test]
    async fn test_expired_thread_starts_fresh() {
        let h = harness_with(
            vec![text_reply("first"), text_reply("second")],
            &["primary"],
            InMemoryConversationStore::new(Duration::from_millis(20)),
        );

        h.orchestrator.respond("t1", "hello").await.unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;
        h.orchestrator.respond("t1", "hello again").await.unwrap();

        let stored = h.store.get("t1").await.unwrap().unwrap();
        assert_eq!(stored.len(), 3);
        assert_eq!(stored.messages()[1].text(), Some("hello again"));

        // The second model call carried only the fresh seed and the new input.
        let requests = h.requests.lock().unwrap();
        assert_eq!(requests[1].messages.len(), 2);
        assert_eq!(requests[1].messages[0].role(), MessageRole::System);
    }

    #[tokio::test]
    async fn test_second_turn_extends_history() {
        let h = harness(vec![text_reply("hi there"), text_reply("still here")]);

        h.orchestrator.respond("t1", "hello").await.unwrap();
        h.orchestrator.respond("t1", "you there?").await.unwrap();

        let stored = h.store.get("t1").await.unwrap().unwrap();
        assert_eq!(stored.len(), 5);
        let systems = stored
            .messages()
            .iter()
            .filter(|m| m.role() == MessageRole::System)
            .count();
        assert_eq!(systems, 1);
    }

    #[tokio::test]
    async fn test_threads_do_not_share_history() {
        let h = harness(vec![text_reply("a"), text_reply("b")]);

        h.orchestrator.respond("alice", "hello").await.unwrap();
        h.orchestrator.respond("bob", "hello").await.unwrap();

        assert_eq!(h.store.get("alice").await.unwrap().unwrap().len(), 3);
        assert_eq!(h.store.get("bob").await.unwrap().unwrap().len(), 3);
        assert_eq!(h.requests.lock().unwrap()[1].messages.len(), 2);
    }

    #[tokio::test]
    async fn test_blank_input_is_rejected_before_any_call() {
        let h = harness(vec![text_reply("unused")]);

        let err = h.orchestrator.respond("t1", "   ").await.unwrap_err();

        assert!(matches!(err, ChatError::EmptyInput));
        assert!(h.requests.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_empty_assistant_content_passes_through() {
        let h = harness(vec![Ok(CompletionResponse {
            id: "resp".to_string(),
            model: "m".to_string(),
            content: None,
            tool_calls: Vec::new(),
            stop_reason: StopReason::EndTurn,
            usage: Usage::default(),
        })]);

        let reply = h.orchestrator.respond("t1", "hi").await.unwrap();
        assert_eq!(reply.text, "");
    }

    #[tokio::test]
    async fn test_unknown_tool_aborts_turn() {
        let h = harness(vec![Ok(CompletionResponse {
            id: "resp".to_string(),
            model: "m".to_string(),
            content: None,
            tool_calls: vec![ToolCall {
                id: "x".to_string(),
                name: "calculator".to_string(),
                arguments: "{}".to_string(),
            }],
            stop_reason: StopReason::ToolUse,
            usage: Usage::default(),
        })]);

        let err = h.orchestrator.respond("t1", "1+1").await.unwrap_err();
        assert!(matches!(err, ChatError::Tool(ToolError::UnknownTool(_))));
    }

    #[tokio::test]
    async fn test_manifest_is_sent_with_every_call() {
        let h = harness(vec![text_reply("ok")]);
        h.orchestrator.respond("t1", "hi").await.unwrap();

        let requests = h.requests.lock().unwrap();
        assert_eq!(requests[0].tools.len(), 1);
        assert_eq!(requests[0].tools[0].name, "webSearch");
        assert_eq!(requests[0].temperature, 0.0);
    }

    #[tokio::test]
    async fn test_reset_forgets_thread() {
        let h = harness(vec![text_reply("ok")]);
        h.orchestrator.respond("t1", "hi").await.unwrap();

        assert!(h.orchestrator.reset("t1").await.unwrap());
        assert!(h.store.get("t1").await.unwrap().is_none());
        assert!(!h.orchestrator.reset("t1").await.unwrap());
    }
}
