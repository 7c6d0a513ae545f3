//! Shared application state for the HTTP handlers and the terminal chat.

use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use buddy_core::agent::orchestrator::ChatOrchestrator;
use buddy_core::agent::prompt::SystemPromptBuilder;
use buddy_core::conversation::memory::InMemoryConversationStore;
use buddy_core::tool::registry::ToolRegistry;
use buddy_core::tool::web_search::WebSearchTool;
use buddy_infra::llm::create_fallback;
use buddy_infra::search::tavily::TavilySearch;
use buddy_infra::secret::ApiCredentials;
use buddy_types::config::BuddyConfig;

pub type Orchestrator = ChatOrchestrator<InMemoryConversationStore>;

/// Cheap to clone; every clone shares one orchestrator and one store.
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<Orchestrator>,
}

impl AppState {
    pub fn new(orchestrator: Orchestrator) -> Self {
        Self {
            orchestrator: Arc::new(orchestrator),
        }
    }

    /// Build the model fallback, the search tool and the conversation store
    /// from configuration.
    pub fn init(config: &BuddyConfig, credentials: ApiCredentials) -> anyhow::Result<Self> {
        let fallback = create_fallback(&config.llm, credentials.llm)?;

        let search = TavilySearch::from_config(&config.search, credentials.search)?;
        let tools = ToolRegistry::new().with_tool(
            WebSearchTool::new(search)
                .with_max_results(config.search.max_results)
                .with_topic(config.search.topic.clone()),
        );

        let store = Arc::new(InMemoryConversationStore::new(Duration::from_secs(
            config.memory.ttl_secs,
        )));

        info!(
            provider = fallback.provider_name(),
            models = ?fallback.candidates(),
            tools = ?tools.names(),
            ttl_secs = config.memory.ttl_secs,
            "Chat orchestrator ready"
        );

        let orchestrator = ChatOrchestrator::new(fallback, tools, store)
            .with_prompt(SystemPromptBuilder::new(config.assistant.persona.as_deref()))
            .with_max_iterations(config.llm.max_iterations);

        Ok(Self::new(orchestrator))
    }

    pub fn store(&self) -> &Arc<InMemoryConversationStore> {
        self.orchestrator.store()
    }
}
