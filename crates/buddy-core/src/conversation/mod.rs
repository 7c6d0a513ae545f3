//! Per-thread conversation memory.
//!
//! [`store::ConversationStore`] is the port the orchestrator talks to;
//! [`memory::InMemoryConversationStore`] is the process-local implementation
//! with time-to-live expiry.

pub mod memory;
pub mod store;
