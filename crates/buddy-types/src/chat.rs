//! Conversation and turn types.
//!
//! A [`Conversation`] is the ordered message history of one thread. It starts
//! with exactly one system message, followed by user/assistant turns with tool
//! results interleaved after any assistant message that requested tools.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::llm::{Message, MessageRole};

/// Ordered message history owned by a single thread.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Conversation {
    messages: Vec<Message>,
}

impl Conversation {
    /// A fresh conversation holding only the given system prompt.
    pub fn seeded(system_prompt: impl Into<String>) -> Self {
        Self {
            messages: vec![Message::system(system_prompt)],
        }
    }

    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    /// Text of the most recent assistant message, if it has any.
    pub fn last_assistant_text(&self) -> Option<&str> {
        self.messages
            .iter()
            .rev()
            .find(|m| m.role() == MessageRole::Assistant)
            .and_then(Message::text)
    }

    /// Ids of tool calls in the trailing assistant message that have no
    /// matching tool result yet, in the order the model issued them.
    pub fn pending_tool_call_ids(&self) -> Vec<&str> {
        let Some(idx) = self
            .messages
            .iter()
            .rposition(|m| m.role() == MessageRole::Assistant)
        else {
            return Vec::new();
        };

        let answered: HashSet<&str> = self.messages[idx + 1..]
            .iter()
            .filter_map(|m| match m {
                Message::Tool { tool_call_id, .. } => Some(tool_call_id.as_str()),
                _ => None,
            })
            .collect();

        self.messages[idx]
            .tool_calls()
            .iter()
            .map(|call| call.id.as_str())
            .filter(|id| !answered.contains(id))
            .collect()
    }
}

/// Outcome of one successful user turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnReply {
    /// Final assistant text returned to the caller.
    pub text: String,
    /// Number of model calls made during the turn.
    pub iterations: u32,
    /// Number of tool calls dispatched during the turn.
    pub tool_calls: usize,
    /// Model that produced the last completion, if any completed.
    pub model: Option<String>,
    /// True when the iteration cap was hit and `text` is the canned answer.
    pub exhausted: bool,
}
