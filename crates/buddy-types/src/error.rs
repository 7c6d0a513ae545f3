use thiserror::Error;

use crate::llm::LlmError;
use crate::tool::ToolError;

/// Errors from repository operations (used by store traits in buddy-core).
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("query error: {0}")]
    Query(String),
}

/// Errors that abort a single chat turn.
///
/// Nothing is persisted for a turn that ends in one of these.
#[derive(Debug, Error)]
pub enum ChatError {
    #[error(transparent)]
    Model(#[from] LlmError),

    #[error(transparent)]
    Tool(#[from] ToolError),

    #[error("conversation store error: {0}")]
    Store(#[from] RepositoryError),

    #[error("input must not be empty")]
    EmptyInput,
}
