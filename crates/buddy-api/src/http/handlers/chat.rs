//! Chat endpoint handler.
//!
//! `POST /api/buddy-ai` with `{ input, threadId }` runs one orchestrator turn
//! and answers `{ message }`.

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info};

use crate::http::error::{AppError, REQUIRED_FIELDS};
use crate::state::AppState;

/// A validated chat request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatRequest {
    pub input: String,
    pub thread_id: String,
}

impl ChatRequest {
    /// Accept the body only if `input` and `threadId` are both non-empty
    /// strings. Extra fields are ignored.
    pub fn from_value(body: &Value) -> Result<Self, AppError> {
        let field = |name: &str| {
            body.get(name)
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };

        match (field("input"), field("threadId")) {
            (Some(input), Some(thread_id)) => Ok(Self { input, thread_id }),
            _ => Err(AppError::Validation(REQUIRED_FIELDS.to_string())),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub message: String,
}

/// POST /api/buddy-ai
pub async fn buddy_ai(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<ChatResponse>, AppError> {
    let Json(body) = body.map_err(|rejection| {
        debug!(%rejection, "Rejected chat request body");
        AppError::Validation(REQUIRED_FIELDS.to_string())
    })?;
    let request = ChatRequest::from_value(&body)?;

    let reply = state
        .orchestrator
        .respond(&request.thread_id, &request.input)
        .await?;

    info!(
        thread_id = %request.thread_id,
        iterations = reply.iterations,
        tool_calls = reply.tool_calls,
        exhausted = reply.exhausted,
        "Chat request served"
    );

    Ok(Json(ChatResponse {
        message: reply.text,
    }))
}
