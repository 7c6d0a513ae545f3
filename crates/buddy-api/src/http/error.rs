//! Application error type mapping to HTTP status codes and the JSON bodies
//! the frontend expects.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use tracing::error;

use buddy_types::error::ChatError;

/// Message returned for any request missing `input` or `threadId`.
pub const REQUIRED_FIELDS: &str = "input and threadId are required";

/// Message returned for every failed turn.
pub const SERVER_ERROR: &str = "Server error";

/// Application-level error that maps to HTTP responses.
#[derive(Debug)]
pub enum AppError {
    /// Request body failed validation.
    Validation(String),
    /// The chat turn failed.
    Chat(ChatError),
}

impl From<ChatError> for AppError {
    fn from(e: ChatError) -> Self {
        AppError::Chat(e)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            AppError::Validation(message) => (StatusCode::BAD_REQUEST, json!({ "message": message })),
            // Whitespace-only input passes the presence check but not the orchestrator.
            AppError::Chat(ChatError::EmptyInput) => (
                StatusCode::BAD_REQUEST,
                json!({ "message": REQUIRED_FIELDS }),
            ),
            AppError::Chat(e) => {
                error!(error = %e, "Chat turn failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "message": SERVER_ERROR, "error": e.to_string() }),
                )
            }
        };

        (
            status,
            [(axum::http::header::CONTENT_TYPE, "application/json")],
            body.to_string(),
        )
            .into_response()
    }
}
