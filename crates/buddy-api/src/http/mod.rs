//! HTTP layer for Buddy.
//!
//! A single chat endpoint at `/api/buddy-ai` plus `/health`, behind an
//! origin allow-list CORS layer and request tracing.

pub mod error;
pub mod handlers;
pub mod router;
