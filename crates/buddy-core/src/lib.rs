//! Business logic and port definitions for Buddy.
//!
//! This crate defines the "ports" (provider, search and store traits) that the
//! infrastructure layer implements, plus the logic that drives them: model
//! fallback, tool dispatch, conversation memory, and the tool-calling loop.
//! It never performs network I/O itself.

pub mod agent;
pub mod conversation;
pub mod llm;
pub mod search;
pub mod tool;
