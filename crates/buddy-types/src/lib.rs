//! Shared domain types for Buddy.
//!
//! This crate contains the types that flow between the orchestrator, the
//! model and search adapters, and the HTTP/CLI surfaces: messages, tool calls,
//! conversations, search results, configuration, and their error enums.
//!
//! Zero infrastructure dependencies -- only serde, serde_json, thiserror.

pub mod chat;
pub mod config;
pub mod error;
pub mod llm;
pub mod search;
pub mod tool;
