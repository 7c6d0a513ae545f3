//! Infrastructure layer for Buddy.
//!
//! Contains implementations of the ports defined in `buddy-core`: the
//! OpenAI-compatible model client and the Tavily search client. Also loads
//! configuration and API credentials.

pub mod config;
pub mod llm;
pub mod search;
pub mod secret;
