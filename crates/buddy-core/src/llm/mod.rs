//! LLM provider abstractions for Buddy.
//!
//! - `LlmProvider`: RPITIT trait for concrete provider implementations
//! - `BoxLlmProvider`: Object-safe wrapper for dynamic dispatch
//! - `ModelFallback`: ordered model candidates with fail-over

pub mod box_provider;
pub mod fallback;
pub mod provider;
