//! Web search provider implementations.
//!
//! Contains the Tavily implementation of the [`SearchProvider`] trait defined
//! in `buddy-core`.
//!
//! [`SearchProvider`]: buddy_core::search::SearchProvider

pub mod tavily;
