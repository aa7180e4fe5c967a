//! Embedding providers.
//!
//! The same provider embeds the query and re-embeds retrieved passages, so
//! similarity scores are always computed in a single vector space.

pub mod provider;
pub mod providers;

pub use provider::{create_provider, EmbeddingProvider};
