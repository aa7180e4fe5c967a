//! Retrieval core for the Relief disaster-management query service.
//!
//! Embeds a question, looks up its nearest corpus passages, re-scores them
//! with cosine similarity and decides whether the answer should be grounded
//! in those passages or produced conversationally.

pub mod bootstrap;
pub mod corpus;
pub mod embeddings;
pub mod rag;
pub mod similarity;

#[cfg(test)]
mod tests;

// Re-export commonly used types
pub use bootstrap::{build_service, build_service_with_embedder, check_corpus, load_corpus};
pub use corpus::{CorpusReport, FlatIndex, Passage, PassageStore, VectorIndex};
pub use embeddings::EmbeddingProvider;
pub use rag::{QueryAnswer, QueryService, RelevanceDecision, RetrievalRouter, Routed};
