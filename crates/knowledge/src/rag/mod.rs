//! Retrieval-gated question answering.
//!
//! The router decides between a grounded and a fallback prompt; the service
//! wraps it with query validation, generation and answer extraction.

pub mod answer;
pub mod router;
pub mod service;
pub mod types;

pub use answer::extract_answer;
pub use router::RetrievalRouter;
pub use service::QueryService;
pub use types::{Candidate, QueryAnswer, RelevanceDecision, Routed};
