//! Routing and answer types.

use crate::corpus::Passage;
use relief_prompt::BuiltPrompt;
use serde::Serialize;

/// A retrieved passage with both its index distance and its re-scored similarity.
#[derive(Debug, Clone, Serialize)]
pub struct Candidate {
    /// Position in the index and passage store
    pub position: usize,

    pub passage: Passage,

    /// Distance reported by the vector index (informational only)
    pub distance: f32,

    /// Cosine similarity between the query and the re-embedded passage
    pub similarity: f32,
}

/// Outcome of the relevance gate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RelevanceDecision {
    /// Whether the grounded template was chosen
    pub grounded: bool,

    /// Highest candidate similarity; `None` when nothing was retrieved
    pub best_score: Option<f32>,
}

impl RelevanceDecision {
    /// Gate a set of similarities against `threshold` (inclusive).
    pub fn from_scores(similarities: &[f32], threshold: f32) -> Self {
        let best_score = similarities.iter().copied().reduce(f32::max);

        Self {
            grounded: best_score.is_some_and(|best| best >= threshold),
            best_score,
        }
    }
}

/// Everything the router produced for one query.
#[derive(Debug, Clone, Serialize)]
pub struct Routed {
    pub prompt: BuiltPrompt,
    pub decision: RelevanceDecision,
    /// Candidates in index order (nearest first); not re-sorted by similarity
    pub candidates: Vec<Candidate>,
}

/// Final result of a handled query.
#[derive(Debug, Clone, Serialize)]
pub struct QueryAnswer {
    /// Extracted answer text
    pub answer: String,

    pub decision: RelevanceDecision,

    /// Model that produced the answer
    pub model: String,
}
