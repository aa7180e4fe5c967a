//! Retrieval router: candidate retrieval, re-scoring, gating and prompt assembly.

use crate::corpus::{PassageStore, VectorIndex};
use crate::embeddings::EmbeddingProvider;
use crate::rag::types::{Candidate, RelevanceDecision, Routed};
use crate::similarity::cosine_similarity;
use relief_core::config::RetrievalSettings;
use relief_core::{AppError, AppResult};
use relief_prompt::PromptSet;
use std::sync::Arc;
use tracing::instrument;

/// Decides between the grounded and the fallback prompt for a query.
///
/// Relevance is judged on cosine similarity between the query vector and
/// freshly re-embedded candidate passages, never on the index distance, so
/// the gate behaves the same whatever metric the index was built with.
pub struct RetrievalRouter {
    index: Arc<dyn VectorIndex>,
    passages: Arc<PassageStore>,
    embedder: Arc<dyn EmbeddingProvider>,
    prompts: Arc<PromptSet>,
    top_k: usize,
    threshold: f32,
}

impl RetrievalRouter {
    pub fn new(
        index: Arc<dyn VectorIndex>,
        passages: Arc<PassageStore>,
        embedder: Arc<dyn EmbeddingProvider>,
        prompts: Arc<PromptSet>,
        settings: &RetrievalSettings,
    ) -> Self {
        Self {
            index,
            passages,
            embedder,
            prompts,
            top_k: settings.top_k,
            threshold: settings.similarity_threshold,
        }
    }

    pub fn prompts(&self) -> &PromptSet {
        &self.prompts
    }

    pub fn passage_count(&self) -> usize {
        self.passages.len()
    }

    pub fn dimensions(&self) -> usize {
        self.index.dimensions()
    }

    /// Route a query whose embedding has already been computed.
    ///
    /// # Errors
    /// - `Embedding` if the query vector does not fit the index or a
    ///   candidate cannot be re-embedded (no partial grounding)
    /// - `CorpusUnavailable` if the index returns a position the passage
    ///   store does not hold
    /// - `Prompt` if rendering fails
    #[instrument(skip_all, fields(top_k = self.top_k, threshold = self.threshold))]
    pub async fn route(&self, query_vector: &[f32], query_text: &str) -> AppResult<Routed> {
        let k = self.top_k.min(self.index.len());
        if k == 0 {
            tracing::info!("No corpus available, routing to fallback");
            let decision = RelevanceDecision::from_scores(&[], self.threshold);
            return self.fallback(query_text, Vec::new(), decision);
        }

        let neighbors = self.index.search(query_vector, k)?;

        let passages = neighbors
            .iter()
            .map(|neighbor| {
                self.passages.get(neighbor.position).cloned().ok_or_else(|| {
                    AppError::CorpusUnavailable(format!(
                        "Index position {} has no passage (store holds {})",
                        neighbor.position,
                        self.passages.len()
                    ))
                })
            })
            .collect::<AppResult<Vec<_>>>()?;

        let texts: Vec<String> = passages.iter().map(|p| p.content.clone()).collect();
        let candidate_vectors = self.embedder.embed_batch(&texts).await?;
        if candidate_vectors.len() != passages.len() {
            return Err(AppError::Embedding(format!(
                "Embedded {} candidates, expected {}",
                candidate_vectors.len(),
                passages.len()
            )));
        }
        if let Some(bad) = candidate_vectors
            .iter()
            .find(|v| v.len() != query_vector.len())
        {
            return Err(AppError::Embedding(format!(
                "Candidate embedding has dimension {}, query has {}",
                bad.len(),
                query_vector.len()
            )));
        }

        let candidates: Vec<Candidate> = neighbors
            .into_iter()
            .zip(passages)
            .zip(candidate_vectors)
            .map(|((neighbor, passage), vector)| Candidate {
                position: neighbor.position,
                passage,
                distance: neighbor.distance,
                similarity: cosine_similarity(query_vector, &vector),
            })
            .collect();

        let similarities: Vec<f32> = candidates.iter().map(|c| c.similarity).collect();
        let decision = RelevanceDecision::from_scores(&similarities, self.threshold);

        tracing::debug!(
            positions = ?candidates.iter().map(|c| c.position).collect::<Vec<_>>(),
            scores = ?similarities,
            "Re-scored candidates"
        );
        tracing::info!(
            grounded = decision.grounded,
            best_score = decision.best_score,
            "Relevance decision"
        );

        if !decision.grounded {
            return self.fallback(query_text, candidates, decision);
        }

        let context = candidates
            .iter()
            .map(|c| c.passage.content.as_str())
            .collect::<Vec<_>>()
            .join("\n");
        let prompt = self.prompts.render_grounded(&context, query_text)?;

        Ok(Routed {
            prompt,
            decision,
            candidates,
        })
    }

    fn fallback(
        &self,
        query_text: &str,
        candidates: Vec<Candidate>,
        decision: RelevanceDecision,
    ) -> AppResult<Routed> {
        let prompt = self.prompts.render_fallback(query_text)?;
        Ok(Routed {
            prompt,
            decision,
            candidates,
        })
    }
}
