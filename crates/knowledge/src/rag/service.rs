//! Query service: validate, embed, route, generate, extract.

use crate::embeddings::EmbeddingProvider;
use crate::rag::answer::extract_answer;
use crate::rag::router::RetrievalRouter;
use crate::rag::types::{QueryAnswer, Routed};
use relief_core::config::GenerationSettings;
use relief_core::{AppError, AppResult};
use relief_llm::{LlmClient, LlmRequest};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tracing::instrument;

/// End-to-end handler for one question.
///
/// Built once at startup and shared across requests; it holds no per-request
/// state. Generation calls are admission-controlled and the wait for a permit
/// counts against the same deadline as the call itself.
pub struct QueryService {
    embedder: Arc<dyn EmbeddingProvider>,
    router: RetrievalRouter,
    llm: Arc<dyn LlmClient>,
    model: String,
    generation: GenerationSettings,
    timeout: Duration,
    permits: Arc<Semaphore>,
}

impl QueryService {
    pub fn new(
        embedder: Arc<dyn EmbeddingProvider>,
        router: RetrievalRouter,
        llm: Arc<dyn LlmClient>,
        model: impl Into<String>,
        generation: GenerationSettings,
    ) -> Self {
        let timeout = Duration::from_secs(generation.timeout_secs);
        let permits = Arc::new(Semaphore::new(generation.max_concurrent.max(1)));

        Self {
            embedder,
            router,
            llm,
            model: model.into(),
            generation,
            timeout,
            permits,
        }
    }

    /// Override the generation deadline.
    pub fn with_generation_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn router(&self) -> &RetrievalRouter {
        &self.router
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Answer a question.
    ///
    /// # Errors
    /// - `InvalidInput` for an empty or whitespace-only query; nothing
    ///   downstream is called
    /// - `Embedding`, `CorpusUnavailable`, `Prompt` from routing
    /// - `Generation` if the backend fails
    /// - `GenerationTimeout` if no answer arrives before the deadline
    #[instrument(skip_all, fields(query_len = query.len()))]
    pub async fn handle(&self, query: &str) -> AppResult<QueryAnswer> {
        let routed = self.route_only(query).await?;

        let request = LlmRequest::new(routed.prompt.text.as_str(), self.model.as_str())
            .with_max_tokens(self.generation.max_tokens)
            .with_temperature(self.generation.temperature)
            .with_top_p(self.generation.top_p);

        let response = self.generate(&request).await?;
        let answer = extract_answer(&response.content, self.router.prompts().answer_cue());

        tracing::info!(
            grounded = routed.decision.grounded,
            completion_tokens = response.usage.completion_tokens,
            "Answered query"
        );

        Ok(QueryAnswer {
            answer,
            decision: routed.decision,
            model: response.model,
        })
    }

    /// Validate, embed and route a question without generating.
    pub async fn route_only(&self, query: &str) -> AppResult<Routed> {
        if query.trim().is_empty() {
            return Err(AppError::InvalidInput(
                "query must not be empty".to_string(),
            ));
        }

        // Embedded once; the same vector drives retrieval and re-scoring
        let query_vector = self.embedder.embed(query).await?;

        self.router.route(&query_vector, query).await
    }

    async fn generate(&self, request: &LlmRequest) -> AppResult<relief_llm::LlmResponse> {
        let call = async {
            let _permit = self
                .permits
                .acquire()
                .await
                .map_err(|e| AppError::Generation(format!("Generation pool closed: {}", e)))?;

            tracing::debug!(
                provider = self.llm.provider_name(),
                prompt_len = request.prompt.len(),
                "Calling generation backend"
            );
            self.llm.complete(request).await
        };

        match tokio::time::timeout(self.timeout, call).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!(timeout_ms = self.timeout.as_millis() as u64, "Generation timed out");
                Err(AppError::GenerationTimeout(self.timeout))
            }
        }
    }
}
