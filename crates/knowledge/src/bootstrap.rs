//! Startup wiring from configuration to a ready [`QueryService`].

use crate::corpus::{verify_alignment, CorpusReport, FlatIndex, PassageStore, VectorIndex};
use crate::embeddings::{create_provider, EmbeddingProvider};
use crate::rag::{QueryService, RetrievalRouter};
use relief_core::{AppConfig, AppResult};
use relief_llm::create_client;
use relief_prompt::load_prompt_set;
use std::sync::Arc;

/// Index and passages that passed the alignment checks.
pub struct LoadedCorpus {
    pub index: Arc<dyn VectorIndex>,
    pub passages: Arc<PassageStore>,
    pub report: CorpusReport,
}

/// Load and verify the corpus against an embedding dimension.
pub fn load_corpus(config: &AppConfig, embedding_dimensions: usize) -> AppResult<LoadedCorpus> {
    let index = FlatIndex::load_faiss(&config.index_path())?;
    let passages = PassageStore::load(&config.metadata_path())?;

    let report = verify_alignment(&index, &passages, embedding_dimensions, &config.corpus)?;

    tracing::info!(
        passages = report.passages,
        dimensions = report.dimensions,
        checksum = %report.checksum,
        "Corpus verified"
    );

    Ok(LoadedCorpus {
        index: Arc::new(index),
        passages: Arc::new(passages),
        report,
    })
}

/// Run the corpus self-checks without building a generation client.
///
/// Uses the configured dimension rather than a live provider, so it works
/// while the embedding server is down.
pub fn check_corpus(config: &AppConfig) -> AppResult<CorpusReport> {
    load_corpus(config, config.embedding.dimensions).map(|loaded| loaded.report)
}

/// Build the query service from configuration.
pub async fn build_service(config: &AppConfig) -> AppResult<QueryService> {
    let embedder = create_provider(&config.embedding).await?;
    build_service_with_embedder(config, embedder)
}

/// Build the query service around an existing embedding provider.
pub fn build_service_with_embedder(
    config: &AppConfig,
    embedder: Arc<dyn EmbeddingProvider>,
) -> AppResult<QueryService> {
    let corpus = load_corpus(config, embedder.dimensions())?;
    let prompts = Arc::new(load_prompt_set(config)?);

    let llm = create_client(
        &config.provider,
        config.provider_endpoint(),
        config.resolve_api_key(&config.provider).as_deref(),
        Some(config.provider_timeout()),
    )?;

    tracing::info!(
        provider = %config.provider,
        model = %config.model,
        embedding = embedder.provider_name(),
        top_k = config.retrieval.top_k,
        threshold = config.retrieval.similarity_threshold,
        "Query service ready"
    );

    let router = RetrievalRouter::new(
        corpus.index,
        corpus.passages,
        Arc::clone(&embedder),
        prompts,
        &config.retrieval,
    );

    Ok(QueryService::new(
        embedder,
        router,
        llm,
        config.model.clone(),
        config.generation.clone(),
    ))
}
