//! Test doubles for routing and service scenarios.

use crate::corpus::{FlatIndex, Passage, PassageStore, VectorIndex};
use crate::embeddings::EmbeddingProvider;
use crate::rag::{QueryService, RetrievalRouter};
use relief_core::config::{GenerationSettings, RetrievalSettings};
use relief_core::{AppError, AppResult};
use relief_llm::{LlmClient, LlmRequest, LlmResponse, LlmUsage};
use relief_prompt::PromptSet;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const FLOOD_PASSAGE: &str = "Evacuate low-lying areas during flood warnings.";
pub const QUAKE_PASSAGE: &str = "Drop, cover and hold on when an earthquake starts.";
pub const FIRE_PASSAGE: &str = "Clear dry brush around your home before wildfire season.";

/// Embeds text onto keyword axes: flood, earthquake, fire, color.
///
/// Text with no keyword maps to the zero vector.
#[derive(Debug, Default)]
pub struct KeywordEmbedder {
    pub embed_calls: AtomicUsize,
    pub batch_calls: AtomicUsize,
}

impl KeywordEmbedder {
    const AXES: [&'static [&'static str]; 4] = [
        &["flood", "flooding"],
        &["earthquake", "quake"],
        &["fire", "wildfire"],
        &["color", "colour"],
    ];

    pub fn vector(text: &str) -> Vec<f32> {
        let lower = text.to_lowercase();
        let words: Vec<&str> = lower.split(|c: char| !c.is_alphanumeric()).collect();
        Self::AXES
            .iter()
            .map(|keywords| words.iter().filter(|w| keywords.contains(w)).count() as f32)
            .collect()
    }
}

#[async_trait::async_trait]
impl EmbeddingProvider for KeywordEmbedder {
    fn provider_name(&self) -> &str {
        "keyword"
    }

    fn model_name(&self) -> &str {
        "keyword-axes"
    }

    fn dimensions(&self) -> usize {
        4
    }

    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        self.batch_calls.fetch_add(1, Ordering::SeqCst);
        Ok(texts.iter().map(|t| Self::vector(t)).collect())
    }

    async fn embed(&self, text: &str) -> AppResult<Vec<f32>> {
        self.embed_calls.fetch_add(1, Ordering::SeqCst);
        Ok(Self::vector(text))
    }
}

/// Returns exactly the vectors it was given; unknown text is an error.
#[derive(Debug)]
pub struct FixedEmbedder {
    vectors: HashMap<String, Vec<f32>>,
    dimensions: usize,
}

impl FixedEmbedder {
    pub fn new(dimensions: usize, entries: Vec<(&str, Vec<f32>)>) -> Self {
        Self {
            vectors: entries
                .into_iter()
                .map(|(text, v)| (text.to_string(), v))
                .collect(),
            dimensions,
        }
    }
}

#[async_trait::async_trait]
impl EmbeddingProvider for FixedEmbedder {
    fn provider_name(&self) -> &str {
        "fixed"
    }

    fn model_name(&self) -> &str {
        "fixed"
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        texts
            .iter()
            .map(|t| {
                self.vectors
                    .get(t)
                    .cloned()
                    .ok_or_else(|| AppError::Embedding(format!("no fixture vector for {:?}", t)))
            })
            .collect()
    }
}

/// Embeds queries but fails on every batch (candidate re-scoring).
#[derive(Debug)]
pub struct BrokenBatchEmbedder;

#[async_trait::async_trait]
impl EmbeddingProvider for BrokenBatchEmbedder {
    fn provider_name(&self) -> &str {
        "broken"
    }

    fn model_name(&self) -> &str {
        "broken"
    }

    fn dimensions(&self) -> usize {
        4
    }

    async fn embed_batch(&self, _texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        Err(AppError::Embedding("embedding server went away".to_string()))
    }

    async fn embed(&self, text: &str) -> AppResult<Vec<f32>> {
        Ok(KeywordEmbedder::vector(text))
    }
}

/// Rejects single-text embedding, so every query fails before retrieval.
#[derive(Debug)]
pub struct FailingQueryEmbedder;

#[async_trait::async_trait]
impl EmbeddingProvider for FailingQueryEmbedder {
    fn provider_name(&self) -> &str {
        "failing"
    }

    fn model_name(&self) -> &str {
        "failing"
    }

    fn dimensions(&self) -> usize {
        4
    }

    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| KeywordEmbedder::vector(t)).collect())
    }

    async fn embed(&self, _text: &str) -> AppResult<Vec<f32>> {
        Err(AppError::Embedding("query embedding refused".to_string()))
    }
}

/// Generation double that records requests and replies after an optional delay.
pub struct ScriptedLlm {
    reply: Reply,
    delay: Option<Duration>,
    pub requests: Mutex<Vec<LlmRequest>>,
    in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
}

pub enum Reply {
    /// Echo the prompt, then append this text
    Echo(&'static str),
    Fixed(&'static str),
    Fail,
}

impl ScriptedLlm {
    pub fn new(reply: Reply) -> Self {
        Self {
            reply,
            delay: None,
            requests: Mutex::new(Vec::new()),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait::async_trait]
impl LlmClient for ScriptedLlm {
    fn provider_name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse> {
        self.requests.lock().unwrap().push(request.clone());

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        let content = match self.reply {
            Reply::Echo(tail) => format!("{} {}", request.prompt, tail),
            Reply::Fixed(text) => text.to_string(),
            Reply::Fail => return Err(AppError::Generation("backend returned 500".to_string())),
        };

        Ok(LlmResponse {
            content,
            model: request.model.clone(),
            usage: LlmUsage::new(10, 5),
            done: true,
        })
    }
}

/// The three-passage disaster corpus indexed with keyword vectors.
pub fn disaster_corpus() -> (Arc<FlatIndex>, Arc<PassageStore>) {
    let texts = [FLOOD_PASSAGE, QUAKE_PASSAGE, FIRE_PASSAGE];
    let index = FlatIndex::new(4, texts.iter().map(|t| KeywordEmbedder::vector(t)).collect())
        .unwrap();
    let passages = PassageStore::from_passages(texts.iter().map(|t| Passage::new(*t)).collect());
    (Arc::new(index), Arc::new(passages))
}

pub fn retrieval(top_k: usize, threshold: f32) -> RetrievalSettings {
    RetrievalSettings {
        top_k,
        similarity_threshold: threshold,
    }
}

pub fn router(
    index: Arc<dyn VectorIndex>,
    passages: Arc<PassageStore>,
    embedder: Arc<dyn EmbeddingProvider>,
    settings: RetrievalSettings,
) -> RetrievalRouter {
    let prompts = Arc::new(PromptSet::defaults().unwrap());
    RetrievalRouter::new(index, passages, embedder, prompts, &settings)
}

/// Service over the disaster corpus with the keyword embedder.
pub fn disaster_service(
    llm: Arc<ScriptedLlm>,
    generation: GenerationSettings,
) -> (QueryService, Arc<KeywordEmbedder>) {
    let (index, passages) = disaster_corpus();
    let embedder = Arc::new(KeywordEmbedder::default());
    let router = router(index, passages, embedder.clone(), retrieval(2, 0.5));
    let service = QueryService::new(embedder.clone(), router, llm, "tinyllama", generation);
    (service, embedder)
}
