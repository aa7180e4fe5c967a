use std::sync::Arc;

use relief_core::config::{GenerationSettings, RetrievalSettings};
use relief_core::{AppError, AppResult};
use relief_knowledge::{
    EmbeddingProvider, FlatIndex, Passage, PassageStore, QueryService, RetrievalRouter,
};
use relief_llm::{LlmClient, LlmRequest, LlmResponse, LlmUsage};
use relief_prompt::PromptSet;
use relief_server::{app_router, HealthResponse, QueryResponse};
use serde_json::Value;

const FLOOD: &str = "Evacuate low-lying areas during flood warnings.";
const QUAKE: &str = "Drop, cover and hold on when an earthquake starts.";

/// Two axes: flood and earthquake.
#[derive(Debug)]
struct TwoAxisEmbedder;

fn axes(text: &str) -> Vec<f32> {
    let lower = text.to_lowercase();
    vec![
        lower.matches("flood").count() as f32,
        lower.matches("earthquake").count() as f32,
    ]
}

#[async_trait::async_trait]
impl EmbeddingProvider for TwoAxisEmbedder {
    fn provider_name(&self) -> &str {
        "axes"
    }

    fn model_name(&self) -> &str {
        "axes"
    }

    fn dimensions(&self) -> usize {
        2
    }

    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| axes(t)).collect())
    }
}

/// Replies with the prompt plus a fixed tail, or fails when told to.
struct EchoLlm {
    fail: bool,
}

#[async_trait::async_trait]
impl LlmClient for EchoLlm {
    fn provider_name(&self) -> &str {
        "echo"
    }

    async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse> {
        if self.fail {
            return Err(AppError::Generation("backend returned 500".to_string()));
        }
        let tail = if request.prompt.contains(FLOOD) {
            " Move to higher ground."
        } else {
            " Happy to chat!"
        };
        Ok(LlmResponse {
            content: format!("{}{}", request.prompt, tail),
            model: request.model.clone(),
            usage: LlmUsage::new(12, 4),
            done: true,
        })
    }
}

fn service(fail: bool) -> Arc<QueryService> {
    let embedder: Arc<dyn EmbeddingProvider> = Arc::new(TwoAxisEmbedder);
    let index = FlatIndex::new(2, vec![axes(FLOOD), axes(QUAKE)]).expect("index");
    let passages = PassageStore::from_passages(vec![Passage::new(FLOOD), Passage::new(QUAKE)]);
    let prompts = PromptSet::defaults().expect("default prompts");

    let router = RetrievalRouter::new(
        Arc::new(index),
        Arc::new(passages),
        Arc::clone(&embedder),
        Arc::new(prompts),
        &RetrievalSettings {
            top_k: 2,
            similarity_threshold: 0.5,
        },
    );

    Arc::new(QueryService::new(
        embedder,
        router,
        Arc::new(EchoLlm { fail }),
        "tinyllama",
        GenerationSettings::default(),
    ))
}

async fn spawn_server(fail: bool) -> (String, tokio::task::JoinHandle<()>) {
    let app = app_router(service(fail));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind test listener");
    let addr = listener.local_addr().expect("listener addr");

    let handle = tokio::spawn(async move {
        axum::serve(listener, app).await.expect("server run");
    });

    (format!("http://{}", addr), handle)
}

#[tokio::test]
async fn grounded_query_returns_answer_only() {
    let (base, handle) = spawn_server(false).await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{}/query", base))
        .json(&serde_json::json!({ "query": "What should I do during a flood?" }))
        .send()
        .await
        .expect("query response");
    assert_eq!(response.status(), reqwest::StatusCode::OK);

    let body: Value = response.json().await.expect("query json");
    assert_eq!(body, serde_json::json!({ "answer": "Move to higher ground." }));

    handle.abort();
}

#[tokio::test]
async fn off_topic_query_uses_conversational_reply() {
    let (base, handle) = spawn_server(false).await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{}/query", base))
        .json(&serde_json::json!({ "query": "What's your favorite color?" }))
        .send()
        .await
        .expect("query response");
    assert!(response.status().is_success());

    let body: QueryResponse = response.json().await.expect("query json");
    // No cue in the fallback prompt, so the whole trimmed reply comes back
    assert!(body.answer.ends_with("Happy to chat!"));
    assert!(!body.answer.contains(FLOOD));

    handle.abort();
}

#[tokio::test]
async fn empty_query_is_bad_request() {
    let (base, handle) = spawn_server(false).await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{}/query", base))
        .json(&serde_json::json!({ "query": "   " }))
        .send()
        .await
        .expect("query response");
    assert_eq!(response.status(), reqwest::StatusCode::BAD_REQUEST);

    let body: Value = response.json().await.expect("error json");
    assert!(body.get("error").and_then(Value::as_str).is_some());

    handle.abort();
}

#[tokio::test]
async fn malformed_body_is_rejected() {
    let (base, handle) = spawn_server(false).await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{}/query", base))
        .json(&serde_json::json!({ "question": "flood?" }))
        .send()
        .await
        .expect("query response");
    assert_eq!(response.status(), reqwest::StatusCode::UNPROCESSABLE_ENTITY);

    handle.abort();
}

#[tokio::test]
async fn extra_body_keys_are_ignored() {
    let (base, handle) = spawn_server(false).await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{}/query", base))
        .json(&serde_json::json!({ "query": "What should I do during a flood?", "session": "abc" }))
        .send()
        .await
        .expect("query response");
    assert_eq!(response.status(), reqwest::StatusCode::OK);

    let body: QueryResponse = response.json().await.expect("query json");
    assert_eq!(body.answer, "Move to higher ground.");

    handle.abort();
}

#[tokio::test]
async fn backend_failure_is_bad_gateway() {
    let (base, handle) = spawn_server(true).await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{}/query", base))
        .json(&serde_json::json!({ "query": "flood?" }))
        .send()
        .await
        .expect("query response");
    assert_eq!(response.status(), reqwest::StatusCode::BAD_GATEWAY);

    handle.abort();
}

#[tokio::test]
async fn health_reports_corpus_shape() {
    let (base, handle) = spawn_server(false).await;

    let response = reqwest::get(format!("{}/health", base))
        .await
        .expect("health response");
    assert!(response.status().is_success());

    let body: HealthResponse = response.json().await.expect("health json");
    assert_eq!(body.status, "ok");
    assert_eq!(body.passages, 2);
    assert_eq!(body.dimensions, 2);

    handle.abort();
}

#[tokio::test]
async fn cors_allows_any_origin() {
    let (base, handle) = spawn_server(false).await;
    let client = reqwest::Client::new();

    let response = client
        .get(format!("{}/health", base))
        .header("Origin", "http://example.org")
        .send()
        .await
        .expect("health response");

    let allow = response
        .headers()
        .get("access-control-allow-origin")
        .and_then(|v| v.to_str().ok());
    assert_eq!(allow, Some("*"));

    handle.abort();
}
