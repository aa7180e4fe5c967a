//! Router construction and the listener loop.

use crate::error::ApiError;
use crate::types::{HealthResponse, QueryRequest, QueryResponse};
use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use relief_core::config::ServerSettings;
use relief_core::{AppError, AppResult};
use relief_knowledge::QueryService;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::Instrument;

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<QueryService>,
}

/// Build the application router around a ready query service.
pub fn app_router(service: Arc<QueryService>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/query", post(query))
        .route("/health", get(health))
        .with_state(AppState { service })
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

/// Bind the configured address and serve until the process stops.
pub async fn run_server(settings: &ServerSettings, service: Arc<QueryService>) -> AppResult<()> {
    let addr: SocketAddr = format!("{}:{}", settings.host, settings.port)
        .parse()
        .map_err(|e| {
            AppError::Config(format!(
                "Invalid listen address {}:{}: {}",
                settings.host, settings.port, e
            ))
        })?;

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Relief listening on http://{}", addr);

    axum::serve(listener, app_router(service)).await?;
    Ok(())
}

async fn query(
    State(state): State<AppState>,
    Json(request): Json<QueryRequest>,
) -> Result<Json<QueryResponse>, ApiError> {
    let request_id = uuid::Uuid::new_v4();
    let span = tracing::info_span!("query", %request_id);

    let answer = state
        .service
        .handle(&request.query)
        .instrument(span)
        .await?;

    Ok(Json(QueryResponse {
        answer: answer.answer,
    }))
}

async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let router = state.service.router();
    Json(HealthResponse {
        status: "ok".to_string(),
        passages: router.passage_count(),
        dimensions: router.dimensions(),
    })
}
