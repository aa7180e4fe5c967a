//! Request and response bodies.

use serde::{Deserialize, Serialize};

/// Body of `POST /query`. Extra keys are ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryRequest {
    pub query: String,
}

/// Only the answer leaves the service; the relevance decision stays in logs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryResponse {
    pub answer: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub passages: usize,
    pub dimensions: usize,
}
