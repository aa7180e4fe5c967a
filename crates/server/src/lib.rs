//! HTTP surface for the Relief query service.
//!
//! One JSON endpoint answers questions; a second reports readiness. The
//! handlers are thin: all decisions happen inside [`QueryService`].

mod error;
mod routes;
mod types;

pub use error::ApiError;
pub use routes::{app_router, run_server, AppState};
pub use types::{HealthResponse, QueryRequest, QueryResponse};

pub use relief_knowledge::QueryService;
