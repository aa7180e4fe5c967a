//! Relief Core Library
//!
//! This crate provides the foundational utilities shared by every Relief crate:
//! - Error handling (`AppError`, `AppResult`)
//! - Logging infrastructure
//! - Configuration management (retrieval, generation, corpus, server settings)

pub mod config;
pub mod error;
pub mod logging;

// Re-export commonly used types
pub use config::AppConfig;
pub use error::{AppError, AppResult};
