//! Generation backend integration for Relief.
//!
//! This crate provides a provider-agnostic abstraction over text-generation
//! backends. The query service only ever talks to [`LlmClient`], so the
//! concrete backend is chosen by configuration.
//!
//! # Providers
//! - **Ollama**: Local LLM runtime (default)
//! - **OpenAI-compatible**: any server exposing `/v1/completions`
//!   (llama.cpp, vLLM, text-generation-inference)
//!
//! # Example
//! ```no_run
//! use relief_llm::{LlmClient, LlmRequest, providers::OllamaClient};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = OllamaClient::new();
//! let request = LlmRequest::new("Question: what is a flood?\nAnswer:", "tinyllama")
//!     .with_max_tokens(250);
//! let response = client.complete(&request).await?;
//! println!("{}", response.content);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod factory;
pub mod providers;
pub mod types;

// Re-export main types
pub use client::{LlmClient, LlmRequest, LlmResponse, LlmUsage};
pub use factory::create_client;
pub use providers::{OllamaClient, OpenAiCompatClient};
pub use types::ProviderType;
