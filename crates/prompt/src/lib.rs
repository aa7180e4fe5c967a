//! Prompt templates for the Relief query service.
//!
//! This crate provides:
//! - YAML-based prompt definitions (grounded and fallback roles)
//! - Handlebars template rendering with HTML escaping disabled
//! - A validated [`PromptSet`] the retrieval router renders from

pub mod builder;
pub mod loader;
pub mod types;

// Re-export main types
pub use builder::{PromptSet, DEFAULT_ANSWER_CUE, DEFAULT_FALLBACK, DEFAULT_GROUNDED};
pub use loader::{list_prompts, load_prompt, load_prompt_set};
pub use types::{BuiltPrompt, PromptDefinition, PromptKind};
