//! Prompt types for the Relief query service.
//!
//! This module defines the domain entities for the prompt system.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Which template produced a prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PromptKind {
    /// Question answered from retrieved corpus passages
    Grounded,
    /// Question answered without corpus context
    Fallback,
}

impl PromptKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Grounded => "grounded",
            Self::Fallback => "fallback",
        }
    }
}

impl fmt::Display for PromptKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A prompt definition loaded from YAML.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptDefinition {
    /// Unique prompt identifier
    pub id: String,

    /// Human-readable title
    pub title: String,

    /// API version for schema evolution
    #[serde(rename = "apiVersion")]
    pub api_version: String,

    /// Creator identifier
    #[serde(rename = "createdBy", default)]
    pub created_by: String,

    /// Role the template plays in routing
    pub kind: PromptKind,

    /// Template string with Handlebars syntax.
    ///
    /// Variables: `question` (both kinds), `context` (grounded only).
    pub template: String,

    /// Answer cue override (grounded definitions only)
    #[serde(rename = "answerCue", default, skip_serializing_if = "Option::is_none")]
    pub answer_cue: Option<String>,
}

/// A rendered prompt ready for the generation backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuiltPrompt {
    /// Template that produced the text
    pub kind: PromptKind,

    /// Rendered prompt text
    pub text: String,
}

impl BuiltPrompt {
    pub fn new(kind: PromptKind, text: String) -> Self {
        Self { kind, text }
    }
}
