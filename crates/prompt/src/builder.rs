//! Prompt rendering for the grounded and fallback templates.

use crate::types::{BuiltPrompt, PromptKind};
use handlebars::Handlebars;
use relief_core::{AppError, AppResult};
use std::fmt;

/// Phrase the default grounded template ends with.
pub const DEFAULT_ANSWER_CUE: &str = "Answer:";

/// Default grounded template: role instruction, context block, question, cue.
pub const DEFAULT_GROUNDED: &str = "You are a disaster management assistant. \
Use the context below to help the user.\n\n\
Context:\n{{context}}\n\n\
Question: {{question}}\n\
Answer:";

/// Default fallback template: conversational, question only.
pub const DEFAULT_FALLBACK: &str = "You are a helpful assistant. Respond conversationally.\n\n\
User: {{question}}\n\
Assistant:";

const GROUNDED_NAME: &str = "grounded";
const FALLBACK_NAME: &str = "fallback";

/// The validated pair of templates plus the answer cue.
///
/// Templates are registered once at construction so a malformed template is
/// a startup error rather than a per-request one.
pub struct PromptSet {
    registry: Handlebars<'static>,
    grounded: String,
    fallback: String,
    answer_cue: String,
}

impl PromptSet {
    /// Validate and register both templates.
    ///
    /// # Errors
    /// Returns `AppError::Prompt` if:
    /// - the answer cue is empty
    /// - the grounded template does not end with the answer cue
    /// - the grounded template does not reference `question` and `context`
    /// - the fallback template does not reference `question`
    /// - either template fails to parse
    pub fn new(
        grounded: impl Into<String>,
        fallback: impl Into<String>,
        answer_cue: impl Into<String>,
    ) -> AppResult<Self> {
        let grounded = grounded.into();
        let fallback = fallback.into();
        // Extraction splits on this exact string
        let answer_cue = answer_cue.into().trim().to_string();

        validate_templates(&grounded, &fallback, &answer_cue)?;

        let mut registry = Handlebars::new();

        // Disable HTML escaping for plain text
        registry.register_escape_fn(handlebars::no_escape);

        registry
            .register_template_string(GROUNDED_NAME, &grounded)
            .map_err(|e| AppError::Prompt(format!("Failed to register grounded template: {}", e)))?;
        registry
            .register_template_string(FALLBACK_NAME, &fallback)
            .map_err(|e| AppError::Prompt(format!("Failed to register fallback template: {}", e)))?;

        Ok(Self {
            registry,
            grounded,
            fallback,
            answer_cue,
        })
    }

    /// The built-in disaster-management templates.
    pub fn defaults() -> AppResult<Self> {
        Self::new(DEFAULT_GROUNDED, DEFAULT_FALLBACK, DEFAULT_ANSWER_CUE)
    }

    pub fn answer_cue(&self) -> &str {
        &self.answer_cue
    }

    pub fn grounded_template(&self) -> &str {
        &self.grounded
    }

    pub fn fallback_template(&self) -> &str {
        &self.fallback
    }

    /// Render the grounded template with a context block and the verbatim question.
    pub fn render_grounded(&self, context: &str, question: &str) -> AppResult<BuiltPrompt> {
        let data = serde_json::json!({
            "context": context,
            "question": question,
        });

        let text = self
            .registry
            .render(GROUNDED_NAME, &data)
            .map_err(|e| AppError::Prompt(format!("Failed to render grounded template: {}", e)))?;

        Ok(BuiltPrompt::new(PromptKind::Grounded, text))
    }

    /// Render the fallback template with the verbatim question only.
    pub fn render_fallback(&self, question: &str) -> AppResult<BuiltPrompt> {
        let data = serde_json::json!({ "question": question });

        let text = self
            .registry
            .render(FALLBACK_NAME, &data)
            .map_err(|e| AppError::Prompt(format!("Failed to render fallback template: {}", e)))?;

        Ok(BuiltPrompt::new(PromptKind::Fallback, text))
    }
}

impl fmt::Debug for PromptSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PromptSet")
            .field("grounded", &self.grounded)
            .field("fallback", &self.fallback)
            .field("answer_cue", &self.answer_cue)
            .finish()
    }
}

fn validate_templates(grounded: &str, fallback: &str, cue: &str) -> AppResult<()> {
    if cue.is_empty() {
        return Err(AppError::Prompt("Answer cue cannot be empty".to_string()));
    }

    if !grounded.trim_end().ends_with(cue) {
        return Err(AppError::Prompt(format!(
            "Grounded template must end with the answer cue {:?}",
            cue
        )));
    }

    for var in ["question", "context"] {
        if !references(grounded, var) {
            return Err(AppError::Prompt(format!(
                "Grounded template must reference {{{{{}}}}}",
                var
            )));
        }
    }

    if !references(fallback, "question") {
        return Err(AppError::Prompt(
            "Fallback template must reference {{question}}".to_string(),
        ));
    }

    Ok(())
}

/// Whether `template` contains a `{{var}}` (or `{{{var}}}`) expression.
fn references(template: &str, var: &str) -> bool {
    template.split("{{").skip(1).any(|segment| {
        segment
            .split("}}")
            .next()
            .map(|expr| expr.trim_start_matches('{').trim() == var)
            .unwrap_or(false)
    })
}
