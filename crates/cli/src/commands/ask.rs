//! Ask command handler.
//!
//! Runs one question through the same service the HTTP endpoint uses.

use clap::Args;
use relief_core::{config::AppConfig, AppError, AppResult};
use relief_knowledge::build_service;

/// Answer one question
#[derive(Args, Debug)]
pub struct AskCommand {
    /// The question to ask
    pub question: String,

    /// Output as JSON (answer plus relevance decision)
    #[arg(long)]
    pub json: bool,
}

impl AskCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        let service = build_service(config).await?;
        let answer = service.handle(&self.question).await?;

        if self.json {
            let output = serde_json::json!({
                "answer": answer.answer,
                "grounded": answer.decision.grounded,
                "bestScore": answer.decision.best_score,
                "model": answer.model,
                "provider": config.provider,
            });
            let json = serde_json::to_string_pretty(&output)
                .map_err(|e| AppError::Serialization(e.to_string()))?;
            println!("{}", json);
        } else {
            println!("{}", answer.answer);
            tracing::debug!(
                grounded = answer.decision.grounded,
                best_score = ?answer.decision.best_score,
                "Relevance decision"
            );
        }

        Ok(())
    }
}
