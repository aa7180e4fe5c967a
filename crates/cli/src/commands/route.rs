//! Route command handler.
//!
//! Shows which template a question would get and why, without calling the
//! generation backend. Useful for tuning the similarity threshold.

use clap::Args;
use relief_core::{config::AppConfig, AppError, AppResult};
use relief_knowledge::build_service;

/// Show the relevance decision and prompt for a question
#[derive(Args, Debug)]
pub struct RouteCommand {
    /// The question to route
    pub question: String,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl RouteCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        let service = build_service(config).await?;
        let routed = service.route_only(&self.question).await?;

        if self.json {
            let json = serde_json::to_string_pretty(&routed)
                .map_err(|e| AppError::Serialization(e.to_string()))?;
            println!("{}", json);
            return Ok(());
        }

        let verdict = if routed.decision.grounded {
            "grounded"
        } else {
            "fallback"
        };
        match routed.decision.best_score {
            Some(best) => println!(
                "Decision: {} (best {:.4}, threshold {:.4})",
                verdict, best, config.retrieval.similarity_threshold
            ),
            None => println!("Decision: {} (no candidates)", verdict),
        }

        for candidate in &routed.candidates {
            println!(
                "  #{:<5} similarity {:.4}  distance {:.4}  {}",
                candidate.position,
                candidate.similarity,
                candidate.distance,
                preview(&candidate.passage.content, 60)
            );
        }

        println!("\n{}", routed.prompt.text);
        Ok(())
    }
}

fn preview(text: &str, max_chars: usize) -> String {
    let flat = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= max_chars {
        flat
    } else {
        let cut: String = flat.chars().take(max_chars).collect();
        format!("{}...", cut)
    }
}
