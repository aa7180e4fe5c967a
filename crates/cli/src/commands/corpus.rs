//! Corpus command handler.

use clap::{Args, Subcommand};
use relief_core::{config::AppConfig, AppError, AppResult};
use relief_knowledge::check_corpus;

/// Corpus maintenance
#[derive(Args, Debug)]
pub struct CorpusCommand {
    #[command(subcommand)]
    pub action: CorpusAction,
}

#[derive(Subcommand, Debug)]
pub enum CorpusAction {
    /// Run the startup self-checks against the configured corpus
    Check(CorpusCheckCommand),
}

#[derive(Args, Debug)]
pub struct CorpusCheckCommand {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl CorpusCommand {
    pub fn execute(&self, config: &AppConfig) -> AppResult<()> {
        match &self.action {
            CorpusAction::Check(cmd) => cmd.execute(config),
        }
    }
}

impl CorpusCheckCommand {
    pub fn execute(&self, config: &AppConfig) -> AppResult<()> {
        let report = check_corpus(config)?;

        if self.json {
            let json = serde_json::to_string_pretty(&report)
                .map_err(|e| AppError::Serialization(e.to_string()))?;
            println!("{}", json);
        } else {
            println!("Index:      {}", config.index_path().display());
            println!("Passages:   {}", config.metadata_path().display());
            println!("Count:      {}", report.passages);
            println!("Dimensions: {}", report.dimensions);
            println!("Checksum:   {}", report.checksum);
        }

        Ok(())
    }
}
