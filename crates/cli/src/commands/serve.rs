//! Serve command handler.

use clap::Args;
use relief_core::{config::AppConfig, AppResult};
use relief_knowledge::build_service;
use std::sync::Arc;

/// Start the HTTP query service
#[derive(Args, Debug)]
pub struct ServeCommand {
    /// Address to bind
    #[arg(long, env = "RELIEF_HOST")]
    pub host: Option<String>,

    /// Port to bind
    #[arg(long, env = "RELIEF_PORT")]
    pub port: Option<u16>,

    /// Emit logs as JSON lines
    #[arg(long)]
    pub json_logs: bool,
}

impl ServeCommand {
    /// Fold listener flags into the configuration before logging starts.
    pub fn apply(&self, config: &mut AppConfig) {
        if let Some(host) = &self.host {
            config.server.host = host.clone();
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if self.json_logs {
            config.json_logs = true;
        }
    }

    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Building query service");

        // Startup fails here if the corpus is missing or misaligned
        let service = Arc::new(build_service(config).await?);

        relief_server::run_server(&config.server, service).await
    }
}
