use std::sync::Arc;

use anyhow::Context;
use orchestrator::Orchestrator;
use providers::GeminiClient;
use shared::settings::load_settings_or_default;
use tokio::sync::mpsc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod commands;
mod files;
mod render;
mod repl;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let (settings, from_file) = load_settings_or_default();

    // Logs go to stderr so they never interleave with the transcript
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&settings.log_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if !from_file {
        warn!("no settings file found, using defaults");
    }

    let service = GeminiClient::from_settings(&settings)
        .context("Failed to set up the Gemini client (set GEMINI_API_KEY)")?;

    let (tx, rx) = mpsc::unbounded_channel();
    let orchestrator = Arc::new(Orchestrator::new(Arc::new(service), &settings).with_events(tx));
    info!(models = settings.models.len(), "AIVAN starting");

    let renderer = tokio::spawn(render::run(Arc::clone(&orchestrator), rx));
    let result = repl::run(Arc::clone(&orchestrator)).await;

    orchestrator.cancel_in_flight();
    renderer.abort();
    result?;
    Ok(())
}
