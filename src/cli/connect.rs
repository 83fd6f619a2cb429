//! Captive-portal login command

use colored::Colorize;
use mosmetro_core::config::PortalConfig;
use mosmetro_core::error::MosMetroError;
use mosmetro_core::portal::Orchestrator;
use mosmetro_core::types::ExitOutcome;

/// Detect the portal, log in and report the verdict
pub async fn run_connect(config: PortalConfig) -> Result<ExitOutcome, MosMetroError> {
    let mut orchestrator = Orchestrator::from_config(&config)?;
    let outcome = orchestrator.run().await;

    let verdict = match outcome {
        ExitOutcome::AlreadyConnected => "Already connected".green(),
        ExitOutcome::ConnectedNow => "Connected successfully! :3".green().bold(),
        ExitOutcome::Failed => "Connection failed :(".red().bold(),
        ExitOutcome::WrongNetwork => "Wrong network".yellow(),
    };
    println!("{}", verdict);

    Ok(outcome)
}
