//! mosmetro - automatic captive-portal login
//!
//! Detects whether the current network is behind a wi-fi.ru captive portal
//! and performs the login handshake instead of the browser redirect chain.

use clap::Parser;
use mosmetro_core::config::{
    HostOverride, PortalConfig, DEFAULT_HTTPS_PROBE, DEFAULT_HTTP_PROBE, DEFAULT_TIMEOUT_SECS,
};
use mosmetro_core::error::MosMetroError;
use mosmetro_core::init_logging;
use std::path::PathBuf;
use tracing::level_filters::LevelFilter;

mod cli;

/// Exit code for configuration and start-up failures
const EXIT_SETUP_FAILURE: i32 = 3;

#[derive(Parser)]
#[command(name = "mosmetro")]
#[command(about = "Automatic login for wi-fi.ru public Wi-Fi captive portals")]
#[command(version)]
struct Cli {
    /// Plain-HTTP generate-204 endpoint
    #[arg(long, env = "MOSMETRO_HTTP_PROBE", default_value = DEFAULT_HTTP_PROBE)]
    http_probe: String,

    /// HTTPS generate-204 endpoint (certificate validation relaxed)
    #[arg(long, env = "MOSMETRO_HTTPS_PROBE", default_value = DEFAULT_HTTPS_PROBE)]
    https_probe: String,

    /// Per-request timeout in seconds
    #[arg(long, env = "MOSMETRO_TIMEOUT", default_value_t = DEFAULT_TIMEOUT_SECS)]
    timeout: u64,

    /// JSON file with browser User-Agent strings to pick from
    #[arg(long, env = "MOSMETRO_USER_AGENTS", value_name = "FILE")]
    user_agents: Option<PathBuf>,

    /// Resolve HOST to IP for every request (repeatable)
    #[arg(long, value_name = "HOST=IP")]
    resolve: Vec<HostOverride>,

    /// Show every request
    #[arg(short, long, conflicts_with = "quiet")]
    verbose: bool,

    /// Only show warnings and errors
    #[arg(short, long)]
    quiet: bool,
}

impl Cli {
    fn log_level(&self) -> LevelFilter {
        if self.verbose {
            LevelFilter::DEBUG
        } else if self.quiet {
            LevelFilter::WARN
        } else {
            LevelFilter::INFO
        }
    }

    fn into_config(self) -> PortalConfig {
        PortalConfig {
            http_probe: self.http_probe,
            https_probe: self.https_probe,
            timeout_secs: self.timeout,
            user_agents: self.user_agents,
            resolve: self.resolve,
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();

    // Initialize logging
    if let Err(e) = init_logging(cli.log_level()) {
        eprintln!("Failed to initialize logging: {}", e);
        std::process::exit(EXIT_SETUP_FAILURE);
    }

    match cli::connect::run_connect(cli.into_config()).await {
        Ok(outcome) => std::process::exit(outcome.exit_code()),
        Err(e) => {
            let exit_code = match e {
                // Invalid flags or environment
                MosMetroError::Config(_) => EXIT_SETUP_FAILURE,
                // HTTP client could not be built
                MosMetroError::Portal(_) => EXIT_SETUP_FAILURE,
            };

            eprintln!("{}", e);
            std::process::exit(exit_code);
        }
    }
}
