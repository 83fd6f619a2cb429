//! Probe, identify, log in, re-probe
//!
//! One `Orchestrator` owns the session for a whole run and turns the
//! individual component results into a single `ExitOutcome`.

use crate::config::PortalConfig;
use crate::error::MosMetroError;
use crate::portal::probe::{ConnectivityProbe, ProbeAnomaly, ProbeResult};
use crate::portal::registry::ProviderRegistry;
use crate::portal::session::PortalSession;
use crate::types::ExitOutcome;
use crate::user_agent::pick_user_agent;
use reqwest::header::USER_AGENT;
use tracing::{debug, error, info, warn};

/// Runs the detection and login sequence
#[derive(Debug)]
pub struct Orchestrator {
    session: PortalSession,
    probe: ConnectivityProbe,
    registry: ProviderRegistry,
}

impl Orchestrator {
    pub fn new(session: PortalSession, probe: ConnectivityProbe, registry: ProviderRegistry) -> Self {
        Self {
            session,
            probe,
            registry,
        }
    }

    /// Build the session, probe and built-in registry for a configuration
    ///
    /// A random User-Agent is applied when a usable data file is
    /// configured; otherwise the client default stays in place.
    pub fn from_config(config: &PortalConfig) -> Result<Self, MosMetroError> {
        config.validate()?;

        let mut session = PortalSession::new(config)?;
        if let Some(agent) = pick_user_agent(config.user_agents.as_deref()) {
            match session.set_header(USER_AGENT, &agent) {
                Ok(()) => debug!(user_agent = %agent, "Using random User-Agent"),
                Err(e) => warn!("Random User-Agent disabled: {}", e),
            }
        }

        let probe = ConnectivityProbe::from_config(config)?;
        Ok(Self::new(session, probe, ProviderRegistry::builtin()))
    }

    /// Run the whole sequence once
    #[tracing::instrument(skip(self), fields(providers = ?self.registry.names()))]
    pub async fn run(&mut self) -> ExitOutcome {
        info!(
            "Captive portal check started at {}",
            chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
        );

        let redirect = match self.probe.check(&self.session).await {
            ProbeResult::Connected => {
                info!("Already connected");
                return ExitOutcome::AlreadyConnected;
            }
            ProbeResult::Blocked(redirect) => redirect,
            ProbeResult::Unexpected(anomaly) => {
                report_anomaly(anomaly);
                return ExitOutcome::WrongNetwork;
            }
        };

        let Some(mut handshake) = self.registry.identify(&redirect) else {
            warn!(
                location = redirect.location().unwrap_or_default(),
                "Wrong network"
            );
            return ExitOutcome::WrongNetwork;
        };

        match handshake.connect(&mut self.session, &self.probe).await {
            Ok(true) => {
                info!("Connected successfully");
                ExitOutcome::ConnectedNow
            }
            Ok(false) => {
                error!("Connection failed: the portal still intercepts traffic");
                ExitOutcome::Failed
            }
            Err(e) if e.is_user_actionable() => {
                warn!(provider = handshake.name(), "{}", e);
                ExitOutcome::Failed
            }
            Err(e) => {
                error!(provider = handshake.name(), "Connection failed: {}", e);
                ExitOutcome::Failed
            }
        }
    }
}

fn report_anomaly(anomaly: ProbeAnomaly) {
    if let ProbeAnomaly::Response(response) = &anomaly {
        warn!(
            status = %response.status(),
            url = %response.url(),
            headers = ?response.headers(),
            body = response.body().unwrap_or_default(),
            "Raw probe response"
        );
    }
    warn!("Wrong network: {}", anomaly.into_error());
}
