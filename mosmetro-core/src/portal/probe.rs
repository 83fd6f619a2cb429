//! Generate-204 connectivity probe
//!
//! An unintercepted network answers the probe endpoints with an empty
//! `204 No Content`. Captive portals answer with a redirect to their login
//! page, and some of them intercept plain HTTP only, so both a plain and a
//! TLS leg have to come back clean before the network counts as open.

use crate::config::PortalConfig;
use crate::error::{ConfigError, PortalError};
use crate::portal::response::CapturedResponse;
use crate::portal::session::{PortalSession, Redirects};
use reqwest::{Response, StatusCode};
use tracing::debug;
use url::Url;

/// Outcome of a connectivity check
#[derive(Debug)]
pub enum ProbeResult {
    /// Both legs answered 204, no portal present
    Connected,
    /// A portal intercepted the probe with a redirect
    Blocked(CapturedResponse),
    /// Neither a clean 204 nor a redirect
    Unexpected(ProbeAnomaly),
}

impl ProbeResult {
    pub fn is_connected(&self) -> bool {
        matches!(self, ProbeResult::Connected)
    }
}

/// What made a probe result unexpected
#[derive(Debug)]
pub enum ProbeAnomaly {
    /// A response that was neither 204 nor a redirect
    Response(CapturedResponse),
    /// The request did not complete
    Transport(PortalError),
}

impl ProbeAnomaly {
    /// Convert into the portal error taxonomy
    pub fn into_error(self) -> PortalError {
        match self {
            ProbeAnomaly::Response(response) => PortalError::UnexpectedResponse {
                status: response.status().as_u16(),
                url: response.url().to_string(),
            },
            ProbeAnomaly::Transport(error) => error,
        }
    }
}

/// Issues the two-leg generate-204 check
#[derive(Debug, Clone)]
pub struct ConnectivityProbe {
    http: Url,
    https: Url,
}

impl ConnectivityProbe {
    /// Create a probe for explicit endpoints
    pub fn new(http: Url, https: Url) -> Self {
        Self { http, https }
    }

    /// Create a probe from the configured endpoints
    pub fn from_config(config: &PortalConfig) -> Result<Self, ConfigError> {
        let parse = |endpoint: &str| {
            Url::parse(endpoint).map_err(|_| ConfigError::InvalidUrl {
                url: endpoint.to_string(),
            })
        };

        Ok(Self::new(
            parse(&config.http_probe)?,
            parse(&config.https_probe)?,
        ))
    }

    /// Run the check
    ///
    /// The plain-HTTP leg goes first; the TLS leg, with certificate
    /// validation relaxed, is only issued once the first leg returned 204.
    #[tracing::instrument(skip_all, fields(http = %self.http, https = %self.https))]
    pub async fn check(&self, session: &PortalSession) -> ProbeResult {
        let plain = match session.get(&self.http, Redirects::Manual).await {
            Ok(response) => response,
            Err(e) => return transport_failure(e),
        };
        debug!(status = %plain.status(), "Plain HTTP probe answered");

        if plain.status() != StatusCode::NO_CONTENT {
            return classify(plain).await;
        }

        let secure = match session.probe_insecure(&self.https).await {
            Ok(response) => response,
            Err(e) => return transport_failure(e),
        };
        debug!(status = %secure.status(), "HTTPS probe answered");

        if secure.status() != StatusCode::NO_CONTENT {
            return classify(secure).await;
        }

        ProbeResult::Connected
    }
}

async fn classify(response: Response) -> ProbeResult {
    // Redirect bodies are irrelevant; anything else is kept for diagnostics
    let keep_body = !response.status().is_redirection();
    let captured = CapturedResponse::capture(response, keep_body).await;

    if captured.is_redirect() {
        debug!(
            status = %captured.status(),
            location = captured.location().unwrap_or_default(),
            "Probe was redirected"
        );
        ProbeResult::Blocked(captured)
    } else {
        ProbeResult::Unexpected(ProbeAnomaly::Response(captured))
    }
}

fn transport_failure(error: PortalError) -> ProbeResult {
    debug!("Connectivity probe failed: {}", error);
    ProbeResult::Unexpected(ProbeAnomaly::Transport(error))
}
