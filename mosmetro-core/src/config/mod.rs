//! Configuration module
//!
//! Holds the per-run settings. Nothing is persisted: the CLI builds a
//! `PortalConfig` from flags and environment variables on every start.

use crate::error::ConfigError;
use std::net::IpAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use url::Url;

/// Plain-HTTP leg of the connectivity probe
pub const DEFAULT_HTTP_PROBE: &str = "http://google.com/generate_204";

/// TLS leg of the connectivity probe
pub const DEFAULT_HTTPS_PROBE: &str = "https://google.com/generate_204";

/// Per-request timeout in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Pins a host name to a fixed address for every session request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostOverride {
    pub host: String,
    pub addr: IpAddr,
}

impl FromStr for HostOverride {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let invalid = || ConfigError::InvalidResolve {
            value: value.to_string(),
        };

        let (host, addr) = value.split_once('=').ok_or_else(invalid)?;
        let host = host.trim();
        if host.is_empty() {
            return Err(invalid());
        }
        let addr = addr.trim().parse::<IpAddr>().map_err(|_| invalid())?;

        Ok(Self {
            host: host.to_string(),
            addr,
        })
    }
}

/// Settings for one detection and login run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortalConfig {
    /// Plain-HTTP generate-204 endpoint
    pub http_probe: String,

    /// HTTPS generate-204 endpoint, probed with certificate checks relaxed
    pub https_probe: String,

    /// Timeout applied to every request, in seconds
    pub timeout_secs: u64,

    /// Optional User-Agent data file
    pub user_agents: Option<PathBuf>,

    /// Static name resolution overrides
    pub resolve: Vec<HostOverride>,
}

impl PortalConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_endpoint(&self.http_probe)?;
        validate_endpoint(&self.https_probe)?;

        if self.timeout_secs == 0 {
            return Err(ConfigError::ZeroTimeout);
        }

        Ok(())
    }

    /// Request timeout as a `Duration`
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for PortalConfig {
    fn default() -> Self {
        Self {
            http_probe: DEFAULT_HTTP_PROBE.to_string(),
            https_probe: DEFAULT_HTTPS_PROBE.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            user_agents: None,
            resolve: Vec::new(),
        }
    }
}

fn validate_endpoint(endpoint: &str) -> Result<(), ConfigError> {
    let url = Url::parse(endpoint).map_err(|_| ConfigError::InvalidUrl {
        url: endpoint.to_string(),
    })?;

    match url.scheme() {
        "http" | "https" => Ok(()),
        scheme => Err(ConfigError::UnsupportedScheme {
            scheme: scheme.to_string(),
        }),
    }
}
