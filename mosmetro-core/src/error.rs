//! Error types for the mosmetro captive-portal client
//!
//! This module defines all error types used throughout the application,
//! providing consistent error handling and user-friendly error messages.

use thiserror::Error;

/// Main error type for the mosmetro application
#[derive(Error, Debug)]
pub enum MosMetroError {
    /// Errors related to building or validating the run configuration
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Errors raised while talking to the captive portal
    #[error("Portal error: {0}")]
    Portal(#[from] PortalError),
}

/// Configuration-related errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid probe endpoint URL: {url}")]
    InvalidUrl { url: String },

    #[error("Unsupported probe endpoint scheme: {scheme} (only http and https are allowed)")]
    UnsupportedScheme { scheme: String },

    #[error("Request timeout cannot be zero")]
    ZeroTimeout,

    #[error("Invalid host override: {value} (expected HOST=IP)")]
    InvalidResolve { value: String },

    #[error("Failed to read User-Agent data from {path}: {message}")]
    UserAgentData { path: String, message: String },
}

/// Captive-portal detection and handshake errors
///
/// Every variant is terminal for the current attempt. The handshake is never
/// retried in-process; a fresh run is the only remedy.
#[derive(Error, Debug)]
pub enum PortalError {
    #[error("Network error while requesting {url}: {reason}")]
    Network { url: String, reason: String },

    #[error("Unexpected response {status} from {url}")]
    UnexpectedResponse { status: u16, url: String },

    #[error("Redirect response {status} carries no Location header")]
    MissingLocation { status: u16 },

    #[error("Invalid redirect target {location}: {reason}")]
    InvalidRedirect { location: String, reason: String },

    #[error("Registration is required. Please go to {url}")]
    RegistrationRequired { url: String },

    #[error("You probably have been temporarily banned (redirected to {location})")]
    TemporaryBan { location: String },

    #[error("Invalid value for header {name}: {reason}")]
    InvalidHeader { name: String, reason: String },

    #[error("HTTP client creation failed: {0}")]
    Client(#[source] reqwest::Error),
}

impl PortalError {
    /// Build a network error from a failed request, keeping the target URL
    pub fn network(url: &str, err: &reqwest::Error) -> Self {
        let reason = if err.is_timeout() {
            "request timed out".to_string()
        } else if err.is_connect() {
            "connection refused or unreachable".to_string()
        } else {
            format!("request failed: {}", err)
        };

        PortalError::Network {
            url: url.to_string(),
            reason,
        }
    }

    /// Whether the user has to act before another run can succeed
    pub fn is_user_actionable(&self) -> bool {
        matches!(
            self,
            PortalError::RegistrationRequired { .. } | PortalError::TemporaryBan { .. }
        )
    }
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, MosMetroError>;
