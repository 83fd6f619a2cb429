//! Type definitions shared across the portal client
//!
//! Session tokens are wrapped with the secrecy crate so they never end up
//! in logs or debug output.

use secrecy::{ExposeSecret, Secret};

/// Anti-forgery token scraped from the portal's authentication page
///
/// The portal expects it echoed back in the `X-CSRF-Token` header of the
/// auth submission. It is scoped to one session and never logged.
#[derive(Clone, Debug)]
pub struct CsrfToken(Secret<String>);

impl CsrfToken {
    /// Create a new token from the raw attribute value
    pub fn new(token: String) -> Self {
        Self(Secret::new(token))
    }

    /// Expose the token value (use with caution!)
    ///
    /// Only needed when writing the request header.
    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }
}

/// Final verdict of one run
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExitOutcome {
    /// No portal in the way, nothing was done
    AlreadyConnected,
    /// A portal was found and the handshake lifted the restriction
    ConnectedNow,
    /// A known portal was found but the handshake did not succeed
    Failed,
    /// The network is not one this client knows how to log into
    WrongNetwork,
}

impl ExitOutcome {
    /// Process exit code for this outcome
    ///
    /// Success of either kind maps to 0, a failed handshake to 1 and an
    /// unknown network to 2.
    pub fn exit_code(self) -> i32 {
        match self {
            ExitOutcome::AlreadyConnected | ExitOutcome::ConnectedNow => 0,
            ExitOutcome::Failed => 1,
            ExitOutcome::WrongNetwork => 2,
        }
    }
}
