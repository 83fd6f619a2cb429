//! Handshake capability implemented by every supported portal family

use crate::error::PortalError;
use crate::portal::probe::ConnectivityProbe;
use crate::portal::session::PortalSession;
use async_trait::async_trait;

/// Login protocol for one captive-portal family
///
/// Instances are built by the registry from the redirect that identified
/// the portal. `connect` runs the whole handshake against the shared
/// session and finishes with a connectivity re-check.
#[async_trait]
pub trait Handshake: Send {
    /// Provider name used in log output
    fn name(&self) -> &'static str;

    /// Perform the login
    ///
    /// Returns `Ok(true)` when the re-check reports the network open,
    /// `Ok(false)` when the portal still intercepts traffic, and an error
    /// for terminal conditions such as a required registration.
    async fn connect(
        &mut self,
        session: &mut PortalSession,
        probe: &ConnectivityProbe,
    ) -> Result<bool, PortalError>;
}
