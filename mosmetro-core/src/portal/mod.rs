//! Captive portal detection and login
//!
//! Connectivity probing, provider identification and the provider
//! handshakes, tied together by the orchestrator.

pub mod orchestrator;
pub mod probe;
pub mod provider;
pub mod registry;
pub mod response;
pub mod session;

// Portal families
pub mod mosmetro_v2;

// Public re-exports
pub use orchestrator::Orchestrator;
pub use probe::{ConnectivityProbe, ProbeAnomaly, ProbeResult};
pub use provider::Handshake;
pub use registry::{ProviderDescriptor, ProviderRegistry};
pub use response::CapturedResponse;
pub use session::{PortalSession, Redirects};
