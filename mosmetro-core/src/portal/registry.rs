//! Registry of known portal providers
//!
//! Providers are registered in a fixed order at start-up. Identification
//! walks that order and the first provider whose predicate accepts the
//! intercepting redirect wins.

use crate::portal::mosmetro_v2::MosMetroV2;
use crate::portal::provider::Handshake;
use crate::portal::response::CapturedResponse;
use tracing::{debug, info};

/// Predicate and constructor for one provider
#[derive(Clone, Copy)]
pub struct ProviderDescriptor {
    /// Provider name used in log output
    pub name: &'static str,
    /// Whether the redirect belongs to this provider's portal family
    pub matches: fn(&CapturedResponse) -> bool,
    /// Build a handshake bound to the triggering redirect
    pub build: fn(CapturedResponse) -> Box<dyn Handshake>,
}

impl std::fmt::Debug for ProviderDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderDescriptor")
            .field("name", &self.name)
            .finish()
    }
}

/// Ordered set of provider descriptors
#[derive(Debug, Clone)]
pub struct ProviderRegistry {
    providers: Vec<ProviderDescriptor>,
}

impl ProviderRegistry {
    /// Create a registry with no providers
    pub fn empty() -> Self {
        Self {
            providers: Vec::new(),
        }
    }

    /// Create a registry with every built-in provider
    pub fn builtin() -> Self {
        let mut registry = Self::empty();
        registry.register(MosMetroV2::descriptor());
        registry
    }

    /// Append a provider; earlier registrations take precedence
    pub fn register(&mut self, descriptor: ProviderDescriptor) {
        self.providers.push(descriptor);
    }

    /// Names of the registered providers, in match order
    pub fn names(&self) -> Vec<&'static str> {
        self.providers.iter().map(|p| p.name).collect()
    }

    /// Find the provider for an intercepting redirect
    pub fn identify(&self, redirect: &CapturedResponse) -> Option<Box<dyn Handshake>> {
        let descriptor = self.providers.iter().find(|p| (p.matches)(redirect));

        match descriptor {
            Some(descriptor) => {
                info!("Detected provider: {}", descriptor.name);
                Some((descriptor.build)(redirect.clone()))
            }
            None => {
                debug!(
                    location = redirect.location().unwrap_or_default(),
                    "No provider matches the redirect"
                );
                None
            }
        }
    }
}
