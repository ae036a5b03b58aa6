//! Discovery configuration for the in-process substrate

use std::time::Duration;

use super::memory::{MemoryNetwork, MemoryResolver, DEFAULT_FORGET_AFTER};
use super::predicate::PredicateError;

/// Discovery options
#[derive(Debug, Clone)]
pub struct DiscoveryConfig {
    /// Stream filter; empty matches every stream
    pub predicate: String,

    /// How long a stream that stopped announcing itself stays discoverable
    pub forget_after: Duration,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            predicate: String::new(),
            forget_after: DEFAULT_FORGET_AFTER,
        }
    }
}

impl DiscoveryConfig {
    /// Set the predicate
    pub fn predicate(mut self, predicate: impl Into<String>) -> Self {
        self.predicate = predicate.into();
        self
    }

    /// Set the grace period
    pub fn forget_after(mut self, forget_after: Duration) -> Self {
        self.forget_after = forget_after;
        self
    }

    /// Create a network that ages streams out after `forget_after`
    pub fn network(&self) -> MemoryNetwork {
        MemoryNetwork::with_forget_after(self.forget_after)
    }

    /// Create a resolver on `network`
    ///
    /// Fails if the predicate is malformed.
    pub fn resolver(&self, network: MemoryNetwork) -> Result<MemoryResolver, PredicateError> {
        MemoryResolver::new(network, &self.predicate)
    }
}
