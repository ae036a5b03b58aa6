//! Discovery and transport substrate
//!
//! The readers never talk to the network directly. They see three seams:
//!
//! - [`Discovery`]: the current snapshot of streams matching a predicate,
//!   with streams that stopped announcing themselves aged out by the
//!   substrate after a grace period.
//! - [`Connector`]: opens an [`Inlet`] for a descriptor. This can be slow.
//! - [`Inlet`]: non-blocking pull of the next buffered sample.
//!
//! [`memory`] is an in-process implementation of all three, used by the
//! `lsl2osc` tool together with [`synthetic`] sources, and by tests.

pub mod config;
pub mod error;
pub mod memory;
pub mod predicate;
pub mod synthetic;

pub use config::DiscoveryConfig;
pub use error::{OpenError, PullError};
pub use memory::{MemoryConnector, MemoryInlet, MemoryNetwork, MemoryOutlet, MemoryResolver};
pub use predicate::{Predicate, PredicateError};
pub use synthetic::{SourceSpecError, SyntheticSource};

use crate::stream::{Sample, StreamInfo};

/// Source of discovery snapshots
pub trait Discovery {
    /// Streams currently known to match the predicate
    ///
    /// Order is decided by the substrate; it must be stable between calls
    /// as long as the set does not change.
    fn results(&self) -> Vec<StreamInfo>;
}

/// An open, pollable connection to one stream's sample buffer
pub trait Inlet: Send + 'static {
    /// Pull the next buffered sample without waiting
    ///
    /// `Ok(None)` means nothing is buffered right now.
    fn pull_sample(&mut self) -> Result<Option<Sample>, PullError>;

    /// Release transport resources
    ///
    /// Called exactly once, by the owner of the inlet, when it stops
    /// tracking the stream.
    fn close(&mut self) {}
}

/// Factory for inlets
pub trait Connector: Send + Sync + 'static {
    type Inlet: Inlet;

    /// Open an inlet for a discovered stream
    fn open(&self, info: &StreamInfo) -> Result<Self::Inlet, OpenError>;
}

impl<C: Connector> Connector for std::sync::Arc<C> {
    type Inlet = C::Inlet;

    fn open(&self, info: &StreamInfo) -> Result<Self::Inlet, OpenError> {
        (**self).open(info)
    }
}
