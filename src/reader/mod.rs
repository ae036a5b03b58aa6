//! Continuous reader
//!
//! Polls discovery, tracks the matching streams and delivers their buffered
//! samples, once per call made by an external driver loop.
//!
//! # Modes
//!
//! ```text
//!   fetch_all = false                 fetch_all = true
//!   ┌──────────────────────┐          ┌──────────────────────────────┐
//!   │ SingleTargetReader   │          │ FanOutReader                 │
//!   │  first result only   │          │  StreamRegistry::reconcile   │
//!   │  re-target on uid    │          │  drain every tracked stream  │
//!   └──────────┬───────────┘          └──────────────┬───────────────┘
//!              └────────────► DrainPolicy ◄──────────┘
//! ```
//!
//! Calls must not overlap; the reader holds no internal synchronization.
//! Lifecycle changes are logged and, for subscribers, sent as
//! [`ReaderEvent`]s.

pub mod config;
pub mod event;
pub mod fanout;
pub mod single;

pub use config::ReaderConfig;
pub use event::ReaderEvent;
pub use fanout::FanOutReader;
pub use single::SingleTargetReader;

use tokio::sync::mpsc;

use crate::delivery::DrainPolicy;
use crate::stream::{Sample, StreamSample};
use crate::substrate::{Connector, Discovery};
use event::EventChannel;

enum Mode<D: Discovery, C: Connector> {
    Single(SingleTargetReader<D, C>),
    FanOut(FanOutReader<D, C>),
}

/// Entry point for reading discovered streams
///
/// # Example
/// ```no_run
/// use lsl_osc::delivery::DrainPolicy;
/// use lsl_osc::reader::{ContinuousReader, ReaderConfig};
/// use lsl_osc::substrate::{MemoryConnector, MemoryNetwork, MemoryResolver};
///
/// # fn example() -> Result<(), lsl_osc::substrate::PredicateError> {
/// let network = MemoryNetwork::new();
/// let resolver = MemoryResolver::new(network.clone(), "type='EEG'")?;
/// let connector = MemoryConnector::new(network);
///
/// let config = ReaderConfig::default().fetch_all(true);
/// let mut reader = ContinuousReader::new(resolver, connector, config);
///
/// loop {
///     reader.for_each(
///         |s| println!("{} {:?} @ {}", s.name(), s.values(), s.timestamp()),
///         DrainPolicy::Latest,
///     );
///     std::thread::sleep(std::time::Duration::from_millis(10));
/// }
/// # }
/// ```
pub struct ContinuousReader<D: Discovery, C: Connector> {
    mode: Mode<D, C>,
    fetch_all: bool,
}

impl<D: Discovery, C: Connector> ContinuousReader<D, C> {
    pub fn new(discovery: D, connector: C, config: ReaderConfig) -> Self {
        let events = EventChannel::new(config.event_capacity);

        let mode = if config.fetch_all {
            Mode::FanOut(FanOutReader::new(
                discovery,
                connector,
                config.open_mode,
                events,
            ))
        } else {
            Mode::Single(SingleTargetReader::new(discovery, connector, events))
        };

        Self {
            mode,
            fetch_all: config.fetch_all,
        }
    }

    /// Whether every matching stream is read, as configured
    pub fn fetch_all(&self) -> bool {
        self.fetch_all
    }

    /// Receive lifecycle events
    ///
    /// Only the most recent subscriber receives events. Events that do not
    /// fit in the channel are only logged.
    pub fn subscribe(&mut self) -> mpsc::Receiver<ReaderEvent> {
        match &mut self.mode {
            Mode::Single(reader) => reader.subscribe(),
            Mode::FanOut(reader) => reader.subscribe(),
        }
    }

    /// Run one cycle and return a single sample, without metadata
    pub fn read(&mut self, policy: DrainPolicy) -> Option<Sample> {
        match &mut self.mode {
            Mode::Single(reader) => reader.poll(policy),
            Mode::FanOut(reader) => reader.poll(policy),
        }
    }

    /// Run one cycle and invoke `callback` once per delivered sample
    pub fn for_each<F>(&mut self, callback: F, policy: DrainPolicy)
    where
        F: FnMut(StreamSample<'_>),
    {
        match &mut self.mode {
            Mode::Single(reader) => reader.for_each(callback, policy),
            Mode::FanOut(reader) => reader.for_each(callback, policy),
        }
    }
}
