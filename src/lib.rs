//! Continuous stream reader
//!
//! Discovers live sample streams matching a predicate, keeps one inlet per
//! stream while it stays discoverable, and hands buffered samples to the
//! caller, either every one of them or only the latest per cycle.
//!
//! ```text
//!   substrate ──► reader ──► callback ──► osc
//!   (Discovery,   (single /   (StreamSample   (/<type>/<name>
//!    Connector,    fan-out)    with metadata)   over UDP)
//!    Inlet)
//! ```
//!
//! The `lsl2osc` binary wires these together against the in-process
//! [`substrate::memory`] network fed by synthetic sources.

pub mod delivery;
pub mod error;
pub mod osc;
pub mod reader;
pub mod registry;
pub mod stream;
pub mod substrate;

pub use delivery::DrainPolicy;
pub use error::{Error, Result};
pub use reader::{ContinuousReader, ReaderConfig, ReaderEvent};
pub use stream::{ChannelFormat, Sample, StreamId, StreamInfo, StreamSample};
