//! Stream descriptors and samples
//!
//! These are the data types shared between the discovery substrate, the
//! stream registry and the readers:
//!
//! ```text
//!   Discovery::results() ──► StreamInfo ──► Connector::open() ──► Inlet
//!                                 │                                 │
//!                                 └──────────► StreamSample ◄── Sample
//! ```

pub mod format;
pub mod info;
pub mod sample;

pub use format::ChannelFormat;
pub use info::{StreamId, StreamInfo};
pub use sample::{ChannelValue, Sample, StreamSample};
