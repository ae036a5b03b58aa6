//! OSC forwarding
//!
//! Turns delivered samples into OSC messages addressed `/<type>/<name>` and
//! sends them over UDP.

pub mod config;
pub mod encoder;
pub mod sender;

pub use config::OscConfig;
pub use encoder::{OscArg, OscEncoder, OscMessage};
pub use sender::OscSender;
