//! Stream registry
//!
//! The registry owns the mapping from stream identity to
//! {descriptor, inlet} and reconciles it against discovery snapshots.
//!
//! # Architecture
//!
//! ```text
//!            Discovery::results()
//!                     │ snapshot
//!                     ▼
//!         ┌────────────────────────────┐
//!         │ StreamRegistry             │
//!         │   streams: HashMap<Id,     │──── lost: drop TrackedStream
//!         │     TrackedStream {        │           (inlet.close())
//!         │       info, inlet }>       │
//!         │   pending: HashMap<Id, gen>│◄─── gained: Connector::open
//!         └─────────────┬──────────────┘     (inline, or blocking pool)
//!                       │ streams_mut()
//!                       ▼
//!                 FanOutReader drains
//! ```
//!
//! # Ownership
//!
//! An inlet lives inside exactly one [`TrackedStream`], and closing happens
//! in its `Drop`. Nothing else can poll or close an inlet, so double-close
//! and concurrent polls are impossible by construction.

pub mod config;
pub mod entry;
mod opener;
pub mod store;

pub use config::OpenMode;
pub use entry::TrackedStream;
pub use store::{ReconcileReport, StreamRegistry};
