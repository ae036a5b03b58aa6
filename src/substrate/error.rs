//! Substrate error types
//!
//! Failures reported by the discovery/transport layer. All of them are
//! per-stream: none of them aborts a reader cycle.

use crate::stream::StreamId;

/// Error opening an inlet for a descriptor
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OpenError {
    /// The substrate does not know this identity (anymore)
    NotFound(StreamId),
    /// The transport refused the connection
    Refused(String),
}

impl std::fmt::Display for OpenError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OpenError::NotFound(uid) => write!(f, "Stream not found: {}", uid),
            OpenError::Refused(reason) => write!(f, "Inlet open refused: {}", reason),
        }
    }
}

impl std::error::Error for OpenError {}

/// Error pulling a sample from an inlet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PullError {
    /// The source disappeared while we were reading from it
    SourceLost,
}

impl std::fmt::Display for PullError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PullError::SourceLost => write!(f, "Stream source lost"),
        }
    }
}

impl std::error::Error for PullError {}
