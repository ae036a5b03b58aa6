//! Reader configuration

use crate::registry::OpenMode;

/// Default capacity of the event channel
pub const DEFAULT_EVENT_CAPACITY: usize = 256;

/// Continuous reader options
#[derive(Debug, Clone)]
pub struct ReaderConfig {
    /// Read from every matching stream instead of only the first one
    pub fetch_all: bool,

    /// Where inlets of newly discovered streams are opened (fan-out only)
    pub open_mode: OpenMode,

    /// Capacity of the subscriber event channel
    pub event_capacity: usize,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            fetch_all: false,
            open_mode: OpenMode::Inline,
            event_capacity: DEFAULT_EVENT_CAPACITY,
        }
    }
}

impl ReaderConfig {
    /// Set fan-out mode
    pub fn fetch_all(mut self, fetch_all: bool) -> Self {
        self.fetch_all = fetch_all;
        self
    }

    /// Set the open mode
    pub fn open_mode(mut self, mode: OpenMode) -> Self {
        self.open_mode = mode;
        self
    }

    /// Set the event channel capacity
    pub fn event_capacity(mut self, capacity: usize) -> Self {
        self.event_capacity = capacity.max(1);
        self
    }
}
