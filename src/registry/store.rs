//! Stream registry implementation
//!
//! Owns every tracked stream and reconciles them against discovery
//! snapshots. Reconciliation computes the diff first, then applies it:
//!
//! ```text
//!   lost   = tracked - snapshot   ──► drop entry (closes inlet)
//!   gained = snapshot - tracked   ──► open inlet, insert entry
//!   both                          ──► untouched, inlet reused
//! ```

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use super::config::OpenMode;
use super::entry::TrackedStream;
use super::opener::BackgroundOpener;
use crate::stream::{StreamId, StreamInfo};
use crate::substrate::{Connector, Inlet, OpenError};

/// Changes applied by one reconciliation
#[derive(Debug, Default)]
pub struct ReconcileReport {
    /// Streams whose inlet was opened and are now tracked
    pub gained: Vec<StreamInfo>,
    /// Streams that disappeared; their last-known descriptor
    pub lost: Vec<StreamInfo>,
    /// Streams whose inlet could not be opened (retried next cycle)
    pub failed: Vec<(StreamInfo, OpenError)>,
}

impl ReconcileReport {
    pub fn is_empty(&self) -> bool {
        self.gained.is_empty() && self.lost.is_empty() && self.failed.is_empty()
    }
}

/// Registry of tracked streams keyed by identity
///
/// At most one inlet exists per identity. The registry is the sole owner
/// of inlet lifetime.
pub struct StreamRegistry<C: Connector> {
    /// Map of identity to tracked stream
    streams: HashMap<StreamId, TrackedStream<C::Inlet>>,

    /// Identities with a background open in flight, with its generation
    pending: HashMap<StreamId, u64>,

    connector: Arc<C>,

    /// Present only in background mode with a runtime available
    opener: Option<BackgroundOpener<C::Inlet>>,

    next_generation: u64,
}

impl<C: Connector> StreamRegistry<C> {
    /// Create a registry that opens inlets inline
    pub fn new(connector: C) -> Self {
        Self::with_mode(connector, OpenMode::Inline)
    }

    /// Create a registry with the given open mode
    ///
    /// Background mode needs a tokio runtime; without one the registry
    /// falls back to inline opens.
    pub fn with_mode(connector: C, mode: OpenMode) -> Self {
        let opener = match mode {
            OpenMode::Inline => None,
            OpenMode::Background => {
                let opener = BackgroundOpener::try_new();
                if opener.is_none() {
                    tracing::warn!("No tokio runtime available, opening inlets inline");
                }
                opener
            }
        };

        Self {
            streams: HashMap::new(),
            pending: HashMap::new(),
            connector: Arc::new(connector),
            opener,
            next_generation: 1,
        }
    }

    /// Whether inlets are opened off the polling thread
    pub fn opens_in_background(&self) -> bool {
        self.opener.is_some()
    }

    /// Reconcile tracked streams against a discovery snapshot
    ///
    /// Every identity that left the snapshot is reported lost exactly once;
    /// every identity that joined is reported gained exactly once, when its
    /// inlet is available.
    pub fn reconcile(&mut self, snapshot: Vec<StreamInfo>) -> ReconcileReport {
        let mut report = ReconcileReport::default();

        let current: HashMap<StreamId, StreamInfo> = snapshot
            .into_iter()
            .map(|info| (info.uid().clone(), info))
            .collect();

        // Compute the diff before touching anything
        let lost: Vec<StreamId> = self
            .streams
            .keys()
            .filter(|uid| !current.contains_key(*uid))
            .cloned()
            .collect();

        for uid in lost {
            if let Some(tracked) = self.streams.remove(&uid) {
                report.lost.push(tracked.info().clone());
            }
        }

        self.pending.retain(|uid, _| {
            let keep = current.contains_key(uid);
            if !keep {
                tracing::debug!(stream = %uid, "Stream vanished before its inlet opened");
            }
            keep
        });

        self.collect_background_opens(&current, &mut report);

        let gained: Vec<StreamInfo> = current
            .into_values()
            .filter(|info| {
                !self.streams.contains_key(info.uid()) && !self.pending.contains_key(info.uid())
            })
            .collect();

        for info in gained {
            match &self.opener {
                Some(opener) => {
                    let generation = self.next_generation;
                    self.next_generation += 1;
                    self.pending.insert(info.uid().clone(), generation);
                    opener.spawn(Arc::clone(&self.connector), info, generation);
                }
                None => match self.connector.open(&info) {
                    Ok(inlet) => track(&mut self.streams, &mut report, info, inlet),
                    Err(error) => report.failed.push((info, error)),
                },
            }
        }

        report
    }

    /// Publish finished background opens that are still wanted
    fn collect_background_opens(
        &mut self,
        current: &HashMap<StreamId, StreamInfo>,
        report: &mut ReconcileReport,
    ) {
        let Some(opener) = self.opener.as_mut() else {
            return;
        };

        for done in opener.completed() {
            let uid = done.info.uid().clone();
            let wanted = self.pending.get(&uid) == Some(&done.generation)
                && current.contains_key(&uid);

            match done.result {
                Ok(inlet) if wanted => {
                    self.pending.remove(&uid);
                    track(&mut self.streams, report, done.info, inlet);
                }
                Ok(mut stale) => {
                    stale.close();
                    tracing::debug!(stream = %uid, "Discarding stale inlet");
                }
                Err(error) if wanted => {
                    self.pending.remove(&uid);
                    report.failed.push((done.info, error));
                }
                Err(_) => {}
            }
        }
    }

    /// Number of tracked streams
    pub fn len(&self) -> usize {
        self.streams.len()
    }

    pub fn is_empty(&self) -> bool {
        self.streams.is_empty()
    }

    /// Number of background opens in flight
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    pub fn contains(&self, uid: &StreamId) -> bool {
        self.streams.contains_key(uid)
    }

    pub fn get(&self, uid: &StreamId) -> Option<&TrackedStream<C::Inlet>> {
        self.streams.get(uid)
    }

    /// Identities of tracked streams
    pub fn ids(&self) -> HashSet<StreamId> {
        self.streams.keys().cloned().collect()
    }

    /// Tracked streams, in unspecified order
    pub fn streams_mut(&mut self) -> impl Iterator<Item = &mut TrackedStream<C::Inlet>> {
        self.streams.values_mut()
    }
}

fn track<I: Inlet>(
    streams: &mut HashMap<StreamId, TrackedStream<I>>,
    report: &mut ReconcileReport,
    info: StreamInfo,
    inlet: I,
) {
    report.gained.push(info.clone());
    streams.insert(info.uid().clone(), TrackedStream::new(info, inlet));
}
