//! Reader lifecycle events
//!
//! Every event is logged. Callers that want to react to lifecycle changes
//! without parsing logs subscribe to a bounded channel.

use tokio::sync::mpsc;

use crate::registry::ReconcileReport;
use crate::stream::StreamInfo;
use crate::substrate::OpenError;

/// Lifecycle and failure notifications
#[derive(Debug, Clone, PartialEq)]
pub enum ReaderEvent {
    /// A stream is now tracked
    StreamGained(StreamInfo),
    /// A tracked stream left discovery; carries its last-known descriptor
    StreamLost(StreamInfo),
    /// The single-target reader switched to another stream
    TargetChanged {
        previous: Option<StreamInfo>,
        current: StreamInfo,
    },
    /// A poll failed because the source went away; the stream stays
    /// tracked until discovery drops it
    SourceLost(StreamInfo),
    /// An inlet could not be opened; retried on the next cycle
    OpenFailed { info: StreamInfo, error: OpenError },
}

/// Logging event emitter with an optional subscriber
#[derive(Debug)]
pub(crate) struct EventChannel {
    tx: Option<mpsc::Sender<ReaderEvent>>,
    capacity: usize,
}

impl EventChannel {
    pub fn new(capacity: usize) -> Self {
        Self {
            tx: None,
            capacity: capacity.max(1),
        }
    }

    /// Start delivering events to a new receiver, replacing any previous one
    pub fn subscribe(&mut self) -> mpsc::Receiver<ReaderEvent> {
        let (tx, rx) = mpsc::channel(self.capacity);
        self.tx = Some(tx);
        rx
    }

    pub fn emit(&self, event: ReaderEvent) {
        log(&event);

        if let Some(tx) = &self.tx {
            if let Err(mpsc::error::TrySendError::Full(event)) = tx.try_send(event) {
                tracing::debug!(?event, "Event channel full, event only logged");
            }
        }
    }

    /// Emit one event per change in a reconciliation report
    pub fn emit_report(&self, report: ReconcileReport) {
        for info in report.lost {
            self.emit(ReaderEvent::StreamLost(info));
        }
        for info in report.gained {
            self.emit(ReaderEvent::StreamGained(info));
        }
        for (info, error) in report.failed {
            self.emit(ReaderEvent::OpenFailed { info, error });
        }
    }
}

fn log(event: &ReaderEvent) {
    match event {
        ReaderEvent::StreamGained(info) => tracing::info!(
            stream = %info.uid(),
            name = info.name(),
            stream_type = info.stream_type(),
            host = info.host(),
            "Got new stream"
        ),
        ReaderEvent::StreamLost(info) => tracing::info!(
            stream = %info.uid(),
            name = info.name(),
            stream_type = info.stream_type(),
            host = info.host(),
            "Lost stream"
        ),
        ReaderEvent::TargetChanged { previous, current } => tracing::info!(
            stream = %current.uid(),
            name = current.name(),
            stream_type = current.stream_type(),
            host = current.host(),
            previous = ?previous.as_ref().map(|p| p.uid()),
            "Tracking stream"
        ),
        ReaderEvent::SourceLost(info) => tracing::warn!(
            stream = %info.uid(),
            name = info.name(),
            "Stream broke, waiting for discovery to drop it"
        ),
        ReaderEvent::OpenFailed { info, error } => tracing::warn!(
            stream = %info.uid(),
            name = info.name(),
            error = %error,
            "Failed to open inlet"
        ),
    }
}
