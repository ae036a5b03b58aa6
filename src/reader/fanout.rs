//! Fan-out reader
//!
//! Tracks every stream matching the predicate. Each cycle reconciles the
//! registry against a fresh discovery snapshot, then drains the tracked
//! streams. A stream whose source is lost is logged and skipped; the others
//! are drained as usual.

use tokio::sync::mpsc;

use super::event::{EventChannel, ReaderEvent};
use crate::delivery::DrainPolicy;
use crate::registry::{OpenMode, StreamRegistry};
use crate::stream::{Sample, StreamSample};
use crate::substrate::{Connector, Discovery};

pub struct FanOutReader<D: Discovery, C: Connector> {
    discovery: D,
    registry: StreamRegistry<C>,
    events: EventChannel,
}

impl<D: Discovery, C: Connector> FanOutReader<D, C> {
    pub(crate) fn new(discovery: D, connector: C, mode: OpenMode, events: EventChannel) -> Self {
        Self {
            discovery,
            registry: StreamRegistry::with_mode(connector, mode),
            events,
        }
    }

    pub fn subscribe(&mut self) -> mpsc::Receiver<ReaderEvent> {
        self.events.subscribe()
    }

    pub fn registry(&self) -> &StreamRegistry<C> {
        &self.registry
    }

    /// Pull form
    ///
    /// Under `DrainPolicy::All` this returns the first sample any tracked
    /// stream yields, pulling at most one sample per stream. Under
    /// `DrainPolicy::Latest` every stream is drained and the latest sample
    /// of the last stream that had one wins.
    pub fn poll(&mut self, policy: DrainPolicy) -> Option<Sample> {
        self.refresh();

        match policy {
            DrainPolicy::All => {
                for tracked in self.registry.streams_mut() {
                    match tracked.pull() {
                        Ok(Some(sample)) => return Some(sample),
                        Ok(None) => {}
                        Err(_) => self
                            .events
                            .emit(ReaderEvent::SourceLost(tracked.info().clone())),
                    }
                }
                None
            }
            DrainPolicy::Latest => {
                let mut latest = None;
                for tracked in self.registry.streams_mut() {
                    let outcome = tracked.drain(policy, |s| latest = Some(s.sample));
                    if outcome.source_lost {
                        self.events
                            .emit(ReaderEvent::SourceLost(tracked.info().clone()));
                    }
                }
                latest
            }
        }
    }

    /// Push form: drain every tracked stream into `callback`
    pub fn for_each<F>(&mut self, mut callback: F, policy: DrainPolicy)
    where
        F: FnMut(StreamSample<'_>),
    {
        self.refresh();

        for tracked in self.registry.streams_mut() {
            let outcome = tracked.drain(policy, &mut callback);
            if outcome.source_lost {
                self.events
                    .emit(ReaderEvent::SourceLost(tracked.info().clone()));
            }
        }
    }

    fn refresh(&mut self) {
        let report = self.registry.reconcile(self.discovery.results());
        self.events.emit_report(report);
    }
}
