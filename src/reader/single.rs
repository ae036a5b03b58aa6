//! Single-target reader
//!
//! Tracks only the first stream of the discovery result and re-targets when
//! that first stream's identity changes. The substrate decides the order.

use tokio::sync::mpsc;

use super::event::{EventChannel, ReaderEvent};
use crate::delivery::DrainPolicy;
use crate::registry::TrackedStream;
use crate::stream::{Sample, StreamInfo, StreamSample};
use crate::substrate::{Connector, Discovery};

pub struct SingleTargetReader<D: Discovery, C: Connector> {
    discovery: D,
    connector: C,
    target: Option<TrackedStream<C::Inlet>>,
    events: EventChannel,
}

impl<D: Discovery, C: Connector> SingleTargetReader<D, C> {
    pub(crate) fn new(discovery: D, connector: C, events: EventChannel) -> Self {
        Self {
            discovery,
            connector,
            target: None,
            events,
        }
    }

    pub fn subscribe(&mut self) -> mpsc::Receiver<ReaderEvent> {
        self.events.subscribe()
    }

    /// Descriptor of the stream currently tracked
    pub fn target(&self) -> Option<&StreamInfo> {
        self.target.as_ref().map(|t| t.info())
    }

    /// Pull form: one sample (the next one, or the latest under
    /// `DrainPolicy::Latest`), without metadata
    pub fn poll(&mut self, policy: DrainPolicy) -> Option<Sample> {
        if !self.refresh() {
            return None;
        }
        let target = self.target.as_mut()?;

        match policy {
            DrainPolicy::All => match target.pull() {
                Ok(sample) => sample,
                Err(_) => {
                    self.events.emit(ReaderEvent::SourceLost(target.info().clone()));
                    None
                }
            },
            DrainPolicy::Latest => {
                let mut latest = None;
                let outcome = target.drain(policy, |s| latest = Some(s.sample));
                if outcome.source_lost {
                    self.events.emit(ReaderEvent::SourceLost(target.info().clone()));
                }
                latest
            }
        }
    }

    /// Push form: invoke `callback` once per delivered sample
    pub fn for_each<F>(&mut self, mut callback: F, policy: DrainPolicy)
    where
        F: FnMut(StreamSample<'_>),
    {
        if !self.refresh() {
            return;
        }
        if let Some(target) = self.target.as_mut() {
            let outcome = target.drain(policy, &mut callback);
            if outcome.source_lost {
                self.events.emit(ReaderEvent::SourceLost(target.info().clone()));
            }
        }
    }

    /// Follow the first discovered stream
    ///
    /// Returns false when discovery is empty; the current target is kept in
    /// that case so a momentarily empty result does not erase tracking.
    fn refresh(&mut self) -> bool {
        let Some(first) = self.discovery.results().into_iter().next() else {
            return false;
        };

        let unchanged = self
            .target
            .as_ref()
            .is_some_and(|t| t.info().uid() == first.uid());
        if unchanged {
            return true;
        }

        // Replace: the old inlet is closed before the new one is opened
        let previous = self.target.take().map(|old| old.info().clone());

        match self.connector.open(&first) {
            Ok(inlet) => {
                self.events.emit(ReaderEvent::TargetChanged {
                    previous,
                    current: first.clone(),
                });
                self.target = Some(TrackedStream::new(first, inlet));
                true
            }
            Err(error) => {
                self.events.emit(ReaderEvent::OpenFailed { info: first, error });
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::delivery::testing::{value, ScriptedInlet, Step};
    use crate::substrate::OpenError;

    /// Discovery returning whatever the test puts in
    #[derive(Default)]
    struct FixedDiscovery(RefCell<Vec<StreamInfo>>);

    impl FixedDiscovery {
        fn set(&self, infos: Vec<StreamInfo>) {
            *self.0.borrow_mut() = infos;
        }
    }

    impl Discovery for Arc<FixedDiscovery> {
        fn results(&self) -> Vec<StreamInfo> {
            self.0.borrow().clone()
        }
    }

    /// Connector handing out pre-scripted inlets per identity
    #[derive(Default)]
    struct ScriptConnector {
        scripts: Mutex<HashMap<String, Vec<Step>>>,
        opens: AtomicUsize,
        closes: Arc<AtomicUsize>,
    }

    impl ScriptConnector {
        fn script(&self, uid: &str, steps: Vec<Step>) {
            self.scripts.lock().unwrap().insert(uid.to_string(), steps);
        }
    }

    impl Connector for ScriptConnector {
        type Inlet = ScriptedInlet;

        fn open(&self, info: &StreamInfo) -> Result<ScriptedInlet, OpenError> {
            let steps = self
                .scripts
                .lock()
                .unwrap()
                .remove(info.uid().as_str())
                .ok_or_else(|| OpenError::NotFound(info.uid().clone()))?;
            self.opens.fetch_add(1, Ordering::SeqCst);
            let mut inlet = ScriptedInlet::new(steps);
            inlet.closes = self.closes.clone();
            Ok(inlet)
        }
    }

    fn info(uid: &str) -> StreamInfo {
        StreamInfo::new(uid, format!("name-{}", uid), "EEG")
            .hostname("host")
            .nominal_srate(100.0)
    }

    fn samples(values: &[f64]) -> Vec<Step> {
        values.iter().copied().map(Step::Sample).collect()
    }

    fn reader(
        discovery: &Arc<FixedDiscovery>,
        connector: &Arc<ScriptConnector>,
    ) -> SingleTargetReader<Arc<FixedDiscovery>, Arc<ScriptConnector>> {
        SingleTargetReader::new(discovery.clone(), connector.clone(), EventChannel::new(16))
    }

    #[test]
    fn test_empty_discovery_is_noop() {
        let discovery = Arc::new(FixedDiscovery::default());
        let connector = Arc::new(ScriptConnector::default());
        let mut reader = reader(&discovery, &connector);

        assert_eq!(reader.poll(DrainPolicy::All), None);
        let mut calls = 0;
        reader.for_each(|_| calls += 1, DrainPolicy::All);
        assert_eq!(calls, 0);
        assert!(reader.target().is_none());
    }

    #[test]
    fn test_push_delivers_all_with_metadata() {
        let discovery = Arc::new(FixedDiscovery::default());
        let connector = Arc::new(ScriptConnector::default());
        connector.script("A", samples(&[1.0, 2.0]));
        discovery.set(vec![info("A")]);
        let mut reader = reader(&discovery, &connector);

        let mut got = Vec::new();
        reader.for_each(
            |s| {
                got.push((
                    value(&s.sample),
                    s.timestamp(),
                    s.name().to_string(),
                    s.stream_type().to_string(),
                    s.host().to_string(),
                    s.uid().to_string(),
                    s.nominal_srate(),
                    s.format_label(),
                ))
            },
            DrainPolicy::All,
        );

        assert_eq!(got.len(), 2);
        assert_eq!(got[0].0, 1.0);
        assert_eq!(got[1].0, 2.0);
        for row in &got {
            assert_eq!(row.2, "name-A");
            assert_eq!(row.3, "EEG");
            assert_eq!(row.4, "host");
            assert_eq!(row.5, "A");
            assert_eq!(row.6, 100.0);
            assert_eq!(row.7, "float32");
        }
    }

    #[test]
    fn test_pull_latest_and_next() {
        let discovery = Arc::new(FixedDiscovery::default());
        let connector = Arc::new(ScriptConnector::default());
        connector.script("A", samples(&[1.0, 2.0, 3.0, 4.0]));
        discovery.set(vec![info("A")]);
        let mut reader = reader(&discovery, &connector);

        // Next sample only; the rest stays buffered
        assert_eq!(reader.poll(DrainPolicy::All).map(|s| value(&s)), Some(1.0));
        // Latest of what remains
        assert_eq!(reader.poll(DrainPolicy::Latest).map(|s| value(&s)), Some(4.0));
        assert_eq!(reader.poll(DrainPolicy::Latest), None);
    }

    #[test]
    fn test_unchanged_first_element_never_reopens() {
        let discovery = Arc::new(FixedDiscovery::default());
        let connector = Arc::new(ScriptConnector::default());
        connector.script("A", samples(&[1.0]));
        discovery.set(vec![info("A"), info("B")]);
        let mut reader = reader(&discovery, &connector);

        for _ in 0..5 {
            reader.poll(DrainPolicy::All);
        }
        assert_eq!(connector.opens.load(Ordering::SeqCst), 1);
        assert_eq!(reader.target().unwrap().uid().as_str(), "A");
    }

    #[test]
    fn test_retarget_closes_old_and_opens_new() {
        let discovery = Arc::new(FixedDiscovery::default());
        let connector = Arc::new(ScriptConnector::default());
        connector.script("A", samples(&[1.0]));
        connector.script("B", samples(&[7.0]));
        let mut reader = reader(&discovery, &connector);
        let mut events = reader.subscribe();

        discovery.set(vec![info("A")]);
        assert_eq!(reader.poll(DrainPolicy::All).map(|s| value(&s)), Some(1.0));

        discovery.set(vec![info("B"), info("A")]);
        assert_eq!(reader.poll(DrainPolicy::All).map(|s| value(&s)), Some(7.0));

        assert_eq!(connector.opens.load(Ordering::SeqCst), 2);
        assert_eq!(connector.closes.load(Ordering::SeqCst), 1);
        assert_eq!(reader.target().unwrap().uid().as_str(), "B");

        assert_eq!(
            events.try_recv().unwrap(),
            ReaderEvent::TargetChanged {
                previous: None,
                current: info("A")
            }
        );
        assert_eq!(
            events.try_recv().unwrap(),
            ReaderEvent::TargetChanged {
                previous: Some(info("A")),
                current: info("B")
            }
        );
    }

    #[test]
    fn test_empty_result_keeps_target() {
        let discovery = Arc::new(FixedDiscovery::default());
        let connector = Arc::new(ScriptConnector::default());
        connector.script("A", samples(&[1.0, 2.0]));
        discovery.set(vec![info("A")]);
        let mut reader = reader(&discovery, &connector);

        assert!(reader.poll(DrainPolicy::All).is_some());

        discovery.set(vec![]);
        assert_eq!(reader.poll(DrainPolicy::All), None);
        assert_eq!(reader.target().unwrap().uid().as_str(), "A");

        // Back again: same identity, no reopen, buffered sample still there
        discovery.set(vec![info("A")]);
        assert_eq!(reader.poll(DrainPolicy::All).map(|s| value(&s)), Some(2.0));
        assert_eq!(connector.opens.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_source_lost_is_contained() {
        let discovery = Arc::new(FixedDiscovery::default());
        let connector = Arc::new(ScriptConnector::default());
        connector.script("A", vec![Step::Sample(1.0), Step::Lost, Step::Sample(2.0)]);
        discovery.set(vec![info("A")]);
        let mut reader = reader(&discovery, &connector);
        let mut events = reader.subscribe();

        let mut got = Vec::new();
        reader.for_each(|s| got.push(value(&s.sample)), DrainPolicy::All);
        assert_eq!(got, vec![1.0]);

        let _target_changed = events.try_recv().unwrap();
        assert_eq!(events.try_recv().unwrap(), ReaderEvent::SourceLost(info("A")));

        // Still tracked; the next cycle continues
        reader.for_each(|s| got.push(value(&s.sample)), DrainPolicy::All);
        assert_eq!(got, vec![1.0, 2.0]);
    }

    #[test]
    fn test_open_failure_retried() {
        let discovery = Arc::new(FixedDiscovery::default());
        let connector = Arc::new(ScriptConnector::default());
        discovery.set(vec![info("A")]);
        let mut reader = reader(&discovery, &connector);

        assert_eq!(reader.poll(DrainPolicy::All), None);
        assert!(reader.target().is_none());

        connector.script("A", samples(&[5.0]));
        assert_eq!(reader.poll(DrainPolicy::All).map(|s| value(&s)), Some(5.0));
    }
}
