//! In-process discovery and transport
//!
//! A [`MemoryNetwork`] is a shared table of advertised streams. Producers
//! advertise a stream and push samples through a [`MemoryOutlet`];
//! consumers find streams with a [`MemoryResolver`] and read them through
//! [`MemoryInlet`]s opened by a [`MemoryConnector`].
//!
//! ```text
//!   MemoryOutlet::push_sample ──► every open MemoryInlet queue
//!         │ drop / close
//!         ▼
//!   stream stops announcing ──► still in results for `forget_after`
//!                          ──► open inlets drain, then SourceLost
//! ```

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::{Duration, Instant};

use super::error::{OpenError, PullError};
use super::predicate::{Predicate, PredicateError};
use super::{Connector, Discovery, Inlet};
use crate::stream::{Sample, StreamId, StreamInfo};

/// Grace period before a stopped stream disappears from results
pub const DEFAULT_FORGET_AFTER: Duration = Duration::from_secs(5);

/// Per-inlet buffer capacity; the oldest samples are dropped beyond it
pub const DEFAULT_MAX_BUFFERED: usize = 32 * 1024;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Debug)]
struct InletQueue {
    samples: VecDeque<Sample>,
    source_alive: bool,
}

#[derive(Debug)]
struct StreamSlot {
    info: StreamInfo,
    order: u64,
    stopped_at: Option<Instant>,
    inlets: Vec<Weak<Mutex<InletQueue>>>,
}

impl StreamSlot {
    fn expired(&self, now: Instant, forget_after: Duration) -> bool {
        match self.stopped_at {
            Some(stopped) => now.duration_since(stopped) >= forget_after,
            None => false,
        }
    }
}

#[derive(Debug)]
struct NetworkState {
    streams: HashMap<StreamId, StreamSlot>,
    next_id: u64,
    forget_after: Duration,
    max_buffered: usize,
}

/// Shared in-process stream table
#[derive(Debug, Clone)]
pub struct MemoryNetwork {
    state: Arc<Mutex<NetworkState>>,
}

impl MemoryNetwork {
    /// Create a network with the default grace period
    pub fn new() -> Self {
        Self::with_forget_after(DEFAULT_FORGET_AFTER)
    }

    /// Create a network with a custom grace period
    pub fn with_forget_after(forget_after: Duration) -> Self {
        Self {
            state: Arc::new(Mutex::new(NetworkState {
                streams: HashMap::new(),
                next_id: 1,
                forget_after,
                max_buffered: DEFAULT_MAX_BUFFERED,
            })),
        }
    }

    /// Set the per-inlet buffer capacity
    pub fn max_buffered(self, max: usize) -> Self {
        lock(&self.state).max_buffered = max.max(1);
        self
    }

    /// Grace period of this network
    pub fn forget_after(&self) -> Duration {
        lock(&self.state).forget_after
    }

    /// Advertise a stream
    ///
    /// The identity of `template` is replaced by a fresh one that is never
    /// handed out again on this network.
    pub fn advertise(&self, template: StreamInfo) -> MemoryOutlet {
        let mut state = lock(&self.state);
        let order = state.next_id;
        state.next_id += 1;

        let uid = StreamId::new(format!("mem-{:08x}", order));
        let info = template.with_uid(uid.clone());

        state.streams.insert(
            uid.clone(),
            StreamSlot {
                info: info.clone(),
                order,
                stopped_at: None,
                inlets: Vec::new(),
            },
        );

        tracing::debug!(stream = %uid, name = info.name(), "Stream advertised");

        MemoryOutlet {
            network: self.clone(),
            info,
            closed: false,
        }
    }

    /// Number of inlets currently open on a stream
    pub fn open_inlets(&self, uid: &StreamId) -> usize {
        let state = lock(&self.state);
        state
            .streams
            .get(uid)
            .map(|slot| slot.inlets.iter().filter(|w| w.strong_count() > 0).count())
            .unwrap_or(0)
    }

    /// Snapshot of visible streams, oldest advertisement first
    ///
    /// Streams stopped longer than the grace period are purged.
    fn visible(&self) -> Vec<StreamInfo> {
        let mut state = lock(&self.state);
        let now = Instant::now();
        let forget_after = state.forget_after;

        state.streams.retain(|uid, slot| {
            let keep = !slot.expired(now, forget_after);
            if !keep {
                tracing::debug!(stream = %uid, "Stream expired");
            }
            keep
        });

        let mut slots: Vec<&StreamSlot> = state.streams.values().collect();
        slots.sort_by_key(|slot| slot.order);
        slots.into_iter().map(|slot| slot.info.clone()).collect()
    }

    fn push(&self, uid: &StreamId, sample: Sample) {
        let mut state = lock(&self.state);
        let max_buffered = state.max_buffered;

        if let Some(slot) = state.streams.get_mut(uid) {
            slot.inlets.retain(|weak| weak.strong_count() > 0);
            for weak in &slot.inlets {
                if let Some(queue) = weak.upgrade() {
                    let mut queue = lock(&queue);
                    if queue.samples.len() >= max_buffered {
                        queue.samples.pop_front();
                    }
                    queue.samples.push_back(sample.clone());
                }
            }
        }
    }

    fn stop(&self, uid: &StreamId) {
        let mut state = lock(&self.state);

        if let Some(slot) = state.streams.get_mut(uid) {
            slot.stopped_at = Some(Instant::now());
            for weak in &slot.inlets {
                if let Some(queue) = weak.upgrade() {
                    lock(&queue).source_alive = false;
                }
            }
            tracing::debug!(stream = %uid, "Stream stopped announcing");
        }
    }

    fn connect(&self, uid: &StreamId) -> Result<MemoryInlet, OpenError> {
        let mut state = lock(&self.state);
        let slot = state
            .streams
            .get_mut(uid)
            .ok_or_else(|| OpenError::NotFound(uid.clone()))?;

        let queue = Arc::new(Mutex::new(InletQueue {
            samples: VecDeque::new(),
            source_alive: slot.stopped_at.is_none(),
        }));
        slot.inlets.push(Arc::downgrade(&queue));

        Ok(MemoryInlet { queue: Some(queue) })
    }
}

impl Default for MemoryNetwork {
    fn default() -> Self {
        Self::new()
    }
}

/// Producer side of an advertised stream
///
/// Dropping the outlet stops the stream's announcements.
#[derive(Debug)]
pub struct MemoryOutlet {
    network: MemoryNetwork,
    info: StreamInfo,
    closed: bool,
}

impl MemoryOutlet {
    /// Descriptor of the advertised stream (with its assigned identity)
    pub fn info(&self) -> &StreamInfo {
        &self.info
    }

    pub fn uid(&self) -> &StreamId {
        self.info.uid()
    }

    /// Deliver a sample to every open inlet
    pub fn push_sample(&self, sample: Sample) {
        if !self.closed {
            self.network.push(self.info.uid(), sample);
        }
    }

    /// Stop announcing the stream
    pub fn close(&mut self) {
        if !self.closed {
            self.closed = true;
            self.network.stop(self.info.uid());
        }
    }
}

impl Drop for MemoryOutlet {
    fn drop(&mut self) {
        self.close();
    }
}

/// Consumer side of one stream
#[derive(Debug)]
pub struct MemoryInlet {
    queue: Option<Arc<Mutex<InletQueue>>>,
}

impl Inlet for MemoryInlet {
    fn pull_sample(&mut self) -> Result<Option<Sample>, PullError> {
        let Some(queue) = self.queue.as_ref() else {
            return Ok(None);
        };
        let mut queue = lock(queue);

        match queue.samples.pop_front() {
            Some(sample) => Ok(Some(sample)),
            None if queue.source_alive => Ok(None),
            None => Err(PullError::SourceLost),
        }
    }

    fn close(&mut self) {
        self.queue = None;
    }
}

/// Discovery over a [`MemoryNetwork`]
#[derive(Debug, Clone)]
pub struct MemoryResolver {
    network: MemoryNetwork,
    predicate: Predicate,
}

impl MemoryResolver {
    /// Create a resolver, rejecting malformed predicates up front
    pub fn new(network: MemoryNetwork, predicate: &str) -> Result<Self, PredicateError> {
        Ok(Self::with_predicate(network, Predicate::parse(predicate)?))
    }

    pub fn with_predicate(network: MemoryNetwork, predicate: Predicate) -> Self {
        Self { network, predicate }
    }

    pub fn predicate(&self) -> &Predicate {
        &self.predicate
    }
}

impl Discovery for MemoryResolver {
    fn results(&self) -> Vec<StreamInfo> {
        self.network
            .visible()
            .into_iter()
            .filter(|info| self.predicate.matches(info))
            .collect()
    }
}

/// Opens [`MemoryInlet`]s
#[derive(Debug, Clone)]
pub struct MemoryConnector {
    network: MemoryNetwork,
    open_delay: Duration,
}

impl MemoryConnector {
    pub fn new(network: MemoryNetwork) -> Self {
        Self {
            network,
            open_delay: Duration::ZERO,
        }
    }

    /// Make every open block the calling thread for `delay`
    pub fn open_delay(mut self, delay: Duration) -> Self {
        self.open_delay = delay;
        self
    }
}

impl Connector for MemoryConnector {
    type Inlet = MemoryInlet;

    fn open(&self, info: &StreamInfo) -> Result<MemoryInlet, OpenError> {
        if !self.open_delay.is_zero() {
            std::thread::sleep(self.open_delay);
        }
        self.network.connect(info.uid())
    }
}
