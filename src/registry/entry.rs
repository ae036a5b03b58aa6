//! Tracked stream entry
//!
//! Pairs a descriptor with the inlet opened for it. The entry is the only
//! owner of the inlet: the inlet is closed exactly once, when the entry is
//! dropped.

use std::time::Instant;

use crate::delivery::{self, DrainOutcome, DrainPolicy};
use crate::stream::{Sample, StreamInfo, StreamSample};
use crate::substrate::{Inlet, PullError};

/// A discovered stream with its open inlet
pub struct TrackedStream<I: Inlet> {
    info: StreamInfo,
    inlet: I,
    opened_at: Instant,
}

impl<I: Inlet> TrackedStream<I> {
    pub(crate) fn new(info: StreamInfo, inlet: I) -> Self {
        Self {
            info,
            inlet,
            opened_at: Instant::now(),
        }
    }

    /// Descriptor the inlet was opened from
    pub fn info(&self) -> &StreamInfo {
        &self.info
    }

    /// When the inlet was opened
    pub fn opened_at(&self) -> Instant {
        self.opened_at
    }

    /// Pull a single sample
    pub fn pull(&mut self) -> Result<Option<Sample>, PullError> {
        self.inlet.pull_sample()
    }

    /// Drain the inlet, tagging each delivered sample with this stream's
    /// descriptor
    pub fn drain<F>(&mut self, policy: DrainPolicy, mut deliver: F) -> DrainOutcome
    where
        F: FnMut(StreamSample<'_>),
    {
        let info = &self.info;
        delivery::drain(&mut self.inlet, policy, |sample| {
            deliver(StreamSample { sample, info })
        })
    }
}

impl<I: Inlet> Drop for TrackedStream<I> {
    fn drop(&mut self) {
        self.inlet.close();
        tracing::debug!(stream = %self.info.uid(), "Inlet closed");
    }
}

impl<I: Inlet> std::fmt::Debug for TrackedStream<I> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrackedStream")
            .field("info", &self.info)
            .field("opened_at", &self.opened_at)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;

    use super::*;
    use crate::delivery::testing::{value, ScriptedInlet};

    #[test]
    fn test_drain_tags_samples_with_descriptor() {
        let info = StreamInfo::new("A", "BioSemi", "EEG").hostname("lab-pc");
        let mut tracked = TrackedStream::new(info, ScriptedInlet::samples(&[1.0, 2.0]));

        let mut got = Vec::new();
        tracked.drain(DrainPolicy::All, |s| {
            got.push((value(&s.sample), s.name().to_string(), s.host().to_string()))
        });

        assert_eq!(
            got,
            vec![
                (1.0, "BioSemi".to_string(), "lab-pc".to_string()),
                (2.0, "BioSemi".to_string(), "lab-pc".to_string()),
            ]
        );
    }

    #[test]
    fn test_drop_closes_inlet_once() {
        let inlet = ScriptedInlet::samples(&[]);
        let closes = inlet.closes.clone();

        let tracked = TrackedStream::new(StreamInfo::new("A", "a", "EEG"), inlet);
        assert_eq!(closes.load(Ordering::SeqCst), 0);

        drop(tracked);
        assert_eq!(closes.load(Ordering::SeqCst), 1);
    }
}
