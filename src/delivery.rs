//! Delivery policies
//!
//! How buffered samples are extracted from an inlet in one reader cycle:
//!
//! - [`DrainPolicy::All`]: every buffered sample, in the order polled.
//! - [`DrainPolicy::Latest`]: keep polling, overwrite a "last seen" slot,
//!   deliver only the final sample. Earlier samples of the cycle are gone
//!   for good.
//!
//! "Nothing buffered" ends the loop normally. `SourceLost` also ends the
//! loop, without an error: the stream stays tracked until discovery drops
//! it.

use crate::stream::Sample;
use crate::substrate::{Inlet, PullError};

/// Sample extraction policy for one cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DrainPolicy {
    /// Deliver every buffered sample in order
    #[default]
    All,
    /// Deliver only the most recent buffered sample
    Latest,
}

impl DrainPolicy {
    /// `Latest` if `latest_only`, `All` otherwise
    pub fn from_latest_only(latest_only: bool) -> Self {
        if latest_only {
            DrainPolicy::Latest
        } else {
            DrainPolicy::All
        }
    }

    pub fn is_latest_only(&self) -> bool {
        *self == DrainPolicy::Latest
    }
}

/// What happened while draining one inlet
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrainOutcome {
    /// Samples pulled from the inlet
    pub polled: usize,
    /// Samples handed to the consumer
    pub delivered: usize,
    /// The drain stopped because the source was lost
    pub source_lost: bool,
}

/// Drain `inlet` according to `policy`, handing samples to `deliver`
///
/// Under `Latest`, samples pulled before a `SourceLost` are still valid, so
/// the last of them is delivered.
pub fn drain<I, F>(inlet: &mut I, policy: DrainPolicy, mut deliver: F) -> DrainOutcome
where
    I: Inlet + ?Sized,
    F: FnMut(Sample),
{
    let mut outcome = DrainOutcome::default();
    let mut latest = None;

    loop {
        match inlet.pull_sample() {
            Ok(Some(sample)) => {
                outcome.polled += 1;
                match policy {
                    DrainPolicy::All => {
                        deliver(sample);
                        outcome.delivered += 1;
                    }
                    DrainPolicy::Latest => latest = Some(sample),
                }
            }
            Ok(None) => break,
            Err(PullError::SourceLost) => {
                outcome.source_lost = true;
                break;
            }
        }
    }

    if let Some(sample) = latest {
        deliver(sample);
        outcome.delivered += 1;
    }

    outcome
}

#[cfg(test)]
pub(crate) mod testing {
    //! Scripted inlets shared by the registry and reader tests

    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use crate::stream::Sample;
    use crate::substrate::{Inlet, PullError};

    /// One scripted poll result
    #[derive(Debug, Clone)]
    pub enum Step {
        Sample(f64),
        Lost,
    }

    /// Inlet replaying a fixed script, then reporting "nothing buffered"
    #[derive(Debug, Default)]
    pub struct ScriptedInlet {
        pub script: VecDeque<Step>,
        pub closes: Arc<AtomicUsize>,
    }

    impl ScriptedInlet {
        pub fn new(steps: impl IntoIterator<Item = Step>) -> Self {
            Self {
                script: steps.into_iter().collect(),
                closes: Arc::new(AtomicUsize::new(0)),
            }
        }

        pub fn samples(values: &[f64]) -> Self {
            Self::new(values.iter().copied().map(Step::Sample))
        }
    }

    impl Inlet for ScriptedInlet {
        fn pull_sample(&mut self) -> Result<Option<Sample>, PullError> {
            match self.script.pop_front() {
                Some(Step::Sample(v)) => Ok(Some(Sample::from_values([v], v))),
                Some(Step::Lost) => Err(PullError::SourceLost),
                None => Ok(None),
            }
        }

        fn close(&mut self) {
            self.closes.fetch_add(1, Ordering::SeqCst);
        }
    }

    /// First channel of a sample as f64
    pub fn value(sample: &Sample) -> f64 {
        sample.values[0].as_f64().unwrap()
    }
}
