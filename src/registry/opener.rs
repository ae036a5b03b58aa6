//! Background inlet opening
//!
//! Opens run on the tokio blocking pool; results come back over an
//! unbounded channel and are collected without waiting.

use std::sync::Arc;

use tokio::runtime::Handle;
use tokio::sync::mpsc;

use crate::stream::StreamInfo;
use crate::substrate::{Connector, Inlet, OpenError};

/// Result of one background open
pub(super) struct Completion<I> {
    pub info: StreamInfo,
    pub generation: u64,
    pub result: Result<I, OpenError>,
}

pub(super) struct BackgroundOpener<I: Inlet> {
    runtime: Handle,
    tx: mpsc::UnboundedSender<Completion<I>>,
    rx: mpsc::UnboundedReceiver<Completion<I>>,
}

impl<I: Inlet> BackgroundOpener<I> {
    /// Bind to the current tokio runtime, if there is one
    pub fn try_new() -> Option<Self> {
        let runtime = Handle::try_current().ok()?;
        let (tx, rx) = mpsc::unbounded_channel();
        Some(Self { runtime, tx, rx })
    }

    /// Start opening `info` off the polling thread
    pub fn spawn<C>(&self, connector: Arc<C>, info: StreamInfo, generation: u64)
    where
        C: Connector<Inlet = I>,
    {
        let tx = self.tx.clone();
        tracing::debug!(stream = %info.uid(), generation, "Opening inlet in background");

        self.runtime.spawn_blocking(move || {
            let result = connector.open(&info);
            let completion = Completion {
                info,
                generation,
                result,
            };
            // Registry is gone: nobody will own this inlet
            if let Err(mpsc::error::SendError(mut orphan)) = tx.send(completion) {
                if let Ok(inlet) = orphan.result.as_mut() {
                    inlet.close();
                }
            }
        });
    }

    /// Opens finished since the last call
    pub fn completed(&mut self) -> Vec<Completion<I>> {
        let mut done = Vec::new();
        while let Ok(completion) = self.rx.try_recv() {
            done.push(completion);
        }
        done
    }
}

impl<I: Inlet> Drop for BackgroundOpener<I> {
    fn drop(&mut self) {
        // Opens finished but never collected still hold live inlets
        self.rx.close();
        while let Ok(mut completion) = self.rx.try_recv() {
            if let Ok(inlet) = completion.result.as_mut() {
                inlet.close();
            }
        }
    }
}
