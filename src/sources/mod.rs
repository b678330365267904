//! Background samplers publishing immutable snapshots
//!
//! A [`Sampler`] owns a [`PausableWorker`] whose unit of work reads a probe
//! and publishes the result by replacing the whole snapshot behind an
//! [`ArcSwap`]. Readers on other threads always get either the previous or
//! the new complete snapshot, never a partial one, and never block on a
//! collection pass.

mod process;
mod stats;

pub use process::{ProcessEntry, ProcessSnapshot, ProcessSource};
pub use stats::{StatsSnapshot, StatsSource};

use crate::core::{PausableWorker, WorkerState};
use arc_swap::ArcSwap;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Failure inside a sampling probe.
///
/// A failed probe leaves the previously published snapshot in place; the
/// sampler keeps polling.
#[derive(Debug, Error)]
pub enum SampleError {
    /// The backing data source cannot provide data on this system.
    #[error("sampling backend unavailable: {0}")]
    Unavailable(&'static str),
    /// The backing data source failed while being read.
    #[error("sampling failed: {0}")]
    Read(String),
}

/// A periodic sampler publishing snapshots of type `T`.
///
/// Before the first collection pass completes, readers observe
/// `T::default()`.
pub struct Sampler<T> {
    worker: PausableWorker,
    cell: Arc<ArcSwap<T>>,
}

impl<T: Default + Send + Sync + 'static> Sampler<T> {
    /// Create a sampler running `probe` once per `interval` on its own
    /// thread. Nothing runs until [`start`](Self::start).
    pub fn new<F>(name: impl Into<String>, interval: Duration, mut probe: F) -> Self
    where
        F: FnMut() -> Result<T, SampleError> + Send + 'static,
    {
        let cell = Arc::new(ArcSwap::from_pointee(T::default()));
        let published = Arc::clone(&cell);
        let worker = PausableWorker::new(name, interval, move || {
            let sample = probe()?;
            published.store(Arc::new(sample));
            Ok(())
        });
        Self { worker, cell }
    }

    /// The most recently published snapshot. Non-blocking.
    pub fn snapshot(&self) -> Arc<T> {
        self.cell.load_full()
    }

    /// A cheap read handle for another thread.
    pub fn reader(&self) -> SnapshotReader<T> {
        SnapshotReader {
            cell: Arc::clone(&self.cell),
        }
    }

    /// Spawn the sampling thread. Call exactly once.
    pub fn start(&mut self) {
        self.worker.start();
    }

    /// Suspend collection after at most one in-flight pass.
    pub fn pause(&self) {
        self.worker.pause();
    }

    /// Allow collection again. No-op when not paused.
    pub fn resume(&self) {
        self.worker.resume();
    }

    /// Stop collection for good. Irreversible.
    pub fn stop(&self) {
        self.worker.stop();
    }

    /// Block until the sampling thread has exited.
    pub fn join(&mut self) {
        self.worker.join();
    }

    /// Lifecycle state of the underlying worker.
    pub fn state(&self) -> WorkerState {
        self.worker.state()
    }
}

/// Read-side handle to a sampler's published snapshot.
pub struct SnapshotReader<T> {
    cell: Arc<ArcSwap<T>>,
}

impl<T> SnapshotReader<T> {
    /// The most recently published snapshot. Non-blocking.
    pub fn load(&self) -> Arc<T> {
        self.cell.load_full()
    }
}

impl<T> Clone for SnapshotReader<T> {
    fn clone(&self) -> Self {
        Self {
            cell: Arc::clone(&self.cell),
        }
    }
}
