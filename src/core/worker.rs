//! Pausable periodic worker threads
//!
//! A [`PausableWorker`] runs a unit of work on its own thread once per poll
//! interval. Iterations are gated by a binary permit: `pause` takes the
//! permit so the next iteration blocks, `resume` puts it back, and `stop`
//! forces the gate open so nothing can deadlock on the way out.

use anyhow::Result;
use log::{debug, error, warn};
use std::sync::{Arc, Condvar, Mutex};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

/// Lifecycle of a [`PausableWorker`].
///
/// `Stopped` is terminal; a stopped worker is never restarted, a new one is
/// created instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    NotStarted,
    Running,
    Paused,
    Stopped,
}

/// The binary permit plus the stop flag, guarded together.
///
/// Invariant: at most one permit outstanding. `available == false` means
/// someone (the worker mid-iteration, or a pauser) holds it.
struct Gate {
    available: bool,
    paused: bool,
    stopped: bool,
}

struct Control {
    gate: Mutex<Gate>,
    signal: Condvar,
}

impl Control {
    fn new() -> Self {
        Self {
            gate: Mutex::new(Gate {
                available: true,
                paused: false,
                stopped: false,
            }),
            signal: Condvar::new(),
        }
    }

    /// Worker side: take the permit for one iteration.
    ///
    /// Returns `false` once the worker has been stopped; the stop flag is
    /// checked before the permit so a worker unblocked by `stop` exits
    /// without running further work.
    fn acquire(&self) -> bool {
        let mut gate = self.gate.lock().unwrap_or_else(|e| e.into_inner());
        loop {
            if gate.stopped {
                return false;
            }
            if gate.available {
                gate.available = false;
                return true;
            }
            gate = self.signal.wait(gate).unwrap_or_else(|e| e.into_inner());
        }
    }

    /// Worker side: hand the permit back after an iteration.
    fn release(&self) {
        let mut gate = self.gate.lock().unwrap_or_else(|e| e.into_inner());
        gate.available = true;
        self.signal.notify_all();
    }

    /// Worker side: sleep out the poll interval on the condvar so `stop`
    /// can cut the wait short. Spurious wakes just re-check the deadline.
    ///
    /// Returns `false` once the worker has been stopped.
    fn sleep(&self, interval: Duration) -> bool {
        let deadline = Instant::now() + interval;
        let mut gate = self.gate.lock().unwrap_or_else(|e| e.into_inner());
        loop {
            if gate.stopped {
                return false;
            }
            let now = Instant::now();
            if now >= deadline {
                return true;
            }
            let (guard, _timed_out) = self
                .signal
                .wait_timeout(gate, deadline - now)
                .unwrap_or_else(|e| e.into_inner());
            gate = guard;
        }
    }

    /// Take the permit, waiting out at most one in-flight iteration.
    fn pause(&self) {
        let mut gate = self.gate.lock().unwrap_or_else(|e| e.into_inner());
        loop {
            if gate.stopped {
                return;
            }
            if gate.available {
                gate.available = false;
                gate.paused = true;
                return;
            }
            gate = self.signal.wait(gate).unwrap_or_else(|e| e.into_inner());
        }
    }

    /// Put the permit back, only if it is missing. Calling this on a worker
    /// that is not paused is a harmless no-op.
    fn resume(&self) {
        let mut gate = self.gate.lock().unwrap_or_else(|e| e.into_inner());
        if gate.stopped {
            return;
        }
        gate.paused = false;
        if !gate.available {
            gate.available = true;
            self.signal.notify_all();
        }
    }

    /// Force the gate open and raise the stop flag. Wakes a paused worker, a
    /// sleeping worker, and any caller blocked inside `pause`.
    fn stop(&self) {
        let mut gate = self.gate.lock().unwrap_or_else(|e| e.into_inner());
        gate.stopped = true;
        gate.available = true;
        gate.paused = false;
        self.signal.notify_all();
    }
}

type WorkFn = Box<dyn FnMut() -> Result<()> + Send>;

/// A worker thread that can be paused and resumed.
///
/// The unit of work runs once per poll interval. A failing unit of work is
/// logged and the loop keeps going; only [`stop`](Self::stop) ends it.
pub struct PausableWorker {
    name: String,
    interval: Duration,
    control: Arc<Control>,
    body: Option<WorkFn>,
    handle: Option<JoinHandle<()>>,
    started: bool,
}

impl PausableWorker {
    /// Create a worker that will run `work` once per `interval`.
    ///
    /// Nothing runs until [`start`](Self::start).
    pub fn new<F>(name: impl Into<String>, interval: Duration, work: F) -> Self
    where
        F: FnMut() -> Result<()> + Send + 'static,
    {
        Self {
            name: name.into(),
            interval,
            control: Arc::new(Control::new()),
            body: Some(Box::new(work)),
            handle: None,
            started: false,
        }
    }

    /// Spawn the worker thread. Call exactly once; a second call is ignored
    /// with a warning.
    pub fn start(&mut self) {
        if self.started {
            warn!("worker '{}' already started, ignoring", self.name);
            return;
        }
        let Some(mut work) = self.body.take() else {
            return;
        };
        self.started = true;

        let control = Arc::clone(&self.control);
        let interval = self.interval;
        let name = self.name.clone();
        let spawned = std::thread::Builder::new()
            .name(self.name.clone())
            .spawn(move || {
                debug!("worker '{}' up (poll {:?})", name, interval);
                loop {
                    if !control.acquire() {
                        break;
                    }
                    if let Err(err) = work() {
                        warn!("worker '{}': unit of work failed: {err:#}", name);
                    }
                    control.release();
                    if !control.sleep(interval) {
                        break;
                    }
                }
                debug!("worker '{}' exiting", name);
            });

        match spawned {
            Ok(handle) => self.handle = Some(handle),
            Err(err) => error!("failed to spawn worker '{}': {err}", self.name),
        }
    }

    /// Suspend further iterations by taking the permit.
    ///
    /// Blocks at most for one in-flight unit of work. Returns immediately on
    /// a stopped worker.
    pub fn pause(&self) {
        self.control.pause();
    }

    /// Allow iterations again. No-op when the worker is not paused.
    pub fn resume(&self) {
        self.control.resume();
    }

    /// Stop the worker for good. Irreversible; also unblocks a paused
    /// worker and cuts an interval sleep short.
    pub fn stop(&self) {
        self.control.stop();
    }

    /// Block until the worker thread has exited. A worker that panicked is
    /// logged, not propagated. Idempotent.
    pub fn join(&mut self) {
        if let Some(handle) = self.handle.take() {
            if let Err(panic) = handle.join() {
                warn!("worker '{}' panicked: {:?}", self.name, panic);
            }
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> WorkerState {
        let gate = self.control.gate.lock().unwrap_or_else(|e| e.into_inner());
        if gate.stopped {
            WorkerState::Stopped
        } else if !self.started {
            WorkerState::NotStarted
        } else if gate.paused {
            WorkerState::Paused
        } else {
            WorkerState::Running
        }
    }
}

impl Drop for PausableWorker {
    fn drop(&mut self) {
        self.stop();
        self.join();
    }
}
