//! Core worker primitive and shared constants

pub mod constants;
mod worker;

pub use worker::{PausableWorker, WorkerState};
