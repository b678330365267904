//! livewall: the concurrency and lifecycle core of a live system-stats
//! wallpaper
//!
//! This library provides:
//! - Pausable periodic worker threads gated by a binary permit
//! - Background samplers publishing immutable snapshots for the render side
//! - A self-rescheduling render loop with a touch-driven mode switch
//! - The engine binding platform lifecycle events to all of the above
//!
//! Drawing itself is out of scope; embedders supply a [`Surface`] and a
//! [`ScenePainter`].

pub mod config;
pub mod core;
pub mod engine;
pub mod render;
pub mod sources;

// Re-export commonly used types
pub use config::EngineConfig;
pub use engine::Engine;
pub use render::{Orientation, ScenePainter, Surface};
pub use sources::{ProcessSnapshot, Sampler, StatsSnapshot};
