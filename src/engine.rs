//! The engine: lifecycle glue over the samplers and the render loop
//!
//! An [`Engine`] owns two samplers and the render thread, and translates
//! platform lifecycle callbacks into their pause/resume/stop calls and
//! display events. Tearing it down (surface destroyed, or plain drop)
//! stops and joins every thread it created.

use crate::config::EngineConfig;
use crate::render::{DisplayEvent, RenderLoop, ScenePainter, Surface};
use crate::sources::{
    ProcessSnapshot, ProcessSource, Sampler, SnapshotReader, StatsSnapshot, StatsSource,
};
use crossbeam::channel::{unbounded, Sender};
use log::{debug, error, info, warn};
use std::thread::JoinHandle;

/// A live-wallpaper engine instance.
///
/// Created once per rendering surface. After
/// [`on_surface_destroyed`](Self::on_surface_destroyed) the instance is
/// spent; create a new one for a new surface.
pub struct Engine {
    stats: Sampler<StatsSnapshot>,
    processes: Sampler<ProcessSnapshot>,
    /// Dropped on teardown so late events fall on a closed channel.
    events: Option<Sender<DisplayEvent>>,
    render: Option<JoinHandle<()>>,
    destroyed: bool,
}

impl Engine {
    /// Build an engine over the system samplers.
    pub fn new<S, P>(surface: S, painter: P, config: EngineConfig) -> Self
    where
        S: Surface,
        P: ScenePainter<S::Canvas>,
    {
        let mut stats_source = StatsSource::new();
        let stats = Sampler::new("livewall-stats", config.stats_interval(), move || {
            stats_source.read()
        });
        let mut process_source = ProcessSource::new();
        let processes = Sampler::new("livewall-processes", config.process_interval(), move || {
            process_source.read()
        });
        Self::with_samplers(surface, painter, config, stats, processes)
    }

    /// Build an engine over caller-supplied samplers.
    pub fn with_samplers<S, P>(
        surface: S,
        painter: P,
        config: EngineConfig,
        stats: Sampler<StatsSnapshot>,
        processes: Sampler<ProcessSnapshot>,
    ) -> Self
    where
        S: Surface,
        P: ScenePainter<S::Canvas>,
    {
        let (events, event_rx) = unbounded();
        let render_loop = RenderLoop::new(
            surface,
            painter,
            stats.reader(),
            processes.reader(),
            event_rx,
            &config,
        );
        let render = match std::thread::Builder::new()
            .name("livewall-render".into())
            .spawn(move || render_loop.run())
        {
            Ok(handle) => Some(handle),
            Err(err) => {
                error!("failed to spawn render thread: {err}");
                None
            }
        };

        Self {
            stats,
            processes,
            events: Some(events),
            render,
            destroyed: false,
        }
    }

    /// Read handle to the stats sampler's latest snapshot.
    pub fn stats(&self) -> SnapshotReader<StatsSnapshot> {
        self.stats.reader()
    }

    /// Read handle to the process sampler's latest snapshot.
    pub fn processes(&self) -> SnapshotReader<ProcessSnapshot> {
        self.processes.reader()
    }

    /// The rendering surface exists; start collecting.
    pub fn on_surface_ready(&mut self) {
        if self.destroyed {
            warn!("surface ready after teardown, ignoring");
            return;
        }
        self.stats.start();
        self.processes.start();
        info!("surface ready, samplers started");
    }

    /// The surface was resized or rotated.
    pub fn on_surface_changed(&mut self, width: u32, height: u32) {
        self.send(DisplayEvent::SurfaceChanged { width, height });
    }

    /// Visibility toggled: samplers and the frame schedule follow in
    /// lock-step.
    pub fn on_visibility_changed(&mut self, visible: bool) {
        if visible {
            self.stats.resume();
            self.processes.resume();
            self.send(DisplayEvent::Visibility(true));
        } else {
            self.send(DisplayEvent::Visibility(false));
            self.stats.pause();
            self.processes.pause();
        }
    }

    pub fn on_touch_down(&mut self, x: f32, y: f32) {
        self.send(DisplayEvent::TouchDown { x, y });
    }

    pub fn on_touch_up_or_cancel(&mut self) {
        self.send(DisplayEvent::TouchUpOrCancel);
    }

    /// The wallpaper scrolled horizontally.
    pub fn on_offset_changed(&mut self, offset_px: f32) {
        self.send(DisplayEvent::OffsetChanged(offset_px));
    }

    /// The surface is gone for good: stop everything and wait for every
    /// thread this engine created to exit. Idempotent.
    pub fn on_surface_destroyed(&mut self) {
        if self.destroyed {
            return;
        }
        self.destroyed = true;

        self.send(DisplayEvent::Visibility(false));
        self.send(DisplayEvent::Shutdown);
        self.events = None;

        self.stats.stop();
        self.processes.stop();
        self.stats.join();
        self.processes.join();

        if let Some(handle) = self.render.take() {
            if let Err(panic) = handle.join() {
                warn!("render thread panicked: {:?}", panic);
            }
        }
        info!("engine torn down");
    }

    fn send(&self, event: DisplayEvent) {
        if let Some(events) = &self.events {
            if events.send(event).is_err() {
                debug!("render loop gone, event dropped");
            }
        }
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        self.on_surface_destroyed();
    }
}
