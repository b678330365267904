//! The self-rescheduling render loop
//!
//! One designated thread owns the view state and renders frames. Display
//! events arrive over a channel; between events the loop waits on a single
//! pending tick deadline. Overwriting that deadline is the
//! cancel-before-reschedule step, so at most one tick is ever pending and
//! two frames can never render concurrently.

use crate::config::EngineConfig;
use crate::core::constants::{
    MODE_ZONE_BOTTOM, MODE_ZONE_LEFT, MODE_ZONE_RIGHT, MODE_ZONE_TOP, ORBIT_WRAP_DEG,
};
use crate::render::surface::{Orientation, ScenePainter, Surface};
use crate::sources::{ProcessSnapshot, SnapshotReader, StatsSnapshot};
use anyhow::Result;
use crossbeam::channel::{Receiver, RecvTimeoutError};
use log::{debug, error, trace};
use std::time::{Duration, Instant};

/// Which scene occupies the readout area.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DisplayMode {
    /// The process diagnostic list.
    #[default]
    Diagnostics,
    /// The orbit animation.
    Orbit,
}

impl DisplayMode {
    /// The next mode in the cycle, wrapping back to the first.
    pub fn advance(self) -> Self {
        match self {
            Self::Diagnostics => Self::Orbit,
            Self::Orbit => Self::Diagnostics,
        }
    }
}

/// Events delivered to the render thread.
#[derive(Debug, Clone, PartialEq)]
pub enum DisplayEvent {
    Visibility(bool),
    SurfaceChanged { width: u32, height: u32 },
    TouchDown { x: f32, y: f32 },
    TouchUpOrCancel,
    OffsetChanged(f32),
    Shutdown,
}

/// View state consulted on every tick. Owned by the render thread; mutated
/// only in response to [`DisplayEvent`]s.
#[derive(Debug, Clone)]
pub struct ViewState {
    pub visible: bool,
    pub mode: DisplayMode,
    /// Last hot-zone touch point; cleared on touch-up/cancel and on
    /// touches outside the zone.
    pub touch: Option<(f32, f32)>,
    pub offset_px: f32,
    pub portrait: bool,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            visible: false,
            mode: DisplayMode::default(),
            touch: None,
            offset_px: 0.0,
            portrait: true,
        }
    }
}

/// Whether a touch point falls inside the mode hot-zone.
///
/// The zone scales with display density and rides along with the
/// horizontal offset.
pub fn mode_zone_contains(offset_px: f32, scale: f32, x: f32, y: f32) -> bool {
    x >= offset_px + MODE_ZONE_LEFT * scale
        && x <= offset_px + MODE_ZONE_RIGHT * scale
        && y >= MODE_ZONE_TOP * scale
        && y <= MODE_ZONE_BOTTOM * scale
}

/// The frame loop. Constructed by the engine and moved onto the render
/// thread, where [`run`](Self::run) takes over until shutdown.
pub struct RenderLoop<S: Surface, P: ScenePainter<S::Canvas>> {
    surface: S,
    painter: P,
    stats: SnapshotReader<StatsSnapshot>,
    processes: SnapshotReader<ProcessSnapshot>,
    events: Receiver<DisplayEvent>,
    view: ViewState,
    /// The one pending tick. `None` while idle or invisible.
    pending: Option<Instant>,
    orbit_deg: u16,
    frame_delay: Duration,
    density_scale: f32,
}

impl<S: Surface, P: ScenePainter<S::Canvas>> RenderLoop<S, P> {
    pub fn new(
        surface: S,
        painter: P,
        stats: SnapshotReader<StatsSnapshot>,
        processes: SnapshotReader<ProcessSnapshot>,
        events: Receiver<DisplayEvent>,
        config: &EngineConfig,
    ) -> Self {
        Self {
            surface,
            painter,
            stats,
            processes,
            events,
            view: ViewState::default(),
            pending: None,
            orbit_deg: 0,
            frame_delay: config.frame_delay(),
            density_scale: config.density_scale,
        }
    }

    /// Run until [`DisplayEvent::Shutdown`] or channel disconnect.
    pub fn run(mut self) {
        debug!("render loop up (frame delay {:?})", self.frame_delay);
        loop {
            let event = match self.pending {
                Some(deadline) => match self.events.recv_deadline(deadline) {
                    Ok(event) => Some(event),
                    Err(RecvTimeoutError::Timeout) => None,
                    Err(RecvTimeoutError::Disconnected) => break,
                },
                None => match self.events.recv() {
                    Ok(event) => Some(event),
                    Err(_) => break,
                },
            };

            match event {
                None => {
                    // scheduled tick; the orbit keeps moving even while the
                    // diagnostic scene hides it
                    self.advance_orbit();
                    self.render_frame(true);
                }
                Some(DisplayEvent::Shutdown) => break,
                Some(event) => self.handle(event),
            }
        }
        debug!("render loop down");
    }

    fn handle(&mut self, event: DisplayEvent) {
        trace!("display event: {:?}", event);
        match event {
            DisplayEvent::Visibility(true) => {
                self.view.visible = true;
                self.render_frame(true);
            }
            DisplayEvent::Visibility(false) => {
                self.view.visible = false;
                self.pending = None;
            }
            DisplayEvent::SurfaceChanged { width, height } => {
                self.view.portrait = height >= width;
                self.render_frame(true);
            }
            DisplayEvent::TouchDown { x, y } => {
                if mode_zone_contains(self.view.offset_px, self.density_scale, x, y) {
                    self.view.touch = Some((x, y));
                    self.view.mode = self.view.mode.advance();
                    debug!("mode toggled to {:?}", self.view.mode);
                    if self.view.visible {
                        self.advance_orbit();
                        // the scene position did not move, only the readout
                        // area is dirty
                        self.render_frame(false);
                    }
                } else {
                    self.view.touch = None;
                }
            }
            DisplayEvent::TouchUpOrCancel => {
                self.view.touch = None;
            }
            DisplayEvent::OffsetChanged(offset_px) => {
                self.view.offset_px = offset_px;
                self.render_frame(true);
            }
            // consumed by run() before it gets here
            DisplayEvent::Shutdown => {}
        }
    }

    /// Draw one frame and re-arm the next tick.
    ///
    /// Skips drawing when the surface is transiently unavailable. A painter
    /// error is logged and never stalls the cadence: the canvas is
    /// presented and the tick is re-armed regardless.
    fn render_frame(&mut self, position_changed: bool) {
        if let Some(mut canvas) = self.surface.acquire() {
            let outcome = self.paint(&mut canvas, position_changed);
            self.surface.present(canvas);
            if let Err(err) = outcome {
                error!("frame aborted: {err:#}");
            }
        } else {
            trace!("surface unavailable, skipping frame");
        }

        // drop any stale schedule before arming the next tick
        self.pending = None;
        if self.view.visible {
            self.pending = Some(Instant::now() + self.frame_delay);
        }
    }

    fn paint(&mut self, canvas: &mut S::Canvas, position_changed: bool) -> Result<()> {
        let orientation = if self.view.portrait {
            Orientation::Portrait
        } else {
            Orientation::Landscape
        };

        if position_changed {
            self.painter
                .draw_background(canvas, self.view.offset_px, orientation)?;
        }
        if self.view.portrait {
            let stats = self.stats.load();
            self.painter.draw_overlay_text(canvas, &stats)?;
            self.painter.draw_status_readout(canvas, &stats)?;
            match self.view.mode {
                DisplayMode::Diagnostics => {
                    let processes = self.processes.load();
                    self.painter.draw_diagnostic_list(canvas, &processes)?;
                }
                DisplayMode::Orbit => {
                    self.painter
                        .draw_alternate_display(canvas, &stats, self.orbit_deg)?;
                }
            }
        }
        Ok(())
    }

    fn advance_orbit(&mut self) {
        self.orbit_deg += 1;
        if self.orbit_deg > ORBIT_WRAP_DEG {
            self.orbit_deg = 0;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::Sampler;
    use crossbeam::channel::{unbounded, Sender};
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::thread::JoinHandle;

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        Background(f32, Orientation),
        Overlay,
        Status,
        Diagnostics,
        Alternate(u16),
    }

    struct TestSurface {
        available: Arc<AtomicBool>,
        presented: Arc<AtomicUsize>,
    }

    impl Surface for TestSurface {
        type Canvas = ();

        fn acquire(&mut self) -> Option<()> {
            self.available.load(Ordering::SeqCst).then_some(())
        }

        fn present(&mut self, _canvas: ()) {
            self.presented.fetch_add(1, Ordering::SeqCst);
        }
    }

    struct TestPainter {
        calls: Sender<(Instant, Call)>,
        fail_overlay: bool,
    }

    impl TestPainter {
        fn record(&mut self, call: Call) {
            self.calls.send((Instant::now(), call)).ok();
        }
    }

    impl ScenePainter<()> for TestPainter {
        fn draw_background(
            &mut self,
            _canvas: &mut (),
            offset_px: f32,
            orientation: Orientation,
        ) -> Result<()> {
            self.record(Call::Background(offset_px, orientation));
            Ok(())
        }

        fn draw_overlay_text(&mut self, _canvas: &mut (), _stats: &StatsSnapshot) -> Result<()> {
            self.record(Call::Overlay);
            if self.fail_overlay {
                anyhow::bail!("font atlas lost")
            }
            Ok(())
        }

        fn draw_status_readout(&mut self, _canvas: &mut (), _stats: &StatsSnapshot) -> Result<()> {
            self.record(Call::Status);
            Ok(())
        }

        fn draw_diagnostic_list(
            &mut self,
            _canvas: &mut (),
            _processes: &ProcessSnapshot,
        ) -> Result<()> {
            self.record(Call::Diagnostics);
            Ok(())
        }

        fn draw_alternate_display(
            &mut self,
            _canvas: &mut (),
            _stats: &StatsSnapshot,
            orbit_deg: u16,
        ) -> Result<()> {
            self.record(Call::Alternate(orbit_deg));
            Ok(())
        }
    }

    struct Harness {
        events: Sender<DisplayEvent>,
        calls: Receiver<(Instant, Call)>,
        available: Arc<AtomicBool>,
        presented: Arc<AtomicUsize>,
        thread: JoinHandle<()>,
    }

    impl Harness {
        fn spawn(frame_delay_ms: u64, fail_overlay: bool) -> Self {
            let (event_tx, event_rx) = unbounded();
            let (call_tx, call_rx) = unbounded();
            let available = Arc::new(AtomicBool::new(true));
            let presented = Arc::new(AtomicUsize::new(0));

            let config = EngineConfig {
                frame_delay_ms,
                ..EngineConfig::default()
            };
            let stats: Sampler<StatsSnapshot> =
                Sampler::new("test-stats", Duration::from_secs(60), || {
                    Ok(StatsSnapshot::default())
                });
            let processes: Sampler<ProcessSnapshot> =
                Sampler::new("test-procs", Duration::from_secs(60), || {
                    Ok(ProcessSnapshot::default())
                });

            let render_loop = RenderLoop::new(
                TestSurface {
                    available: Arc::clone(&available),
                    presented: Arc::clone(&presented),
                },
                TestPainter {
                    calls: call_tx,
                    fail_overlay,
                },
                stats.reader(),
                processes.reader(),
                event_rx,
                &config,
            );
            let thread = std::thread::spawn(move || render_loop.run());

            Self {
                events: event_tx,
                calls: call_rx,
                available,
                presented,
                thread,
            }
        }

        fn send(&self, event: DisplayEvent) {
            self.events.send(event).expect("render loop alive");
        }

        /// All painter calls of the next frame (frames start with
        /// `Background` except mode-toggle frames, so collect until quiet).
        fn next_frame(&self) -> Vec<Call> {
            let mut calls = Vec::new();
            let first = self
                .calls
                .recv_timeout(Duration::from_secs(2))
                .expect("a frame should render");
            calls.push(first.1);
            while let Ok((_, call)) = self.calls.recv_timeout(Duration::from_millis(20)) {
                calls.push(call);
            }
            calls
        }

        fn shutdown(self) {
            self.send(DisplayEvent::Shutdown);
            self.thread.join().expect("render thread exits cleanly");
        }
    }

    /// Touch coordinates inside the hot-zone at default density and zero
    /// offset.
    const HIT: (f32, f32) = (500.0, 150.0);

    #[test]
    fn test_mode_zone_geometry() {
        assert!(mode_zone_contains(0.0, 1.0, 487.0, 141.0));
        assert!(mode_zone_contains(0.0, 1.0, 577.0, 164.0));
        assert!(!mode_zone_contains(0.0, 1.0, 486.0, 150.0));
        assert!(!mode_zone_contains(0.0, 1.0, 500.0, 165.0));

        // the zone scales with density and rides the offset
        assert!(mode_zone_contains(100.0, 2.0, 100.0 + 1000.0, 300.0));
        assert!(!mode_zone_contains(100.0, 2.0, 1000.0, 300.0));
    }

    #[test]
    fn test_mode_cycles_on_hot_zone_touches() {
        let harness = Harness::spawn(60_000, false);
        harness.send(DisplayEvent::Visibility(true));
        let frame = harness.next_frame();
        assert!(frame.contains(&Call::Diagnostics), "mode starts at 0: {frame:?}");

        // N hits leave the mode at N mod 2
        harness.send(DisplayEvent::TouchDown { x: HIT.0, y: HIT.1 });
        let frame = harness.next_frame();
        assert!(frame.iter().any(|c| matches!(c, Call::Alternate(_))), "{frame:?}");
        // mode-toggle redraws skip the background blit
        assert!(!frame.iter().any(|c| matches!(c, Call::Background(..))), "{frame:?}");

        harness.send(DisplayEvent::TouchDown { x: HIT.0, y: HIT.1 });
        let frame = harness.next_frame();
        assert!(frame.contains(&Call::Diagnostics), "{frame:?}");

        harness.shutdown();
    }

    #[test]
    fn test_touch_outside_zone_does_not_cycle_or_render() {
        let harness = Harness::spawn(60_000, false);
        harness.send(DisplayEvent::Visibility(true));
        harness.next_frame();

        harness.send(DisplayEvent::TouchDown { x: 10.0, y: 10.0 });
        harness.send(DisplayEvent::TouchUpOrCancel);
        assert!(harness.calls.recv_timeout(Duration::from_millis(100)).is_err());

        harness.shutdown();
    }

    #[test]
    fn test_render_cadence_and_visibility_pause() {
        let delay = Duration::from_millis(40);
        let harness = Harness::spawn(40, false);
        harness.send(DisplayEvent::Visibility(true));

        // collect background timestamps over a few ticks
        let mut stamps = Vec::new();
        let deadline = Instant::now() + Duration::from_millis(400);
        while Instant::now() < deadline {
            if let Ok((at, Call::Background(..))) =
                harness.calls.recv_timeout(Duration::from_millis(100))
            {
                stamps.push(at);
            }
        }
        assert!(stamps.len() >= 3, "expected steady ticks, got {}", stamps.len());
        for pair in stamps.windows(2) {
            assert!(pair[1] - pair[0] >= delay, "frames must be spaced by the delay");
        }

        // invisible: renders stop entirely
        harness.send(DisplayEvent::Visibility(false));
        while harness.calls.recv_timeout(Duration::from_millis(80)).is_ok() {}
        assert!(harness.calls.recv_timeout(Duration::from_millis(150)).is_err());

        // back on: one immediate frame, then steady ticks, no backlog
        harness.send(DisplayEvent::Visibility(true));
        let (first, _) = harness
            .calls
            .recv_timeout(Duration::from_millis(100))
            .expect("immediate frame on visibility");
        let mut resumed = vec![first];
        let deadline = Instant::now() + Duration::from_millis(200);
        while Instant::now() < deadline {
            if let Ok((at, Call::Background(..))) =
                harness.calls.recv_timeout(Duration::from_millis(100))
            {
                resumed.push(at);
            }
        }
        for pair in resumed.windows(2) {
            assert!(pair[1] - pair[0] >= delay, "no queued frame backlog after resume");
        }

        harness.shutdown();
    }

    #[test]
    fn test_painter_error_still_presents_and_reschedules() {
        let harness = Harness::spawn(30, true);
        harness.send(DisplayEvent::Visibility(true));

        // overlay fails every frame; the canvas is presented anyway and the
        // loop keeps ticking
        let frame = harness.next_frame();
        assert!(frame.contains(&Call::Overlay));
        assert!(!frame.contains(&Call::Status), "error aborts the rest of the frame");
        assert!(harness.presented.load(Ordering::SeqCst) >= 1);

        let more = harness.next_frame();
        assert!(more.contains(&Call::Overlay), "cadence survives painter errors");

        harness.shutdown();
    }

    #[test]
    fn test_unavailable_surface_skips_frame_but_keeps_ticking() {
        let harness = Harness::spawn(30, false);
        harness.available.store(false, Ordering::SeqCst);
        harness.send(DisplayEvent::Visibility(true));

        assert!(harness.calls.recv_timeout(Duration::from_millis(100)).is_err());
        assert_eq!(harness.presented.load(Ordering::SeqCst), 0);

        // the tick kept re-arming, so frames flow as soon as the surface is back
        harness.available.store(true, Ordering::SeqCst);
        let frame = harness.next_frame();
        assert!(frame.iter().any(|c| matches!(c, Call::Background(..))));

        harness.shutdown();
    }

    #[test]
    fn test_landscape_skips_overlay_scene() {
        let harness = Harness::spawn(60_000, false);
        harness.send(DisplayEvent::SurfaceChanged {
            width: 1920,
            height: 1080,
        });
        let frame = harness.next_frame();
        assert_eq!(frame, vec![Call::Background(0.0, Orientation::Landscape)]);

        harness.send(DisplayEvent::SurfaceChanged {
            width: 1080,
            height: 1920,
        });
        let frame = harness.next_frame();
        assert!(frame.contains(&Call::Overlay));
        assert!(frame.contains(&Call::Status));

        harness.shutdown();
    }

    #[test]
    fn test_offset_change_renders_immediately_with_new_offset() {
        let harness = Harness::spawn(60_000, false);
        harness.send(DisplayEvent::OffsetChanged(-320.0));
        let frame = harness.next_frame();
        assert!(frame
            .iter()
            .any(|c| matches!(c, Call::Background(px, _) if *px == -320.0)));
        harness.shutdown();
    }

    #[test]
    fn test_orbit_advances_on_ticks_even_in_diagnostics_mode() {
        let harness = Harness::spawn(20, false);
        harness.send(DisplayEvent::Visibility(true));

        // a few diagnostic-mode ticks pass while the orbit is hidden
        std::thread::sleep(Duration::from_millis(120));
        while harness.calls.try_recv().is_ok() {}

        // toggling the mode reveals an angle well past zero
        harness.send(DisplayEvent::TouchDown { x: HIT.0, y: HIT.1 });
        let deadline = Instant::now() + Duration::from_secs(2);
        let mut angle = None;
        while Instant::now() < deadline && angle.is_none() {
            if let Ok((_, Call::Alternate(deg))) =
                harness.calls.recv_timeout(Duration::from_millis(200))
            {
                angle = Some(deg);
            }
        }
        assert!(angle.unwrap_or(0) >= 3, "orbit must advance while hidden: {angle:?}");

        harness.shutdown();
    }
}
