//! Drawing seams: the surface and the scene painter
//!
//! The engine draws nothing itself. Each frame it acquires a canvas from
//! the [`Surface`], runs the [`ScenePainter`] callbacks against it in a
//! fixed order, and presents the canvas back. What those callbacks put on
//! the canvas is entirely the embedder's business.

use crate::sources::{ProcessSnapshot, StatsSnapshot};
use anyhow::Result;

/// Physical orientation of the drawing surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    Portrait,
    Landscape,
}

/// A lockable drawing surface.
///
/// `acquire` may transiently yield nothing (the frame is skipped, not an
/// error). Every acquired canvas is presented exactly once, even when a
/// painter callback fails mid-frame.
pub trait Surface: Send + 'static {
    type Canvas;

    /// Take exclusive hold of the canvas for one frame, if available.
    fn acquire(&mut self) -> Option<Self::Canvas>;

    /// Present the finished frame.
    fn present(&mut self, canvas: Self::Canvas);
}

/// Scene painter callbacks, invoked by the render loop each frame.
///
/// The engine guarantees the order and frequency of these calls, not their
/// content. An `Err` from any callback aborts the rest of the frame; the
/// canvas is still presented and the loop keeps its cadence.
pub trait ScenePainter<C>: Send + 'static {
    /// Composite the scrollable background. Only called when the scene
    /// position changed since the last frame.
    fn draw_background(&mut self, canvas: &mut C, offset_px: f32, orientation: Orientation)
        -> Result<()>;

    /// The informational overlay: usage and uptime readouts.
    fn draw_overlay_text(&mut self, canvas: &mut C, stats: &StatsSnapshot) -> Result<()>;

    /// The small status readout (current clock speed).
    fn draw_status_readout(&mut self, canvas: &mut C, stats: &StatsSnapshot) -> Result<()>;

    /// The process diagnostic list, shown in [`DisplayMode::Diagnostics`].
    ///
    /// [`DisplayMode::Diagnostics`]: crate::render::DisplayMode::Diagnostics
    fn draw_diagnostic_list(&mut self, canvas: &mut C, processes: &ProcessSnapshot) -> Result<()>;

    /// The alternate scene with the orbit animation, shown in
    /// [`DisplayMode::Orbit`].
    ///
    /// [`DisplayMode::Orbit`]: crate::render::DisplayMode::Orbit
    fn draw_alternate_display(
        &mut self,
        canvas: &mut C,
        stats: &StatsSnapshot,
        orbit_deg: u16,
    ) -> Result<()>;
}
