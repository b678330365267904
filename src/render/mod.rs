//! Render scheduling and drawing seams

mod scheduler;
mod surface;

pub use scheduler::{mode_zone_contains, DisplayEvent, DisplayMode, RenderLoop, ViewState};
pub use surface::{Orientation, ScenePainter, Surface};
