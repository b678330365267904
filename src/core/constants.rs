//! Shared constants for the engine

/// How many rows the diagnostic list may occupy on screen.
pub const DISPLAY_ROW_BUDGET: usize = 23;

/// Mode hot-zone bounds in density-independent units. The live rectangle is
/// these values multiplied by the display density scale, shifted right by
/// the current horizontal offset.
pub const MODE_ZONE_LEFT: f32 = 487.0;
pub const MODE_ZONE_RIGHT: f32 = 577.0;
pub const MODE_ZONE_TOP: f32 = 141.0;
pub const MODE_ZONE_BOTTOM: f32 = 164.0;

/// The orbit angle wraps back to zero once it passes this many degrees.
pub const ORBIT_WRAP_DEG: u16 = 360;

/// Bytes per megabyte (base 2)
pub const BYTES_PER_MB: f64 = 1_048_576.0;

/// Bytes per gigabyte (base 2)
pub const BYTES_PER_GB: f64 = 1_073_741_824.0;
