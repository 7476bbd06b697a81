//! Twin Resonance - cross-world mechanics core
//!
//! Core modules:
//! - `sim`: Deterministic two-world simulation (characters, mechanics, coordinator)
//! - `tuning`: Data-driven game balance
//! - `error`: Level and tuning loading errors

pub mod error;
pub mod sim;
pub mod tuning;

pub use error::{LevelError, TuningError};
pub use tuning::{SmoothingMode, Tuning};

/// Core configuration constants
pub mod consts {
    /// Largest delta a single frame may advance the simulation (seconds)
    pub const MAX_FRAME_DT: f32 = 0.05;
    /// Frame rate the authored per-frame tuning values were written against
    pub const REFERENCE_HZ: f32 = 60.0;

    /// Normalized distance at which proximity strength reaches zero
    pub const PROXIMITY_RANGE: f32 = 0.25;
    /// Proximity strength above which the worlds "tear"
    pub const TEAR_THRESHOLD: f32 = 0.9;
    /// Time dilation applied to both worlds while torn
    pub const TEAR_DILATION: f32 = 0.5;
    /// Allowed range for a world's time dilation
    pub const MIN_DILATION: f32 = 0.1;
    pub const MAX_DILATION: f32 = 2.0;

    /// Delay between the win trigger and level completion (seconds)
    pub const WIN_DELAY_SECS: f32 = 0.25;

    /// Default world extent when a level does not specify one
    pub const DEFAULT_WORLD_WIDTH: f32 = 400.0;
    pub const DEFAULT_WORLD_HEIGHT: f32 = 300.0;

    /// Seconds without glide input before the flow world asks for a hint
    pub const HINT_DELAY_SECS: f32 = 8.0;

    /// Ice wall opacity below which it no longer blocks
    pub const ICE_SOLID_EPSILON: f32 = 0.01;
}

/// Clamp a scalar to [0, 1]. NaN collapses to 0.
#[inline]
pub fn clamp01(v: f32) -> f32 {
    if v.is_nan() { 0.0 } else { v.clamp(0.0, 1.0) }
}

/// Linear interpolation from `a` toward `b` by fraction `t`
#[inline]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}
