//! Clamped exponential smoothing
//!
//! Authored coefficients are "fraction of the remaining gap closed per 60 Hz
//! tick". In [`SmoothingMode::TimeBased`] the same coefficient becomes a decay
//! constant `k = -ln(1 - c) * 60`, so a 60 Hz caller sees identical values and
//! other frame rates converge at the same wall-clock speed.

use serde::{Deserialize, Serialize};

use crate::consts::REFERENCE_HZ;
use crate::tuning::SmoothingMode;
use crate::{clamp01, lerp};

/// Fraction of the gap to close this tick for a per-60Hz coefficient
#[inline]
pub fn blend_fraction(mode: SmoothingMode, per_call: f32, dt: f32) -> f32 {
    match mode {
        SmoothingMode::PerCall => clamp01(per_call),
        SmoothingMode::TimeBased => {
            let c = clamp01(per_call);
            if c >= 1.0 {
                return 1.0;
            }
            let k = -(1.0 - c).ln() * REFERENCE_HZ;
            clamp01(1.0 - (-k * dt.max(0.0)).exp())
        }
    }
}

/// Velocity retention for a per-60Hz damping factor
#[inline]
pub fn damping_factor(mode: SmoothingMode, damping: f32, dt: f32) -> f32 {
    match mode {
        SmoothingMode::PerCall => damping,
        SmoothingMode::TimeBased => damping.powf(dt.max(0.0) * REFERENCE_HZ),
    }
}

/// One scalar eased toward a target and kept in [0, 1]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClampedSmoother {
    value: f32,
    target: f32,
    coefficient: f32,
    mode: SmoothingMode,
}

impl ClampedSmoother {
    pub fn new(initial: f32, coefficient: f32, mode: SmoothingMode) -> Self {
        let value = clamp01(initial);
        Self {
            value,
            target: value,
            coefficient,
            mode,
        }
    }

    #[inline]
    pub fn value(&self) -> f32 {
        self.value
    }

    #[inline]
    pub fn target(&self) -> f32 {
        self.target
    }

    /// Store a new target; the value only moves on `step`
    pub fn set_target(&mut self, target: f32) {
        self.target = clamp01(target);
    }

    /// Move the value toward the target for a tick of length `dt`
    pub fn step(&mut self, dt: f32) -> f32 {
        let t = blend_fraction(self.mode, self.coefficient, dt);
        self.value = clamp01(lerp(self.value, self.target, t));
        self.value
    }

    /// Snap both value and target (level load only)
    pub fn reset(&mut self, value: f32) {
        self.value = clamp01(value);
        self.target = self.value;
    }
}
