//! Mechanic entities and their local rules
//!
//! Each mechanic only knows its own geometry and state. Wiring between them
//! (which bridge listens to which windmill, which wall to which plate) is done
//! by the owning world through link tables.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::smooth::ClampedSmoother;
use crate::consts::{ICE_SOLID_EPSILON, REFERENCE_HZ};
use crate::tuning::SmoothingMode;
use crate::clamp01;

/// Spins while enough wind reaches it; feeds bridges on the same link
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Windmill {
    pub pos: Vec2,
    pub link_index: u32,
    pub threshold: f32,
    pub active: bool,
    /// Blade angle (radians), cosmetic only
    #[serde(skip)]
    pub rotation: f32,
}

impl Windmill {
    pub fn new(pos: Vec2, link_index: u32, threshold: f32) -> Self {
        Self {
            pos,
            link_index,
            threshold: clamp01(threshold),
            active: false,
            rotation: 0.0,
        }
    }

    /// Update activation from the current wind power
    pub fn apply_wind(&mut self, wind_power: f32) {
        self.active = wind_power >= self.threshold;
    }

    /// Advance the blade angle while active
    pub fn spin(&mut self, dt: f32, spin_per_frame: f32) {
        if self.active {
            self.rotation = (self.rotation + spin_per_frame * dt * REFERENCE_HZ)
                .rem_euclid(std::f32::consts::TAU);
        }
    }
}

/// Extends from its origin while a linked windmill spins
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bridge {
    pub origin: Vec2,
    pub max_width: f32,
    pub link_index: u32,
    pub width: f32,
}

impl Bridge {
    pub fn new(origin: Vec2, max_width: f32, link_index: u32) -> Self {
        Self {
            origin,
            max_width: max_width.max(0.0),
            link_index,
            width: 0.0,
        }
    }

    /// Ease toward full or zero width. Returns true when the width crosses
    /// `cue_width` upward this tick.
    pub fn ease(&mut self, powered: bool, dt: f32, rate: f32, cue_width: f32) -> bool {
        let target = if powered { self.max_width } else { 0.0 };
        let before = self.width;
        let t = (dt * rate).clamp(0.0, 1.0);
        self.width = (self.width + (target - self.width) * t).clamp(0.0, self.max_width);
        before < cue_width && self.width >= cue_width
    }

    /// Fraction of the span currently bridged
    pub fn extension(&self) -> f32 {
        if self.max_width > 0.0 {
            clamp01(self.width / self.max_width)
        } else {
            0.0
        }
    }
}

/// Heats every ice wall on its link while the surge character stands on it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeatPlate {
    pub pos: Vec2,
    pub radius: f32,
    pub link_index: u32,
    pub active: bool,
}

impl HeatPlate {
    pub fn new(pos: Vec2, radius: f32, link_index: u32) -> Self {
        Self {
            pos,
            radius: radius.max(0.0),
            link_index,
            active: false,
        }
    }

    pub fn update(&mut self, character: Vec2, slack: f32) -> bool {
        self.active = character.distance(self.pos) < self.radius + slack;
        self.active
    }

    /// Heat this plate contributes (0 or 1)
    pub fn intensity(&self) -> f32 {
        if self.active { 1.0 } else { 0.0 }
    }
}

/// Melts under linked heat and slowly refreezes without it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IceWall {
    pub pos: Vec2,
    pub size: Vec2,
    pub link_index: u32,
    /// Frozen fraction lost per second at full heat
    pub melt_rate: f32,
    /// Frozen fraction regained per second without heat
    pub refreeze_rate: f32,
    frozen: ClampedSmoother,
}

impl IceWall {
    pub fn new(
        pos: Vec2,
        size: Vec2,
        link_index: u32,
        melt_time: f32,
        refreeze_rate: f32,
        smoothing: f32,
        mode: SmoothingMode,
    ) -> Self {
        Self {
            pos,
            size,
            link_index,
            melt_rate: if melt_time > 0.0 { 1.0 / melt_time } else { 0.0 },
            refreeze_rate: refreeze_rate.max(0.0),
            frozen: ClampedSmoother::new(1.0, smoothing, mode),
        }
    }

    /// 1 = solid, 0 = melted away
    pub fn frozen(&self) -> f32 {
        self.frozen.value()
    }

    pub fn is_solid(&self) -> bool {
        self.frozen.value() > ICE_SOLID_EPSILON
    }

    /// Move the frozen target by heat (or lack of it), then ease toward it
    pub fn apply_heat(&mut self, intensity: f32, dt: f32) {
        let intensity = clamp01(intensity);
        let target = if intensity > 0.0 {
            self.frozen.target() - self.melt_rate * intensity * dt
        } else {
            self.frozen.target() + self.refreeze_rate * dt
        };
        self.frozen.set_target(target);
        self.frozen.step(dt);
    }
}

/// Breaks once its world's charge reaches the threshold; never reforms
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Barrier {
    pub pos: Vec2,
    pub size: Vec2,
    pub threshold: f32,
    broken: bool,
}

impl Barrier {
    pub fn new(pos: Vec2, size: Vec2, threshold: f32) -> Self {
        Self {
            pos,
            size,
            threshold: clamp01(threshold),
            broken: false,
        }
    }

    pub fn is_broken(&self) -> bool {
        self.broken
    }

    /// Returns true only on the tick the barrier breaks
    pub fn try_break(&mut self, charge: f32) -> bool {
        if self.broken || charge < self.threshold {
            return false;
        }
        self.broken = true;
        true
    }
}

/// Exit the character must stand in
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Portal {
    pub pos: Vec2,
    pub radius: f32,
    pub occupied: bool,
}

impl Portal {
    pub fn new(pos: Vec2, radius: f32) -> Self {
        Self {
            pos,
            radius: radius.max(0.0),
            occupied: false,
        }
    }

    pub fn update(&mut self, character: Vec2) -> bool {
        self.occupied = character.distance(self.pos) <= self.radius;
        self.occupied
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FRAME: f32 = 1.0 / 60.0;

    #[test]
    fn test_windmill_threshold() {
        let mut w = Windmill::new(Vec2::ZERO, 0, 0.3);
        w.apply_wind(0.29);
        assert!(!w.active);
        w.apply_wind(0.3);
        assert!(w.active);
        w.spin(FRAME, 0.1);
        assert!((w.rotation - 0.1).abs() < 1e-5);
    }

    #[test]
    fn test_bridge_extends_and_cues_once() {
        let mut b = Bridge::new(Vec2::ZERO, 100.0, 0);
        let mut cues = 0;
        for _ in 0..120 {
            if b.ease(true, FRAME, 6.0, 10.0) {
                cues += 1;
            }
        }
        assert_eq!(cues, 1);
        assert!(b.width > 99.0);
        assert!(b.width <= b.max_width);

        for _ in 0..120 {
            b.ease(false, FRAME, 6.0, 10.0);
        }
        assert!(b.width < 1.0);
    }

    #[test]
    fn test_heat_plate_slack() {
        let mut p = HeatPlate::new(Vec2::new(100.0, 100.0), 30.0, 0);
        assert!(p.update(Vec2::new(136.0, 100.0), 7.0));
        assert!(!p.update(Vec2::new(137.0, 100.0), 7.0));
        assert_eq!(p.intensity(), 0.0);
    }

    #[test]
    fn test_ice_melts_monotonically() {
        let mut wall = IceWall::new(
            Vec2::ZERO,
            Vec2::new(40.0, 80.0),
            0,
            2.0,
            0.12,
            0.15,
            SmoothingMode::TimeBased,
        );
        let mut last = wall.frozen();
        for _ in 0..120 {
            wall.apply_heat(1.0, FRAME);
            assert!(wall.frozen() <= last);
            last = wall.frozen();
        }
        assert!(wall.frozen() < 0.1);
    }

    #[test]
    fn test_ice_refreezes_without_heat() {
        let mut wall = IceWall::new(
            Vec2::ZERO,
            Vec2::ONE,
            0,
            0.5,
            0.12,
            0.15,
            SmoothingMode::PerCall,
        );
        for _ in 0..120 {
            wall.apply_heat(1.0, FRAME);
        }
        let melted = wall.frozen();
        for _ in 0..60 {
            wall.apply_heat(0.0, FRAME);
        }
        assert!(wall.frozen() > melted);
        assert!(wall.frozen() <= 1.0);
    }

    #[test]
    fn test_ice_never_jumps() {
        let mut wall = IceWall::new(
            Vec2::ZERO,
            Vec2::ONE,
            0,
            0.01,
            0.12,
            0.15,
            SmoothingMode::PerCall,
        );
        let before = wall.frozen();
        wall.apply_heat(1.0, 0.05);
        // One tick can close at most the smoothing fraction of the gap
        assert!(before - wall.frozen() <= 0.15 + 1e-6);
    }

    #[test]
    fn test_barrier_breaks_once() {
        let mut b = Barrier::new(Vec2::ZERO, Vec2::ONE, 0.5);
        assert!(!b.try_break(0.49));
        assert!(b.try_break(0.5));
        assert!(!b.try_break(1.0));
        assert!(b.is_broken());
        assert!(!b.try_break(0.0));
        assert!(b.is_broken());
    }

    #[test]
    fn test_portal_radius_inclusive() {
        let mut p = Portal::new(Vec2::ZERO, 30.0);
        assert!(p.update(Vec2::new(30.0, 0.0)));
        assert!(!p.update(Vec2::new(30.5, 0.0)));
    }
}
