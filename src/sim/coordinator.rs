//! Cross-world coordinator
//!
//! Sits between the two worlds. It never touches world state: the session
//! feeds it each world's outputs after they tick, and reads back the latched
//! values (wind, heat, dilation) to push into the worlds on the next tick.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::event::{FeedbackCue, WorldId};
use super::smooth::ClampedSmoother;
use super::world::HeatMap;
use crate::clamp01;
use crate::consts::{PROXIMITY_RANGE, TEAR_DILATION, TEAR_THRESHOLD, WIN_DELAY_SECS};
use crate::tuning::Tuning;

/// Level state machine. There is no losing state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Phase {
    #[default]
    Idle,
    Running,
    Won,
}

/// How close the two characters are in normalized space
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ProximityReading {
    /// 1 when overlapping, 0 at `PROXIMITY_RANGE` or further
    pub strength: f32,
    pub tear: bool,
}

#[derive(Debug, Clone)]
pub struct CrossWorldCoordinator {
    phase: Phase,
    level_index: usize,

    surge: ClampedSmoother,
    flow: ClampedSmoother,

    proximity: ProximityReading,
    /// Tear state last tick, for the rising edge
    was_torn: bool,
    warned_degenerate: bool,

    surge_occupied: bool,
    flow_occupied: bool,

    latched_wind: f32,
    latched_heat: HeatMap,

    /// Seconds until the pending completion fires
    win_timer: Option<f32>,
    cues: Vec<FeedbackCue>,
}

impl CrossWorldCoordinator {
    pub fn new(tuning: &Tuning) -> Self {
        Self {
            phase: Phase::Idle,
            level_index: 0,
            surge: ClampedSmoother::new(0.0, tuning.hud_smoothing, tuning.smoothing),
            flow: ClampedSmoother::new(0.0, tuning.hud_smoothing, tuning.smoothing),
            proximity: ProximityReading::default(),
            was_torn: false,
            warned_degenerate: false,
            surge_occupied: false,
            flow_occupied: false,
            latched_wind: 0.0,
            latched_heat: HeatMap::new(),
            win_timer: None,
            cues: Vec::new(),
        }
    }

    /// Zero everything level-scoped and cancel a pending completion
    pub(crate) fn reset_for_new_level(&mut self, level_index: usize) {
        if self.win_timer.is_some() {
            log::info!("Pending completion of level {} cancelled", self.level_index);
        }
        self.phase = Phase::Idle;
        self.level_index = level_index;
        self.surge.reset(0.0);
        self.flow.reset(0.0);
        self.proximity = ProximityReading::default();
        self.was_torn = false;
        self.warned_degenerate = false;
        self.surge_occupied = false;
        self.flow_occupied = false;
        self.latched_wind = 0.0;
        self.latched_heat.clear();
        self.win_timer = None;
        self.cues.clear();
    }

    pub(crate) fn update_surge(&mut self, raw: f32) {
        self.surge.set_target(raw);
    }

    pub(crate) fn update_flow(&mut self, raw: f32) {
        self.flow.set_target(raw);
    }

    /// Latch the flow world's wind for the surge world's next tick
    pub(crate) fn wind_power_changed(&mut self, pct: f32) {
        self.latched_wind = clamp01(pct);
    }

    /// Latch the surge world's heat map for the flow world's next tick
    pub(crate) fn heat_intensity_changed(&mut self, map: &HeatMap) {
        self.latched_heat.clear();
        self.latched_heat
            .extend(map.iter().map(|(&link, &v)| (link, clamp01(v))));
    }

    pub(crate) fn update_proximity(
        &mut self,
        surge_pos: Vec2,
        flow_pos: Vec2,
        surge_size: Vec2,
        flow_size: Vec2,
    ) -> ProximityReading {
        let usable = |size: Vec2| size.is_finite() && size.x > 0.0 && size.y > 0.0;
        let strength = if usable(surge_size) && usable(flow_size) {
            let d = (surge_pos / surge_size).distance(flow_pos / flow_size);
            clamp01(1.0 - d / PROXIMITY_RANGE)
        } else {
            if !self.warned_degenerate {
                log::warn!(
                    "Degenerate world extents {:?} / {:?}, proximity disabled",
                    surge_size,
                    flow_size
                );
                self.warned_degenerate = true;
            }
            0.0
        };

        let tear = strength > TEAR_THRESHOLD;
        if tear && !self.was_torn {
            log::debug!("Worlds tear at strength {:.3}", strength);
            self.cues.push(FeedbackCue::ProximityTear);
        }
        self.was_torn = tear;
        self.proximity = ProximityReading { strength, tear };
        self.proximity
    }

    /// Record a portal's occupancy; both occupied wins the level once
    pub(crate) fn set_portal_occupancy(&mut self, world: WorldId, occupied: bool) {
        match world {
            WorldId::Surge => self.surge_occupied = occupied,
            WorldId::Flow => self.flow_occupied = occupied,
        }
        if self.surge_occupied && self.flow_occupied && self.phase != Phase::Won {
            log::info!("Level {} won", self.level_index);
            self.phase = Phase::Won;
            self.win_timer = Some(WIN_DELAY_SECS);
            self.cues.push(FeedbackCue::Win);
        }
    }

    /// Smooth the HUD scalars and run the win countdown with the clock's
    /// (undilated) delta. Returns true on the tick the completion is due.
    pub(crate) fn tick(&mut self, dt: f32) -> bool {
        if self.phase == Phase::Idle {
            self.phase = Phase::Running;
        }
        self.surge.step(dt);
        self.flow.step(dt);

        match self.win_timer {
            Some(remaining) => {
                let remaining = remaining - dt;
                if remaining <= 0.0 {
                    self.win_timer = None;
                    true
                } else {
                    self.win_timer = Some(remaining);
                    false
                }
            }
            None => false,
        }
    }

    pub(crate) fn drain_cues(&mut self) -> Vec<FeedbackCue> {
        std::mem::take(&mut self.cues)
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn level_index(&self) -> usize {
        self.level_index
    }

    /// Smoothed surge for display
    pub fn surge(&self) -> f32 {
        self.surge.value()
    }

    /// Smoothed flow for display
    pub fn flow(&self) -> f32 {
        self.flow.value()
    }

    pub fn proximity(&self) -> ProximityReading {
        self.proximity
    }

    /// Dilation both worlds run at next tick
    pub fn time_dilation(&self) -> f32 {
        if self.proximity.tear {
            TEAR_DILATION
        } else {
            1.0
        }
    }

    pub fn latched_wind(&self) -> f32 {
        self.latched_wind
    }

    pub fn latched_heat(&self) -> &HeatMap {
        &self.latched_heat
    }

    pub fn portal_occupancy(&self) -> (bool, bool) {
        (self.surge_occupied, self.flow_occupied)
    }

    pub fn win_pending(&self) -> bool {
        self.win_timer.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const FRAME: f32 = 1.0 / 60.0;
    const SIZE: Vec2 = Vec2::new(400.0, 300.0);

    fn coordinator() -> CrossWorldCoordinator {
        CrossWorldCoordinator::new(&Tuning::default())
    }

    #[test]
    fn test_hud_values_smooth_toward_target() {
        let mut c = coordinator();
        c.update_surge(1.0);
        assert_eq!(c.surge(), 0.0);
        c.tick(FRAME);
        assert!((c.surge() - 0.12).abs() < 1e-4);
        for _ in 0..300 {
            c.tick(FRAME);
        }
        assert!(c.surge() > 0.99);
        c.update_flow(5.0);
        c.tick(FRAME);
        assert!(c.flow() <= 1.0);
    }

    #[test]
    fn test_proximity_strength() {
        let mut c = coordinator();
        let same = c.update_proximity(Vec2::new(100.0, 100.0), Vec2::new(100.0, 100.0), SIZE, SIZE);
        assert_eq!(same.strength, 1.0);
        assert!(same.tear);

        // Half of the range apart in normalized x
        let half = c.update_proximity(Vec2::ZERO, Vec2::new(50.0, 0.0), SIZE, SIZE);
        assert!((half.strength - 0.5).abs() < 1e-5);
        assert!(!half.tear);

        let far = c.update_proximity(Vec2::ZERO, Vec2::new(400.0, 300.0), SIZE, SIZE);
        assert_eq!(far.strength, 0.0);
    }

    #[test]
    fn test_proximity_uses_each_worlds_extent() {
        let mut c = coordinator();
        let reading = c.update_proximity(
            Vec2::new(200.0, 150.0),
            Vec2::new(400.0, 300.0),
            SIZE,
            SIZE * 2.0,
        );
        assert_eq!(reading.strength, 1.0);
    }

    #[test]
    fn test_tear_edge_fires_once() {
        let mut c = coordinator();
        let p = Vec2::new(100.0, 100.0);
        for _ in 0..10 {
            c.update_proximity(p, p, SIZE, SIZE);
        }
        assert_eq!(c.drain_cues(), vec![FeedbackCue::ProximityTear]);
        assert_eq!(c.time_dilation(), TEAR_DILATION);

        c.update_proximity(p, Vec2::new(300.0, 100.0), SIZE, SIZE);
        assert_eq!(c.time_dilation(), 1.0);
        c.update_proximity(p, p, SIZE, SIZE);
        assert_eq!(c.drain_cues(), vec![FeedbackCue::ProximityTear]);
    }

    #[test]
    fn test_degenerate_extents() {
        let mut c = coordinator();
        let p = Vec2::new(10.0, 10.0);
        let r = c.update_proximity(p, p, Vec2::ZERO, SIZE);
        assert_eq!(r, ProximityReading::default());
        let r = c.update_proximity(p, p, SIZE, Vec2::new(f32::NAN, 1.0));
        assert_eq!(r.strength, 0.0);
        assert!(c.drain_cues().is_empty());
    }

    #[test]
    fn test_win_once_then_completion() {
        let mut c = coordinator();
        c.set_portal_occupancy(WorldId::Surge, true);
        assert_eq!(c.phase(), Phase::Idle);
        c.set_portal_occupancy(WorldId::Flow, true);
        assert_eq!(c.phase(), Phase::Won);
        c.set_portal_occupancy(WorldId::Flow, true);
        c.set_portal_occupancy(WorldId::Surge, false);
        c.set_portal_occupancy(WorldId::Surge, true);
        assert_eq!(c.drain_cues(), vec![FeedbackCue::Win]);

        let mut due = 0;
        let mut frames = 0;
        for _ in 0..60 {
            frames += 1;
            if c.tick(FRAME) {
                due += 1;
                break;
            }
        }
        assert_eq!(due, 1);
        assert!((15..=16).contains(&frames));
        assert!(!c.win_pending());
        assert_eq!(c.phase(), Phase::Won);
    }

    #[test]
    fn test_reset_cancels_pending_win() {
        let mut c = coordinator();
        c.tick(FRAME);
        assert_eq!(c.phase(), Phase::Running);
        c.set_portal_occupancy(WorldId::Surge, true);
        c.set_portal_occupancy(WorldId::Flow, true);
        assert!(c.win_pending());

        c.reset_for_new_level(2);
        assert_eq!(c.phase(), Phase::Idle);
        assert_eq!(c.level_index(), 2);
        assert!(!c.win_pending());
        assert_eq!(c.portal_occupancy(), (false, false));
        assert!(c.drain_cues().is_empty());
        for _ in 0..60 {
            assert!(!c.tick(FRAME));
        }
    }

    #[test]
    fn test_cross_signals_latch_clamped() {
        let mut c = coordinator();
        c.wind_power_changed(3.0);
        assert_eq!(c.latched_wind(), 1.0);
        c.heat_intensity_changed(&HeatMap::from([(0, 1.0), (2, -1.0)]));
        assert_eq!(c.latched_heat().get(&0), Some(&1.0));
        assert_eq!(c.latched_heat().get(&2), Some(&0.0));
        c.reset_for_new_level(0);
        assert_eq!(c.latched_wind(), 0.0);
        assert!(c.latched_heat().is_empty());
    }

    proptest! {
        #[test]
        fn prop_scalars_stay_in_unit_range(
            raw in prop::collection::vec(-10.0f32..10.0, 1..50),
            ax in -1000.0f32..1000.0, ay in -1000.0f32..1000.0,
            bx in -1000.0f32..1000.0, by in -1000.0f32..1000.0,
        ) {
            let mut c = coordinator();
            for v in raw {
                c.update_surge(v);
                c.update_flow(-v);
                c.wind_power_changed(v);
                c.tick(FRAME);
                prop_assert!((0.0..=1.0).contains(&c.surge()));
                prop_assert!((0.0..=1.0).contains(&c.flow()));
                prop_assert!((0.0..=1.0).contains(&c.latched_wind()));
            }
            let r = c.update_proximity(Vec2::new(ax, ay), Vec2::new(bx, by), SIZE, SIZE);
            prop_assert!((0.0..=1.0).contains(&r.strength));
        }
    }
}
