//! Game session: the per-frame driver
//!
//! Owns the clock, both worlds and the coordinator, and fixes the order they
//! run in. Cross-world values always travel through the coordinator's latch,
//! so a world sees the other world's output from the previous tick.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::clock::SessionClock;
use super::coordinator::{CrossWorldCoordinator, ProximityReading};
use super::event::{GameEvent, WinEvent, WorldId};
use super::level::{LevelCatalog, LevelData, ValidationReport, validate};
use super::world::{CrossSignal, WorldSimulation};
use crate::tuning::Tuning;

/// One frame of player input, in each world's local coordinates
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TickInput {
    /// Held pointer in the surge world; `None` releases the drag
    pub surge_drag: Option<Vec2>,
    /// New glide target in the flow world, if tapped this frame
    pub flow_target: Option<Vec2>,
}

/// Opening glide: (start time, fraction of the flow world extent)
const ONBOARDING_PATH: [(f32, Vec2); 3] = [
    (0.0, Vec2::new(0.35, 0.55)),
    (0.7, Vec2::new(0.55, 0.50)),
    (1.4, Vec2::new(0.70, 0.45)),
];
const ONBOARDING_SECS: f32 = 2.0;

/// Scripted glide that shows the wind link before the player takes over
#[derive(Debug, Clone)]
struct Onboarding {
    extent: Vec2,
    elapsed: f32,
    next: usize,
}

impl Onboarding {
    fn new(extent: Vec2) -> Self {
        Self {
            extent,
            elapsed: 0.0,
            next: 0,
        }
    }

    /// Glide target due this tick, if any
    fn next_target(&mut self, dt: f32) -> Option<Vec2> {
        let due = ONBOARDING_PATH
            .get(self.next)
            .filter(|(at, _)| self.elapsed >= *at)
            .map(|(_, frac)| *frac * self.extent);
        if due.is_some() {
            self.next += 1;
        }
        self.elapsed += dt;
        due
    }

    fn is_finished(&self) -> bool {
        self.elapsed >= ONBOARDING_SECS
    }
}

/// Everything a HUD shows
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HudSnapshot {
    pub surge: f32,
    pub flow: f32,
    pub proximity: ProximityReading,
    pub title: String,
    pub timer: String,
}

pub struct GameSession {
    tuning: Tuning,
    clock: SessionClock,
    coordinator: CrossWorldCoordinator,
    level: LevelData,
    surge_world: WorldSimulation,
    flow_world: WorldSimulation,
    /// Game time when the current level was won
    won_at: Option<f32>,
    /// Owns flow input while running
    onboarding: Option<Onboarding>,
    events: Vec<GameEvent>,
}

impl GameSession {
    /// A fresh session, starting on the first built-in level
    pub fn new(tuning: Tuning) -> Self {
        let level = LevelCatalog::builtin().get(0).clone();
        let mut session = Self {
            clock: SessionClock::new(),
            coordinator: CrossWorldCoordinator::new(&tuning),
            surge_world: WorldSimulation::surge(&level, &tuning),
            flow_world: WorldSimulation::flow(&level, &tuning),
            level,
            tuning,
            won_at: None,
            onboarding: None,
            events: Vec::new(),
        };
        session.onboarding = Self::onboarding_for(&session.level);
        session.coordinator.reset_for_new_level(session.level.index);
        session
    }

    /// Rebuild both worlds from `level`. Wiring mistakes are logged and
    /// returned but never block the load.
    pub fn load_level(&mut self, level: LevelData) -> ValidationReport {
        log::info!("Loading level {} \"{}\"", level.index, level.title);
        let report = validate(&level);
        self.surge_world = WorldSimulation::surge(&level, &self.tuning);
        self.flow_world = WorldSimulation::flow(&level, &self.tuning);
        self.coordinator.reset_for_new_level(level.index);
        self.clock.reset();
        self.won_at = None;
        self.onboarding = Self::onboarding_for(&level);
        self.level = level;
        report
    }

    fn onboarding_for(level: &LevelData) -> Option<Onboarding> {
        level
            .onboarding
            .then(|| Onboarding::new(level.world_size.flow))
    }

    /// True while the scripted opening glide ignores flow input
    pub fn is_onboarding(&self) -> bool {
        self.onboarding.is_some()
    }

    /// Reload the current level from its data
    pub fn restart(&mut self) -> ValidationReport {
        log::info!("Restarting level {}", self.level.index);
        self.load_level(self.level.clone())
    }

    pub fn advance(&mut self, next_level: LevelData) -> ValidationReport {
        self.load_level(next_level)
    }

    /// Run one frame: clock, surge world, flow world, coordinator
    pub fn tick(&mut self, raw_elapsed: f32, input: &TickInput) {
        let dt = self.clock.next_delta(raw_elapsed);

        // Values from the previous tick
        let dilation = self.coordinator.time_dilation();
        self.surge_world
            .receive(CrossSignal::WindPower(self.coordinator.latched_wind()));
        self.flow_world
            .receive(CrossSignal::HeatMap(self.coordinator.latched_heat().clone()));
        self.surge_world.set_time_dilation(dilation);
        self.flow_world.set_time_dilation(dilation);

        let flow_target = if let Some(script) = self.onboarding.as_mut() {
            let target = script.next_target(dt);
            if script.is_finished() {
                log::info!("Onboarding finished, flow input unlocked");
                self.onboarding = None;
            }
            target
        } else {
            input.flow_target
        };

        self.surge_world.steer(input.surge_drag);
        self.flow_world.steer(flow_target);

        let surge = self.surge_world.tick(dt);
        let flow = self.flow_world.tick(dt);
        self.collect_world_cues();

        let coordinator = &mut self.coordinator;
        coordinator.update_surge(surge.local_charge);
        coordinator.update_flow(flow.local_charge);
        coordinator.wind_power_changed(flow.wind_power);
        coordinator.heat_intensity_changed(&surge.heat_links);
        coordinator.set_portal_occupancy(WorldId::Surge, surge.portal_occupied);
        coordinator.set_portal_occupancy(WorldId::Flow, flow.portal_occupied);
        coordinator.update_proximity(
            surge.position,
            flow.position,
            self.level.world_size.surge,
            self.level.world_size.flow,
        );
        if coordinator.win_pending() && self.won_at.is_none() {
            self.won_at = Some(self.clock.elapsed());
        }

        let completion_due = coordinator.tick(dt);
        self.events
            .extend(coordinator.drain_cues().into_iter().map(GameEvent::Cue));

        if completion_due {
            let win = WinEvent {
                level_index: self.level.index,
                elapsed_secs: self.won_at.unwrap_or_else(|| self.clock.elapsed()),
            };
            log::info!(
                "Level {} complete in {}s",
                win.level_index,
                win.whole_seconds()
            );
            self.events.push(GameEvent::LevelComplete(win));
        }
    }

    fn collect_world_cues(&mut self) {
        for world in [&mut self.surge_world, &mut self.flow_world] {
            self.events
                .extend(world.drain_cues().into_iter().map(GameEvent::Cue));
        }
    }

    /// Take everything emitted since the last drain, in emission order
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn coordinator(&self) -> &CrossWorldCoordinator {
        &self.coordinator
    }

    pub fn surge_world(&self) -> &WorldSimulation {
        &self.surge_world
    }

    pub fn flow_world(&self) -> &WorldSimulation {
        &self.flow_world
    }

    pub fn level(&self) -> &LevelData {
        &self.level
    }

    pub fn clock(&self) -> &SessionClock {
        &self.clock
    }

    pub fn hud(&self) -> HudSnapshot {
        HudSnapshot {
            surge: self.coordinator.surge(),
            flow: self.coordinator.flow(),
            proximity: self.coordinator.proximity(),
            title: self.level.title.clone(),
            timer: self.clock.timer_string(),
        }
    }

    #[cfg(test)]
    pub(crate) fn worlds_mut(&mut self) -> (&mut WorldSimulation, &mut WorldSimulation) {
        (&mut self.surge_world, &mut self.flow_world)
    }
}
