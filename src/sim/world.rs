//! One world's simulation
//!
//! A world owns its character and mechanics, advances them by a (dilated)
//! delta, and reports what the other world needs to know. It never reads the
//! other world directly: cross-world values arrive as [`CrossSignal`]s pushed
//! in by the session before the tick.

use std::collections::BTreeMap;

use glam::Vec2;

use super::character::{Character, Steering};
use super::event::{FeedbackCue, WorldId};
use super::level::LevelData;
use super::link::LinkTable;
use super::mechanics::{Barrier, Bridge, HeatPlate, IceWall, Portal, Windmill};
use super::smooth::blend_fraction;
use crate::consts::{HINT_DELAY_SECS, MAX_DILATION, MIN_DILATION, REFERENCE_HZ};
use crate::tuning::{CharacterTuning, Tuning};
use crate::clamp01;

/// Heat intensity per link index
pub type HeatMap = BTreeMap<u32, f32>;

/// Value routed in from the other world
#[derive(Debug, Clone, PartialEq)]
pub enum CrossSignal {
    /// Flow world's wind, drives windmills and bridges
    WindPower(f32),
    /// Surge world's heat plates, melts ice walls
    HeatMap(HeatMap),
}

/// What a world reports after its tick
#[derive(Debug, Clone, PartialEq)]
pub struct WorldOutput {
    pub world: WorldId,
    pub local_charge: f32,
    /// Link index -> 0 or 1 for every heat plate link (surge world)
    pub heat_links: HeatMap,
    /// Generated wind (flow world), 0 elsewhere
    pub wind_power: f32,
    pub portal_occupied: bool,
    pub position: Vec2,
}

/// Simulation of a single world
#[derive(Debug, Clone)]
pub struct WorldSimulation {
    id: WorldId,
    character: Character,
    character_tuning: CharacterTuning,
    tuning: Tuning,

    windmills: Vec<Windmill>,
    bridges: Vec<Bridge>,
    heat_plates: Vec<HeatPlate>,
    ice_walls: Vec<IceWall>,
    barriers: Vec<Barrier>,
    portal: Portal,
    windmill_links: LinkTable,

    /// Latest cross inputs
    wind_received: f32,
    heat_received: HeatMap,

    /// Wind accumulator driven by character speed
    wind_generated: f32,
    time_dilation: f32,
    /// Seconds since the last glide input, and whether the hint already went out
    idle_secs: f32,
    hint_sent: bool,
    cues: Vec<FeedbackCue>,
}

impl WorldSimulation {
    /// Build the dragged-character world: windmills, bridges, heat plates
    pub fn surge(level: &LevelData, tuning: &Tuning) -> Self {
        let windmills: Vec<Windmill> = level
            .windmills
            .iter()
            .map(|w| {
                Windmill::new(
                    w.position,
                    w.link_index,
                    w.threshold.unwrap_or(tuning.windmill_threshold),
                )
            })
            .collect();
        let windmill_links = LinkTable::from_links(windmills.iter().map(|w| w.link_index));

        let mut world = Self::empty(
            WorldId::Surge,
            Character::new(level.surge_start, Steering::Drag),
            tuning.surge_character.clone(),
            Portal::new(level.surge_portal.position, level.surge_portal.radius),
            tuning,
        );
        world.windmills = windmills;
        world.windmill_links = windmill_links;
        world.bridges = level
            .bridges
            .iter()
            .map(|b| Bridge::new(b.origin, b.max_width, b.link_index))
            .collect();
        world.heat_plates = level
            .heat_plates
            .iter()
            .map(|h| HeatPlate::new(h.position, h.radius, h.link_index))
            .collect();
        world.barriers = level
            .surge_barriers
            .iter()
            .map(|b| Barrier::new(b.position, b.size, b.threshold))
            .collect();
        world
    }

    /// Build the gliding-character world: ice walls, wind generation
    pub fn flow(level: &LevelData, tuning: &Tuning) -> Self {
        let mut world = Self::empty(
            WorldId::Flow,
            Character::new(level.flow_start, Steering::Glide),
            tuning.flow_character.clone(),
            Portal::new(level.flow_portal.position, level.flow_portal.radius),
            tuning,
        );
        world.ice_walls = level
            .ice_walls
            .iter()
            .map(|w| {
                IceWall::new(
                    w.position,
                    w.size,
                    w.link_index,
                    w.melt_time,
                    w.refreeze_rate.unwrap_or(tuning.ice_refreeze_rate),
                    tuning.ice_smoothing,
                    tuning.smoothing,
                )
            })
            .collect();
        world.barriers = level
            .flow_barriers
            .iter()
            .map(|b| Barrier::new(b.position, b.size, b.threshold))
            .collect();
        world
    }

    fn empty(
        id: WorldId,
        character: Character,
        character_tuning: CharacterTuning,
        portal: Portal,
        tuning: &Tuning,
    ) -> Self {
        Self {
            id,
            character,
            character_tuning,
            tuning: tuning.clone(),
            windmills: Vec::new(),
            bridges: Vec::new(),
            heat_plates: Vec::new(),
            ice_walls: Vec::new(),
            barriers: Vec::new(),
            portal,
            windmill_links: LinkTable::new(),
            wind_received: 0.0,
            heat_received: HeatMap::new(),
            wind_generated: 0.0,
            time_dilation: 1.0,
            idle_secs: 0.0,
            hint_sent: false,
            cues: Vec::new(),
        }
    }

    /// Apply this frame's pointer input, already in local coordinates.
    /// Drag worlds treat `None` as a release; glide worlds keep their target.
    pub fn steer(&mut self, pointer: Option<Vec2>) {
        match self.character.steering {
            Steering::Drag => self
                .character
                .drag(pointer, self.character_tuning.grab_radius),
            Steering::Glide => {
                if let Some(point) = pointer {
                    self.character.glide_to(point);
                    self.idle_secs = 0.0;
                    self.hint_sent = false;
                }
            }
        }
    }

    /// Accept a value computed from the other world's previous tick
    pub fn receive(&mut self, signal: CrossSignal) {
        match signal {
            CrossSignal::WindPower(pct) => self.wind_received = clamp01(pct),
            CrossSignal::HeatMap(map) => {
                self.heat_received = map.into_iter().map(|(k, v)| (k, clamp01(v))).collect();
            }
        }
    }

    pub fn set_time_dilation(&mut self, dilation: f32) {
        self.time_dilation = if dilation.is_finite() {
            dilation.clamp(MIN_DILATION, MAX_DILATION)
        } else {
            1.0
        };
    }

    /// Advance one frame. `dt` is the clock's capped delta; dilation is
    /// applied here.
    pub fn tick(&mut self, dt: f32) -> WorldOutput {
        let dt = dt.max(0.0) * self.time_dilation;
        let prev_pos = self.character.pos;

        let mode = self.tuning.smoothing;
        if self.character.step(dt, &self.character_tuning, mode) {
            self.cues.push(FeedbackCue::ChargeFull { world: self.id });
        }

        self.apply_wind(dt);
        self.apply_heat(dt);
        self.generate_wind(prev_pos, dt);
        self.track_inactivity(dt);
        self.check_mechanics();

        self.output()
    }

    /// Windmills spin on received wind; bridges follow their linked windmills
    fn apply_wind(&mut self, dt: f32) {
        for windmill in &mut self.windmills {
            windmill.apply_wind(self.wind_received);
            windmill.spin(dt, self.tuning.windmill_spin);
        }
        for (idx, bridge) in self.bridges.iter_mut().enumerate() {
            let powered = self
                .windmill_links
                .members(bridge.link_index)
                .iter()
                .any(|&w| self.windmills[w].active);
            if bridge.ease(
                powered,
                dt,
                self.tuning.bridge_extend_rate,
                self.tuning.bridge_cue_width,
            ) {
                log::debug!("Bridge {} extended past cue width", idx);
                self.cues.push(FeedbackCue::BridgeExtended { bridge: idx });
            }
        }
    }

    /// Ice walls melt under their link's heat and refreeze otherwise
    fn apply_heat(&mut self, dt: f32) {
        for wall in &mut self.ice_walls {
            let intensity = self
                .heat_received
                .get(&wall.link_index)
                .copied()
                .unwrap_or(0.0);
            wall.apply_heat(intensity, dt);
        }
    }

    /// Gliding produces wind proportional to per-frame speed
    fn generate_wind(&mut self, prev_pos: Vec2, dt: f32) {
        if self.id != WorldId::Flow || dt <= 0.0 {
            return;
        }
        let per_frame_speed = self.character.pos.distance(prev_pos) / (dt * REFERENCE_HZ);
        let pct = (per_frame_speed / self.tuning.wind_full_speed).min(1.0);
        let t = blend_fraction(self.tuning.smoothing, self.tuning.wind_smoothing, dt);
        self.wind_generated = clamp01(self.wind_generated + (pct - self.wind_generated) * t);
    }

    /// One hint per idle stretch on the glide side
    fn track_inactivity(&mut self, dt: f32) {
        if self.character.steering != Steering::Glide {
            return;
        }
        self.idle_secs += dt;
        if self.idle_secs > HINT_DELAY_SECS && !self.hint_sent {
            self.hint_sent = true;
            self.cues.push(FeedbackCue::InactivityHint);
        }
    }

    /// Heat plate activation, barrier breaks and portal occupancy
    pub fn check_mechanics(&mut self) {
        let pos = self.character.pos;
        for plate in &mut self.heat_plates {
            plate.update(pos, self.tuning.heat_slack);
        }
        for (idx, barrier) in self.barriers.iter_mut().enumerate() {
            if barrier.try_break(self.character.charge) {
                log::debug!("{} barrier {} broken", self.id.as_str(), idx);
                self.cues.push(FeedbackCue::BarrierBroken {
                    world: self.id,
                    barrier: idx,
                });
            }
        }
        self.portal.update(pos);
    }

    /// Current outputs without advancing
    pub fn output(&self) -> WorldOutput {
        let mut heat_links = HeatMap::new();
        for plate in &self.heat_plates {
            let entry = heat_links.entry(plate.link_index).or_insert(0.0);
            *entry = entry.max(plate.intensity());
        }
        WorldOutput {
            world: self.id,
            local_charge: self.character.charge,
            heat_links,
            wind_power: if self.id == WorldId::Flow {
                self.wind_generated
            } else {
                0.0
            },
            portal_occupied: self.portal.occupied,
            position: self.character.pos,
        }
    }

    pub fn drain_cues(&mut self) -> Vec<FeedbackCue> {
        std::mem::take(&mut self.cues)
    }

    pub fn id(&self) -> WorldId {
        self.id
    }

    pub fn character(&self) -> &Character {
        &self.character
    }

    pub fn windmills(&self) -> &[Windmill] {
        &self.windmills
    }

    pub fn bridges(&self) -> &[Bridge] {
        &self.bridges
    }

    pub fn heat_plates(&self) -> &[HeatPlate] {
        &self.heat_plates
    }

    pub fn ice_walls(&self) -> &[IceWall] {
        &self.ice_walls
    }

    pub fn barriers(&self) -> &[Barrier] {
        &self.barriers
    }

    pub fn portal(&self) -> &Portal {
        &self.portal
    }

    pub fn time_dilation(&self) -> f32 {
        self.time_dilation
    }

    /// Wind most recently routed in
    pub fn wind_received(&self) -> f32 {
        self.wind_received
    }

    /// Heat most recently routed in for `link`
    pub fn heat_received(&self, link: u32) -> f32 {
        self.heat_received.get(&link).copied().unwrap_or(0.0)
    }

    /// Test hook: place the character directly
    #[cfg(test)]
    pub(crate) fn character_mut(&mut self) -> &mut Character {
        &mut self.character
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::level::{BarrierSpec, LevelCatalog};

    const FRAME: f32 = 1.0 / 60.0;

    fn level(index: usize) -> LevelData {
        LevelCatalog::builtin().get(index).clone()
    }

    #[test]
    fn test_surge_world_builds_from_level() {
        let world = WorldSimulation::surge(&level(3), &Tuning::default());
        assert_eq!(world.id(), WorldId::Surge);
        assert_eq!(world.windmills().len(), 1);
        assert_eq!(world.bridges().len(), 1);
        assert_eq!(world.heat_plates().len(), 1);
        assert_eq!(world.barriers().len(), 1);
        assert!(world.ice_walls().is_empty());
        assert_eq!(world.character().pos, Vec2::new(90.0, 260.0));
    }

    #[test]
    fn test_wind_extends_linked_bridge() {
        let mut world = WorldSimulation::surge(&level(1), &Tuning::default());
        world.receive(CrossSignal::WindPower(0.8));
        for _ in 0..120 {
            world.tick(FRAME);
        }
        assert!(world.windmills()[0].active);
        assert!(world.bridges()[0].extension() > 0.99);
        let cues = world.drain_cues();
        assert!(cues.contains(&FeedbackCue::BridgeExtended { bridge: 0 }));

        world.receive(CrossSignal::WindPower(0.1));
        for _ in 0..120 {
            world.tick(FRAME);
        }
        assert!(!world.windmills()[0].active);
        assert!(world.bridges()[0].extension() < 0.01);
    }

    #[test]
    fn test_unlinked_bridge_stays_retracted() {
        let mut data = level(1);
        data.bridges[0].link_index = 5;
        let mut world = WorldSimulation::surge(&data, &Tuning::default());
        world.receive(CrossSignal::WindPower(1.0));
        for _ in 0..120 {
            world.tick(FRAME);
        }
        assert!(world.windmills()[0].active);
        assert_eq!(world.bridges()[0].width, 0.0);
    }

    #[test]
    fn test_heat_plate_reported_by_link() {
        let data = level(3);
        let mut world = WorldSimulation::surge(&data, &Tuning::default());
        let out = world.tick(FRAME);
        assert_eq!(out.heat_links.get(&0), Some(&0.0));

        world.character_mut().pos = data.heat_plates[0].position;
        let out = world.tick(FRAME);
        assert_eq!(out.heat_links.get(&0), Some(&1.0));
    }

    #[test]
    fn test_heat_melts_linked_wall_only() {
        let mut data = level(3);
        data.ice_walls.push(crate::sim::level::IceWallSpec {
            position: Vec2::new(50.0, 50.0),
            size: Vec2::new(10.0, 10.0),
            link_index: 1,
            melt_time: 1.0,
            refreeze_rate: None,
        });
        let mut world = WorldSimulation::flow(&data, &Tuning::default());
        world.receive(CrossSignal::HeatMap(HeatMap::from([(0, 1.0)])));
        for _ in 0..60 {
            world.tick(FRAME);
        }
        assert!(world.ice_walls()[0].frozen() < 0.9);
        assert_eq!(world.ice_walls()[1].frozen(), 1.0);
    }

    #[test]
    fn test_gliding_generates_wind() {
        let mut world = WorldSimulation::flow(&level(1), &Tuning::default());
        assert_eq!(world.tick(FRAME).wind_power, 0.0);
        world.steer(Some(Vec2::new(380.0, 120.0)));
        let mut peak: f32 = 0.0;
        for _ in 0..60 {
            let out = world.tick(FRAME);
            assert!((0.0..=1.0).contains(&out.wind_power));
            peak = peak.max(out.wind_power);
        }
        assert!(peak > 0.3);
    }

    #[test]
    fn test_barrier_breaks_on_local_charge() {
        let mut data = level(0);
        data.surge_barriers.push(BarrierSpec {
            position: Vec2::new(300.0, 50.0),
            size: Vec2::new(20.0, 20.0),
            threshold: 0.1,
        });
        let mut world = WorldSimulation::surge(&data, &Tuning::default());
        let start = world.character().pos;
        world.steer(Some(start));
        let mut breaks = 0;
        for _ in 0..120 {
            world.steer(Some(start));
            world.tick(FRAME);
            breaks += world
                .drain_cues()
                .iter()
                .filter(|c| matches!(c, FeedbackCue::BarrierBroken { .. }))
                .count();
        }
        assert!(world.barriers()[0].is_broken());
        assert_eq!(breaks, 1);
    }

    #[test]
    fn test_time_dilation_slows_movement() {
        let data = level(1);
        let mut normal = WorldSimulation::flow(&data, &Tuning::default());
        let mut slowed = WorldSimulation::flow(&data, &Tuning::default());
        slowed.set_time_dilation(0.5);
        let target = Vec2::new(300.0, 120.0);
        normal.steer(Some(target));
        slowed.steer(Some(target));
        for _ in 0..3 {
            normal.tick(FRAME);
            slowed.tick(FRAME);
        }
        let start = data.flow_start;
        assert!(normal.character().pos.distance(start) > slowed.character().pos.distance(start));

        slowed.set_time_dilation(100.0);
        assert_eq!(slowed.time_dilation(), MAX_DILATION);
    }

    #[test]
    fn test_inactivity_hint_once_per_idle_stretch() {
        let mut world = WorldSimulation::flow(&level(1), &Tuning::default());
        let hints = |world: &mut WorldSimulation| {
            world
                .drain_cues()
                .iter()
                .filter(|c| **c == FeedbackCue::InactivityHint)
                .count()
        };

        for _ in 0..(8 * 60 - 10) {
            world.tick(FRAME);
        }
        assert_eq!(hints(&mut world), 0);
        for _ in 0..120 {
            world.tick(FRAME);
        }
        assert_eq!(hints(&mut world), 1);

        world.steer(Some(Vec2::new(200.0, 120.0)));
        for _ in 0..(8 * 60 - 10) {
            world.tick(FRAME);
        }
        assert_eq!(hints(&mut world), 0);
        for _ in 0..120 {
            world.tick(FRAME);
        }
        assert_eq!(hints(&mut world), 1);
    }

    #[test]
    fn test_drag_world_never_hints() {
        let mut world = WorldSimulation::surge(&level(1), &Tuning::default());
        for _ in 0..(20 * 60) {
            world.tick(FRAME);
        }
        assert!(!world.drain_cues().contains(&FeedbackCue::InactivityHint));
    }

    #[test]
    fn test_portal_occupancy() {
        let data = level(0);
        let mut world = WorldSimulation::flow(&data, &Tuning::default());
        assert!(!world.tick(FRAME).portal_occupied);
        world.character_mut().pos = data.flow_portal.position;
        world.character_mut().vel = Vec2::ZERO;
        assert!(world.tick(FRAME).portal_occupied);
    }
}
