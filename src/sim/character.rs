//! Player characters
//!
//! Both characters share the same spring integration; they differ in how the
//! player steers them. The surge character follows a held drag, the flow
//! character glides toward the last tapped point until it arrives.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::smooth::damping_factor;
use crate::clamp01;
use crate::consts::REFERENCE_HZ;
use crate::tuning::{CharacterTuning, SmoothingMode};

/// How the player steers a character
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Steering {
    /// Follow a held pointer; the drag must start near the character
    Drag,
    /// Glide toward the last target, dropping it on arrival
    Glide,
}

/// A character and its accumulated charge
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Character {
    pub pos: Vec2,
    pub vel: Vec2,
    /// Surge or flow, always in [0, 1]
    pub charge: f32,
    pub steering: Steering,
    target: Option<Vec2>,
    dragging: bool,
}

impl Character {
    pub fn new(pos: Vec2, steering: Steering) -> Self {
        Self {
            pos,
            vel: Vec2::ZERO,
            charge: 0.0,
            steering,
            target: None,
            dragging: false,
        }
    }

    pub fn target(&self) -> Option<Vec2> {
        self.target
    }

    /// True while the player is actively steering this tick
    pub fn is_steering(&self) -> bool {
        match self.steering {
            Steering::Drag => self.dragging,
            Steering::Glide => self.target.is_some(),
        }
    }

    /// Feed the pointer state for a drag-steered character.
    /// `None` releases the drag.
    pub fn drag(&mut self, pointer: Option<Vec2>, grab_radius: f32) {
        match pointer {
            Some(point) => {
                if !self.dragging && point.distance(self.pos) < grab_radius {
                    self.dragging = true;
                }
                if self.dragging {
                    self.target = Some(point);
                }
            }
            None => {
                self.dragging = false;
            }
        }
    }

    /// Set a new glide target
    pub fn glide_to(&mut self, point: Vec2) {
        self.target = Some(point);
    }

    /// Integrate movement and charge for one (already dilated) tick.
    /// Returns true on the tick the charge first reaches full.
    pub fn step(&mut self, dt: f32, tuning: &CharacterTuning, mode: SmoothingMode) -> bool {
        if self.steering == Steering::Glide {
            if let Some(target) = self.target {
                if target.distance(self.pos) <= tuning.arrival_radius {
                    self.target = None;
                }
            }
        }

        // A released drag keeps coasting toward its last point
        if let Some(target) = self.target {
            self.vel += (target - self.pos) * dt * tuning.acceleration;
        }
        self.pos += self.vel * dt * REFERENCE_HZ;
        self.vel *= damping_factor(mode, tuning.damping, dt);

        let before = self.charge;
        let delta = if self.is_steering() {
            tuning.charge_rate
        } else {
            -tuning.discharge_rate
        };
        self.charge = clamp01(self.charge + delta * dt * REFERENCE_HZ);
        before < 1.0 && self.charge >= 1.0
    }
}
