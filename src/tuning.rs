//! Data-driven game balance
//!
//! Every value defaults to the authored feel. A tuning file only needs to name
//! the fields it overrides:
//!
//! ```json
//! { "smoothing": "per_call", "windmill_threshold": 0.4 }
//! ```

use serde::{Deserialize, Serialize};

use crate::error::TuningError;

/// How per-tick smoothing coefficients are applied
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SmoothingMode {
    /// Coefficient applied once per tick regardless of dt (frame-rate dependent)
    PerCall,
    /// Coefficient converted to `1 - exp(-k * dt)`, matching `PerCall` at 60 Hz
    #[default]
    TimeBased,
}

/// Movement and charge tuning for one character
///
/// Overriding a character replaces the whole block; there is no per-field merge
/// because the two characters have different defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CharacterTuning {
    /// Spring pull toward the target
    pub acceleration: f32,
    /// Velocity retained per reference frame
    pub damping: f32,
    /// Charge gained per reference frame while the player steers
    pub charge_rate: f32,
    /// Charge lost per reference frame otherwise
    pub discharge_rate: f32,
    /// A drag only starts when the pointer lands this close (surge world)
    pub grab_radius: f32,
    /// Glide target is dropped once within this distance (flow world)
    pub arrival_radius: f32,
}

impl CharacterTuning {
    /// Dragged character of the surge world
    pub fn surge() -> Self {
        Self {
            acceleration: 8.0,
            damping: 0.9,
            charge_rate: 0.0035,
            discharge_rate: 0.0012,
            grab_radius: 50.0,
            arrival_radius: 0.0,
        }
    }

    /// Gliding character of the flow world
    pub fn flow() -> Self {
        Self {
            acceleration: 6.0,
            damping: 0.92,
            charge_rate: 0.004,
            discharge_rate: 0.0015,
            grab_radius: 0.0,
            arrival_radius: 10.0,
        }
    }
}

/// Complete balance table for a session
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    pub smoothing: SmoothingMode,
    /// HUD surge/flow lerp per 60 Hz tick
    pub hud_smoothing: f32,

    pub surge_character: CharacterTuning,
    pub flow_character: CharacterTuning,

    /// Wind power a windmill needs to spin when the level gives no threshold
    pub windmill_threshold: f32,
    /// Windmill rotation per reference frame while active (radians)
    pub windmill_spin: f32,
    /// Bridge width easing rate (per second, capped at 1 per tick)
    pub bridge_extend_rate: f32,
    /// Width at which an extending bridge emits its cue
    pub bridge_cue_width: f32,
    /// Extra reach added to every heat plate radius
    pub heat_slack: f32,
    /// Ice regrowth per second when no heat reaches a wall
    pub ice_refreeze_rate: f32,
    /// Ice opacity lerp per 60 Hz tick
    pub ice_smoothing: f32,
    /// Per-frame speed that produces full wind
    pub wind_full_speed: f32,
    /// Wind accumulator lerp per 60 Hz tick
    pub wind_smoothing: f32,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            smoothing: SmoothingMode::TimeBased,
            hud_smoothing: 0.12,
            surge_character: CharacterTuning::surge(),
            flow_character: CharacterTuning::flow(),
            windmill_threshold: 0.3,
            windmill_spin: 0.1,
            bridge_extend_rate: 6.0,
            bridge_cue_width: 10.0,
            heat_slack: 7.0,
            ice_refreeze_rate: 0.12,
            ice_smoothing: 0.15,
            wind_full_speed: 8.0,
            wind_smoothing: 0.08,
        }
    }
}

impl Tuning {
    /// Parse tuning overrides from JSON and validate them
    pub fn from_json(json: &str) -> Result<Self, TuningError> {
        let tuning: Tuning = serde_json::from_str(json)?;
        tuning.validate()?;
        Ok(tuning)
    }

    /// Reject values that would break the [0, 1] invariants or blow up integration
    pub fn validate(&self) -> Result<(), TuningError> {
        let fractions = [
            ("hud_smoothing", self.hud_smoothing),
            ("ice_smoothing", self.ice_smoothing),
            ("wind_smoothing", self.wind_smoothing),
            ("windmill_threshold", self.windmill_threshold),
            ("surge_character.damping", self.surge_character.damping),
            ("flow_character.damping", self.flow_character.damping),
        ];
        for (name, value) in fractions {
            if !(0.0..=1.0).contains(&value) {
                return Err(TuningError::OutOfRange { name, value });
            }
        }

        let non_negative = [
            ("bridge_extend_rate", self.bridge_extend_rate),
            ("bridge_cue_width", self.bridge_cue_width),
            ("heat_slack", self.heat_slack),
            ("ice_refreeze_rate", self.ice_refreeze_rate),
            ("windmill_spin", self.windmill_spin),
            ("surge_character.acceleration", self.surge_character.acceleration),
            ("surge_character.charge_rate", self.surge_character.charge_rate),
            ("surge_character.discharge_rate", self.surge_character.discharge_rate),
            ("flow_character.acceleration", self.flow_character.acceleration),
            ("flow_character.charge_rate", self.flow_character.charge_rate),
            ("flow_character.discharge_rate", self.flow_character.discharge_rate),
        ];
        for (name, value) in non_negative {
            if !value.is_finite() || value < 0.0 {
                return Err(TuningError::OutOfRange { name, value });
            }
        }

        if !self.wind_full_speed.is_finite() || self.wind_full_speed <= 0.0 {
            return Err(TuningError::OutOfRange {
                name: "wind_full_speed",
                value: self.wind_full_speed,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(Tuning::default().validate().is_ok());
    }

    #[test]
    fn test_partial_override() {
        let tuning =
            Tuning::from_json(r#"{ "smoothing": "per_call", "windmill_threshold": 0.4 }"#).unwrap();
        assert_eq!(tuning.smoothing, SmoothingMode::PerCall);
        assert!((tuning.windmill_threshold - 0.4).abs() < 1e-6);
        // Untouched fields keep their defaults
        assert!((tuning.hud_smoothing - 0.12).abs() < 1e-6);
        assert!((tuning.flow_character.damping - 0.92).abs() < 1e-6);
        assert!((tuning.surge_character.damping - 0.9).abs() < 1e-6);
    }

    #[test]
    fn test_character_block_override() {
        let json = r#"{ "flow_character": {
            "acceleration": 4.0, "damping": 0.8, "charge_rate": 0.01,
            "discharge_rate": 0.002, "grab_radius": 0.0, "arrival_radius": 12.0
        } }"#;
        let tuning = Tuning::from_json(json).unwrap();
        assert!((tuning.flow_character.arrival_radius - 12.0).abs() < 1e-6);
        assert!((tuning.surge_character.acceleration - 8.0).abs() < 1e-6);
    }

    #[test]
    fn test_rejects_out_of_range() {
        let err = Tuning::from_json(r#"{ "hud_smoothing": 1.5 }"#).unwrap_err();
        assert!(matches!(
            err,
            TuningError::OutOfRange {
                name: "hud_smoothing",
                ..
            }
        ));
    }

    #[test]
    fn test_rejects_bad_json() {
        assert!(matches!(
            Tuning::from_json("{ not json"),
            Err(TuningError::Parse(_))
        ));
    }
}
