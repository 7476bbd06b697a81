//! Events emitted by the core for the feedback layer and progression

use serde::{Deserialize, Serialize};

/// Which of the two linked worlds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WorldId {
    /// Dragged character, charge is `surge`
    Surge,
    /// Gliding character, charge is `flow`
    Flow,
}

impl WorldId {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorldId::Surge => "surge",
            WorldId::Flow => "flow",
        }
    }
}

/// One-shot haptic/visual cues
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FeedbackCue {
    BarrierBroken { world: WorldId, barrier: usize },
    BridgeExtended { bridge: usize },
    ChargeFull { world: WorldId },
    ProximityTear,
    /// The flow character has gone unsteered long enough to show a hint
    InactivityHint,
    Win,
}

/// Level completion, sent once the win delay has elapsed
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WinEvent {
    pub level_index: usize,
    /// Game time from level start to completion
    pub elapsed_secs: f32,
}

impl WinEvent {
    pub fn whole_seconds(&self) -> u32 {
        self.elapsed_secs.max(0.0).floor() as u32
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    Cue(FeedbackCue),
    LevelComplete(WinEvent),
}
