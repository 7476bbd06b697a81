//! Frame delta capping and elapsed game time

use crate::consts::MAX_FRAME_DT;

/// Turns raw frame elapsed time into a bounded simulation delta
#[derive(Debug, Clone, Default)]
pub struct SessionClock {
    elapsed: f32,
    frames: u64,
}

impl SessionClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Capped delta for this frame. Hitches (debugger pauses, backgrounding)
    /// never advance more than `MAX_FRAME_DT`; garbage input advances nothing.
    pub fn next_delta(&mut self, raw_elapsed: f32) -> f32 {
        let dt = if raw_elapsed.is_finite() && raw_elapsed > 0.0 {
            raw_elapsed.min(MAX_FRAME_DT)
        } else {
            0.0
        };
        self.elapsed += dt;
        self.frames += 1;
        dt
    }

    /// Seconds of game time since the last reset
    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// `MM:SS` for the HUD
    pub fn timer_string(&self) -> String {
        let t = self.elapsed.floor() as u64;
        format!("{:02}:{:02}", t / 60, t % 60)
    }

    pub fn reset(&mut self) {
        self.elapsed = 0.0;
        self.frames = 0;
    }
}
