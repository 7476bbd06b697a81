//! Errors raised while loading level and tuning data
//!
//! The simulation itself never fails; only untrusted input coming in from
//! JSON can be rejected.

/// Result alias for level loading
pub type LevelResult<T> = Result<T, LevelError>;

/// Level data rejected at load time
#[derive(Debug, thiserror::Error)]
pub enum LevelError {
    #[error("failed to parse level JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("level {level}: {what} has invalid geometry ({detail})")]
    InvalidGeometry {
        level: usize,
        what: String,
        detail: String,
    },

    #[error("level {level}: ice wall {wall} has non-positive melt time {melt_time}")]
    InvalidMeltTime {
        level: usize,
        wall: usize,
        melt_time: f32,
    },
}

/// Tuning data rejected at load time
#[derive(Debug, thiserror::Error)]
pub enum TuningError {
    #[error("failed to parse tuning JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("tuning value `{name}` out of range: {value}")]
    OutOfRange { name: &'static str, value: f32 },
}
