//! Setup-time configuration errors. Everything that can go wrong at runtime
//! (misses, rejected transitions, blocked damage) is a value, not an error.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("bpm must be positive and finite, got {0}")]
    InvalidBpm(f64),
    #[error("first beat offset must be finite, got {0}")]
    InvalidOffset(f64),
    #[error("input threshold must be in [0, {half_beat_secs}) seconds, got {threshold_secs}")]
    InvalidInputThreshold {
        threshold_secs: f64,
        half_beat_secs: f64,
    },
    #[error("beats per measure must be at least 1")]
    ZeroBeatsPerMeasure,
    #[error("max health must be at least 1")]
    ZeroMaxHealth,
    #[error("no beat listeners are subscribed")]
    NoListeners,
    #[error("invalid session config: {0}")]
    Json(#[from] serde_json::Error),
}
