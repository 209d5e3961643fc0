//! Session configuration.
//!
//! Every field has a default so a partial JSON document is a valid config.
//! `validate()` is the single place setup errors are detected.

use serde::{Deserialize, Serialize};

use crate::constants::*;
use crate::enums::Archetype;
use crate::error::ConfigError;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub bpm: f64,
    /// Song time of beat 0 (seconds).
    pub first_beat_offset_secs: f64,
    /// Half-width of the on-time window (seconds).
    pub input_threshold_secs: f64,
    pub beats_per_measure: u32,
    pub max_health: u32,
    pub kill_heal: u32,
    pub player_archetype: Archetype,
    /// Spawn the player fish when the session starts.
    pub spawn_player: bool,
    /// Subscribe the combo tracker to beat events.
    pub track_combo: bool,
    pub enemy_attack_cooldown_beats: u32,
    /// Enemies placed when the session starts or restarts.
    pub enemies: Vec<EnemySpawn>,
}

/// One enemy placement handed over by the spawn collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnemySpawn {
    pub archetype: Archetype,
    pub x: f32,
    pub y: f32,
    #[serde(default = "default_attack_every_beat")]
    pub attack_every_beat: bool,
}

fn default_attack_every_beat() -> bool {
    true
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            bpm: DEFAULT_BPM,
            first_beat_offset_secs: 0.0,
            input_threshold_secs: DEFAULT_INPUT_THRESHOLD_SECS,
            beats_per_measure: DEFAULT_BEATS_PER_MEASURE,
            max_health: DEFAULT_MAX_HEALTH,
            kill_heal: KILL_HEAL,
            player_archetype: Archetype::default(),
            spawn_player: true,
            track_combo: true,
            enemy_attack_cooldown_beats: ENEMY_ATTACK_COOLDOWN_BEATS,
            enemies: Vec::new(),
        }
    }
}

impl SessionConfig {
    /// Parse and validate a JSON config document.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: SessionConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn seconds_per_beat(&self) -> f64 {
        60.0 / self.bpm
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.bpm.is_finite() || self.bpm <= 0.0 {
            return Err(ConfigError::InvalidBpm(self.bpm));
        }
        if !self.first_beat_offset_secs.is_finite() {
            return Err(ConfigError::InvalidOffset(self.first_beat_offset_secs));
        }
        let half_beat_secs = self.seconds_per_beat() / 2.0;
        if !self.input_threshold_secs.is_finite()
            || self.input_threshold_secs < 0.0
            || self.input_threshold_secs >= half_beat_secs
        {
            return Err(ConfigError::InvalidInputThreshold {
                threshold_secs: self.input_threshold_secs,
                half_beat_secs,
            });
        }
        if self.beats_per_measure == 0 {
            return Err(ConfigError::ZeroBeatsPerMeasure);
        }
        if self.max_health == 0 {
            return Err(ConfigError::ZeroMaxHealth);
        }
        Ok(())
    }
}
