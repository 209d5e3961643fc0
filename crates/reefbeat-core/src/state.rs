//! Session snapshot: the complete visible state handed to presentation each tick.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::enums::*;
use crate::events::{PresentationEvent, SessionEvent};
use crate::types::{ActorId, SimTime};

/// Complete session state produced after each tick.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub time: SimTime,
    pub phase: GamePhase,
    pub beat: BeatView,
    pub punished: bool,
    pub combo: ComboView,
    pub actors: Vec<ActorView>,
    pub presentation: Vec<PresentationEvent>,
    pub session_events: Vec<SessionEvent>,
    pub kills: u32,
}

/// Position on the beat grid.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct BeatView {
    pub song_position_beats: f64,
    pub last_emitted_beat: i64,
    pub measure: i64,
    pub beat_in_measure: u32,
    pub time_to_next_beat_secs: f64,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct ComboView {
    pub current: u32,
    pub best: u32,
    pub beats_into_measure: u32,
    pub kills_this_measure: u32,
}

/// One fish as seen by presentation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActorView {
    pub id: ActorId,
    pub archetype: Archetype,
    pub faction: Faction,
    pub is_player: bool,
    pub position: Vec2,
    pub facing: Vec2,
    pub health: u32,
    pub max_health: u32,
    pub invincible: bool,
    pub phase: AbilityPhase,
    pub beats_in_phase: u32,
    /// Song time the current timed phase (dash, parry, cooldown) ends at.
    pub phase_ends_at_secs: Option<f64>,
    pub level: u8,
    pub damage_window_open: bool,
}
