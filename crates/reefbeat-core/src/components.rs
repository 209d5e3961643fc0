//! ECS components for hecs entities.
//!
//! Components are plain data structs. Game logic lives in the ability
//! transition functions and the session systems, not here.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::enums::*;
use crate::types::{ActorId, FactionMask};

/// Identity of a fish.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Actor {
    pub id: ActorId,
    pub archetype: Archetype,
}

/// World-space position.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position(pub Vec2);

/// Unit direction attacks and dashes are aimed along.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Facing(pub Vec2);

impl Default for Facing {
    fn default() -> Self {
        Facing(Vec2::X)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Health {
    pub current: u32,
    pub max: u32,
}

impl Health {
    pub fn full(max: u32) -> Self {
        Self { current: max, max }
    }

    pub fn is_dead(&self) -> bool {
        self.current == 0
    }
}

/// Damage immunity. Two independent holders: hit recovery counted in beats,
/// and an ability (deflate dash, counter-attack) holding it for its duration.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Invincibility {
    pub beats_remaining: u32,
    pub held_by_ability: bool,
}

impl Invincibility {
    pub fn is_active(&self) -> bool {
        self.beats_remaining > 0 || self.held_by_ability
    }
}

/// Combat allegiance: who this fish is and who it may hurt.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Combatant {
    pub faction: Faction,
    pub target_mask: FactionMask,
    pub is_player: bool,
}

/// Shared ability record. Every archetype uses the same fields; the archetype
/// tag selects which transition table interprets them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AbilityState {
    pub archetype: Archetype,
    pub phase: AbilityPhase,
    /// Inflate level, charge level or speed, depending on archetype.
    pub level: u8,
    /// Beat of the last honoured primary activation.
    pub last_action_beat: Option<i64>,
    /// Beat of the last activation that sustains the level (inflate, speed).
    pub last_activation_beat: Option<i64>,
    /// Activation beat before `last_activation_beat`. An early press is
    /// recorded before its beat is crossed, so decay looks one further back.
    pub previous_activation_beat: Option<i64>,
    /// Beat the current charge started on.
    pub charge_started_beat: Option<i64>,
    /// Beats until a parry may be attempted again.
    pub cooldown_beats: u32,
    /// Whole beats spent in the current phase.
    pub beats_in_phase: u32,
    pub damage_window_open: bool,
    /// Counter-attack queued by a successful parry, executed on the next beat.
    pub counter_target: Option<ActorId>,
    /// Song time the current timed phase ends at.
    pub phase_ends_at_secs: Option<f64>,
    /// Bumped on every forced reset; deadlines from older epochs are stale.
    pub epoch: u32,
}

impl AbilityState {
    pub fn new(archetype: Archetype) -> Self {
        Self {
            archetype,
            phase: AbilityPhase::Idle,
            level: 0,
            last_action_beat: None,
            last_activation_beat: None,
            previous_activation_beat: None,
            charge_started_beat: None,
            cooldown_beats: 0,
            beats_in_phase: 0,
            damage_window_open: false,
            counter_target: None,
            phase_ends_at_secs: None,
            epoch: 0,
        }
    }
}

/// Beat-driven enemy controller: aim on one beat, attack on the next.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct EnemyBrain {
    /// Direction recorded on the preparing beat.
    pub prepared_aim: Option<Vec2>,
    pub attack_every_beat: bool,
    pub cooldown_beats: u32,
    pub cooldown_remaining: u32,
    /// Charge-dasher enemies alternate press and release.
    pub holding: bool,
}

impl EnemyBrain {
    pub fn new(attack_every_beat: bool, cooldown_beats: u32) -> Self {
        Self {
            prepared_aim: None,
            attack_every_beat,
            cooldown_beats,
            cooldown_remaining: 0,
            holding: false,
        }
    }
}
