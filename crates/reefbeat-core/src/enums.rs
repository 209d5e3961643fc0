//! Enumeration types used throughout the session.

use serde::{Deserialize, Serialize};

/// Playable fish archetype. Every archetype shares one ability record;
/// the tag selects its transition table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Archetype {
    /// Piranha: on-beat short dash with a brief bite window.
    #[default]
    DashAttacker,
    /// Pufferfish: stacking inflate levels, deflate into an escape dash.
    InflateAttacker,
    /// Tuna: hold to charge across beats, release into a sweeping dash.
    ChargeDasher,
    /// Swordfish: build speed on beat, parry at full speed, counter next beat.
    SpeedParrier,
}

/// Outcome of judging an input instant against the beat grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Verdict {
    OnTime,
    Missed,
}

/// Ability phase shared by all archetypes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum AbilityPhase {
    #[default]
    Idle,
    /// Actively attacking (dash bite, inflated, or moving at speed).
    Attacking,
    /// Holding a charge.
    Charging,
    /// Committed displacement dash.
    Dashing,
    /// Parry window open.
    Parrying,
    /// Executing a queued counter-attack.
    CounterAttacking,
    /// Recovering; activations are ignored.
    OnCooldown,
}

/// Which side a fish fights for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Faction {
    #[default]
    Player,
    Enemy,
}

impl Faction {
    pub fn bit(self) -> u8 {
        match self {
            Faction::Player => 0b01,
            Faction::Enemy => 0b10,
        }
    }

    /// The faction this one attacks by default.
    pub fn opponent(self) -> Faction {
        match self {
            Faction::Player => Faction::Enemy,
            Faction::Enemy => Faction::Player,
        }
    }
}

/// Timed sub-beat behaviours that run off the deadline scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeadlineKind {
    /// Dash-attacker bite window closes.
    DamageWindowClose,
    /// Post-attack recovery ends at the next beat's early window.
    CooldownEnd,
    /// Inflate level check after the following beat's late window.
    LevelDecay,
    /// A charge held too long fizzles.
    ChargeExpiry,
    /// Displacement dash (deflate or charged) ends.
    DashEnd,
    /// Parry window closes without a hit.
    ParryEnd,
    /// Counter-attack lunge ends.
    CounterEnd,
}

/// Why an ability trigger was ignored. Expected under rapid input; never an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RejectReason {
    /// The ability is in a non-interruptible busy phase.
    Busy,
    /// A primary activation was already honoured for this beat.
    SameBeat,
    /// Level is already at the archetype maximum.
    AtMaxLevel,
    /// Deflate attempted with nothing to deflate.
    NoLevel,
    /// Parry attempted below max speed or during its cooldown.
    NotEligible,
    /// Release with no charge in progress.
    NotCharging,
    /// The archetype has no such action.
    Unsupported,
}

/// Why the combat gate refused a damage attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RejectedDamage {
    SelfHit,
    WrongFaction,
    Invincible,
    AlreadyDead,
    MissingTarget,
}

/// Session phase (top-level state).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    #[default]
    Ready,
    Playing,
    Paused,
    /// The player died; waiting for the game-state collaborator to restart.
    GameOver,
}
