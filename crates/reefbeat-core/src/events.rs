//! Events emitted by the session for presentation and for external collaborators.

use serde::{Deserialize, Serialize};

use crate::enums::*;
use crate::types::ActorId;

/// Cues for the presentation sink (animation, sprites, sound).
/// Presentation never queries logic state; it only consumes these.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Cue {
    /// An integer beat was crossed.
    BeatPulse { beat: i64 },
    /// A player input was judged.
    InputFeedback { verdict: Verdict, error_secs: f64 },
    /// A player input arrived while punished and was dropped.
    InputBlocked,
    /// Dash-attacker bite started.
    EnterAttacking,
    Inflate { level: u8 },
    Deflate { level: u8 },
    ChargeStarted,
    ChargeLevel { level: u8 },
    ChargedDash { level: u8 },
    /// Charge released off-beat, interrupted, or held too long.
    ChargeCancelled,
    DashStarted { distance: f32 },
    ParryStarted,
    ParryDeflected { attacker: ActorId },
    CounterAttack { target: ActorId },
    SpeedChanged { speed: u8 },
    /// Accumulated level dropped back to zero.
    LevelReset,
    InvincibilityChanged { invincible: bool },
    Damaged { amount: u32, remaining: u32 },
    Died,
    ReturnIdle,
}

/// A cue, tagged with the fish it belongs to (`None` for global cues).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PresentationEvent {
    pub actor: Option<ActorId>,
    pub cue: Cue,
}

impl PresentationEvent {
    pub fn global(cue: Cue) -> Self {
        Self { actor: None, cue }
    }

    pub fn for_actor(actor: ActorId, cue: Cue) -> Self {
        Self {
            actor: Some(actor),
            cue,
        }
    }
}

/// Requests and notifications for the game-state and pooling collaborators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SessionEvent {
    /// The player died; the game-state owner should restart the track.
    RestartRequested,
    /// A non-player fish died; the pool should reclaim it.
    DespawnRequested { actor: ActorId },
    Kill { attacker: ActorId, target: ActorId },
    ComboExtended { combo: u32 },
    ComboBroken { lost: u32 },
}
