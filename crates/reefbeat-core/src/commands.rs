//! Player commands sent from the input layer to the session.
//!
//! Commands carry no timing interpretation of their own: they are queued and
//! judged against the beat grid at the next tick boundary.

use serde::{Deserialize, Serialize};

use crate::enums::*;

/// All possible player actions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum PlayerCommand {
    // --- Rhythm input ---
    /// Primary action key went down.
    Press,
    /// Primary action key went up.
    Release,
    /// Secondary action (deflate, parry).
    Secondary,
    /// Point the player fish toward a world-space position.
    Aim { x: f32, y: f32 },

    // --- Session control ---
    /// Choose the archetype the player spawns as on the next restart.
    SelectArchetype { archetype: Archetype },
    /// Begin playing from the Ready phase.
    Start,
    Pause,
    Resume,
    /// Tear down the world and respawn from the config.
    Restart,
}
