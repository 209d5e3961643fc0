//! Fundamental geometric and simulation types.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::enums::Faction;

/// Stable identifier of a fish, handed to presentation and pooling collaborators.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ActorId(pub u32);

/// Simulation time tracking.
///
/// `song_secs` mirrors the audio position the last tick was driven with;
/// it is not integrated from `dt`, so the session never drifts from the music.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SimTime {
    /// Current tick number (increments by 1 each tick).
    pub tick: u64,
    /// Audio position at this tick (seconds).
    pub song_secs: f64,
}

impl SimTime {
    /// Advance by one tick to the given audio position.
    pub fn advance_to(&mut self, song_secs: f64) {
        self.tick += 1;
        self.song_secs = song_secs;
    }
}

/// Set of factions an attacker is allowed to damage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FactionMask(pub u8);

impl FactionMask {
    pub const NONE: FactionMask = FactionMask(0);

    pub fn only(faction: Faction) -> Self {
        Self(faction.bit())
    }

    pub fn with(self, faction: Faction) -> Self {
        Self(self.0 | faction.bit())
    }

    pub fn contains(&self, faction: Faction) -> bool {
        self.0 & faction.bit() != 0
    }
}

/// Shape of an attack, anchored at the attacker's position and facing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "shape")]
pub enum DamageRegion {
    /// Everything within `radius`.
    Circle { radius: f32 },
    /// Everything within `range` and no more than `half_angle_deg` off the facing.
    Cone { range: f32, half_angle_deg: f32 },
}

impl DamageRegion {
    /// Whether a point lies inside the region.
    pub fn contains(&self, origin: Vec2, facing: Vec2, point: Vec2) -> bool {
        let offset = point - origin;
        match *self {
            DamageRegion::Circle { radius } => offset.length_squared() <= radius * radius,
            DamageRegion::Cone {
                range,
                half_angle_deg,
            } => {
                if offset.length_squared() > range * range {
                    return false;
                }
                // A target sitting on the origin is always hit.
                if offset.length_squared() <= f32::EPSILON {
                    return true;
                }
                let facing = if facing.length_squared() > f32::EPSILON {
                    facing.normalize()
                } else {
                    Vec2::X
                };
                let cos = facing.dot(offset.normalize()).clamp(-1.0, 1.0);
                cos.acos().to_degrees() <= half_angle_deg
            }
        }
    }
}
