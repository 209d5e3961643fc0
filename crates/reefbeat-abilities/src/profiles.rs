//! Archetype-specific ability profiles.
//!
//! Consolidates per-archetype parameters for the ability transition tables.

use reefbeat_core::enums::{AbilityPhase, Archetype};
use reefbeat_core::types::DamageRegion;

/// When an unparried hit interrupts an ability.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitInterrupt {
    Never,
    WhileCharging,
    /// Any non-idle phase.
    Always,
}

impl HitInterrupt {
    pub fn applies(self, phase: AbilityPhase) -> bool {
        match self {
            HitInterrupt::Never => false,
            HitInterrupt::WhileCharging => phase == AbilityPhase::Charging,
            HitInterrupt::Always => phase != AbilityPhase::Idle,
        }
    }
}

/// Ability profile for an archetype.
#[derive(Debug, Clone, Copy)]
pub struct AbilityProfile {
    /// Cap on level, charge or speed. Zero for archetypes without one.
    pub max_level: u8,
    pub hit_interrupt: HitInterrupt,
    /// Whether the archetype has a secondary action (deflate, parry).
    pub has_secondary: bool,
}

pub fn get_profile(archetype: Archetype) -> AbilityProfile {
    use reefbeat_core::constants::*;

    match archetype {
        Archetype::DashAttacker => AbilityProfile {
            max_level: 0,
            hit_interrupt: HitInterrupt::Never,
            has_secondary: false,
        },
        Archetype::InflateAttacker => AbilityProfile {
            max_level: INFLATE_RADII.len() as u8,
            hit_interrupt: HitInterrupt::Always,
            has_secondary: true,
        },
        Archetype::ChargeDasher => AbilityProfile {
            max_level: CHARGE_DAMAGES.len() as u8,
            hit_interrupt: HitInterrupt::WhileCharging,
            has_secondary: false,
        },
        Archetype::SpeedParrier => AbilityProfile {
            max_level: MAX_SPEED_LEVEL,
            hit_interrupt: HitInterrupt::Always,
            has_secondary: true,
        },
    }
}

/// Index into a per-level table; level 0 reads the first entry.
fn level_index(level: u8, len: usize) -> usize {
    (level.max(1) as usize - 1).min(len - 1)
}

/// Bite cone of the dash-attacker.
pub fn bite_region() -> DamageRegion {
    use reefbeat_core::constants::*;
    DamageRegion::Cone {
        range: DASH_ATTACKER_RANGE,
        half_angle_deg: DASH_ATTACKER_ARC_DEG / 2.0,
    }
}

pub fn inflate_region(level: u8) -> DamageRegion {
    use reefbeat_core::constants::INFLATE_RADII;
    DamageRegion::Circle {
        radius: INFLATE_RADII[level_index(level, INFLATE_RADII.len())],
    }
}

pub fn deflate_distance(level: u8) -> f32 {
    use reefbeat_core::constants::DEFLATE_DISTANCES;
    DEFLATE_DISTANCES[level_index(level, DEFLATE_DISTANCES.len())]
}

pub fn charge_damage(level: u8) -> u32 {
    use reefbeat_core::constants::CHARGE_DAMAGES;
    CHARGE_DAMAGES[level_index(level, CHARGE_DAMAGES.len())]
}

pub fn charge_distance(level: u8) -> f32 {
    use reefbeat_core::constants::CHARGE_DISTANCES;
    CHARGE_DISTANCES[level_index(level, CHARGE_DISTANCES.len())]
}

pub fn sweep_region() -> DamageRegion {
    DamageRegion::Circle {
        radius: reefbeat_core::constants::CHARGE_SWEEP_RADIUS,
    }
}

pub fn nose_region() -> DamageRegion {
    DamageRegion::Circle {
        radius: reefbeat_core::constants::NOSE_RADIUS,
    }
}

/// Distance moved per activation at the given speed.
pub fn speed_move_distance(speed: u8) -> f32 {
    use reefbeat_core::constants::{MAX_SPEED_LEVEL, SPEED_MOVE_DISTANCE};
    SPEED_MOVE_DISTANCE * speed.min(MAX_SPEED_LEVEL) as f32 / MAX_SPEED_LEVEL as f32
}
