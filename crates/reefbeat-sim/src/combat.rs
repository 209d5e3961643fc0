//! Damage gate: the only place health goes down.

use hecs::{Entity, World};

use reefbeat_core::components::{AbilityState, Combatant, Health, Invincibility};
use reefbeat_core::constants::PLAYER_HIT_INVINCIBLE_BEATS;
use reefbeat_core::enums::{AbilityPhase, RejectedDamage};

/// Result of one damage attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DamageOutcome {
    Applied {
        remaining: u32,
        /// This hit took the target from alive to dead.
        killed: bool,
        /// Player hit recovery started.
        hit_invincibility: bool,
    },
    /// Negated by an open parry; the target's ability should be told.
    Parried,
    Rejected(RejectedDamage),
}

impl DamageOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, DamageOutcome::Applied { .. })
    }
}

/// Try to damage `target` on behalf of `attacker`.
///
/// A kill heals the attacker by `kill_heal`, capped at its max health. A dead
/// target rejects further damage, so a death is reported exactly once.
pub fn try_damage(
    world: &mut World,
    attacker: Entity,
    target: Entity,
    amount: u32,
    kill_heal: u32,
) -> DamageOutcome {
    if attacker == target {
        return DamageOutcome::Rejected(RejectedDamage::SelfHit);
    }

    let Ok(target_side) = world.get::<&Combatant>(target).map(|c| *c) else {
        return DamageOutcome::Rejected(RejectedDamage::MissingTarget);
    };
    let Ok(mask) = world.get::<&Combatant>(attacker).map(|c| c.target_mask) else {
        return DamageOutcome::Rejected(RejectedDamage::MissingTarget);
    };
    if !mask.contains(target_side.faction) {
        return DamageOutcome::Rejected(RejectedDamage::WrongFaction);
    }

    match world.get::<&Health>(target) {
        Ok(health) if health.is_dead() => {
            return DamageOutcome::Rejected(RejectedDamage::AlreadyDead)
        }
        Ok(_) => {}
        Err(_) => return DamageOutcome::Rejected(RejectedDamage::MissingTarget),
    }

    let invincible = world
        .get::<&Invincibility>(target)
        .map(|inv| inv.is_active())
        .unwrap_or(false);
    if invincible {
        return DamageOutcome::Rejected(RejectedDamage::Invincible);
    }

    let parrying = world
        .get::<&AbilityState>(target)
        .map(|ability| ability.phase == AbilityPhase::Parrying)
        .unwrap_or(false);
    if parrying {
        return DamageOutcome::Parried;
    }

    let remaining = match world.get::<&mut Health>(target) {
        Ok(mut health) => {
            health.current = health.current.saturating_sub(amount);
            health.current
        }
        Err(_) => return DamageOutcome::Rejected(RejectedDamage::MissingTarget),
    };
    let killed = remaining == 0;

    let mut hit_invincibility = false;
    if killed {
        if let Ok(mut health) = world.get::<&mut Health>(attacker) {
            health.current = (health.current + kill_heal).min(health.max);
        }
    } else if target_side.is_player {
        if let Ok(mut inv) = world.get::<&mut Invincibility>(target) {
            inv.beats_remaining = PLAYER_HIT_INVINCIBLE_BEATS;
            hit_invincibility = true;
        }
    }

    DamageOutcome::Applied {
        remaining,
        killed,
        hit_invincibility,
    }
}
