//! Beat-driven enemy controller.
//!
//! On one beat an enemy records the direction toward the player; on the next
//! it attacks along that recorded direction, so the player always gets a
//! beat of warning. Enemy activations land exactly on the beat and are never
//! judged or punished.

use glam::Vec2;

use reefbeat_core::components::EnemyBrain;
use reefbeat_core::enums::{AbilityPhase, Archetype, Verdict};

use crate::fsm::Trigger;

/// What the brain sees on a beat.
#[derive(Debug, Clone, Copy)]
pub struct BrainContext {
    pub archetype: Archetype,
    pub position: Vec2,
    pub player_position: Option<Vec2>,
    pub ability_phase: AbilityPhase,
    pub ability_level: u8,
}

/// Output of one brain step.
#[derive(Debug, Clone, Copy)]
pub struct BrainUpdate {
    pub brain: EnemyBrain,
    /// New facing, if the brain turned.
    pub facing: Option<Vec2>,
    /// Ability trigger to fire this beat.
    pub trigger: Option<Trigger>,
}

fn aim_at(from: Vec2, to: Vec2) -> Vec2 {
    let dir = (to - from).normalize_or_zero();
    if dir == Vec2::ZERO {
        Vec2::X
    } else {
        dir
    }
}

const ON_BEAT: Verdict = Verdict::OnTime;

/// Advance the brain by one beat.
pub fn think(brain: &EnemyBrain, ctx: &BrainContext) -> BrainUpdate {
    let mut next = *brain;
    let mut update = BrainUpdate {
        brain: next,
        facing: None,
        trigger: None,
    };

    let Some(player) = ctx.player_position else {
        return update;
    };

    // A held charge is released once it has gathered at least one level.
    if next.holding {
        if ctx.ability_phase != AbilityPhase::Charging {
            // Charge ended on its own (fizzled or interrupted).
            next.holding = false;
        } else if ctx.ability_level >= 1 {
            next.holding = false;
            next.cooldown_remaining = next.cooldown_beats;
            next.prepared_aim = next.attack_every_beat.then(|| aim_at(ctx.position, player));
            update.trigger = Some(Trigger::Release { verdict: ON_BEAT });
        }
        update.brain = next;
        return update;
    }

    if next.cooldown_remaining > 0 {
        next.cooldown_remaining -= 1;
        update.brain = next;
        return update;
    }

    match next.prepared_aim {
        Some(aim) => {
            update.facing = Some(aim);
            update.trigger = Some(Trigger::Primary { verdict: ON_BEAT });
            if ctx.archetype == Archetype::ChargeDasher {
                next.holding = true;
                next.prepared_aim = Some(aim);
            } else {
                next.cooldown_remaining = next.cooldown_beats;
                next.prepared_aim = next.attack_every_beat.then(|| aim_at(ctx.position, player));
            }
        }
        None => {
            let aim = aim_at(ctx.position, player);
            next.prepared_aim = Some(aim);
            update.facing = Some(aim);
        }
    }

    update.brain = next;
    update
}
