//! Entity spawn factories.
//!
//! Every fish gets the same bundle: identity, placement, health, combat
//! allegiance, ability record and deadline bookkeeping. Enemies add a brain.

use glam::Vec2;
use hecs::{Entity, World};

use reefbeat_core::components::*;
use reefbeat_core::enums::{Archetype, Faction};
use reefbeat_core::types::{ActorId, FactionMask};

use crate::components::PendingDeadlines;

/// Spawn a fish of any faction.
pub fn spawn_fish(
    world: &mut World,
    id: ActorId,
    archetype: Archetype,
    faction: Faction,
    position: Vec2,
    max_health: u32,
) -> Entity {
    world.spawn((
        Actor { id, archetype },
        Position(position),
        Facing::default(),
        Health::full(max_health),
        Invincibility::default(),
        Combatant {
            faction,
            target_mask: FactionMask::only(faction.opponent()),
            is_player: faction == Faction::Player,
        },
        AbilityState::new(archetype),
        PendingDeadlines::default(),
    ))
}

/// Spawn the player fish at the origin.
pub fn spawn_player(world: &mut World, id: ActorId, archetype: Archetype, max_health: u32) -> Entity {
    spawn_fish(world, id, archetype, Faction::Player, Vec2::ZERO, max_health)
}

/// Spawn an enemy fish with a beat-driven brain.
pub fn spawn_enemy(
    world: &mut World,
    id: ActorId,
    archetype: Archetype,
    position: Vec2,
    max_health: u32,
    attack_every_beat: bool,
    cooldown_beats: u32,
) -> Entity {
    let entity = spawn_fish(world, id, archetype, Faction::Enemy, position, max_health);
    // Freshly spawned, so the insert cannot miss.
    let _ = world.insert_one(entity, EnemyBrain::new(attack_every_beat, cooldown_beats));
    entity
}
