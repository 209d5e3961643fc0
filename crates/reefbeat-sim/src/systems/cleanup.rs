//! Cleanup system: removes dead enemies.
//!
//! The player fish is kept after death so the game-over snapshot still shows
//! it; it goes away with the rest of the world on restart.

use hecs::{Entity, World};

use reefbeat_core::components::{Actor, Combatant, Health};
use reefbeat_core::types::ActorId;

/// Despawn dead non-player fish. Returns the ids that were removed.
pub fn run(world: &mut World, despawn_buffer: &mut Vec<Entity>) -> Vec<ActorId> {
    despawn_buffer.clear();
    let mut removed = Vec::new();

    for (entity, (actor, health, combatant)) in
        world.query_mut::<(&Actor, &Health, &Combatant)>()
    {
        if health.is_dead() && !combatant.is_player {
            despawn_buffer.push(entity);
            removed.push(actor.id);
        }
    }

    for entity in despawn_buffer.drain(..) {
        let _ = world.despawn(entity);
    }
    removed
}
