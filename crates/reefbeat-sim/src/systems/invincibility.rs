//! Per-beat countdown of hit-recovery invincibility.

use hecs::{Entity, World};

use reefbeat_core::components::Invincibility;

/// Count one beat off `entity`'s hit recovery.
/// Returns true when this beat ended the invincibility.
pub fn on_beat(world: &mut World, entity: Entity) -> bool {
    let Ok(mut inv) = world.get::<&mut Invincibility>(entity) else {
        return false;
    };
    if inv.beats_remaining == 0 {
        return false;
    }
    inv.beats_remaining -= 1;
    !inv.is_active()
}
