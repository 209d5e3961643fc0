//! Timed displacement system.
//!
//! Moves every fish with a `Motion` toward its destination by song time,
//! and drops the component once the destination is reached.

use hecs::{Entity, World};

use reefbeat_core::components::Position;

use crate::components::Motion;

pub fn run(world: &mut World, now_secs: f64, finished: &mut Vec<Entity>) {
    finished.clear();

    for (entity, (pos, motion)) in world.query_mut::<(&mut Position, &Motion)>() {
        pos.0 = motion.position_at(now_secs);
        if motion.progress(now_secs) >= 1.0 {
            finished.push(entity);
        }
    }

    for entity in finished.drain(..) {
        let _ = world.remove_one::<Motion>(entity);
    }
}
