//! Spatial lookup of damage candidates.
//!
//! The session never asks a physics engine directly; it goes through
//! `TargetQuery`, so a host with its own collision layer can plug it in.

use glam::Vec2;
use hecs::{Entity, World};

use reefbeat_core::components::{Actor, Position};
use reefbeat_core::types::DamageRegion;

pub trait TargetQuery {
    /// Entities whose position lies inside `region` placed at `origin`,
    /// oriented along `facing`. Filtering by faction is not this trait's job.
    fn candidates(
        &self,
        world: &World,
        region: &DamageRegion,
        origin: Vec2,
        facing: Vec2,
    ) -> Vec<Entity>;
}

/// Point-in-region test over every `Position`, in actor id order.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProximityQuery;

impl TargetQuery for ProximityQuery {
    fn candidates(
        &self,
        world: &World,
        region: &DamageRegion,
        origin: Vec2,
        facing: Vec2,
    ) -> Vec<Entity> {
        let mut hits: Vec<(Entity, u32)> = world
            .query::<(&Actor, &Position)>()
            .iter()
            .filter(|(_, (_, pos))| region.contains(origin, facing, pos.0))
            .map(|(entity, (actor, _))| (entity, actor.id.0))
            .collect();
        hits.sort_by_key(|(_, id)| *id);
        hits.into_iter().map(|(entity, _)| entity).collect()
    }
}
