//! ECS systems that operate on the session world.
//!
//! Systems are plain functions over `&mut World` (or `&World` for read-only
//! passes). Anything that needs the deadline scheduler, the listener
//! registry or the combat gate is driven from the engine instead.

pub mod cleanup;
pub mod invincibility;
pub mod motion;
pub mod snapshot;
