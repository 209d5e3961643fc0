//! Session runtime for REEFBEAT.
//!
//! Owns the hecs ECS world, drives every fish's ability from the beat clock
//! and the deadline scheduler, resolves combat, and produces
//! `SessionSnapshot`s for presentation.

pub mod combat;
pub mod combo;
pub mod components;
pub mod engine;
pub mod query;
pub mod systems;
pub mod world_setup;

pub use reefbeat_core as core;
pub use combat::DamageOutcome;
pub use combo::{ComboChange, ComboTracker};
pub use engine::SessionEngine;
pub use query::{ProximityQuery, TargetQuery};

#[cfg(test)]
mod tests;
