//! Ability state machines for REEFBEAT.
//!
//! One shared ability record, four archetype transition tables, and the
//! beat-driven enemy brain. Pure functions over plain data: no ECS, no clock.

pub mod brain;
pub mod fsm;
pub mod profiles;

pub use reefbeat_core as core;
