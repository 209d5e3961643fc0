//! Beat timing for REEFBEAT.
//!
//! Derives discrete beat events from a continuously advancing audio position,
//! judges input instants against the beat grid, and schedules the sub-beat
//! deadlines abilities run on. No ECS dependency; operates on plain data.

pub mod clock;
pub mod judge;
pub mod listeners;
pub mod punishment;
pub mod scheduler;

pub use reefbeat_core as core;

pub use clock::{AudioPositionSource, BeatClock, SampleClock};
pub use judge::{Judgment, TimingJudge};
pub use listeners::{DispatchPass, ListenerAction, ListenerRegistry};
pub use punishment::PunishmentWindow;
pub use scheduler::{DeadlineId, DeadlineScheduler};
