//! Session-local components. These reference scheduler handles and never
//! leave the engine, so they live here instead of the shared core crate.

use glam::Vec2;

use reefbeat_core::enums::DeadlineKind;
use reefbeat_core::types::{ActorId, DamageRegion};
use reefbeat_timing::DeadlineId;

/// An open damage window, swept every tick until the ability closes it.
#[derive(Debug, Clone)]
pub struct DamageWindow {
    pub region: DamageRegion,
    pub damage: u32,
    /// Targets already hit during the current beat.
    pub hit: Vec<ActorId>,
}

impl DamageWindow {
    pub fn new(region: DamageRegion, damage: u32) -> Self {
        Self {
            region,
            damage,
            hit: Vec::new(),
        }
    }
}

/// Timed displacement (dash, deflate, lunge), interpolated by song time.
#[derive(Debug, Clone, Copy)]
pub struct Motion {
    pub from: Vec2,
    pub to: Vec2,
    pub started_secs: f64,
    pub duration_secs: f64,
}

impl Motion {
    /// Progress in [0, 1] at `now_secs`.
    pub fn progress(&self, now_secs: f64) -> f32 {
        if self.duration_secs <= 0.0 {
            return 1.0;
        }
        ((now_secs - self.started_secs) / self.duration_secs).clamp(0.0, 1.0) as f32
    }

    pub fn position_at(&self, now_secs: f64) -> Vec2 {
        self.from.lerp(self.to, self.progress(now_secs))
    }
}

/// Deadlines this fish's ability is waiting on, so they can be cancelled
/// by kind or all at once.
#[derive(Debug, Clone, Default)]
pub struct PendingDeadlines(pub Vec<(DeadlineKind, DeadlineId)>);

impl PendingDeadlines {
    pub fn push(&mut self, kind: DeadlineKind, id: DeadlineId) {
        self.0.push((kind, id));
    }

    /// Remove and return every handle of `kind`.
    pub fn take_kind(&mut self, kind: DeadlineKind) -> Vec<DeadlineId> {
        let mut taken = Vec::new();
        self.0.retain(|(k, id)| {
            if *k == kind {
                taken.push(*id);
                false
            } else {
                true
            }
        });
        taken
    }

    pub fn take_all(&mut self) -> Vec<DeadlineId> {
        self.0.drain(..).map(|(_, id)| id).collect()
    }

    /// Forget a handle once it has fired.
    pub fn forget(&mut self, id: DeadlineId) {
        self.0.retain(|(_, pending)| *pending != id);
    }
}
