//! Measure-aligned combo counter.
//!
//! The combo grows by one for every measure that contained at least one kill
//! and breaks on a measure without kills or on a missed player input.

use log::info;

use reefbeat_core::state::ComboView;

/// Reported when the combo changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComboChange {
    Extended { combo: u32 },
    Broken { lost: u32 },
}

#[derive(Debug, Clone)]
pub struct ComboTracker {
    beats_per_measure: u32,
    current_combo: u32,
    best_combo: u32,
    beats_into_measure: u32,
    kills_this_measure: u32,
}

impl ComboTracker {
    pub fn new(beats_per_measure: u32) -> Self {
        Self {
            beats_per_measure: beats_per_measure.max(1),
            current_combo: 0,
            best_combo: 0,
            beats_into_measure: 0,
            kills_this_measure: 0,
        }
    }

    /// Count a beat; evaluates the measure once it is complete.
    pub fn on_beat(&mut self, beat: i64) -> Option<ComboChange> {
        self.beats_into_measure += 1;
        if self.beats_into_measure < self.beats_per_measure {
            return None;
        }

        let change = if self.kills_this_measure > 0 {
            self.current_combo += 1;
            self.best_combo = self.best_combo.max(self.current_combo);
            info!(
                "combo {} at beat {beat} ({} kills this measure)",
                self.current_combo, self.kills_this_measure
            );
            Some(ComboChange::Extended {
                combo: self.current_combo,
            })
        } else {
            self.break_combo()
        };

        self.beats_into_measure = 0;
        self.kills_this_measure = 0;
        change
    }

    pub fn on_kill(&mut self) {
        self.kills_this_measure += 1;
    }

    /// A missed player input breaks the combo immediately.
    pub fn on_missed_beat(&mut self) -> Option<ComboChange> {
        self.break_combo()
    }

    fn break_combo(&mut self) -> Option<ComboChange> {
        if self.current_combo == 0 {
            return None;
        }
        let lost = self.current_combo;
        self.current_combo = 0;
        info!("combo of {lost} broken");
        Some(ComboChange::Broken { lost })
    }

    /// Back to an empty measure. The best combo survives restarts.
    pub fn reset(&mut self) {
        self.current_combo = 0;
        self.beats_into_measure = 0;
        self.kills_this_measure = 0;
    }

    pub fn current_combo(&self) -> u32 {
        self.current_combo
    }

    pub fn best_combo(&self) -> u32 {
        self.best_combo
    }

    pub fn kills_this_measure(&self) -> u32 {
        self.kills_this_measure
    }

    pub fn view(&self) -> ComboView {
        ComboView {
            current: self.current_combo,
            best: self.best_combo,
            beats_into_measure: self.beats_into_measure,
            kills_this_measure: self.kills_this_measure,
        }
    }
}
