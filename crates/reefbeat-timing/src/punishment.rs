//! Miss lockout for the player.
//!
//! A missed input locks the player out until the early window of the beat
//! after the punished one opens. Enemies never own one of these.

/// Player-only input lockout after a miss.
#[derive(Debug, Clone, Copy)]
pub struct PunishmentWindow {
    /// Early window half-width in beats (`threshold / seconds_per_beat`).
    early_window_beats: f64,
    punished_beat: Option<i64>,
}

impl PunishmentWindow {
    pub fn new(early_window_beats: f64) -> Self {
        Self {
            early_window_beats,
            punished_beat: None,
        }
    }

    pub fn from_threshold(input_threshold_secs: f64, seconds_per_beat: f64) -> Self {
        Self::new(input_threshold_secs / seconds_per_beat)
    }

    /// Arm the lockout at the beat nearest to the miss.
    pub fn on_miss(&mut self, current_beats: f64) {
        self.punished_beat = Some(current_beats.round() as i64);
    }

    pub fn is_punished(&self) -> bool {
        self.punished_beat.is_some()
    }

    pub fn punished_beat(&self) -> Option<i64> {
        self.punished_beat
    }

    /// Beat position at which the current lockout lifts.
    pub fn release_at_beats(&self) -> Option<f64> {
        self.punished_beat
            .map(|beat| (beat + 1) as f64 - self.early_window_beats)
    }

    pub fn is_blocking(&self, current_beats: f64) -> bool {
        match self.release_at_beats() {
            Some(release) => current_beats < release,
            None => false,
        }
    }

    /// Lift the lockout once the next beat's early window has opened.
    /// Returns true on the tick it lifts.
    pub fn tick(&mut self, current_beats: f64) -> bool {
        match self.release_at_beats() {
            Some(release) if current_beats >= release => {
                self.punished_beat = None;
                true
            }
            _ => false,
        }
    }

    pub fn reset(&mut self) {
        self.punished_beat = None;
    }
}
