//! Input timing judge.
//!
//! An instant is on time when it lies within `input_threshold_secs` of the
//! nearest integer beat, in either direction.

use reefbeat_core::enums::Verdict;
use reefbeat_core::error::ConfigError;

use crate::clock::BeatClock;

/// Full judgment of one input instant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Judgment {
    pub nearest_beat: i64,
    /// Signed distance to the nearest beat: negative early, positive late.
    pub error_secs: f64,
    pub verdict: Verdict,
}

#[derive(Debug, Clone, Copy)]
pub struct TimingJudge {
    input_threshold_secs: f64,
}

impl TimingJudge {
    /// The threshold must leave a gap between the late window of one beat
    /// and the early window of the next.
    pub fn new(input_threshold_secs: f64, seconds_per_beat: f64) -> Result<Self, ConfigError> {
        let half_beat_secs = seconds_per_beat / 2.0;
        if !input_threshold_secs.is_finite()
            || input_threshold_secs < 0.0
            || input_threshold_secs >= half_beat_secs
        {
            return Err(ConfigError::InvalidInputThreshold {
                threshold_secs: input_threshold_secs,
                half_beat_secs,
            });
        }
        Ok(Self {
            input_threshold_secs,
        })
    }

    pub fn input_threshold_secs(&self) -> f64 {
        self.input_threshold_secs
    }

    pub fn classify(&self, song_position_beats: f64, seconds_per_beat: f64) -> Verdict {
        self.judge(song_position_beats, seconds_per_beat).verdict
    }

    pub fn judge(&self, song_position_beats: f64, seconds_per_beat: f64) -> Judgment {
        let nearest = song_position_beats.round();
        let error_secs = (song_position_beats - nearest) * seconds_per_beat;
        let verdict = if error_secs.abs() <= self.input_threshold_secs {
            Verdict::OnTime
        } else {
            Verdict::Missed
        };
        Judgment {
            nearest_beat: nearest as i64,
            error_secs,
            verdict,
        }
    }

    /// Half-width of the acceptance window, in beats.
    pub fn window_beats(&self, seconds_per_beat: f64) -> f64 {
        self.input_threshold_secs / seconds_per_beat
    }

    /// Beat position at which inputs for `beat` start counting.
    pub fn early_window_opens(&self, beat: i64, seconds_per_beat: f64) -> f64 {
        beat as f64 - self.window_beats(seconds_per_beat)
    }

    /// Beat position after which inputs for `beat` no longer count.
    pub fn late_window_closes(&self, beat: i64, seconds_per_beat: f64) -> f64 {
        beat as f64 + self.window_beats(seconds_per_beat)
    }

    pub fn beats_to_seconds(&self, clock: &BeatClock, beats: f64) -> f64 {
        clock.beats_to_seconds(beats)
    }

    pub fn seconds_to_beats(&self, clock: &BeatClock, secs: f64) -> f64 {
        clock.seconds_to_beats(secs)
    }
}
