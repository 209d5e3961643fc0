//! Beat clock: audio position to beat index.
//!
//! The clock never integrates frame deltas. Every tick it is handed the
//! playback position of the audio source and recomputes the beat position
//! from scratch, so it stays locked to the music at any frame rate.

use log::{debug, warn};

use reefbeat_core::config::SessionConfig;
use reefbeat_core::error::ConfigError;

/// Anything that can report a monotonically advancing playback position.
pub trait AudioPositionSource {
    /// Current playback position (seconds).
    fn position_secs(&self) -> f64;
}

/// Sample-counting position source. The position is derived from the number
/// of samples the audio device has consumed, which is exact where wall-clock
/// timers drift.
#[derive(Debug, Clone, Copy)]
pub struct SampleClock {
    samples_played: u64,
    sample_rate: u32,
}

impl SampleClock {
    pub fn new(sample_rate: u32) -> Self {
        Self {
            samples_played: 0,
            sample_rate: sample_rate.max(1),
        }
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn samples_played(&self) -> u64 {
        self.samples_played
    }

    pub fn advance_samples(&mut self, samples: u64) {
        self.samples_played = self.samples_played.saturating_add(samples);
    }

    /// Advance by a duration, rounded to whole samples.
    pub fn advance_secs(&mut self, secs: f64) {
        if secs.is_finite() && secs > 0.0 {
            self.advance_samples((secs * self.sample_rate as f64).round() as u64);
        }
    }

    pub fn reset(&mut self) {
        self.samples_played = 0;
    }
}

impl AudioPositionSource for SampleClock {
    fn position_secs(&self) -> f64 {
        self.samples_played as f64 / self.sample_rate as f64
    }
}

/// Converts the audio position into beats and emits each crossed beat once.
#[derive(Debug, Clone)]
pub struct BeatClock {
    bpm: f64,
    seconds_per_beat: f64,
    first_beat_offset_secs: f64,
    song_position_secs: f64,
    song_position_beats: f64,
    last_emitted_beat: i64,
}

impl BeatClock {
    pub fn new(bpm: f64, first_beat_offset_secs: f64) -> Result<Self, ConfigError> {
        if !bpm.is_finite() || bpm <= 0.0 {
            return Err(ConfigError::InvalidBpm(bpm));
        }
        if !first_beat_offset_secs.is_finite() {
            return Err(ConfigError::InvalidOffset(first_beat_offset_secs));
        }
        let seconds_per_beat = 60.0 / bpm;
        Ok(Self {
            bpm,
            seconds_per_beat,
            first_beat_offset_secs,
            song_position_secs: 0.0,
            song_position_beats: -first_beat_offset_secs / seconds_per_beat,
            last_emitted_beat: 0,
        })
    }

    pub fn from_config(config: &SessionConfig) -> Result<Self, ConfigError> {
        Self::new(config.bpm, config.first_beat_offset_secs)
    }

    /// Move the clock to a new playback position.
    ///
    /// Returns the beat index when an integer beat was crossed. If several
    /// beats elapsed since the last call (a long frame spike) only the latest
    /// one is returned; the skipped indices are never emitted.
    pub fn advance(&mut self, position_secs: f64) -> Option<i64> {
        if !position_secs.is_finite() {
            warn!("ignoring non-finite audio position {position_secs}");
            return None;
        }
        if position_secs < self.song_position_secs {
            warn!(
                "audio position went backwards ({:.4}s -> {:.4}s), ignoring",
                self.song_position_secs, position_secs
            );
            return None;
        }

        self.song_position_secs = position_secs;
        self.song_position_beats =
            (position_secs - self.first_beat_offset_secs) / self.seconds_per_beat;

        let whole = self.song_position_beats.floor() as i64;
        if whole <= self.last_emitted_beat {
            return None;
        }
        if whole > self.last_emitted_beat + 1 {
            debug!(
                "dropped beats {}..{} in one tick",
                self.last_emitted_beat + 1,
                whole
            );
        }
        self.last_emitted_beat = whole;
        Some(whole)
    }

    /// Rewind to the start of the track.
    pub fn restart(&mut self) {
        self.song_position_secs = 0.0;
        self.song_position_beats = -self.first_beat_offset_secs / self.seconds_per_beat;
        self.last_emitted_beat = 0;
    }

    pub fn bpm(&self) -> f64 {
        self.bpm
    }

    pub fn seconds_per_beat(&self) -> f64 {
        self.seconds_per_beat
    }

    pub fn first_beat_offset_secs(&self) -> f64 {
        self.first_beat_offset_secs
    }

    pub fn song_position_secs(&self) -> f64 {
        self.song_position_secs
    }

    pub fn song_position_beats(&self) -> f64 {
        self.song_position_beats
    }

    pub fn last_emitted_beat(&self) -> i64 {
        self.last_emitted_beat
    }

    pub fn beats_to_seconds(&self, beats: f64) -> f64 {
        beats * self.seconds_per_beat
    }

    pub fn seconds_to_beats(&self, secs: f64) -> f64 {
        secs / self.seconds_per_beat
    }

    /// Absolute song time of beat `beat` (offset included).
    pub fn beat_time_secs(&self, beat: i64) -> f64 {
        self.first_beat_offset_secs + beat as f64 * self.seconds_per_beat
    }

    pub fn time_to_next_beat_secs(&self) -> f64 {
        let next = self.song_position_beats.floor() + 1.0;
        (next - self.song_position_beats) * self.seconds_per_beat
    }

    pub fn current_measure(&self, beats_per_measure: u32) -> i64 {
        let whole = self.song_position_beats.floor() as i64;
        whole.div_euclid(beats_per_measure.max(1) as i64)
    }

    pub fn beat_in_measure(&self, beats_per_measure: u32) -> u32 {
        let whole = self.song_position_beats.floor() as i64;
        whole.rem_euclid(beats_per_measure.max(1) as i64) as u32
    }
}
