//! Session constants and tuning parameters.

/// Simulation tick rate used by headless drivers (Hz).
pub const TICK_RATE: u32 = 60;

/// Seconds per tick at the default tick rate.
pub const DT: f64 = 1.0 / TICK_RATE as f64;

// --- Beat grid ---

/// Default song tempo.
pub const DEFAULT_BPM: f64 = 120.0;

/// Default half-width of the input acceptance window (seconds).
pub const DEFAULT_INPUT_THRESHOLD_SECS: f64 = 0.15;

/// Beats in one combo measure.
pub const DEFAULT_BEATS_PER_MEASURE: u32 = 4;

/// Default audio sample rate for `SampleClock`-driven sessions.
pub const DEFAULT_SAMPLE_RATE: u32 = 48_000;

// --- Health ---

/// Health of every fish at spawn.
pub const DEFAULT_MAX_HEALTH: u32 = 3;

/// Health restored to the attacker on a kill.
pub const KILL_HEAL: u32 = 1;

/// Beats of invincibility a player gets after taking a hit.
pub const PLAYER_HIT_INVINCIBLE_BEATS: u32 = 1;

// --- Dash-attacker (piranha) ---

/// Dash length (world units).
pub const DASH_ATTACKER_DISTANCE: f32 = 2.0;

/// Dash duration; the damage window closes with it (seconds).
pub const DASH_ATTACKER_DURATION_SECS: f64 = 0.2;

/// Reach of the bite cone.
pub const DASH_ATTACKER_RANGE: f32 = 1.5;

/// Full opening angle of the bite cone (degrees).
pub const DASH_ATTACKER_ARC_DEG: f32 = 60.0;

pub const DASH_ATTACKER_DAMAGE: u32 = 1;

// --- Inflate-attacker (pufferfish) ---

/// Spike radius per inflate level (index = level - 1).
pub const INFLATE_RADII: [f32; 3] = [1.0, 1.5, 2.0];

/// Deflate dash length per consumed level (index = level - 1).
pub const DEFLATE_DISTANCES: [f32; 3] = [2.0, 3.0, 4.0];

/// Deflate dash duration (beats).
pub const DEFLATE_DURATION_BEATS: f64 = 2.0;

pub const INFLATE_DAMAGE: u32 = 1;

// --- Charge-dasher (tuna) ---

/// Sweep damage per charge level (index = level - 1).
pub const CHARGE_DAMAGES: [u32; 3] = [2, 3, 4];

/// Charged dash length per level (index = level - 1).
pub const CHARGE_DISTANCES: [f32; 3] = [3.0, 5.0, 7.0];

/// Charged dash duration (beats).
pub const CHARGE_DASH_DURATION_BEATS: f64 = 1.0;

/// Radius of the sweep around the dashing body.
pub const CHARGE_SWEEP_RADIUS: f32 = 1.0;

// --- Speed-parrier (swordfish) ---

pub const MAX_SPEED_LEVEL: u8 = 4;

/// Movement per beat at full speed; scaled by speed / max.
pub const SPEED_MOVE_DISTANCE: f32 = 2.0;

/// Nose hit radius while at full speed.
pub const NOSE_RADIUS: f32 = 0.5;

pub const NOSE_DAMAGE: u32 = 2;

/// Parry window length (seconds).
pub const PARRY_WINDOW_SECS: f64 = 0.2;

/// Beats before another parry may be attempted.
pub const PARRY_COOLDOWN_BEATS: u32 = 2;

pub const COUNTER_DAMAGE: u32 = 4;

/// Counter-attack lunge duration (seconds).
pub const COUNTER_DURATION_SECS: f64 = 0.3;

// --- Enemy AI ---

/// Beats an enemy rests after executing an attack.
pub const ENEMY_ATTACK_COOLDOWN_BEATS: u32 = 0;
