//! Ability finite state machine.
//!
//! `evaluate` is a pure function: given the shared ability record, the beat
//! context and one trigger, it returns the next record plus the intents the
//! session must carry out (strikes, dashes, deadlines, presentation cues).
//! The archetype tag selects the transition table.

use log::debug;

use reefbeat_core::components::AbilityState;
use reefbeat_core::constants::*;
use reefbeat_core::enums::{AbilityPhase, Archetype, DeadlineKind, RejectReason, Verdict};
use reefbeat_core::events::Cue;
use reefbeat_core::types::{ActorId, DamageRegion};

use crate::profiles::{self, get_profile};

/// Beat grid information for one evaluation.
#[derive(Debug, Clone, Copy)]
pub struct AbilityContext {
    /// Beat the trigger is attributed to: the crossed beat for `Beat`, the
    /// nearest beat for judged inputs.
    pub beat: i64,
    pub now_secs: f64,
    pub seconds_per_beat: f64,
    pub first_beat_offset_secs: f64,
    pub input_threshold_secs: f64,
}

impl AbilityContext {
    pub fn beat_time_secs(&self, beat: i64) -> f64 {
        self.first_beat_offset_secs + beat as f64 * self.seconds_per_beat
    }

    pub fn early_window_opens_secs(&self, beat: i64) -> f64 {
        self.beat_time_secs(beat) - self.input_threshold_secs
    }

    pub fn late_window_closes_secs(&self, beat: i64) -> f64 {
        self.beat_time_secs(beat) + self.input_threshold_secs
    }

    pub fn beats_to_secs(&self, beats: f64) -> f64 {
        beats * self.seconds_per_beat
    }
}

/// What happened to the ability.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Trigger {
    /// An integer beat was crossed.
    Beat,
    /// Primary action (press).
    Primary { verdict: Verdict },
    /// Primary action key released.
    Release { verdict: Verdict },
    /// Secondary action (deflate, parry).
    Secondary { verdict: Verdict },
    /// A scheduled deadline fired.
    Deadline { kind: DeadlineKind, epoch: u32 },
    /// Damage landed on this fish.
    Hit { attacker: ActorId },
    /// A hit was negated by an open parry.
    Parried { attacker: ActorId },
    /// Forced reset (death, restart).
    Interrupt,
}

/// Intent the session carries out after a transition.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Effect {
    Present(Cue),
    /// Apply damage once to everything in the region right now.
    Strike { region: DamageRegion, damage: u32 },
    /// Keep hitting whatever enters the region until closed, once per target.
    OpenDamageWindow { region: DamageRegion, damage: u32 },
    CloseDamageWindow,
    Schedule { kind: DeadlineKind, at_secs: f64 },
    Cancel(DeadlineKind),
    CancelAll,
    /// Displace along the facing.
    Dash { distance: f32, duration_secs: f64 },
    HoldInvincibility,
    ReleaseInvincibility,
    /// Lunge to `target` and hit it directly.
    CounterStrike {
        target: ActorId,
        damage: u32,
        duration_secs: f64,
    },
    Rejected(RejectReason),
}

/// Output of the ability FSM.
#[derive(Debug, Clone)]
pub struct AbilityUpdate {
    pub state: AbilityState,
    pub effects: Vec<Effect>,
    pub changed: bool,
}

/// Evaluate one trigger against an ability record.
pub fn evaluate(state: &AbilityState, ctx: &AbilityContext, trigger: Trigger) -> AbilityUpdate {
    let mut next = state.clone();
    let mut effects = Vec::new();

    match trigger {
        Trigger::Interrupt => force_idle(&mut next, &mut effects),
        Trigger::Deadline { kind, epoch } if epoch != state.epoch => {
            debug!("ignoring stale {kind:?} deadline (epoch {epoch} != {})", state.epoch);
        }
        Trigger::Hit { .. } => {
            if get_profile(state.archetype).hit_interrupt.applies(state.phase) {
                force_idle(&mut next, &mut effects);
            }
        }
        Trigger::Secondary { .. } if !get_profile(state.archetype).has_secondary => {
            effects.push(Effect::Rejected(RejectReason::Unsupported));
        }
        _ => match state.archetype {
            Archetype::DashAttacker => dash_attacker(&mut next, ctx, trigger, &mut effects),
            Archetype::InflateAttacker => inflate_attacker(&mut next, ctx, trigger, &mut effects),
            Archetype::ChargeDasher => charge_dasher(&mut next, ctx, trigger, &mut effects),
            Archetype::SpeedParrier => speed_parrier(&mut next, ctx, trigger, &mut effects),
        },
    }

    if next.phase != state.phase {
        next.beats_in_phase = 0;
    } else if trigger == Trigger::Beat && next.phase != AbilityPhase::Idle {
        next.beats_in_phase += 1;
    }

    let changed = next != *state;
    AbilityUpdate {
        state: next,
        effects,
        changed,
    }
}

/// Cancel everything, close any open window, and drop to Idle.
fn force_idle(state: &mut AbilityState, effects: &mut Vec<Effect>) {
    state.epoch = state.epoch.wrapping_add(1);
    effects.push(Effect::CancelAll);
    if state.damage_window_open {
        effects.push(Effect::CloseDamageWindow);
    }
    effects.push(Effect::ReleaseInvincibility);
    if state.phase == AbilityPhase::Charging {
        effects.push(Effect::Present(Cue::ChargeCancelled));
    }
    if state.level > 0 {
        effects.push(Effect::Present(Cue::LevelReset));
    }
    if state.phase != AbilityPhase::Idle {
        effects.push(Effect::Present(Cue::ReturnIdle));
    }

    state.phase = AbilityPhase::Idle;
    state.level = 0;
    state.damage_window_open = false;
    state.counter_target = None;
    state.phase_ends_at_secs = None;
    state.charge_started_beat = None;
}

fn return_idle(state: &mut AbilityState, effects: &mut Vec<Effect>) {
    state.phase = AbilityPhase::Idle;
    state.phase_ends_at_secs = None;
    effects.push(Effect::Present(Cue::ReturnIdle));
}

/// Busy or same-beat checks shared by every primary activation.
fn reject_primary(
    state: &AbilityState,
    ctx: &AbilityContext,
    busy: &[AbilityPhase],
    effects: &mut Vec<Effect>,
) -> bool {
    let reason = if busy.contains(&state.phase) {
        RejectReason::Busy
    } else if state.last_action_beat == Some(ctx.beat) {
        RejectReason::SameBeat
    } else {
        return false;
    };
    effects.push(Effect::Rejected(reason));
    true
}

fn mark_action(state: &mut AbilityState, beat: i64) {
    state.last_action_beat = Some(beat);
    if state.last_activation_beat != Some(beat) {
        state.previous_activation_beat = state.last_activation_beat;
        state.last_activation_beat = Some(beat);
    }
}

/// Whether beat `beat` had an activation, looking past an early press that
/// was already attributed to the following beat.
fn activated_on(state: &AbilityState, beat: i64) -> bool {
    match state.last_activation_beat {
        Some(last) if last == beat => true,
        Some(last) if last == beat + 1 => state.previous_activation_beat == Some(beat),
        _ => false,
    }
}

// --- Dash-attacker ---

fn dash_attacker(
    state: &mut AbilityState,
    ctx: &AbilityContext,
    trigger: Trigger,
    effects: &mut Vec<Effect>,
) {
    match trigger {
        Trigger::Primary {
            verdict: Verdict::OnTime,
        } => {
            let busy = [AbilityPhase::Attacking, AbilityPhase::OnCooldown];
            if reject_primary(state, ctx, &busy, effects) {
                return;
            }
            let closes_at = ctx.now_secs + DASH_ATTACKER_DURATION_SECS;
            mark_action(state, ctx.beat);
            state.phase = AbilityPhase::Attacking;
            state.damage_window_open = true;
            state.phase_ends_at_secs = Some(closes_at);
            effects.extend([
                Effect::Present(Cue::EnterAttacking),
                Effect::Dash {
                    distance: DASH_ATTACKER_DISTANCE,
                    duration_secs: DASH_ATTACKER_DURATION_SECS,
                },
                Effect::OpenDamageWindow {
                    region: profiles::bite_region(),
                    damage: DASH_ATTACKER_DAMAGE,
                },
                Effect::Schedule {
                    kind: DeadlineKind::DamageWindowClose,
                    at_secs: closes_at,
                },
            ]);
        }
        Trigger::Deadline {
            kind: DeadlineKind::DamageWindowClose,
            ..
        } if state.phase == AbilityPhase::Attacking => {
            state.damage_window_open = false;
            effects.push(Effect::CloseDamageWindow);
            // Recover until inputs for the next beat start counting.
            let next_beat = state.last_action_beat.unwrap_or(ctx.beat) + 1;
            let recovered_at = ctx.early_window_opens_secs(next_beat);
            if recovered_at > ctx.now_secs {
                state.phase = AbilityPhase::OnCooldown;
                state.phase_ends_at_secs = Some(recovered_at);
                effects.push(Effect::Schedule {
                    kind: DeadlineKind::CooldownEnd,
                    at_secs: recovered_at,
                });
            } else {
                return_idle(state, effects);
            }
        }
        Trigger::Deadline {
            kind: DeadlineKind::CooldownEnd,
            ..
        } if state.phase == AbilityPhase::OnCooldown => return_idle(state, effects),
        _ => {}
    }
}

// --- Inflate-attacker ---

fn inflate_attacker(
    state: &mut AbilityState,
    ctx: &AbilityContext,
    trigger: Trigger,
    effects: &mut Vec<Effect>,
) {
    let profile = get_profile(Archetype::InflateAttacker);
    match trigger {
        Trigger::Primary {
            verdict: Verdict::OnTime,
        } => {
            if reject_primary(state, ctx, &[AbilityPhase::Dashing], effects) {
                return;
            }
            if state.level >= profile.max_level {
                effects.push(Effect::Rejected(RejectReason::AtMaxLevel));
                return;
            }
            state.level += 1;
            state.phase = AbilityPhase::Attacking;
            mark_action(state, ctx.beat);
            effects.extend([
                Effect::Present(Cue::Inflate { level: state.level }),
                Effect::Strike {
                    region: profiles::inflate_region(state.level),
                    damage: INFLATE_DAMAGE,
                },
                Effect::Cancel(DeadlineKind::LevelDecay),
                // Decay once the next beat's window closes without another inflate.
                Effect::Schedule {
                    kind: DeadlineKind::LevelDecay,
                    at_secs: ctx.late_window_closes_secs(ctx.beat + 1),
                },
            ]);
        }
        Trigger::Secondary {
            verdict: Verdict::OnTime,
        } => {
            if state.phase == AbilityPhase::Dashing {
                effects.push(Effect::Rejected(RejectReason::Busy));
                return;
            }
            if state.level == 0 {
                effects.push(Effect::Rejected(RejectReason::NoLevel));
                return;
            }
            let consumed = state.level;
            let duration_secs = ctx.beats_to_secs(DEFLATE_DURATION_BEATS);
            state.level = 0;
            state.phase = AbilityPhase::Dashing;
            state.phase_ends_at_secs = Some(ctx.now_secs + duration_secs);
            effects.extend([
                Effect::Cancel(DeadlineKind::LevelDecay),
                Effect::Present(Cue::Deflate { level: consumed }),
                Effect::Dash {
                    distance: profiles::deflate_distance(consumed),
                    duration_secs,
                },
                Effect::HoldInvincibility,
                Effect::Schedule {
                    kind: DeadlineKind::DashEnd,
                    at_secs: ctx.now_secs + duration_secs,
                },
            ]);
        }
        Trigger::Deadline {
            kind: DeadlineKind::LevelDecay,
            ..
        } if state.phase == AbilityPhase::Attacking => {
            state.level = 0;
            effects.push(Effect::Present(Cue::LevelReset));
            return_idle(state, effects);
        }
        Trigger::Deadline {
            kind: DeadlineKind::DashEnd,
            ..
        } if state.phase == AbilityPhase::Dashing => {
            effects.push(Effect::ReleaseInvincibility);
            return_idle(state, effects);
        }
        _ => {}
    }
}

// --- Charge-dasher ---

fn charge_dasher(
    state: &mut AbilityState,
    ctx: &AbilityContext,
    trigger: Trigger,
    effects: &mut Vec<Effect>,
) {
    let profile = get_profile(Archetype::ChargeDasher);
    match trigger {
        Trigger::Primary {
            verdict: Verdict::OnTime,
        } => {
            let busy = [AbilityPhase::Charging, AbilityPhase::Dashing];
            if reject_primary(state, ctx, &busy, effects) {
                return;
            }
            mark_action(state, ctx.beat);
            state.phase = AbilityPhase::Charging;
            state.level = 0;
            state.charge_started_beat = Some(ctx.beat);
            let expires_at = ctx.late_window_closes_secs(ctx.beat + profile.max_level as i64 + 1);
            state.phase_ends_at_secs = Some(expires_at);
            effects.extend([
                Effect::Present(Cue::ChargeStarted),
                Effect::Schedule {
                    kind: DeadlineKind::ChargeExpiry,
                    at_secs: expires_at,
                },
            ]);
        }
        Trigger::Beat if state.phase == AbilityPhase::Charging => {
            // An early press is attributed to the beat that has not fired yet.
            let past_start = state.charge_started_beat.map_or(true, |start| ctx.beat > start);
            if past_start && state.level < profile.max_level {
                state.level += 1;
                effects.push(Effect::Present(Cue::ChargeLevel { level: state.level }));
            }
        }
        Trigger::Release { verdict } => {
            if state.phase != AbilityPhase::Charging {
                effects.push(Effect::Rejected(RejectReason::NotCharging));
                return;
            }
            effects.push(Effect::Cancel(DeadlineKind::ChargeExpiry));
            state.charge_started_beat = None;
            if verdict == Verdict::Missed || state.level == 0 {
                state.level = 0;
                effects.push(Effect::Present(Cue::ChargeCancelled));
                return_idle(state, effects);
                return;
            }
            let duration_secs = ctx.beats_to_secs(CHARGE_DASH_DURATION_BEATS);
            state.phase = AbilityPhase::Dashing;
            state.damage_window_open = true;
            state.phase_ends_at_secs = Some(ctx.now_secs + duration_secs);
            effects.extend([
                Effect::Present(Cue::ChargedDash { level: state.level }),
                Effect::Dash {
                    distance: profiles::charge_distance(state.level),
                    duration_secs,
                },
                Effect::OpenDamageWindow {
                    region: profiles::sweep_region(),
                    damage: profiles::charge_damage(state.level),
                },
                Effect::HoldInvincibility,
                Effect::Schedule {
                    kind: DeadlineKind::DashEnd,
                    at_secs: ctx.now_secs + duration_secs,
                },
            ]);
        }
        Trigger::Deadline {
            kind: DeadlineKind::ChargeExpiry,
            ..
        } if state.phase == AbilityPhase::Charging => {
            state.level = 0;
            state.charge_started_beat = None;
            effects.push(Effect::Present(Cue::ChargeCancelled));
            return_idle(state, effects);
        }
        Trigger::Deadline {
            kind: DeadlineKind::DashEnd,
            ..
        } if state.phase == AbilityPhase::Dashing => {
            state.level = 0;
            state.damage_window_open = false;
            effects.extend([Effect::CloseDamageWindow, Effect::ReleaseInvincibility]);
            return_idle(state, effects);
        }
        _ => {}
    }
}

// --- Speed-parrier ---

/// Phase to settle in once a parry or counter finishes.
fn cruising_phase(state: &AbilityState) -> AbilityPhase {
    if state.level > 0 {
        AbilityPhase::Attacking
    } else {
        AbilityPhase::Idle
    }
}

fn speed_parrier(
    state: &mut AbilityState,
    ctx: &AbilityContext,
    trigger: Trigger,
    effects: &mut Vec<Effect>,
) {
    let profile = get_profile(Archetype::SpeedParrier);
    match trigger {
        Trigger::Primary {
            verdict: Verdict::OnTime,
        } => {
            let busy = [AbilityPhase::Parrying, AbilityPhase::CounterAttacking];
            if reject_primary(state, ctx, &busy, effects) {
                return;
            }
            mark_action(state, ctx.beat);
            let previous = state.level;
            state.level = (state.level + 1).min(profile.max_level);
            state.phase = AbilityPhase::Attacking;
            if state.level != previous {
                effects.push(Effect::Present(Cue::SpeedChanged { speed: state.level }));
            }
            effects.push(Effect::Dash {
                distance: profiles::speed_move_distance(state.level),
                duration_secs: ctx.seconds_per_beat,
            });
            if state.level == profile.max_level && !state.damage_window_open {
                state.damage_window_open = true;
                effects.push(Effect::OpenDamageWindow {
                    region: profiles::nose_region(),
                    damage: NOSE_DAMAGE,
                });
            }
        }
        Trigger::Secondary {
            verdict: Verdict::OnTime,
        } => {
            if matches!(
                state.phase,
                AbilityPhase::Parrying | AbilityPhase::CounterAttacking
            ) {
                effects.push(Effect::Rejected(RejectReason::Busy));
                return;
            }
            if state.level < profile.max_level || state.cooldown_beats > 0 {
                effects.push(Effect::Rejected(RejectReason::NotEligible));
                return;
            }
            let ends_at = ctx.now_secs + PARRY_WINDOW_SECS;
            state.phase = AbilityPhase::Parrying;
            state.cooldown_beats = PARRY_COOLDOWN_BEATS;
            state.phase_ends_at_secs = Some(ends_at);
            effects.extend([
                Effect::Present(Cue::ParryStarted),
                Effect::Schedule {
                    kind: DeadlineKind::ParryEnd,
                    at_secs: ends_at,
                },
            ]);
        }
        Trigger::Parried { attacker } if state.phase == AbilityPhase::Parrying => {
            // Chaining: a deflect refunds the cooldown.
            state.cooldown_beats = 0;
            state.counter_target = Some(attacker);
            state.phase = cruising_phase(state);
            state.phase_ends_at_secs = None;
            effects.extend([
                Effect::Cancel(DeadlineKind::ParryEnd),
                Effect::Present(Cue::ParryDeflected { attacker }),
            ]);
        }
        Trigger::Beat => speed_parrier_beat(state, ctx, effects),
        Trigger::Deadline {
            kind: DeadlineKind::ParryEnd,
            ..
        } if state.phase == AbilityPhase::Parrying => {
            state.phase = cruising_phase(state);
            state.phase_ends_at_secs = None;
        }
        Trigger::Deadline {
            kind: DeadlineKind::CounterEnd,
            ..
        } if state.phase == AbilityPhase::CounterAttacking => {
            state.phase = cruising_phase(state);
            state.phase_ends_at_secs = None;
            effects.push(Effect::ReleaseInvincibility);
            if state.phase == AbilityPhase::Idle {
                effects.push(Effect::Present(Cue::ReturnIdle));
            }
        }
        _ => {}
    }
}

fn speed_parrier_beat(state: &mut AbilityState, ctx: &AbilityContext, effects: &mut Vec<Effect>) {
    let profile = get_profile(Archetype::SpeedParrier);
    state.cooldown_beats = state.cooldown_beats.saturating_sub(1);

    // Decay when the previous beat passed without an activation.
    if !activated_on(state, ctx.beat - 1) && state.level > 0 {
        state.level -= 1;
        effects.push(Effect::Present(Cue::SpeedChanged { speed: state.level }));
        if state.level < profile.max_level && state.damage_window_open {
            state.damage_window_open = false;
            effects.push(Effect::CloseDamageWindow);
        }
        if state.level == 0 && state.phase == AbilityPhase::Attacking {
            return_idle(state, effects);
        }
    }

    if state.phase == AbilityPhase::CounterAttacking {
        return;
    }
    if state.phase != AbilityPhase::Parrying {
        if let Some(target) = state.counter_target.take() {
            start_counter(state, ctx, target, effects);
            return;
        }
    }

    // Keep swimming at the current speed unless a press already moved it.
    if state.level > 0 && state.last_activation_beat != Some(ctx.beat) {
        effects.push(Effect::Dash {
            distance: profiles::speed_move_distance(state.level),
            duration_secs: ctx.seconds_per_beat,
        });
    }
}

fn start_counter(
    state: &mut AbilityState,
    ctx: &AbilityContext,
    target: ActorId,
    effects: &mut Vec<Effect>,
) {
    let ends_at = ctx.now_secs + COUNTER_DURATION_SECS;
    state.phase = AbilityPhase::CounterAttacking;
    state.phase_ends_at_secs = Some(ends_at);
    effects.extend([
        Effect::Present(Cue::CounterAttack { target }),
        Effect::HoldInvincibility,
        Effect::CounterStrike {
            target,
            damage: COUNTER_DAMAGE,
            duration_secs: COUNTER_DURATION_SECS,
        },
        Effect::Schedule {
            kind: DeadlineKind::CounterEnd,
            at_secs: ends_at,
        },
    ]);
}
