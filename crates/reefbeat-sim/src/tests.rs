//! Tests for the session engine, combat gate, combo tracker and systems.

use glam::Vec2;
use hecs::{Entity, World};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use reefbeat_abilities::profiles::get_profile;
use reefbeat_core::commands::PlayerCommand;
use reefbeat_core::components::{AbilityState, Health, Invincibility};
use reefbeat_core::config::{EnemySpawn, SessionConfig};
use reefbeat_core::constants::DT;
use reefbeat_core::enums::*;
use reefbeat_core::error::ConfigError;
use reefbeat_core::events::{Cue, SessionEvent};
use reefbeat_core::state::SessionSnapshot;
use reefbeat_core::types::{ActorId, DamageRegion};

use crate::combat::{try_damage, DamageOutcome};
use crate::combo::{ComboChange, ComboTracker};
use crate::components::Motion;
use crate::engine::SessionEngine;
use crate::query::{ProximityQuery, TargetQuery};
use crate::world_setup;

// ---- Helpers ----

fn playing(config: SessionConfig) -> SessionEngine {
    let mut engine = SessionEngine::new(config).unwrap();
    engine.start().unwrap();
    engine
}

fn with_player(archetype: Archetype) -> SessionConfig {
    SessionConfig {
        player_archetype: archetype,
        ..Default::default()
    }
}

/// Tick at the fixed rate up to and including `until`.
fn tick_until(engine: &mut SessionEngine, until: f64) -> Vec<SessionSnapshot> {
    let mut snaps = Vec::new();
    let mut t = engine.clock().song_position_secs();
    while t < until {
        t = (t + DT).min(until);
        snaps.push(engine.tick(t));
    }
    snaps
}

/// Reach `at` (beat dispatch and motion included), then process `command`
/// in a second tick at the same position.
fn input(engine: &mut SessionEngine, at: f64, command: PlayerCommand) -> Vec<SessionSnapshot> {
    let mut snaps = tick_until(engine, at);
    engine.queue_command(command);
    snaps.push(engine.tick(at));
    snaps
}

/// Process `command` in the same tick that reaches `at`, after that
/// tick's beat dispatch.
fn input_with_beat(
    engine: &mut SessionEngine,
    at: f64,
    command: PlayerCommand,
) -> Vec<SessionSnapshot> {
    let mut snaps = tick_until(engine, at - DT / 2.0);
    engine.queue_command(command);
    snaps.push(engine.tick(at));
    snaps
}

fn cues_for(snaps: &[SessionSnapshot], actor: ActorId) -> Vec<Cue> {
    snaps
        .iter()
        .flat_map(|s| s.presentation.iter())
        .filter(|e| e.actor == Some(actor))
        .map(|e| e.cue)
        .collect()
}

fn session_events(snaps: &[SessionSnapshot]) -> Vec<SessionEvent> {
    snaps
        .iter()
        .flat_map(|s| s.session_events.iter().cloned())
        .collect()
}

fn kills_of(snaps: &[SessionSnapshot]) -> Vec<(ActorId, ActorId)> {
    session_events(snaps)
        .into_iter()
        .filter_map(|e| match e {
            SessionEvent::Kill { attacker, target } => Some((attacker, target)),
            _ => None,
        })
        .collect()
}

// ---- Setup ----

#[test]
fn test_start_requires_listeners() {
    let config = SessionConfig {
        spawn_player: false,
        track_combo: false,
        ..Default::default()
    };
    let mut engine = SessionEngine::new(config).unwrap();
    assert!(matches!(engine.start(), Err(ConfigError::NoListeners)));
    assert_eq!(engine.phase(), GamePhase::Ready);
}

#[test]
fn test_invalid_config_rejected() {
    let config = SessionConfig {
        bpm: 0.0,
        ..Default::default()
    };
    assert!(matches!(
        SessionEngine::new(config),
        Err(ConfigError::InvalidBpm(_))
    ));
}

#[test]
fn test_roster_from_config() {
    let config = SessionConfig {
        enemies: vec![
            EnemySpawn {
                archetype: Archetype::InflateAttacker,
                x: 3.0,
                y: 0.0,
                attack_every_beat: true,
            },
            EnemySpawn {
                archetype: Archetype::ChargeDasher,
                x: -3.0,
                y: 1.0,
                attack_every_beat: false,
            },
        ],
        ..Default::default()
    };
    let mut engine = SessionEngine::new(config).unwrap();
    let snap = engine.tick(0.0);
    assert_eq!(snap.phase, GamePhase::Ready);
    assert_eq!(snap.actors.len(), 3);
    assert!(snap.actors[0].is_player);
    assert_eq!(snap.actors[0].faction, Faction::Player);
    assert_eq!(snap.actors[1].archetype, Archetype::InflateAttacker);
    assert_eq!(snap.actors[2].position, Vec2::new(-3.0, 1.0));
    assert!(snap.actors.iter().all(|a| a.health == a.max_health));
}

#[test]
fn test_ready_does_not_advance_clock() {
    let mut engine = SessionEngine::new(SessionConfig::default()).unwrap();
    let snap = engine.tick(1.0);
    assert_eq!(snap.time.tick, 0);
    assert_eq!(engine.clock().last_emitted_beat(), 0);
    assert!(snap.presentation.is_empty());
}

// ---- Beat dispatch ----

#[test]
fn test_beat_pulses_once_per_beat() {
    let mut engine = playing(SessionConfig::default());
    let snaps = tick_until(&mut engine, 2.0);
    let beats: Vec<i64> = snaps
        .iter()
        .flat_map(|s| s.presentation.iter())
        .filter_map(|e| match e.cue {
            Cue::BeatPulse { beat } => Some(beat),
            _ => None,
        })
        .collect();
    assert_eq!(beats, vec![1, 2, 3, 4]);
    let last = snaps.last().unwrap();
    assert_eq!(last.beat.last_emitted_beat, 4);
    assert_eq!(last.beat.measure, 1);
    assert_eq!(last.beat.beat_in_measure, 0);
}

#[test]
fn test_pause_freezes_clock() {
    let mut engine = playing(SessionConfig::default());
    tick_until(&mut engine, 0.6);
    engine.queue_command(PlayerCommand::Pause);
    let snap = engine.tick(0.6);
    assert_eq!(snap.phase, GamePhase::Paused);

    let snap = engine.tick(1.2);
    assert!(snap.presentation.is_empty());
    assert_eq!(engine.clock().last_emitted_beat(), 1);

    engine.queue_command(PlayerCommand::Resume);
    engine.tick(0.6);
    let snap = engine.tick(1.2);
    assert_eq!(snap.phase, GamePhase::Playing);
    assert!(snap
        .presentation
        .iter()
        .any(|e| e.cue == Cue::BeatPulse { beat: 2 }));
}

#[test]
fn test_frame_spike_fires_deadlines_around_the_beat() {
    // Inflate decay at 1.15s belongs after beat 2.
    let mut engine = playing(with_player(Archetype::InflateAttacker));
    let player = engine.player().unwrap();
    input(&mut engine, 0.5, PlayerCommand::Press);
    tick_until(&mut engine, 0.6);
    let snap = engine.tick(1.2);
    let cues: Vec<Cue> = snap.presentation.iter().map(|e| e.cue).collect();
    let pulse = cues.iter().position(|c| *c == Cue::BeatPulse { beat: 2 }).unwrap();
    let reset = cues.iter().position(|c| *c == Cue::LevelReset).unwrap();
    assert!(pulse < reset, "{cues:?}");
    assert_eq!(engine.ability(player).unwrap().level, 0);

    // Bite recovery (0.7s close, 0.85s cooldown end) belongs before it.
    let mut engine = playing(SessionConfig::default());
    input(&mut engine, 0.5, PlayerCommand::Press);
    tick_until(&mut engine, 0.6);
    let snap = engine.tick(1.2);
    let cues: Vec<Cue> = snap.presentation.iter().map(|e| e.cue).collect();
    let pulse = cues.iter().position(|c| *c == Cue::BeatPulse { beat: 2 }).unwrap();
    let idle = cues.iter().position(|c| *c == Cue::ReturnIdle).unwrap();
    assert!(idle < pulse, "{cues:?}");
}

#[test]
fn test_time_follows_audio_position() {
    let mut engine = playing(SessionConfig::default());
    engine.tick(0.25);
    let snap = engine.tick(0.75);
    assert_eq!(snap.time.tick, 2);
    assert_eq!(snap.time.song_secs, 0.75);
    assert!((snap.beat.song_position_beats - 1.5).abs() < 1e-9);
    assert!((snap.beat.time_to_next_beat_secs - 0.25).abs() < 1e-9);
}

// ---- Judgment and punishment ----

#[test]
fn test_missed_press_punishes_until_next_early_window() {
    let mut engine = playing(SessionConfig::default());
    let player = engine.player().unwrap();

    // 4.35 beats: 0.175s late for beat 4.
    let snaps = input(&mut engine, 2.175, PlayerCommand::Press);
    let last = snaps.last().unwrap();
    assert!(last.punished);
    assert!(cues_for(&snaps, player).iter().any(|c| matches!(
        c,
        Cue::InputFeedback {
            verdict: Verdict::Missed,
            ..
        }
    )));
    assert_eq!(engine.ability(player).unwrap().phase, AbilityPhase::Idle);

    // Still inside the lockout: dropped without judgment.
    let snaps = input(&mut engine, 2.3, PlayerCommand::Press);
    let cues = cues_for(&snaps, player);
    assert!(cues.contains(&Cue::InputBlocked));
    assert!(!cues.iter().any(|c| matches!(c, Cue::InputFeedback { .. })));
    assert_eq!(engine.ability(player).unwrap().phase, AbilityPhase::Idle);

    // Lockout lifted at 4.7 beats; 4.8 is on time for beat 5.
    let snaps = input(&mut engine, 2.4, PlayerCommand::Press);
    assert!(!snaps.last().unwrap().punished);
    assert!(!engine.is_punished());
    let cues = cues_for(&snaps, player);
    assert!(cues.iter().any(|c| matches!(
        c,
        Cue::InputFeedback {
            verdict: Verdict::OnTime,
            ..
        }
    )));
    assert!(cues.contains(&Cue::EnterAttacking));
}

#[test]
fn test_blocked_release_leaves_charge_untouched() {
    let mut engine = playing(with_player(Archetype::ChargeDasher));
    let player = engine.player().unwrap();

    input(&mut engine, 1.0, PlayerCommand::Press);
    assert_eq!(engine.ability(player).unwrap().phase, AbilityPhase::Charging);

    // Miss with a secondary (unsupported, but still judged and punished).
    input(&mut engine, 1.7, PlayerCommand::Secondary);
    assert!(engine.is_punished());

    let snaps = input(&mut engine, 1.8, PlayerCommand::Release);
    assert!(cues_for(&snaps, player).contains(&Cue::InputBlocked));
    assert_eq!(engine.ability(player).unwrap().phase, AbilityPhase::Charging);
}

// ---- Abilities through the engine ----

#[test]
fn test_inflate_levels_and_reset() {
    let mut engine = playing(with_player(Archetype::InflateAttacker));
    let player = engine.player().unwrap();

    for (i, at) in [1.0, 1.5, 2.0].into_iter().enumerate() {
        let snaps = input(&mut engine, at, PlayerCommand::Press);
        let level = i as u8 + 1;
        assert_eq!(engine.ability(player).unwrap().level, level);
        assert!(cues_for(&snaps, player).contains(&Cue::Inflate { level }));
    }

    let snaps = input(&mut engine, 2.5, PlayerCommand::Press);
    let last = snaps.last().unwrap();
    assert!(!cues_for(std::slice::from_ref(last), player)
        .iter()
        .any(|c| matches!(c, Cue::Inflate { .. })));
    assert_eq!(engine.ability(player).unwrap().level, 3);

    // The rejected fourth press does not extend the level past beat 5.
    tick_until(&mut engine, 2.6);
    assert_eq!(engine.ability(player).unwrap().level, 3);
    let snaps = tick_until(&mut engine, 2.7);
    let state = engine.ability(player).unwrap();
    assert_eq!(state.level, 0);
    assert_eq!(state.phase, AbilityPhase::Idle);
    assert!(cues_for(&snaps, player).contains(&Cue::LevelReset));
}

#[test]
fn test_dash_bite_moves_and_closes_window() {
    let mut engine = playing(SessionConfig::default());
    let player = engine.player().unwrap();

    let snaps = input(&mut engine, 1.0, PlayerCommand::Press);
    assert!(cues_for(&snaps, player).contains(&Cue::DashStarted { distance: 2.0 }));
    let state = engine.ability(player).unwrap();
    assert_eq!(state.phase, AbilityPhase::Attacking);
    assert!(state.damage_window_open);

    // Window closes 0.2s later; recovery lasts until beat 3's early window.
    tick_until(&mut engine, 1.25);
    let state = engine.ability(player).unwrap();
    assert!(!state.damage_window_open);
    assert_eq!(state.phase, AbilityPhase::OnCooldown);
    assert_eq!(engine.position(player).unwrap(), Vec2::new(2.0, 0.0));

    tick_until(&mut engine, 1.4);
    assert_eq!(engine.ability(player).unwrap().phase, AbilityPhase::Idle);
}

#[test]
fn test_aim_turns_the_dash() {
    let mut engine = playing(SessionConfig::default());
    let player = engine.player().unwrap();

    engine.queue_command(PlayerCommand::Aim { x: 0.0, y: -5.0 });
    input(&mut engine, 1.0, PlayerCommand::Press);
    tick_until(&mut engine, 1.3);
    let pos = engine.position(player).unwrap();
    assert!(pos.x.abs() < 1e-5);
    assert!((pos.y + 2.0).abs() < 1e-5);
}

#[test]
fn test_interrupted_charge_cannot_be_released() {
    let config = SessionConfig {
        player_archetype: Archetype::ChargeDasher,
        enemy_attack_cooldown_beats: 8,
        ..Default::default()
    };
    let mut engine = playing(config);
    let player = engine.player().unwrap();
    let enemy = engine.spawn_enemy(Archetype::DashAttacker, Vec2::new(1.0, 0.0), true);

    // Beat 1: the enemy aims, the player starts charging.
    input(&mut engine, 0.5, PlayerCommand::Press);
    assert_eq!(engine.ability(player).unwrap().phase, AbilityPhase::Charging);

    // Beat 2: charge reaches level 1, then the enemy bite lands.
    let snaps = tick_until(&mut engine, 1.0);
    let cues = cues_for(&snaps, player);
    assert!(cues.contains(&Cue::ChargeLevel { level: 1 }));
    assert!(cues.contains(&Cue::ChargeCancelled));
    assert!(cues.contains(&Cue::Damaged {
        amount: 1,
        remaining: 2
    }));
    let state = engine.ability(player).unwrap();
    assert_eq!(state.phase, AbilityPhase::Idle);
    assert_eq!(state.level, 0);
    assert!(engine.ability(enemy).unwrap().damage_window_open);

    // A release after the interrupt does nothing.
    let mut snaps = input(&mut engine, 1.05, PlayerCommand::Release);
    assert_eq!(engine.ability(player).unwrap().phase, AbilityPhase::Idle);

    // The cancelled expiry (beat 5 late window) never fires.
    snaps.extend(tick_until(&mut engine, 2.8));
    let cues = cues_for(&snaps, player);
    assert!(!cues.iter().any(|c| matches!(
        c,
        Cue::ChargeCancelled | Cue::ChargedDash { .. } | Cue::DashStarted { .. }
    )));
}

#[test]
fn test_charged_dash_sweeps_enemy() {
    let config = SessionConfig {
        player_archetype: Archetype::ChargeDasher,
        ..Default::default()
    };
    let mut engine = playing(config);
    let player = engine.player().unwrap();
    let dummy = engine.spawn_passive_enemy(Archetype::DashAttacker, Vec2::new(3.0, 0.0));

    input(&mut engine, 0.5, PlayerCommand::Press);
    tick_until(&mut engine, 1.5);
    assert_eq!(engine.ability(player).unwrap().level, 2);

    // Level 2: 3 damage over a 5 unit dash.
    let mut snaps = input(&mut engine, 1.5, PlayerCommand::Release);
    assert!(cues_for(&snaps, player).contains(&Cue::ChargedDash { level: 2 }));
    snaps.extend(tick_until(&mut engine, 2.1));

    assert_eq!(kills_of(&snaps), vec![(player, dummy)]);
    assert_eq!(engine.kills(), 1);
    assert!(engine.entity(dummy).is_none());
    let state = engine.ability(player).unwrap();
    assert_eq!(state.phase, AbilityPhase::Idle);
    assert!(!state.damage_window_open);
    assert!((engine.position(player).unwrap().x - 5.0).abs() < 1e-4);
}

#[test]
fn test_parry_then_counter_kills_attacker() {
    let mut engine = playing(with_player(Archetype::SpeedParrier));
    let player = engine.player().unwrap();

    // Build speed on beats 1-4: the player ends at x = 5.
    let mut snaps = Vec::new();
    for at in [0.5, 1.0, 1.5] {
        snaps.extend(input(&mut engine, at, PlayerCommand::Press));
    }
    // Aims on beat 4 and bites on beat 5.
    let enemy = engine.spawn_enemy(Archetype::DashAttacker, Vec2::new(6.4, 0.0), false);
    snaps.extend(input(&mut engine, 2.0, PlayerCommand::Press));
    assert_eq!(engine.ability(player).unwrap().level, 4);

    snaps.extend(input_with_beat(&mut engine, 2.5, PlayerCommand::Secondary));
    let cues = cues_for(&snaps, player);
    assert!(cues.contains(&Cue::ParryStarted));
    assert!(cues.contains(&Cue::ParryDeflected { attacker: enemy }));
    assert_eq!(engine.health(player).unwrap().current, 3);

    // The counter goes out on beat 6.
    snaps.extend(tick_until(&mut engine, 3.1));
    let cues = cues_for(&snaps, player);
    assert!(cues.contains(&Cue::CounterAttack { target: enemy }));
    assert_eq!(kills_of(&snaps), vec![(player, enemy)]);
    assert_eq!(engine.health(player).unwrap().current, 3);
    assert_eq!(
        engine.ability(player).unwrap().phase,
        AbilityPhase::CounterAttacking
    );

    tick_until(&mut engine, 3.4);
    let state = engine.ability(player).unwrap();
    assert_eq!(state.phase, AbilityPhase::Attacking);
    assert_eq!(state.level, 3);
}

#[test]
fn test_charged_dash_is_invincible() {
    let mut engine = playing(with_player(Archetype::ChargeDasher));
    let player = engine.player().unwrap();

    input(&mut engine, 0.5, PlayerCommand::Press);
    let snaps = tick_until(&mut engine, 1.5);
    let view = &snaps.last().unwrap().actors[0];
    assert_eq!(view.phase, AbilityPhase::Charging);
    assert_eq!(view.beats_in_phase, 2);
    assert!(!view.invincible);

    let snaps = input(&mut engine, 1.5, PlayerCommand::Release);
    assert!(cues_for(&snaps, player).contains(&Cue::InvincibilityChanged { invincible: true }));
    let view = &snaps.last().unwrap().actors[0];
    assert_eq!(view.phase, AbilityPhase::Dashing);
    assert!(view.invincible);
    assert!((view.phase_ends_at_secs.unwrap() - 2.0).abs() < 1e-9);

    let snaps = tick_until(&mut engine, 2.1);
    assert!(cues_for(&snaps, player).contains(&Cue::InvincibilityChanged { invincible: false }));
    let view = &snaps.last().unwrap().actors[0];
    assert_eq!(view.phase, AbilityPhase::Idle);
    assert!(!view.invincible);
    assert_eq!(view.phase_ends_at_secs, None);
}

#[test]
fn test_early_press_still_costs_speed_for_a_skipped_beat() {
    let mut engine = playing(with_player(Archetype::SpeedParrier));
    let player = engine.player().unwrap();

    input(&mut engine, 0.5, PlayerCommand::Press);
    input(&mut engine, 1.0, PlayerCommand::Press);
    tick_until(&mut engine, 1.6);
    assert_eq!(engine.ability(player).unwrap().level, 2);

    // Beat 3 passes untouched; the next press is early for beat 4.
    input(&mut engine, 1.9, PlayerCommand::Press);
    assert_eq!(engine.ability(player).unwrap().level, 3);
    tick_until(&mut engine, 2.05);
    assert_eq!(engine.ability(player).unwrap().level, 2);
}

#[test]
fn test_speed_parrier_keeps_swimming() {
    let mut engine = playing(with_player(Archetype::SpeedParrier));
    let player = engine.player().unwrap();

    input(&mut engine, 0.5, PlayerCommand::Press);
    input(&mut engine, 1.0, PlayerCommand::Press);
    tick_until(&mut engine, 1.6);
    let before = engine.position(player).unwrap();
    tick_until(&mut engine, 1.95);
    let after = engine.position(player).unwrap();
    // Speed 2 covers 1.0 per beat.
    assert!(after.x - before.x > 0.6, "{before:?} -> {after:?}");
}

#[test]
fn test_custom_query_controls_hits() {
    struct NoTargets;

    impl TargetQuery for NoTargets {
        fn candidates(&self, _: &World, _: &DamageRegion, _: Vec2, _: Vec2) -> Vec<Entity> {
            Vec::new()
        }
    }

    let mut engine = SessionEngine::new(SessionConfig::default())
        .unwrap()
        .with_query(NoTargets);
    engine.start().unwrap();
    let dummy = engine.spawn_passive_enemy(Archetype::DashAttacker, Vec2::new(1.0, 0.0));
    input(&mut engine, 1.0, PlayerCommand::Press);
    tick_until(&mut engine, 1.3);
    assert_eq!(engine.health(dummy).unwrap().current, 3);
}

// ---- Kills, combo, death ----

#[test]
fn test_single_kill_extends_combo_then_breaks() {
    let config = SessionConfig {
        max_health: 1,
        ..Default::default()
    };
    let mut engine = playing(config);
    let player = engine.player().unwrap();
    let dummy = engine.spawn_passive_enemy(Archetype::DashAttacker, Vec2::new(1.0, 0.0));

    let mut snaps = input(&mut engine, 1.0, PlayerCommand::Press);
    assert_eq!(kills_of(&snaps), vec![(player, dummy)]);
    assert!(session_events(&snaps).contains(&SessionEvent::DespawnRequested { actor: dummy }));
    assert!(cues_for(&snaps, dummy).contains(&Cue::Died));
    assert!(!engine.is_listening(dummy));
    assert!(engine.entity(dummy).is_none());

    snaps = tick_until(&mut engine, 2.0);
    assert!(session_events(&snaps).contains(&SessionEvent::ComboExtended { combo: 1 }));
    assert_eq!(engine.combo().current_combo(), 1);

    snaps = tick_until(&mut engine, 4.0);
    assert!(session_events(&snaps).contains(&SessionEvent::ComboBroken { lost: 1 }));
    assert_eq!(engine.combo().current_combo(), 0);
    assert_eq!(engine.combo().best_combo(), 1);
}

#[test]
fn test_five_kills_in_a_measure_count_once() {
    let config = SessionConfig {
        player_archetype: Archetype::InflateAttacker,
        max_health: 1,
        ..Default::default()
    };
    let mut engine = playing(config);
    let player = engine.player().unwrap();
    let spots = [(0.5, 0.0), (-0.5, 0.0), (0.0, 0.5), (0.0, -0.5), (0.3, 0.3)];
    let dummies: Vec<ActorId> = spots
        .iter()
        .map(|&(x, y)| engine.spawn_passive_enemy(Archetype::DashAttacker, Vec2::new(x, y)))
        .collect();

    let mut snaps = input(&mut engine, 1.0, PlayerCommand::Press);
    snaps.extend(tick_until(&mut engine, 2.2));

    let kills = kills_of(&snaps);
    assert_eq!(kills.len(), 5);
    for dummy in &dummies {
        assert!(kills.contains(&(player, *dummy)));
    }
    assert_eq!(engine.kills(), 5);
    let combos: Vec<SessionEvent> = session_events(&snaps)
        .into_iter()
        .filter(|e| matches!(e, SessionEvent::ComboExtended { .. }))
        .collect();
    assert_eq!(combos, vec![SessionEvent::ComboExtended { combo: 1 }]);
}

#[test]
fn test_missed_input_breaks_combo() {
    let config = SessionConfig {
        max_health: 1,
        ..Default::default()
    };
    let mut engine = playing(config);
    engine.spawn_passive_enemy(Archetype::DashAttacker, Vec2::new(1.0, 0.0));
    input(&mut engine, 1.0, PlayerCommand::Press);
    tick_until(&mut engine, 2.0);
    assert_eq!(engine.combo().current_combo(), 1);

    let snaps = input(&mut engine, 2.175, PlayerCommand::Press);
    assert!(session_events(&snaps).contains(&SessionEvent::ComboBroken { lost: 1 }));
    assert_eq!(snaps.last().unwrap().combo.current, 0);
}

#[test]
fn test_player_death_requests_restart() {
    let config = SessionConfig {
        max_health: 1,
        enemies: vec![EnemySpawn {
            archetype: Archetype::DashAttacker,
            x: 1.0,
            y: 0.0,
            attack_every_beat: true,
        }],
        ..Default::default()
    };
    let mut engine = playing(config);
    let player = engine.player().unwrap();

    // Aim on beat 1, bite on beat 2.
    let snaps = tick_until(&mut engine, 1.0);
    let last = snaps.last().unwrap();
    assert_eq!(last.phase, GamePhase::GameOver);
    let events = session_events(&snaps);
    assert_eq!(
        events
            .iter()
            .filter(|e| matches!(e, SessionEvent::RestartRequested))
            .count(),
        1
    );
    assert_eq!(kills_of(&snaps), vec![(ActorId(1), player)]);
    // Enemy kills don't count toward the player's tally.
    assert_eq!(engine.kills(), 0);
    // The dead player stays visible until restart.
    assert_eq!(engine.health(player).unwrap().current, 0);

    // Game over: further input and beats are ignored.
    engine.queue_command(PlayerCommand::Press);
    let snap = engine.tick(1.5);
    assert!(snap.presentation.is_empty());

    engine.queue_command(PlayerCommand::Restart);
    let snap = engine.tick(0.0);
    assert_eq!(snap.phase, GamePhase::Ready);
    assert_eq!(snap.actors.len(), 2);
    assert_eq!(engine.health(player).unwrap().current, 1);
    assert_eq!(engine.clock().last_emitted_beat(), 0);

    engine.queue_command(PlayerCommand::Start);
    assert_eq!(engine.tick(0.1).phase, GamePhase::Playing);
}

#[test]
fn test_select_archetype_in_ready_rebuilds_player() {
    let mut engine = SessionEngine::new(SessionConfig::default()).unwrap();
    engine.queue_command(PlayerCommand::SelectArchetype {
        archetype: Archetype::SpeedParrier,
    });
    let snap = engine.tick(0.0);
    assert_eq!(snap.actors[0].archetype, Archetype::SpeedParrier);

    // While playing it waits for the next restart.
    engine.start().unwrap();
    engine.queue_command(PlayerCommand::SelectArchetype {
        archetype: Archetype::ChargeDasher,
    });
    let snap = engine.tick(0.1);
    assert_eq!(snap.actors[0].archetype, Archetype::SpeedParrier);
    engine.restart();
    let snap = engine.tick(0.0);
    assert_eq!(snap.actors[0].archetype, Archetype::ChargeDasher);
}

#[test]
fn test_despawn_cancels_pending_deadlines() {
    let mut engine = playing(with_player(Archetype::InflateAttacker));
    let player = engine.player().unwrap();
    input(&mut engine, 1.0, PlayerCommand::Press);
    assert_eq!(engine.pending_deadlines(), 1);

    assert!(engine.despawn(player));
    assert_eq!(engine.pending_deadlines(), 0);
    assert!(engine.player().is_none());
    assert!(!engine.despawn(player));
}

// ---- Determinism ----

fn scripted_run() -> Vec<String> {
    let config = SessionConfig {
        player_archetype: Archetype::InflateAttacker,
        enemies: vec![
            EnemySpawn {
                archetype: Archetype::DashAttacker,
                x: 3.0,
                y: 1.0,
                attack_every_beat: true,
            },
            EnemySpawn {
                archetype: Archetype::ChargeDasher,
                x: -4.0,
                y: 0.0,
                attack_every_beat: true,
            },
            EnemySpawn {
                archetype: Archetype::SpeedParrier,
                x: 0.0,
                y: 5.0,
                attack_every_beat: false,
            },
        ],
        ..Default::default()
    };
    let mut engine = playing(config);
    let mut out = Vec::new();
    for n in 1..=600u32 {
        let t = n as f64 * DT;
        if n % 30 == 0 {
            engine.queue_command(PlayerCommand::Press);
        }
        if n % 90 == 45 {
            engine.queue_command(PlayerCommand::Secondary);
        }
        out.push(serde_json::to_string(&engine.tick(t)).unwrap());
    }
    out
}

#[test]
fn test_determinism_same_script() {
    let a = scripted_run();
    let b = scripted_run();
    assert_eq!(a.len(), b.len());
    for (tick, (json_a, json_b)) in a.iter().zip(b.iter()).enumerate() {
        assert_eq!(json_a, json_b, "snapshots diverged at tick {tick}");
    }
}

// ---- Randomized invariants ----

#[test]
fn test_random_sessions_keep_invariants() {
    let archetypes = [
        Archetype::DashAttacker,
        Archetype::InflateAttacker,
        Archetype::ChargeDasher,
        Archetype::SpeedParrier,
    ];

    for seed in 0..8u64 {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let enemies = (0..4)
            .map(|_| EnemySpawn {
                archetype: archetypes[rng.gen_range(0..4)],
                x: rng.gen_range(-4.0..4.0),
                y: rng.gen_range(-4.0..4.0),
                attack_every_beat: rng.gen_bool(0.5),
            })
            .collect();
        let config = SessionConfig {
            player_archetype: archetypes[rng.gen_range(0..4)],
            enemies,
            ..Default::default()
        };
        let mut engine = playing(config);

        let mut last_beat = 0;
        let mut killed: Vec<ActorId> = Vec::new();
        let mut t = 0.0;
        for _ in 0..900 {
            t += DT * rng.gen_range(0.5..1.5);
            if rng.gen_bool(0.08) {
                let command = match rng.gen_range(0..4) {
                    0 => PlayerCommand::Press,
                    1 => PlayerCommand::Release,
                    2 => PlayerCommand::Secondary,
                    _ => PlayerCommand::Aim {
                        x: rng.gen_range(-5.0..5.0),
                        y: rng.gen_range(-5.0..5.0),
                    },
                };
                engine.queue_command(command);
            }
            let snap = engine.tick(t);

            for event in &snap.presentation {
                if let Cue::BeatPulse { beat } = event.cue {
                    assert!(beat > last_beat, "seed {seed}: beat {beat} after {last_beat}");
                    last_beat = beat;
                }
            }
            for event in &snap.session_events {
                if let SessionEvent::Kill { target, .. } = event {
                    assert!(!killed.contains(target), "seed {seed}: {target:?} died twice");
                    killed.push(*target);
                }
            }
            for actor in &snap.actors {
                assert!(actor.health <= actor.max_health);
                assert!(actor.level <= get_profile(actor.archetype).max_level);
            }
            if snap.phase == GamePhase::GameOver {
                break;
            }
        }
    }
}

// ---- Combat gate ----

fn duel() -> (World, Entity, Entity) {
    let mut world = World::new();
    let player = world_setup::spawn_player(&mut world, ActorId(0), Archetype::DashAttacker, 3);
    let enemy = world_setup::spawn_enemy(
        &mut world,
        ActorId(1),
        Archetype::DashAttacker,
        Vec2::new(1.0, 0.0),
        3,
        true,
        0,
    );
    (world, player, enemy)
}

#[test]
fn test_try_damage_rules() {
    let (mut world, player, enemy) = duel();

    assert_eq!(
        try_damage(&mut world, player, player, 1, 1),
        DamageOutcome::Rejected(RejectedDamage::SelfHit)
    );

    let outcome = try_damage(&mut world, enemy, player, 2, 1);
    assert_eq!(
        outcome,
        DamageOutcome::Applied {
            remaining: 1,
            killed: false,
            hit_invincibility: true
        }
    );
    assert!(outcome.is_applied());
    assert_eq!(world.get::<&Invincibility>(player).unwrap().beats_remaining, 1);

    // Hit recovery.
    assert_eq!(
        try_damage(&mut world, enemy, player, 1, 1),
        DamageOutcome::Rejected(RejectedDamage::Invincible)
    );

    // Overkill floors at zero and heals the killer.
    let outcome = try_damage(&mut world, player, enemy, 10, 1);
    assert_eq!(
        outcome,
        DamageOutcome::Applied {
            remaining: 0,
            killed: true,
            hit_invincibility: false
        }
    );
    assert_eq!(world.get::<&Health>(enemy).unwrap().current, 0);
    assert_eq!(world.get::<&Health>(player).unwrap().current, 2);

    // A corpse is never killed twice.
    assert_eq!(
        try_damage(&mut world, player, enemy, 1, 1),
        DamageOutcome::Rejected(RejectedDamage::AlreadyDead)
    );
}

#[test]
fn test_try_damage_faction_and_heal_cap() {
    let (mut world, player, enemy) = duel();
    let other = world_setup::spawn_enemy(
        &mut world,
        ActorId(2),
        Archetype::InflateAttacker,
        Vec2::new(2.0, 0.0),
        1,
        true,
        0,
    );
    assert_eq!(
        try_damage(&mut world, enemy, other, 1, 1),
        DamageOutcome::Rejected(RejectedDamage::WrongFaction)
    );

    assert!(try_damage(&mut world, player, other, 1, 1).is_applied());
    assert_eq!(world.get::<&Health>(player).unwrap().current, 3);
}

#[test]
fn test_parrying_target_negates_hit() {
    let (mut world, player, enemy) = duel();
    world
        .get::<&mut AbilityState>(player)
        .unwrap()
        .phase = AbilityPhase::Parrying;
    assert_eq!(
        try_damage(&mut world, enemy, player, 1, 1),
        DamageOutcome::Parried
    );
    assert_eq!(world.get::<&Health>(player).unwrap().current, 3);
}

#[test]
fn test_held_invincibility_rejects_hits() {
    let (mut world, player, enemy) = duel();
    world.get::<&mut Invincibility>(player).unwrap().held_by_ability = true;
    assert_eq!(
        try_damage(&mut world, enemy, player, 1, 1),
        DamageOutcome::Rejected(RejectedDamage::Invincible)
    );
    assert_eq!(world.get::<&Health>(player).unwrap().current, 3);
}

// ---- Query and systems ----

#[test]
fn test_proximity_query_orders_by_id() {
    let (world, player, enemy) = duel();
    let region = DamageRegion::Circle { radius: 5.0 };
    let hits = ProximityQuery.candidates(&world, &region, Vec2::ZERO, Vec2::X);
    assert_eq!(hits, vec![player, enemy]);

    let cone = DamageRegion::Cone {
        range: 1.5,
        half_angle_deg: 30.0,
    };
    let hits = ProximityQuery.candidates(&world, &cone, Vec2::new(0.5, 0.0), Vec2::NEG_X);
    assert_eq!(hits, vec![player]);
}

#[test]
fn test_motion_interpolates_by_song_time() {
    let motion = Motion {
        from: Vec2::ZERO,
        to: Vec2::new(2.0, 0.0),
        started_secs: 1.0,
        duration_secs: 0.5,
    };
    assert_eq!(motion.position_at(0.5), Vec2::ZERO);
    assert_eq!(motion.position_at(1.25), Vec2::new(1.0, 0.0));
    assert_eq!(motion.position_at(9.0), Vec2::new(2.0, 0.0));

    let instant = Motion {
        duration_secs: 0.0,
        ..motion
    };
    assert_eq!(instant.progress(0.0), 1.0);
}

#[test]
fn test_cleanup_keeps_dead_player() {
    let (mut world, player, enemy) = duel();
    world.get::<&mut Health>(player).unwrap().current = 0;
    world.get::<&mut Health>(enemy).unwrap().current = 0;
    let mut buffer = Vec::new();
    let removed = crate::systems::cleanup::run(&mut world, &mut buffer);
    assert_eq!(removed, vec![ActorId(1)]);
    assert!(world.contains(player));
    assert!(!world.contains(enemy));
}

// ---- Combo tracker ----

#[test]
fn test_combo_measure_evaluation() {
    let mut combo = ComboTracker::new(4);
    for beat in 1..=4 {
        assert_eq!(combo.on_beat(beat), None);
    }
    assert_eq!(combo.current_combo(), 0);

    combo.on_kill();
    assert_eq!(combo.kills_this_measure(), 1);
    for beat in 5..=7 {
        assert_eq!(combo.on_beat(beat), None);
    }
    assert_eq!(combo.on_beat(8), Some(ComboChange::Extended { combo: 1 }));
    assert_eq!(combo.kills_this_measure(), 0);

    for _ in 0..5 {
        combo.on_kill();
    }
    for beat in 9..=12 {
        combo.on_beat(beat);
    }
    assert_eq!(combo.current_combo(), 2);

    for beat in 13..=16 {
        combo.on_beat(beat);
    }
    assert_eq!(combo.current_combo(), 0);
    assert_eq!(combo.best_combo(), 2);
}

#[test]
fn test_combo_miss_breaks_immediately() {
    let mut combo = ComboTracker::new(2);
    assert_eq!(combo.on_missed_beat(), None);
    combo.on_kill();
    combo.on_beat(1);
    combo.on_beat(2);
    assert_eq!(combo.on_missed_beat(), Some(ComboChange::Broken { lost: 1 }));
    assert_eq!(combo.view().current, 0);
    assert_eq!(combo.view().best, 1);
}
