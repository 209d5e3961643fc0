//! session-replay: drive a headless REEFBEAT session from a script or from
//! synthetic on-beat input, and report what happened.
//!
//! Usage:
//!   session-replay script --script inputs.json --config session.json --seconds 30
//!   session-replay synthetic --beats 64 --jitter-ms 40 --seed 7 --json

use std::path::PathBuf;
use std::process;

use log::debug;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::Deserialize;

use reefbeat_core::commands::PlayerCommand;
use reefbeat_core::config::SessionConfig;
use reefbeat_core::constants::{DEFAULT_SAMPLE_RATE, TICK_RATE};
use reefbeat_core::enums::{Archetype, GamePhase, Verdict};
use reefbeat_core::events::{Cue, SessionEvent};
use reefbeat_core::state::SessionSnapshot;
use reefbeat_sim::SessionEngine;
use reefbeat_timing::{AudioPositionSource, SampleClock};

/// One scripted input: issue `command` once playback reaches `at_secs`.
#[derive(Debug, Clone, Deserialize)]
struct ScriptEntry {
    at_secs: f64,
    command: PlayerCommand,
}

fn main() {
    env_logger::init();
    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        print_usage();
        process::exit(1);
    }

    match args[1].as_str() {
        "script" => cmd_script(&args[2..]),
        "synthetic" => cmd_synthetic(&args[2..]),
        "help" | "--help" | "-h" => print_usage(),
        other => {
            eprintln!("Unknown command: {other}");
            print_usage();
            process::exit(1);
        }
    }
}

fn print_usage() {
    eprintln!(
        "session-replay: headless REEFBEAT session runner\n\
         \n\
         Commands:\n\
         \n\
         script     Replay a JSON input script\n\
         \n\
           --script <path>    [{{\"at_secs\": 1.0, \"command\": {{\"type\": \"Press\"}}}}, ...]\n\
           --config <path>    Session config JSON (optional, defaults otherwise)\n\
           --seconds <S>      Song length to run (default: last input + 2s)\n\
           --json             Print the final snapshot as JSON\n\
         \n\
         synthetic  Generate on-beat input for the player archetype\n\
         \n\
           --config <path>    Session config JSON (optional)\n\
           --beats <N>        Beats to play (default: 32)\n\
           --jitter-ms <MS>   Max timing error per input, either side (default: 30)\n\
           --seed <N>         RNG seed for the jitter (default: 42)\n\
           --json             Print the final snapshot as JSON\n\
         \n\
         Examples:\n\
         \n\
           session-replay script --script run.json --config pufferfish.json\n\
           session-replay synthetic --beats 64 --jitter-ms 120 --seed 3\n"
    );
}

fn parse_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    for i in 0..args.len() {
        if args[i] == flag && i + 1 < args.len() {
            return Some(args[i + 1].as_str());
        }
    }
    None
}

fn parse_number<T: std::str::FromStr>(args: &[String], flag: &str, default: T) -> T {
    match parse_value(args, flag) {
        Some(raw) => match raw.parse::<T>() {
            Ok(n) => n,
            Err(_) => {
                eprintln!("Error: {flag} expects a number, got {raw:?}");
                process::exit(1);
            }
        },
        None => default,
    }
}

fn has_flag(args: &[String], flag: &str) -> bool {
    args.iter().any(|a| a == flag)
}

fn load_config(args: &[String]) -> SessionConfig {
    let Some(path) = parse_value(args, "--config").map(PathBuf::from) else {
        return SessionConfig::default();
    };
    let json = match std::fs::read_to_string(&path) {
        Ok(json) => json,
        Err(e) => {
            eprintln!("Error reading {}: {e}", path.display());
            process::exit(1);
        }
    };
    match SessionConfig::from_json_str(&json) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Invalid config {}: {e}", path.display());
            process::exit(1);
        }
    }
}

// --- Script command ---

fn cmd_script(args: &[String]) {
    let path = match parse_value(args, "--script") {
        Some(p) => PathBuf::from(p),
        None => {
            eprintln!("Error: --script <path> is required");
            process::exit(1);
        }
    };
    let json = match std::fs::read_to_string(&path) {
        Ok(json) => json,
        Err(e) => {
            eprintln!("Error reading {}: {e}", path.display());
            process::exit(1);
        }
    };
    let mut script: Vec<ScriptEntry> = match serde_json::from_str(&json) {
        Ok(entries) => entries,
        Err(e) => {
            eprintln!("Invalid script {}: {e}", path.display());
            process::exit(1);
        }
    };
    script.sort_by(|a, b| a.at_secs.total_cmp(&b.at_secs));

    let config = load_config(args);
    let last_input = script.last().map(|e| e.at_secs).unwrap_or(0.0);
    let seconds = parse_number(args, "--seconds", last_input + 2.0);

    eprintln!("Replaying {} inputs over {seconds:.1}s", script.len());
    let report = run_session(config, &script, seconds);
    print_report(&report, has_flag(args, "--json"));
}

// --- Synthetic command ---

fn cmd_synthetic(args: &[String]) {
    let config = load_config(args);
    let beats: u32 = parse_number(args, "--beats", 32);
    let jitter_ms: f64 = parse_number(args, "--jitter-ms", 30.0);
    let seed: u64 = parse_number(args, "--seed", 42);

    let script = synthetic_script(&config, beats, jitter_ms / 1000.0, seed);
    let seconds = config.first_beat_offset_secs + (beats + 1) as f64 * config.seconds_per_beat();

    eprintln!(
        "Synthetic {:?} run: {beats} beats at {} bpm, ±{jitter_ms}ms jitter, seed {seed}",
        config.player_archetype, config.bpm
    );
    let report = run_session(config, &script, seconds);
    print_report(&report, has_flag(args, "--json"));
}

/// Inputs a reasonable player of the configured archetype would make.
fn synthetic_script(
    config: &SessionConfig,
    beats: u32,
    jitter_secs: f64,
    seed: u64,
) -> Vec<ScriptEntry> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let spb = config.seconds_per_beat();
    let mut script = Vec::new();

    let mut push = |beat: u32, command: PlayerCommand, rng: &mut ChaCha8Rng| {
        let jitter = if jitter_secs > 0.0 {
            rng.gen_range(-jitter_secs..=jitter_secs)
        } else {
            0.0
        };
        let at_secs = config.first_beat_offset_secs + beat as f64 * spb + jitter;
        script.push(ScriptEntry {
            at_secs: at_secs.max(0.0),
            command,
        });
    };

    for beat in 1..=beats {
        match config.player_archetype {
            Archetype::DashAttacker => push(beat, PlayerCommand::Press, &mut rng),
            // Three inflates, then deflate away.
            Archetype::InflateAttacker => {
                let command = if beat % 4 == 0 {
                    PlayerCommand::Secondary
                } else {
                    PlayerCommand::Press
                };
                push(beat, command, &mut rng);
            }
            // Hold for three beats, release on the fourth.
            Archetype::ChargeDasher => match beat % 4 {
                1 => push(beat, PlayerCommand::Press, &mut rng),
                0 => push(beat, PlayerCommand::Release, &mut rng),
                _ => {}
            },
            // Keep speed up and parry every sixth beat once at full speed.
            Archetype::SpeedParrier => {
                if beat > 4 && beat % 6 == 0 {
                    push(beat, PlayerCommand::Secondary, &mut rng);
                } else {
                    push(beat, PlayerCommand::Press, &mut rng);
                }
            }
        }
    }

    script.sort_by(|a, b| a.at_secs.total_cmp(&b.at_secs));
    script
}

// --- Session loop ---

#[derive(Debug, Default)]
struct Report {
    ticks: u64,
    beats: u32,
    on_time: u32,
    missed: u32,
    blocked: u32,
    kills: u32,
    best_combo: u32,
    died_at_secs: Option<f64>,
    final_snapshot: SessionSnapshot,
}

fn run_session(config: SessionConfig, script: &[ScriptEntry], seconds: f64) -> Report {
    let mut engine = match SessionEngine::new(config) {
        Ok(engine) => engine,
        Err(e) => {
            eprintln!("Cannot build session: {e}");
            process::exit(1);
        }
    };
    if let Err(e) = engine.start() {
        eprintln!("Cannot start session: {e}");
        process::exit(1);
    }

    let mut audio = SampleClock::new(DEFAULT_SAMPLE_RATE);
    let samples_per_tick = (DEFAULT_SAMPLE_RATE / TICK_RATE) as u64;
    let mut next_input = 0;
    let mut report = Report::default();

    while audio.position_secs() < seconds {
        audio.advance_samples(samples_per_tick);
        let due = script[next_input..]
            .iter()
            .take_while(|entry| entry.at_secs <= audio.position_secs())
            .count();
        for entry in &script[next_input..next_input + due] {
            debug!("{:.3}s: {:?}", audio.position_secs(), entry.command);
        }
        engine.queue_commands(
            script[next_input..next_input + due]
                .iter()
                .map(|entry| entry.command.clone()),
        );
        next_input += due;

        let snapshot = engine.tick_with_source(&audio);
        tally(&mut report, &snapshot);
        report.final_snapshot = snapshot;

        if engine.phase() == GamePhase::GameOver {
            report.died_at_secs = Some(audio.position_secs());
            break;
        }
    }

    report.kills = engine.kills();
    report.best_combo = engine.combo().best_combo();
    report
}

fn tally(report: &mut Report, snapshot: &SessionSnapshot) {
    report.ticks += 1;
    for event in &snapshot.presentation {
        match event.cue {
            Cue::BeatPulse { .. } => report.beats += 1,
            Cue::InputFeedback {
                verdict: Verdict::OnTime,
                ..
            } => report.on_time += 1,
            Cue::InputFeedback {
                verdict: Verdict::Missed,
                ..
            } => report.missed += 1,
            Cue::InputBlocked => report.blocked += 1,
            _ => {}
        }
    }
    for event in &snapshot.session_events {
        if let SessionEvent::Kill { attacker, target } = event {
            eprintln!(
                "  {:.2}s: actor {} killed actor {}",
                snapshot.time.song_secs, attacker.0, target.0
            );
        }
    }
}

fn print_report(report: &Report, as_json: bool) {
    if as_json {
        match serde_json::to_string_pretty(&report.final_snapshot) {
            Ok(json) => println!("{json}"),
            Err(e) => {
                eprintln!("Error serializing snapshot: {e}");
                process::exit(1);
            }
        }
        return;
    }

    println!("Ticks:       {}", report.ticks);
    println!("Beats:       {}", report.beats);
    println!("On time:     {}", report.on_time);
    println!("Missed:      {}", report.missed);
    println!("Blocked:     {}", report.blocked);
    println!("Kills:       {}", report.kills);
    println!("Best combo:  {}", report.best_combo);
    match report.died_at_secs {
        Some(secs) => println!("Player died at {secs:.2}s"),
        None => {
            let survivors = report
                .final_snapshot
                .actors
                .iter()
                .filter(|a| !a.is_player && a.health > 0)
                .count();
            println!("Survived; {survivors} enemies left");
        }
    }
}
