//! Snapshot system: builds the `SessionSnapshot` handed to presentation.
//!
//! Read-only over the world. Actors are listed in id order so two runs with
//! the same inputs serialize identically.

use hecs::World;

use reefbeat_core::components::*;
use reefbeat_core::enums::GamePhase;
use reefbeat_core::events::{PresentationEvent, SessionEvent};
use reefbeat_core::state::*;
use reefbeat_core::types::SimTime;

/// Everything outside the world that goes into a snapshot.
pub struct SnapshotInputs {
    pub time: SimTime,
    pub phase: GamePhase,
    pub beat: BeatView,
    pub punished: bool,
    pub combo: ComboView,
    pub kills: u32,
    pub presentation: Vec<PresentationEvent>,
    pub session_events: Vec<SessionEvent>,
}

pub fn build_snapshot(world: &World, inputs: SnapshotInputs) -> SessionSnapshot {
    SessionSnapshot {
        time: inputs.time,
        phase: inputs.phase,
        beat: inputs.beat,
        punished: inputs.punished,
        combo: inputs.combo,
        actors: build_actors(world),
        presentation: inputs.presentation,
        session_events: inputs.session_events,
        kills: inputs.kills,
    }
}

fn build_actors(world: &World) -> Vec<ActorView> {
    let mut actors: Vec<ActorView> = world
        .query::<(
            &Actor,
            &Position,
            &Facing,
            &Health,
            &Invincibility,
            &Combatant,
            &AbilityState,
        )>()
        .iter()
        .map(
            |(_, (actor, pos, facing, health, inv, combatant, ability))| ActorView {
                id: actor.id,
                archetype: actor.archetype,
                faction: combatant.faction,
                is_player: combatant.is_player,
                position: pos.0,
                facing: facing.0,
                health: health.current,
                max_health: health.max,
                invincible: inv.is_active(),
                phase: ability.phase,
                beats_in_phase: ability.beats_in_phase,
                phase_ends_at_secs: ability.phase_ends_at_secs,
                level: ability.level,
                damage_window_open: ability.damage_window_open,
            },
        )
        .collect();

    actors.sort_by_key(|a| a.id);
    actors
}
