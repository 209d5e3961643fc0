//! Session engine: the heart of a run.
//!
//! `SessionEngine` owns the hecs world together with the beat clock, the
//! timing judge, the punishment window, the listener registry, the deadline
//! scheduler and the combo tracker. The host drives it with the audio
//! position once per frame and gets a `SessionSnapshot` back. Completely
//! headless, so whole sessions can be replayed deterministically in tests.

use std::collections::{HashMap, VecDeque};

use glam::Vec2;
use hecs::{Entity, World};
use log::{debug, info, warn};

use reefbeat_abilities::brain::{self, BrainContext};
use reefbeat_abilities::fsm::{self, AbilityContext, Effect, Trigger};
use reefbeat_core::commands::PlayerCommand;
use reefbeat_core::components::*;
use reefbeat_core::config::SessionConfig;
use reefbeat_core::constants::NOSE_RADIUS;
use reefbeat_core::enums::{Archetype, DeadlineKind, Faction, GamePhase, RejectedDamage, Verdict};
use reefbeat_core::error::ConfigError;
use reefbeat_core::events::{Cue, PresentationEvent, SessionEvent};
use reefbeat_core::state::{BeatView, SessionSnapshot};
use reefbeat_core::types::{ActorId, DamageRegion, SimTime};
use reefbeat_timing::{
    AudioPositionSource, BeatClock, DeadlineScheduler, ListenerRegistry, PunishmentWindow,
    TimingJudge,
};

use crate::combat::{self, DamageOutcome};
use crate::combo::{ComboChange, ComboTracker};
use crate::components::{DamageWindow, Motion, PendingDeadlines};
use crate::query::{ProximityQuery, TargetQuery};
use crate::systems;
use crate::systems::snapshot::SnapshotInputs;
use crate::world_setup;

/// Who gets called when a beat is crossed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenerKey {
    Combo,
    Actor(ActorId),
}

/// What a scheduled deadline delivers when it fires.
#[derive(Debug, Clone, Copy)]
struct DeadlinePayload {
    actor: ActorId,
    kind: DeadlineKind,
    epoch: u32,
}

/// The session engine. Owns the ECS world and all timing state.
pub struct SessionEngine {
    config: SessionConfig,
    world: World,
    time: SimTime,
    phase: GamePhase,
    player_archetype: Archetype,
    clock: BeatClock,
    judge: TimingJudge,
    punishment: PunishmentWindow,
    listeners: ListenerRegistry<ListenerKey>,
    deadlines: DeadlineScheduler<DeadlinePayload>,
    combo: ComboTracker,
    query: Box<dyn TargetQuery>,
    next_actor_id: u32,
    actors: HashMap<ActorId, Entity>,
    player: Option<ActorId>,
    command_queue: VecDeque<PlayerCommand>,
    despawn_buffer: Vec<Entity>,
    motion_buffer: Vec<Entity>,
    presentation: Vec<PresentationEvent>,
    session_events: Vec<SessionEvent>,
    kills: u32,
}

impl SessionEngine {
    /// Validate the config and build the starting roster.
    pub fn new(config: SessionConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let clock = BeatClock::from_config(&config)?;
        let judge = TimingJudge::new(config.input_threshold_secs, clock.seconds_per_beat())?;
        let punishment =
            PunishmentWindow::from_threshold(config.input_threshold_secs, clock.seconds_per_beat());

        let mut engine = Self {
            world: World::new(),
            time: SimTime::default(),
            phase: GamePhase::default(),
            player_archetype: config.player_archetype,
            clock,
            judge,
            punishment,
            listeners: ListenerRegistry::new(),
            deadlines: DeadlineScheduler::new(),
            combo: ComboTracker::new(config.beats_per_measure),
            query: Box::new(ProximityQuery),
            next_actor_id: 0,
            actors: HashMap::new(),
            player: None,
            command_queue: VecDeque::new(),
            despawn_buffer: Vec::new(),
            motion_buffer: Vec::new(),
            presentation: Vec::new(),
            session_events: Vec::new(),
            kills: 0,
            config,
        };
        engine.populate();
        Ok(engine)
    }

    /// Replace the spatial lookup used for strikes and damage windows.
    pub fn with_query(mut self, query: impl TargetQuery + 'static) -> Self {
        self.query = Box::new(query);
        self
    }

    /// Leave `Ready` and start consuming the audio position.
    pub fn start(&mut self) -> Result<(), ConfigError> {
        self.listeners.require_listeners()?;
        if self.phase == GamePhase::Ready {
            info!(
                "session started at {} bpm with {} beat listeners",
                self.clock.bpm(),
                self.listeners.len()
            );
            self.phase = GamePhase::Playing;
        }
        Ok(())
    }

    /// Queue a player command for processing at the next tick boundary.
    pub fn queue_command(&mut self, command: PlayerCommand) {
        self.command_queue.push_back(command);
    }

    /// Queue multiple commands.
    pub fn queue_commands(&mut self, commands: impl IntoIterator<Item = PlayerCommand>) {
        self.command_queue.extend(commands);
    }

    /// Advance the session to `audio_position_secs` and return the snapshot.
    pub fn tick(&mut self, audio_position_secs: f64) -> SessionSnapshot {
        if self.phase == GamePhase::Playing {
            let crossed = self.clock.advance(audio_position_secs);
            self.time.advance_to(self.clock.song_position_secs());
            if self.punishment.tick(self.clock.song_position_beats()) {
                debug!("punishment lifted at {:.3} beats", self.clock.song_position_beats());
            }
            if let Some(beat) = crossed {
                // Deadlines due before the crossed beat fire ahead of it.
                self.fire_due_deadlines(self.clock.beat_time_secs(beat));
                self.dispatch_beat(beat);
            }
            if self.phase == GamePhase::Playing {
                self.fire_due_deadlines(self.clock.song_position_secs());
            }
        }

        self.process_commands();

        if self.phase == GamePhase::Playing {
            let now = self.clock.song_position_secs();
            systems::motion::run(&mut self.world, now, &mut self.motion_buffer);
            self.sweep_damage_windows();
            for id in systems::cleanup::run(&mut self.world, &mut self.despawn_buffer) {
                self.actors.remove(&id);
            }
        }

        self.snapshot()
    }

    /// Tick from any audio position source.
    pub fn tick_with_source(&mut self, source: &impl AudioPositionSource) -> SessionSnapshot {
        self.tick(source.position_secs())
    }

    /// Add an enemy driven by the beat brain.
    pub fn spawn_enemy(
        &mut self,
        archetype: Archetype,
        position: Vec2,
        attack_every_beat: bool,
    ) -> ActorId {
        let id = self.allocate_id();
        let entity = world_setup::spawn_enemy(
            &mut self.world,
            id,
            archetype,
            position,
            self.config.max_health,
            attack_every_beat,
            self.config.enemy_attack_cooldown_beats,
        );
        self.register(id, entity);
        id
    }

    /// Add an enemy with no brain. It still runs its ability on the beat.
    pub fn spawn_passive_enemy(&mut self, archetype: Archetype, position: Vec2) -> ActorId {
        let id = self.allocate_id();
        let entity = world_setup::spawn_fish(
            &mut self.world,
            id,
            archetype,
            Faction::Enemy,
            position,
            self.config.max_health,
        );
        self.register(id, entity);
        id
    }

    /// Remove a fish right away, cancelling everything it was waiting on.
    pub fn despawn(&mut self, id: ActorId) -> bool {
        let Some(entity) = self.actors.remove(&id) else {
            return false;
        };
        self.listeners.unsubscribe(&ListenerKey::Actor(id));
        if let Ok(mut pending) = self.world.get::<&mut PendingDeadlines>(entity) {
            for handle in pending.take_all() {
                self.deadlines.cancel(handle);
            }
        }
        if self.player == Some(id) {
            self.player = None;
        }
        self.world.despawn(entity).is_ok()
    }

    /// Tear everything down and rebuild the roster from the config.
    pub fn restart(&mut self) {
        info!("restarting session (best combo {})", self.combo.best_combo());
        self.world.clear();
        self.actors.clear();
        self.player = None;
        self.next_actor_id = 0;
        self.listeners.clear();
        self.deadlines.clear();
        self.clock.restart();
        self.punishment.reset();
        self.combo.reset();
        self.time = SimTime::default();
        self.kills = 0;
        self.populate();
        self.phase = GamePhase::Ready;
    }

    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    pub fn time(&self) -> SimTime {
        self.time
    }

    pub fn clock(&self) -> &BeatClock {
        &self.clock
    }

    pub fn combo(&self) -> &ComboTracker {
        &self.combo
    }

    pub fn kills(&self) -> u32 {
        self.kills
    }

    pub fn player(&self) -> Option<ActorId> {
        self.player
    }

    pub fn is_punished(&self) -> bool {
        self.punishment.is_punished()
    }

    pub fn pending_deadlines(&self) -> usize {
        self.deadlines.len()
    }

    pub fn is_listening(&self, id: ActorId) -> bool {
        self.listeners.contains(&ListenerKey::Actor(id))
    }

    /// Get a read-only reference to the ECS world.
    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn entity(&self, id: ActorId) -> Option<Entity> {
        self.actors.get(&id).copied()
    }

    pub fn ability(&self, id: ActorId) -> Option<AbilityState> {
        let entity = self.entity(id)?;
        let state = self.world.get::<&AbilityState>(entity).ok()?;
        Some(AbilityState::clone(&state))
    }

    pub fn health(&self, id: ActorId) -> Option<Health> {
        let entity = self.entity(id)?;
        let health = self.world.get::<&Health>(entity).ok()?;
        Some(*health)
    }

    pub fn position(&self, id: ActorId) -> Option<Vec2> {
        let entity = self.entity(id)?;
        let pos = self.world.get::<&Position>(entity).ok()?;
        Some(pos.0)
    }

    // --- Roster ---

    fn populate(&mut self) {
        if self.config.track_combo {
            self.listeners.subscribe(ListenerKey::Combo);
        }
        if self.config.spawn_player {
            let id = self.allocate_id();
            let entity = world_setup::spawn_player(
                &mut self.world,
                id,
                self.player_archetype,
                self.config.max_health,
            );
            self.register(id, entity);
            self.player = Some(id);
        }
        let spawns = self.config.enemies.clone();
        for spawn in spawns {
            self.spawn_enemy(
                spawn.archetype,
                Vec2::new(spawn.x, spawn.y),
                spawn.attack_every_beat,
            );
        }
    }

    fn allocate_id(&mut self) -> ActorId {
        let id = ActorId(self.next_actor_id);
        self.next_actor_id += 1;
        id
    }

    fn register(&mut self, id: ActorId, entity: Entity) {
        self.actors.insert(id, entity);
        self.listeners.subscribe(ListenerKey::Actor(id));
    }

    fn actor_id(&self, entity: Entity) -> Option<ActorId> {
        self.world.get::<&Actor>(entity).ok().map(|actor| actor.id)
    }

    /// Player entity, if it is still alive.
    fn live_player(&self) -> Option<(ActorId, Entity)> {
        let id = self.player?;
        let entity = self.entity(id)?;
        let alive = self
            .world
            .get::<&Health>(entity)
            .map(|health| !health.is_dead())
            .unwrap_or(false);
        alive.then_some((id, entity))
    }

    fn placement(&self, entity: Entity) -> (Vec2, Vec2) {
        let origin = self
            .world
            .get::<&Position>(entity)
            .map(|pos| pos.0)
            .unwrap_or_default();
        let facing = self
            .world
            .get::<&Facing>(entity)
            .map(|facing| facing.0)
            .unwrap_or(Vec2::X);
        (origin, facing)
    }

    fn set_facing(&mut self, entity: Entity, direction: Vec2) {
        if direction == Vec2::ZERO {
            return;
        }
        if let Ok(mut facing) = self.world.get::<&mut Facing>(entity) {
            facing.0 = direction;
        }
    }

    fn present(&mut self, id: ActorId, cue: Cue) {
        self.presentation.push(PresentationEvent::for_actor(id, cue));
    }

    fn push_combo_change(&mut self, change: ComboChange) {
        self.session_events.push(match change {
            ComboChange::Extended { combo } => SessionEvent::ComboExtended { combo },
            ComboChange::Broken { lost } => SessionEvent::ComboBroken { lost },
        });
    }

    // --- Beat grid ---

    fn ability_context(&self, beat: i64, now_secs: f64) -> AbilityContext {
        AbilityContext {
            beat,
            now_secs,
            seconds_per_beat: self.clock.seconds_per_beat(),
            first_beat_offset_secs: self.clock.first_beat_offset_secs(),
            input_threshold_secs: self.judge.input_threshold_secs(),
        }
    }

    /// Whole beat that song time `secs` falls into.
    fn beat_at(&self, secs: f64) -> i64 {
        self.clock
            .seconds_to_beats(secs - self.clock.first_beat_offset_secs())
            .floor() as i64
    }

    /// Fire every deadline due at or before `up_to_secs`, in deadline order.
    fn fire_due_deadlines(&mut self, up_to_secs: f64) {
        while let Some((handle, at_secs, payload)) = self.deadlines.pop_due(up_to_secs) {
            let Some(entity) = self.entity(payload.actor) else {
                continue;
            };
            if let Ok(mut pending) = self.world.get::<&mut PendingDeadlines>(entity) {
                pending.forget(handle);
            }
            let ctx = self.ability_context(self.beat_at(at_secs), at_secs);
            self.apply_trigger(
                entity,
                &ctx,
                Trigger::Deadline {
                    kind: payload.kind,
                    epoch: payload.epoch,
                },
            );
        }
    }

    fn dispatch_beat(&mut self, beat: i64) {
        self.presentation
            .push(PresentationEvent::global(Cue::BeatPulse { beat }));
        let now = self.clock.song_position_secs();

        let mut pass = self.listeners.begin_dispatch(beat);
        while let Some(key) = self.listeners.next_listener(&mut pass) {
            if self.phase != GamePhase::Playing {
                break;
            }
            match key {
                ListenerKey::Combo => {
                    if let Some(change) = self.combo.on_beat(pass.beat()) {
                        self.push_combo_change(change);
                    }
                }
                ListenerKey::Actor(id) => self.actor_beat(id, pass.beat(), now),
            }
        }
    }

    /// One fish's share of a beat: hit recovery, brain, then the ability.
    fn actor_beat(&mut self, id: ActorId, beat: i64, now_secs: f64) {
        let Some(entity) = self.entity(id) else {
            return;
        };

        if systems::invincibility::on_beat(&mut self.world, entity) {
            self.present(id, Cue::InvincibilityChanged { invincible: false });
        }

        if let Ok(mut window) = self.world.get::<&mut DamageWindow>(entity) {
            window.hit.clear();
        }

        let ctx = self.ability_context(beat, now_secs);
        if let Some(trigger) = self.run_brain(entity) {
            self.apply_trigger(entity, &ctx, trigger);
        }
        self.apply_trigger(entity, &ctx, Trigger::Beat);
    }

    fn run_brain(&mut self, entity: Entity) -> Option<Trigger> {
        let current = *self.world.get::<&EnemyBrain>(entity).ok()?;
        let (archetype, ability_phase, ability_level) = {
            let ability = self.world.get::<&AbilityState>(entity).ok()?;
            (ability.archetype, ability.phase, ability.level)
        };
        let (position, _) = self.placement(entity);
        let player_position = self
            .live_player()
            .and_then(|(id, _)| self.position(id));

        let update = brain::think(
            &current,
            &BrainContext {
                archetype,
                position,
                player_position,
                ability_phase,
                ability_level,
            },
        );

        if let Ok(mut stored) = self.world.get::<&mut EnemyBrain>(entity) {
            *stored = update.brain;
        }
        if let Some(direction) = update.facing {
            self.set_facing(entity, direction);
        }
        update.trigger
    }

    // --- Abilities ---

    /// Run one trigger through the fish's ability machine and carry out
    /// every resulting effect.
    fn apply_trigger(&mut self, entity: Entity, ctx: &AbilityContext, trigger: Trigger) {
        let Some(id) = self.actor_id(entity) else {
            return;
        };
        let update = {
            let Ok(state) = self.world.get::<&AbilityState>(entity) else {
                return;
            };
            fsm::evaluate(&state, ctx, trigger)
        };

        let epoch = update.state.epoch;
        if update.changed {
            if let Ok(mut state) = self.world.get::<&mut AbilityState>(entity) {
                *state = update.state;
            }
        }

        for effect in update.effects {
            self.apply_effect(entity, id, ctx, epoch, effect);
        }
    }

    fn apply_effect(
        &mut self,
        entity: Entity,
        id: ActorId,
        ctx: &AbilityContext,
        epoch: u32,
        effect: Effect,
    ) {
        match effect {
            Effect::Present(cue) => self.present(id, cue),
            Effect::Strike { region, damage } => self.strike(entity, &region, damage, ctx),
            Effect::OpenDamageWindow { region, damage } => {
                let _ = self
                    .world
                    .insert_one(entity, DamageWindow::new(region, damage));
            }
            Effect::CloseDamageWindow => {
                let _ = self.world.remove_one::<DamageWindow>(entity);
            }
            Effect::Schedule { kind, at_secs } => {
                let handle = self.deadlines.schedule(
                    at_secs,
                    DeadlinePayload {
                        actor: id,
                        kind,
                        epoch,
                    },
                );
                if let Ok(mut pending) = self.world.get::<&mut PendingDeadlines>(entity) {
                    pending.push(kind, handle);
                }
            }
            Effect::Cancel(kind) => {
                if let Ok(mut pending) = self.world.get::<&mut PendingDeadlines>(entity) {
                    for handle in pending.take_kind(kind) {
                        self.deadlines.cancel(handle);
                    }
                }
            }
            Effect::CancelAll => {
                if let Ok(mut pending) = self.world.get::<&mut PendingDeadlines>(entity) {
                    for handle in pending.take_all() {
                        self.deadlines.cancel(handle);
                    }
                }
            }
            Effect::Dash {
                distance,
                duration_secs,
            } => {
                let (origin, facing) = self.placement(entity);
                let motion = Motion {
                    from: origin,
                    to: origin + facing * distance,
                    started_secs: ctx.now_secs,
                    duration_secs,
                };
                let _ = self.world.insert_one(entity, motion);
                self.present(id, Cue::DashStarted { distance });
            }
            Effect::HoldInvincibility => self.hold_invincibility(entity, id, true),
            Effect::ReleaseInvincibility => self.hold_invincibility(entity, id, false),
            Effect::CounterStrike {
                target,
                damage,
                duration_secs,
            } => self.counter_strike(entity, target, damage, duration_secs, ctx),
            Effect::Rejected(reason) => {
                debug!("actor {} ignored input: {reason:?}", id.0);
            }
        }
    }

    fn hold_invincibility(&mut self, entity: Entity, id: ActorId, hold: bool) {
        let (before, after) = {
            let Ok(mut inv) = self.world.get::<&mut Invincibility>(entity) else {
                return;
            };
            let before = inv.is_active();
            inv.held_by_ability = hold;
            (before, inv.is_active())
        };
        if before != after {
            self.present(id, Cue::InvincibilityChanged { invincible: after });
        }
    }

    fn strike(&mut self, entity: Entity, region: &DamageRegion, damage: u32, ctx: &AbilityContext) {
        let (origin, facing) = self.placement(entity);
        let targets = self
            .query
            .candidates(&self.world, region, origin, facing);
        for target in targets {
            if target != entity {
                self.resolve_damage(entity, target, damage, ctx);
            }
        }
    }

    /// Lunge at the fish whose attack was parried and hit it directly.
    fn counter_strike(
        &mut self,
        entity: Entity,
        target: ActorId,
        damage: u32,
        duration_secs: f64,
        ctx: &AbilityContext,
    ) {
        let Some(target_entity) = self.entity(target) else {
            debug!("counter target {} is gone", target.0);
            return;
        };
        let (origin, _) = self.placement(entity);
        let (destination, _) = self.placement(target_entity);
        let direction = (destination - origin).normalize_or_zero();
        self.set_facing(entity, direction);
        let motion = Motion {
            from: origin,
            to: destination - direction * NOSE_RADIUS,
            started_secs: ctx.now_secs,
            duration_secs,
        };
        let _ = self.world.insert_one(entity, motion);
        self.resolve_damage(entity, target_entity, damage, ctx);
    }

    // --- Combat ---

    fn resolve_damage(
        &mut self,
        attacker: Entity,
        target: Entity,
        amount: u32,
        ctx: &AbilityContext,
    ) -> DamageOutcome {
        let (Some(attacker_id), Some(target_id)) = (self.actor_id(attacker), self.actor_id(target))
        else {
            return DamageOutcome::Rejected(RejectedDamage::MissingTarget);
        };

        let outcome =
            combat::try_damage(&mut self.world, attacker, target, amount, self.config.kill_heal);
        match outcome {
            DamageOutcome::Parried => {
                debug!("actor {} parried actor {}", target_id.0, attacker_id.0);
                self.apply_trigger(
                    target,
                    ctx,
                    Trigger::Parried {
                        attacker: attacker_id,
                    },
                );
            }
            DamageOutcome::Applied {
                remaining,
                killed,
                hit_invincibility,
            } => {
                self.present(target_id, Cue::Damaged { amount, remaining });
                if hit_invincibility {
                    self.present(target_id, Cue::InvincibilityChanged { invincible: true });
                }
                if killed {
                    self.on_kill(attacker_id, target, target_id, ctx);
                } else {
                    self.apply_trigger(
                        target,
                        ctx,
                        Trigger::Hit {
                            attacker: attacker_id,
                        },
                    );
                }
            }
            DamageOutcome::Rejected(reason) => {
                debug!(
                    "damage from actor {} to actor {} rejected: {reason:?}",
                    attacker_id.0, target_id.0
                );
            }
        }
        outcome
    }

    fn on_kill(&mut self, attacker: ActorId, target: Entity, target_id: ActorId, ctx: &AbilityContext) {
        let target_is_player = self.player == Some(target_id);
        info!("actor {} killed actor {}", attacker.0, target_id.0);

        self.session_events.push(SessionEvent::Kill {
            attacker,
            target: target_id,
        });
        self.present(target_id, Cue::Died);
        self.apply_trigger(target, ctx, Trigger::Interrupt);
        self.listeners.unsubscribe(&ListenerKey::Actor(target_id));

        if target_is_player {
            info!("player died, game over");
            self.phase = GamePhase::GameOver;
            self.session_events.push(SessionEvent::RestartRequested);
        } else {
            self.kills += 1;
            self.combo.on_kill();
            self.session_events
                .push(SessionEvent::DespawnRequested { actor: target_id });
        }
    }

    /// Sweep every open damage window over whatever is inside it now.
    fn sweep_damage_windows(&mut self) {
        let mut windows: Vec<(ActorId, Entity, DamageRegion, u32)> = self
            .world
            .query::<(&Actor, &DamageWindow)>()
            .iter()
            .map(|(entity, (actor, window))| (actor.id, entity, window.region, window.damage))
            .collect();
        windows.sort_by_key(|(id, ..)| *id);

        let now = self.clock.song_position_secs();
        let ctx = self.ability_context(self.clock.last_emitted_beat(), now);

        for (_, entity, region, damage) in windows {
            let (origin, facing) = self.placement(entity);
            let candidates = self
                .query
                .candidates(&self.world, &region, origin, facing);
            for target in candidates {
                if target == entity {
                    continue;
                }
                let Some(target_id) = self.actor_id(target) else {
                    continue;
                };
                // The window may have closed because of an earlier hit.
                let already_hit = match self.world.get::<&DamageWindow>(entity) {
                    Ok(window) => window.hit.contains(&target_id),
                    Err(_) => break,
                };
                if already_hit {
                    continue;
                }
                let outcome = self.resolve_damage(entity, target, damage, &ctx);
                if matches!(outcome, DamageOutcome::Applied { .. } | DamageOutcome::Parried) {
                    if let Ok(mut window) = self.world.get::<&mut DamageWindow>(entity) {
                        window.hit.push(target_id);
                    }
                }
            }
        }
    }

    // --- Commands ---

    /// Process all queued commands.
    fn process_commands(&mut self) {
        while let Some(command) = self.command_queue.pop_front() {
            self.handle_command(command);
        }
    }

    fn handle_command(&mut self, command: PlayerCommand) {
        match command {
            PlayerCommand::Press | PlayerCommand::Release | PlayerCommand::Secondary => {
                self.player_input(command)
            }
            PlayerCommand::Aim { x, y } => self.aim(Vec2::new(x, y)),
            PlayerCommand::SelectArchetype { archetype } => {
                self.player_archetype = archetype;
                if self.phase == GamePhase::Ready {
                    self.restart();
                } else {
                    debug!("archetype {archetype:?} applies from the next restart");
                }
            }
            PlayerCommand::Start => {
                if let Err(err) = self.start() {
                    warn!("cannot start session: {err}");
                }
            }
            PlayerCommand::Pause => {
                if self.phase == GamePhase::Playing {
                    self.phase = GamePhase::Paused;
                }
            }
            PlayerCommand::Resume => {
                if self.phase == GamePhase::Paused {
                    self.phase = GamePhase::Playing;
                }
            }
            PlayerCommand::Restart => self.restart(),
        }
    }

    fn aim(&mut self, point: Vec2) {
        if !matches!(self.phase, GamePhase::Ready | GamePhase::Playing) {
            return;
        }
        let Some((_, entity)) = self.live_player() else {
            return;
        };
        let (origin, _) = self.placement(entity);
        self.set_facing(entity, (point - origin).normalize_or_zero());
    }

    /// Judge a player input against the beat grid and hand it to the ability.
    fn player_input(&mut self, command: PlayerCommand) {
        if self.phase != GamePhase::Playing {
            return;
        }
        let Some((id, entity)) = self.live_player() else {
            return;
        };

        let beats = self.clock.song_position_beats();
        if self.punishment.is_blocking(beats) {
            debug!("input {command:?} blocked at {beats:.3} beats");
            self.present(id, Cue::InputBlocked);
            return;
        }

        let judgment = self.judge.judge(beats, self.clock.seconds_per_beat());
        let ctx = self.ability_context(judgment.nearest_beat, self.clock.song_position_secs());

        let trigger = match command {
            PlayerCommand::Release => Trigger::Release {
                verdict: judgment.verdict,
            },
            PlayerCommand::Press | PlayerCommand::Secondary => {
                self.present(
                    id,
                    Cue::InputFeedback {
                        verdict: judgment.verdict,
                        error_secs: judgment.error_secs,
                    },
                );
                if judgment.verdict == Verdict::Missed {
                    debug!(
                        "missed input {:+.3}s off beat {}",
                        judgment.error_secs, judgment.nearest_beat
                    );
                    self.punishment.on_miss(beats);
                    if let Some(change) = self.combo.on_missed_beat() {
                        self.push_combo_change(change);
                    }
                    return;
                }
                if command == PlayerCommand::Press {
                    Trigger::Primary {
                        verdict: Verdict::OnTime,
                    }
                } else {
                    Trigger::Secondary {
                        verdict: Verdict::OnTime,
                    }
                }
            }
            _ => return,
        };
        self.apply_trigger(entity, &ctx, trigger);
    }

    fn snapshot(&mut self) -> SessionSnapshot {
        let beats_per_measure = self.config.beats_per_measure;
        let inputs = SnapshotInputs {
            time: self.time,
            phase: self.phase,
            beat: BeatView {
                song_position_beats: self.clock.song_position_beats(),
                last_emitted_beat: self.clock.last_emitted_beat(),
                measure: self.clock.current_measure(beats_per_measure),
                beat_in_measure: self.clock.beat_in_measure(beats_per_measure),
                time_to_next_beat_secs: self.clock.time_to_next_beat_secs(),
            },
            punished: self.punishment.is_punished(),
            combo: self.combo.view(),
            kills: self.kills,
            presentation: std::mem::take(&mut self.presentation),
            session_events: std::mem::take(&mut self.session_events),
        };
        systems::snapshot::build_snapshot(&self.world, inputs)
    }
}
