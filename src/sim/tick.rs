//! Fixed timestep simulation tick
//!
//! Core game loop that advances the simulation deterministically, plus the
//! run/level state machine.

use glam::Vec2;

use super::behavior;
use super::collision;
use super::spawner::SpawnContext;
use super::state::{GameEvent, GamePhase, GameState, Owner};
use super::weapons::{self, Shot};
use crate::consts::*;

/// Input commands for a single tick (deterministic)
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Movement axes, each in [-1, 1]
    pub movement: Vec2,
    /// Fire held
    pub fire: bool,
    /// Pause toggle
    pub pause: bool,
    /// Start a run from `Idle`
    pub start: bool,
    /// Return to `Idle` after a finished (or paused) run
    pub restart: bool,
    /// Autopilot - AI steers and fires
    pub autopilot: bool,
}

/// Receiver for events drained from the state
pub trait EventSink {
    fn on_event(&mut self, event: &GameEvent);
}

impl EventSink for Vec<GameEvent> {
    fn on_event(&mut self, event: &GameEvent) {
        self.push(*event);
    }
}

/// Drain queued events into a sink. Returns how many were delivered.
pub fn dispatch_events(state: &mut GameState, sink: &mut dyn EventSink) -> usize {
    let events = state.drain_events();
    for event in &events {
        sink.on_event(event);
    }
    events.len()
}

/// Advance the game state by one fixed timestep
pub fn tick(state: &mut GameState, input: &TickInput, dt: f32) {
    if input.restart && (state.phase.is_terminal() || state.phase == GamePhase::Paused) {
        log::info!("Restarting run (final score {})", state.score);
        state.reset();
        return;
    }

    match state.phase {
        GamePhase::Idle => {
            if !input.start {
                return;
            }
            state.phase = GamePhase::Running;
            log::info!("Run started (seed {}, {})", state.seed, state.settings.difficulty.as_str());
        }
        GamePhase::Running => {
            if input.pause {
                state.phase = GamePhase::Paused;
                return;
            }
        }
        GamePhase::Paused => {
            if !input.pause {
                return;
            }
            state.phase = GamePhase::Running;
        }
        GamePhase::Victory | GamePhase::GameOver => return,
    }

    state.time_ticks += 1;
    state.elapsed += dt;
    state.level_elapsed += dt;

    let mut input = input.clone();
    if input.autopilot {
        input.movement = autopilot_movement(state);
        input.fire = true;
    }

    // Player movement
    let axis = input.movement.clamp(Vec2::splat(-1.0), Vec2::splat(1.0));
    let half = state.player.half_size();
    let speed = state.player.speed();
    let pos = state.player.pos + axis * speed * dt;
    state.player.pos = pos.clamp(half, Vec2::new(PLAYFIELD_WIDTH, PLAYFIELD_HEIGHT) - half);

    for expired in state.player.tick_timers(dt) {
        log::debug!("Effect expired: {:?}", expired);
    }

    // Firing
    if (input.fire || state.settings.auto_fire) && state.player.fire_cooldown <= 0.0 {
        fire(state);
    }

    // Spawning
    let enemy_kinds = state.settings.enemy_kinds();
    let powerup_kinds = state.settings.powerup_kinds();
    let ctx = SpawnContext {
        level: state.level,
        difficulty: state.difficulty(),
        score: state.score,
        boss_alive: state.boss_alive(),
        tuning: &state.tuning,
        enemy_kinds: &enemy_kinds,
        powerup_kinds: &powerup_kinds,
    };
    let spawns = state.spawner.tick(dt, &ctx, &mut state.rng);
    for spawn in spawns {
        state.insert_spawn(spawn);
    }

    behavior::advance(state, dt);
    collision::resolve(state, dt);

    if state.player.is_dead() {
        state.phase = GamePhase::GameOver;
        state.events.push(GameEvent::GameOver);
        log::info!(
            "Game over: score {} on level {} after {:.1}s",
            state.score,
            state.level,
            state.elapsed
        );
    } else if level_complete(state) {
        if state.level >= state.tuning.level_count {
            state.phase = GamePhase::Victory;
            state.events.push(GameEvent::Victory);
            log::info!("Victory! Final score {}", state.score);
        } else {
            advance_level(state);
        }
    }

    state.normalize_order();
}

/// Fire the current weapon and restart the cooldown
fn fire(state: &mut GameState) {
    let weapon = state.player.weapon;
    for shot in weapons::volley(&state.player, &state.tuning) {
        match shot {
            Shot::Single(bullet) => {
                state.spawn_bullet(bullet);
            }
            Shot::Pair(a, b) => {
                state.spawn_quantum_pair(a, b);
            }
        }
    }
    state.player.fire_cooldown = weapons::cooldown(weapon, &state.tuning);
    state.events.push(GameEvent::Shoot { weapon });
}

fn level_complete(state: &GameState) -> bool {
    let by_time = state.level_elapsed >= state.level_duration();
    let by_score = state
        .tuning
        .level_score_step
        .is_some_and(|step| step > 0 && state.score >= state.level as u64 * step);
    by_time || by_score
}

/// Move to the next level: clear the field, heal, restart spawn timers
fn advance_level(state: &mut GameState) {
    state.level += 1;
    state.level_elapsed = 0.0;
    state.enemies.clear();
    state.boss = None;
    state.bullets.clear();
    let heal = state.tuning.level_heal;
    state.player.heal(heal);
    state.spawner.reset();
    state.events.push(GameEvent::LevelUp { level: state.level });
    log::info!("Level {} started (difficulty {:.2})", state.level, state.difficulty());
}

/// Steering for autopilot runs: dodge incoming fire, otherwise chase the
/// nearest pickup or line up under the lowest threat
pub fn autopilot_movement(state: &GameState) -> Vec2 {
    let player = &state.player;

    // Dodge the closest enemy bullet heading our way
    let threat = state
        .bullets
        .iter()
        .filter(|b| b.owner == Owner::Enemy)
        .filter(|b| b.pos.y < player.pos.y && player.pos.y - b.pos.y < 150.0)
        .filter(|b| (b.pos.x - player.pos.x).abs() < player.size.x)
        .min_by(|a, b| {
            a.pos
                .distance_squared(player.pos)
                .total_cmp(&b.pos.distance_squared(player.pos))
        });
    if let Some(bullet) = threat {
        let away = if bullet.pos.x <= player.pos.x { 1.0 } else { -1.0 };
        // Pinned against a wall: go the other way
        let blocked = (away > 0.0 && player.pos.x >= PLAYFIELD_WIDTH - player.size.x)
            || (away < 0.0 && player.pos.x <= player.size.x);
        let dir = if blocked { -away } else { away };
        return Vec2::new(dir, 0.0);
    }

    let pickup = state
        .powerups
        .iter()
        .filter(|p| p.pos.y > PLAYFIELD_HEIGHT / 2.0)
        .min_by(|a, b| {
            (a.pos.x - player.pos.x)
                .abs()
                .total_cmp(&(b.pos.x - player.pos.x).abs())
        })
        .map(|p| p.pos.x);
    let prey = state
        .enemies
        .iter()
        .max_by(|a, b| a.pos.y.total_cmp(&b.pos.y))
        .map(|e| e.pos.x)
        .or_else(|| state.boss.as_ref().map(|b| b.pos.x));

    let target_x = pickup.or(prey).unwrap_or(PLAYFIELD_WIDTH / 2.0);
    Vec2::new(((target_x - player.pos.x) / 40.0).clamp(-1.0, 1.0), 0.0)
}
