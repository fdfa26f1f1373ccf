//! Spawn scheduling
//!
//! Decides when and what to create: enemies on a difficulty-scaled timer,
//! power-ups on a flat per-tick chance, and the boss at score milestones.
//! The spawner only produces entities; the state assigns ids on insertion.

use glam::Vec2;
use rand::Rng;
use rand::seq::IndexedRandom;
use serde::{Deserialize, Serialize};

use super::state::{Boss, Enemy, EnemyKind, Movement, PowerUp, PowerUpKind};
use crate::clamp_x;
use crate::consts::*;
use crate::tuning::Tuning;

/// Something the spawner wants added to the world
#[derive(Debug, Clone)]
pub enum Spawn {
    Enemy(Enemy),
    PowerUp(PowerUp),
    Boss(Boss),
}

impl Spawn {
    /// Finite position and positive finite size
    pub fn is_valid(&self) -> bool {
        let (pos, size) = match self {
            Spawn::Enemy(e) => (e.pos, e.size),
            Spawn::PowerUp(p) => (p.pos, p.size),
            Spawn::Boss(b) => (b.pos, b.size),
        };
        pos.is_finite() && size.is_finite() && size.x > 0.0 && size.y > 0.0
    }
}

/// Inputs the spawner reads each tick
#[derive(Debug, Clone, Copy)]
pub struct SpawnContext<'a> {
    pub level: u32,
    pub difficulty: f32,
    pub score: u64,
    pub boss_alive: bool,
    pub tuning: &'a Tuning,
    pub enemy_kinds: &'a [EnemyKind],
    pub powerup_kinds: &'a [PowerUpKind],
}

/// Spawn timers (plain state advanced inside the tick)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Spawner {
    /// Seconds accumulated toward the next enemy
    pub enemy_timer: f32,
    /// Boss score milestones already consumed
    pub boss_milestones: u64,
    /// Enemies spawned this run
    pub spawned: u32,
}

impl Spawner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restart the enemy timer (level advance)
    pub fn reset(&mut self) {
        self.enemy_timer = 0.0;
    }

    /// Seconds between enemies at the given difficulty
    pub fn spawn_interval(tuning: &Tuning, difficulty: f32) -> f32 {
        (tuning.enemy_spawn_interval / difficulty.max(0.1)).max(tuning.min_spawn_interval)
    }

    /// Advance timers and return everything that should appear this tick
    pub fn tick(&mut self, dt: f32, ctx: &SpawnContext, rng: &mut impl Rng) -> Vec<Spawn> {
        let mut spawns = Vec::new();
        let tuning = ctx.tuning;

        self.enemy_timer += dt;
        let interval = Self::spawn_interval(tuning, ctx.difficulty);
        if self.enemy_timer >= interval {
            self.enemy_timer -= interval;
            self.spawned += 1;
            spawns.push(Spawn::Enemy(spawn_enemy(ctx, rng)));
        }

        if !ctx.powerup_kinds.is_empty() && rng.random::<f32>() < tuning.powerup_chance {
            if let Some(&kind) = ctx.powerup_kinds.choose(rng) {
                let x = rng.random_range(0.0..PLAYFIELD_WIDTH);
                spawns.push(Spawn::PowerUp(make_powerup(kind, x, tuning)));
            }
        }

        let milestones = ctx.score / tuning.boss_score_threshold.max(1);
        if milestones > self.boss_milestones {
            // Crossings while a boss is alive are consumed, not queued
            self.boss_milestones = milestones;
            if !ctx.boss_alive {
                let health = tuning.boss_base_health
                    + tuning.boss_health_per_level * ctx.level.saturating_sub(1) as f32;
                spawns.push(Spawn::Boss(Boss::new(health, tuning)));
            }
        }

        spawns
    }
}

/// Horizontal room an enemy needs on each side of its centre
fn enemy_margin(enemy: &Enemy) -> f32 {
    let profile = enemy.kind.profile();
    let sway = match enemy.movement {
        Movement::Straight => 0.0,
        Movement::Zigzag | Movement::Wave => profile.zigzag_amplitude,
    };
    enemy.size.x / 2.0 + sway
}

fn spawn_enemy(ctx: &SpawnContext, rng: &mut impl Rng) -> Enemy {
    let kind = ctx
        .enemy_kinds
        .choose(rng)
        .copied()
        .unwrap_or(EnemyKind::Normal);

    let roll = rng.random::<f32>();
    let movement = if roll < ctx.tuning.zigzag_chance {
        Movement::Zigzag
    } else if roll < ctx.tuning.zigzag_chance + ctx.tuning.wave_chance {
        Movement::Wave
    } else {
        Movement::Straight
    };

    let x = rng.random_range(0.0..PLAYFIELD_WIDTH);
    let mut enemy = Enemy::new(kind, movement, x, ctx.tuning);
    let x = clamp_x(x, enemy_margin(&enemy));
    enemy.pos.x = x;
    enemy.anchor_x = x;
    enemy
}

fn make_powerup(kind: PowerUpKind, x: f32, tuning: &Tuning) -> PowerUp {
    let x = clamp_x(x, tuning.powerup_size / 2.0);
    PowerUp::new(kind, Vec2::new(x, 0.0), tuning.powerup_size, tuning.powerup_speed)
}

/// Roll for an item dropped by a destroyed enemy
pub fn roll_drop(
    pos: Vec2,
    tuning: &Tuning,
    powerup_kinds: &[PowerUpKind],
    rng: &mut impl Rng,
) -> Option<PowerUp> {
    if rng.random::<f32>() >= tuning.drop_chance {
        return None;
    }
    let kind = if powerup_kinds.is_empty() || rng.random::<f32>() < tuning.coin_drop_share {
        PowerUpKind::Coin
    } else {
        *powerup_kinds.choose(rng)?
    };
    let mut powerup = make_powerup(kind, pos.x, tuning);
    powerup.pos.y = pos.y.clamp(0.0, PLAYFIELD_HEIGHT);
    Some(powerup)
}
