//! Per-entity behaviours
//!
//! Movement, firing and expiry for everything on the playfield. Dispatch is
//! on the tagged enums in `state`; entities that leave the playfield or
//! expire are removed here, before collisions are resolved.

use glam::Vec2;
use rand::Rng;

use super::collision::{remove_marked_bullets, retain_unmarked};
use super::state::{
    AttackPattern, Boss, Bullet, BulletKind, Enemy, GameState, Movement, Owner,
};
use crate::consts::*;
use crate::tuning::Tuning;
use crate::{clamp_x, direction_from_up, in_playfield};

/// Particle fade rate (life units per second)
const PARTICLE_FADE: f32 = 1.5;
/// Bullets in the boss ring attack
const RING_BULLETS: u32 = 12;

/// Advance every entity by `dt`
pub fn advance(state: &mut GameState, dt: f32) {
    let player_pos = state.player.pos;

    let mut shots = update_enemies(&mut state.enemies, player_pos, &state.tuning, dt);
    if let Some(boss) = state.boss.as_mut() {
        shots.extend(update_boss(boss, player_pos, &state.tuning, dt));
    }

    let children = update_bullets(state, dt);
    for bullet in shots.into_iter().chain(children) {
        state.spawn_bullet(bullet);
    }

    apply_black_holes(state, dt);
    quantum_swaps(state);
    remove_out_of_bounds(state);

    for powerup in &mut state.powerups {
        powerup.pos.y += powerup.speed * dt;
    }
    state.powerups.retain(|p| in_playfield(p.pos));

    for particle in &mut state.particles {
        particle.pos += particle.vel * dt;
        particle.life -= PARTICLE_FADE * dt;
    }
    state.particles.retain(|p| p.life > 0.0);
}

/// Move enemies and collect the shots they fire
fn update_enemies(enemies: &mut [Enemy], player_pos: Vec2, tuning: &Tuning, dt: f32) -> Vec<Bullet> {
    let mut shots = Vec::new();

    for enemy in enemies.iter_mut() {
        let profile = enemy.kind.profile();
        enemy.age += dt;
        enemy.pos.y += enemy.speed * dt;
        enemy.pos.x = match enemy.movement {
            Movement::Straight => enemy.pos.x,
            Movement::Zigzag => {
                enemy.anchor_x + (enemy.pos.y * profile.zigzag_k).sin() * profile.zigzag_amplitude
            }
            Movement::Wave => {
                enemy.anchor_x
                    + (enemy.age * profile.wave_frequency).sin() * profile.zigzag_amplitude
            }
        };

        let Some(interval) = enemy.fire_interval else {
            continue;
        };
        enemy.fire_cooldown -= dt;
        if enemy.fire_cooldown > 0.0 {
            continue;
        }
        enemy.fire_cooldown += interval;

        let muzzle = enemy.pos + Vec2::new(0.0, enemy.size.y / 2.0);
        let dir = if profile.aimed {
            player_pos - muzzle
        } else {
            Vec2::Y
        };
        shots.push(Bullet::enemy_shot(
            muzzle,
            dir,
            tuning.enemy_bullet_speed,
            tuning.enemy_bullet_damage,
        ));
    }

    shots
}

/// Downward fan of `count` shots spanning `spread` radians
fn fan(origin: Vec2, count: u32, spread: f32, speed: f32, damage: f32) -> Vec<Bullet> {
    (0..count)
        .map(|i| {
            let t = if count > 1 {
                i as f32 / (count - 1) as f32 - 0.5
            } else {
                0.0
            };
            let dir = direction_from_up(std::f32::consts::PI + t * spread);
            Bullet::enemy_shot(origin, dir, speed, damage)
        })
        .collect()
}

/// Move the boss and collect its shots
fn update_boss(boss: &mut Boss, player_pos: Vec2, tuning: &Tuning, dt: f32) -> Vec<Bullet> {
    if boss.pos.y < tuning.boss_hold_y {
        boss.pos.y = (boss.pos.y + tuning.boss_descent_speed * dt).min(tuning.boss_hold_y);
        return Vec::new();
    }

    boss.age += dt;
    let sway = (boss.age * tuning.boss_sway_frequency).sin() * tuning.boss_sway_amplitude;
    boss.pos.x = clamp_x(PLAYFIELD_WIDTH / 2.0 + sway, boss.size.x / 2.0);

    let origin = boss.pos + Vec2::new(0.0, boss.size.y / 2.0);
    let speed = tuning.boss_bullet_speed;
    let damage = tuning.boss_bullet_damage;
    let mut shots = Vec::new();

    boss.shot_cooldown -= dt;
    if boss.shot_cooldown <= 0.0 {
        boss.shot_cooldown += boss.shot_interval;
        match boss.attack {
            AttackPattern::Aimed => {
                shots.push(Bullet::enemy_shot(origin, player_pos - origin, speed, damage));
            }
            AttackPattern::Spread => shots.extend(fan(origin, 5, 0.8, speed, damage)),
            AttackPattern::Barrage => {
                shots.extend(fan(origin, 7, 1.4, speed, damage));
                shots.push(Bullet::enemy_shot(origin, player_pos - origin, speed * 1.2, damage));
            }
        }
    }

    boss.special_cooldown -= dt;
    if boss.special_cooldown <= 0.0 {
        boss.special_cooldown += boss.special_interval;
        log::debug!("Boss ring attack (phase {})", boss.phase);
        for i in 0..RING_BULLETS {
            let angle = std::f32::consts::TAU * i as f32 / RING_BULLETS as f32;
            shots.push(Bullet::enemy_shot(
                boss.pos,
                direction_from_up(angle),
                speed * 0.8,
                damage,
            ));
        }
    }

    shots
}

/// Nearest target to `pos`
fn nearest(targets: &[(u32, Vec2)], pos: Vec2) -> Option<(u32, Vec2)> {
    targets
        .iter()
        .copied()
        .min_by(|a, b| a.1.distance_squared(pos).total_cmp(&b.1.distance_squared(pos)))
}

/// Children of a split bullet, fanned around straight up
fn split_children(parent: &Bullet, split_count: u8, child_count: u8, split_at_y: f32, tuning: &Tuning) -> Vec<Bullet> {
    let speed = parent.speed * 0.8;
    let count = child_count as u32;
    let kind = BulletKind::Split {
        split_count: split_count.saturating_sub(1),
        child_count,
        split_at_y: split_at_y - tuning.split_step_y(),
    };

    (0..count)
        .map(|i| {
            let t = if count > 1 {
                i as f32 / (count - 1) as f32 - 0.5
            } else {
                0.0
            };
            let dir = direction_from_up(t * tuning.split_spread);
            Bullet::new(
                parent.owner,
                kind,
                parent.pos,
                dir * speed,
                parent.damage * 0.6,
                parent.size * 0.75,
            )
        })
        .collect()
}

/// Move bullets, age timed kinds, and split. Returns the split children.
fn update_bullets(state: &mut GameState, dt: f32) -> Vec<Bullet> {
    let targets = state.targets();
    let tuning = &state.tuning;
    let mut marks = vec![false; state.bullets.len()];
    let mut children = Vec::new();

    for (index, bullet) in state.bullets.iter_mut().enumerate() {
        let mut kind = bullet.kind;
        match &mut kind {
            BulletKind::Standard | BulletKind::Piercing | BulletKind::Quantum { .. } => {
                bullet.pos += bullet.vel * dt;
            }
            BulletKind::Laser { duration, .. } => {
                *duration -= dt;
                if *duration <= 0.0 {
                    marks[index] = true;
                }
            }
            BulletKind::Homing { target } | BulletKind::Missile { target } => {
                let current = (*target).and_then(|id| targets.iter().copied().find(|t| t.0 == id));
                let locked = current.or_else(|| nearest(&targets, bullet.pos));
                *target = locked.map(|t| t.0);
                if let Some((_, target_pos)) = locked {
                    let heading = (target_pos - bullet.pos).normalize_or(bullet.vel.normalize_or(Vec2::NEG_Y));
                    bullet.vel = heading * bullet.speed;
                }
                bullet.pos += bullet.vel * dt;
            }
            BulletKind::Emp { radius, max_radius } => {
                // The full-size ring gets one collision pass before it goes
                if *radius >= *max_radius {
                    marks[index] = true;
                } else {
                    *radius = (*radius + tuning.emp_growth * dt).min(*max_radius);
                }
            }
            BulletKind::Split {
                split_count,
                child_count,
                split_at_y,
            } => {
                bullet.pos += bullet.vel * dt;
                if bullet.pos.y <= *split_at_y && *split_count > 0 {
                    marks[index] = true;
                    children.extend(split_children(bullet, *split_count, *child_count, *split_at_y, tuning));
                }
            }
            BulletKind::BlackHole {
                radius,
                max_radius,
                duration,
            } => {
                bullet.pos += bullet.vel * dt;
                *radius = (*radius + tuning.black_hole_growth * dt).min(*max_radius);
                *duration -= dt;
                if *duration <= 0.0 {
                    marks[index] = true;
                }
            }
        }
        bullet.kind = kind;
    }

    remove_marked_bullets(&mut state.bullets, &mut marks);
    children
}

/// Step `pos` toward `center` by at most `step`, never past it
fn pull_toward(pos: Vec2, center: Vec2, step: f32) -> Vec2 {
    let offset = center - pos;
    let distance = offset.length();
    if distance <= step {
        center
    } else {
        pos + offset / distance * step
    }
}

/// Black holes drag enemies and enemy bullets toward their centres
fn apply_black_holes(state: &mut GameState, dt: f32) {
    let holes: Vec<(Vec2, f32)> = state
        .bullets
        .iter()
        .filter_map(|b| match b.kind {
            BulletKind::BlackHole { radius, .. } => Some((b.pos, radius)),
            _ => None,
        })
        .collect();
    if holes.is_empty() {
        return;
    }

    let step = state.tuning.black_hole_pull * dt;
    for (center, radius) in holes {
        for enemy in &mut state.enemies {
            if enemy.pos.distance(center) < radius {
                let pulled = pull_toward(enemy.pos, center, step);
                enemy.anchor_x += pulled.x - enemy.pos.x;
                enemy.pos = pulled;
            }
        }
        for bullet in state.bullets.iter_mut().filter(|b| b.owner == Owner::Enemy) {
            if bullet.pos.distance(center) < radius {
                bullet.pos = pull_toward(bullet.pos, center, step);
            }
        }
    }
}

/// The lower-id half of each quantum pair may swap places with its partner
fn quantum_swaps(state: &mut GameState) {
    let chance = state.tuning.quantum_swap_chance;
    for index in 0..state.bullets.len() {
        let bullet = &state.bullets[index];
        let Some(partner) = bullet.partner() else {
            continue;
        };
        if partner < bullet.id {
            continue;
        }
        if state.rng.random::<f32>() >= chance {
            continue;
        }
        if let Some(other) = state.bullets.iter().position(|b| b.id == partner) {
            let here = state.bullets[index].pos;
            state.bullets[index].pos = state.bullets[other].pos;
            state.bullets[other].pos = here;
        }
    }
}

/// Remove everything whose centre has left the playfield
fn remove_out_of_bounds(state: &mut GameState) {
    let mut marks: Vec<bool> = state.bullets.iter().map(|b| !in_playfield(b.pos)).collect();
    remove_marked_bullets(&mut state.bullets, &mut marks);

    let marks: Vec<bool> = state.enemies.iter().map(|e| !in_playfield(e.pos)).collect();
    retain_unmarked(&mut state.enemies, &marks);
}
