//! Collision detection and response
//!
//! Broad-phase only: every relevant pair is tested each tick. Removals are
//! recorded in per-collection marks and compacted once at the end of the
//! pass, so indices stay valid while the pass runs and nothing removed is
//! looked at again in the same tick.

use glam::Vec2;

use super::spawner::{Spawn, roll_drop};
use super::state::{
    Bullet, BulletKind, EffectKind, GameEvent, GameState, Owner, PowerUp, PowerUpKind,
};

/// Collision shape relative to a centre
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Shape {
    Rect { half: Vec2 },
    Circle { radius: f32 },
}

/// A positioned collision shape
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hitbox {
    pub center: Vec2,
    pub shape: Shape,
}

impl Hitbox {
    pub fn rect(center: Vec2, size: Vec2) -> Self {
        Self {
            center,
            shape: Shape::Rect { half: size / 2.0 },
        }
    }

    pub fn circle(center: Vec2, radius: f32) -> Self {
        Self {
            center,
            shape: Shape::Circle { radius },
        }
    }

    /// Strict overlap test (touching edges do not count)
    pub fn overlaps(&self, other: &Hitbox) -> bool {
        match (self.shape, other.shape) {
            (Shape::Rect { half: a }, Shape::Rect { half: b }) => {
                aabb_overlap(self.center, a, other.center, b)
            }
            (Shape::Circle { radius: a }, Shape::Circle { radius: b }) => {
                circle_overlap(self.center, a, other.center, b)
            }
            (Shape::Rect { half }, Shape::Circle { radius }) => {
                rect_circle_overlap(self.center, half, other.center, radius)
            }
            (Shape::Circle { radius }, Shape::Rect { half }) => {
                rect_circle_overlap(other.center, half, self.center, radius)
            }
        }
    }
}

#[inline]
pub fn aabb_overlap(a_center: Vec2, a_half: Vec2, b_center: Vec2, b_half: Vec2) -> bool {
    let d = (a_center - b_center).abs();
    d.x < a_half.x + b_half.x && d.y < a_half.y + b_half.y
}

#[inline]
pub fn circle_overlap(a_center: Vec2, a_radius: f32, b_center: Vec2, b_radius: f32) -> bool {
    let reach = a_radius + b_radius;
    a_center.distance_squared(b_center) < reach * reach
}

#[inline]
pub fn rect_circle_overlap(rect_center: Vec2, half: Vec2, circle_center: Vec2, radius: f32) -> bool {
    let closest = circle_center.clamp(rect_center - half, rect_center + half);
    closest.distance_squared(circle_center) < radius * radius
}

/// Drop every item whose mark is set, preserving order
pub(crate) fn retain_unmarked<T>(items: &mut Vec<T>, marks: &[bool]) {
    let mut index = 0;
    items.retain(|_| {
        let keep = !marks.get(index).copied().unwrap_or(false);
        index += 1;
        keep
    });
}

/// Remove marked bullets. A removed quantum bullet takes its partner with
/// it; the partner's back reference is cleared first.
pub(crate) fn remove_marked_bullets(bullets: &mut Vec<Bullet>, marks: &mut [bool]) {
    let doomed_partners: Vec<u32> = bullets
        .iter()
        .zip(marks.iter())
        .filter(|(_, marked)| **marked)
        .filter_map(|(bullet, _)| bullet.partner())
        .collect();

    for (bullet, marked) in bullets.iter_mut().zip(marks.iter_mut()) {
        if doomed_partners.contains(&bullet.id) {
            bullet.kind = BulletKind::Quantum { partner: None };
            *marked = true;
        }
    }

    retain_unmarked(bullets, marks);
}

/// Deferred removals for one resolution pass
struct Marks {
    bullets: Vec<bool>,
    enemies: Vec<bool>,
    powerups: Vec<bool>,
    drops: Vec<PowerUp>,
}

/// Score, explosion and possible drop for a destroyed enemy
fn destroy_enemy(state: &mut GameState, index: usize, marks: &mut Marks) {
    marks.enemies[index] = true;
    let (pos, color) = {
        let enemy = &state.enemies[index];
        (enemy.pos, enemy.kind.profile().color)
    };
    state.score += state.tuning.enemy_kill_score;
    state.kills += 1;
    state.explode(pos, color);

    let kinds = state.settings.powerup_kinds();
    if let Some(drop) = roll_drop(pos, &state.tuning, &kinds, &mut state.rng) {
        marks.drops.push(drop);
    }
}

/// Damage the boss; handles phase changes and the kill reward
fn damage_boss(state: &mut GameState, amount: f32) {
    let Some(boss) = state.boss.as_mut() else {
        return;
    };
    if boss.is_dead() {
        return;
    }
    let phase_change = boss.apply_damage(amount);
    let killed = boss.is_dead();
    let pos = boss.pos;

    if let Some(phase) = phase_change {
        log::info!("Boss entered phase {}", phase);
        state.events.push(GameEvent::BossPhase { phase });
    }
    if killed {
        log::info!("Boss destroyed");
        state.score += state.tuning.boss_kill_score;
        state.explode(pos, 0xFFD700);
    }
}

/// Damage the player unless invincible; starts the invincibility window
fn hurt_player(state: &mut GameState, amount: f32) {
    if state.player.is_invincible() || amount <= 0.0 {
        return;
    }
    state.player.apply_damage(amount);
    state.player.invincible_timer = state.tuning.invincibility_secs;
    state.events.push(GameEvent::PlayerHit { damage: amount });
}

/// Contact model shared by enemies and the boss. Returns true when the
/// shield took the hit.
fn contact_player(state: &mut GameState, damage: f32) -> bool {
    if state.player.shield > 0.0 {
        state.player.shield = (state.player.shield - damage).max(0.0);
        state.player.invincible_timer = state.tuning.invincibility_secs;
        state.events.push(GameEvent::PlayerHit { damage: 0.0 });
        true
    } else {
        hurt_player(state, damage);
        false
    }
}

/// Apply a collected power-up
fn apply_powerup(state: &mut GameState, kind: PowerUpKind, marks: &mut Marks) {
    match kind {
        PowerUpKind::Health => {
            let amount = state.tuning.health_pickup;
            state.player.heal(amount);
        }
        PowerUpKind::Shield => {
            let amount = state.tuning.shield_pickup;
            state.player.add_shield(amount);
        }
        PowerUpKind::SpeedBoost => {
            let secs = state.tuning.speed_boost_secs;
            state.player.start_effect(EffectKind::SpeedBoost, secs);
        }
        PowerUpKind::Coin => state.score += state.tuning.coin_score,
        PowerUpKind::Weapon(weapon) => {
            let secs = state.tuning.weapon_duration_secs;
            state.player.grant_weapon(weapon, secs);
        }
        PowerUpKind::Bomb => {
            for index in 0..state.enemies.len() {
                if !marks.enemies[index] {
                    destroy_enemy(state, index, marks);
                }
            }
        }
    }
    state.events.push(GameEvent::PowerUp { kind });
}

/// Resolve every interaction for this tick
pub fn resolve(state: &mut GameState, dt: f32) {
    let mut marks = Marks {
        bullets: vec![false; state.bullets.len()],
        enemies: vec![false; state.enemies.len()],
        powerups: vec![false; state.powerups.len()],
        drops: Vec::new(),
    };

    // 1. Player bullets against enemies and the boss
    for bi in 0..state.bullets.len() {
        if marks.bullets[bi] || state.bullets[bi].owner != Owner::Player {
            continue;
        }
        let hitbox = state.bullets[bi].hitbox();
        let continuous = state.bullets[bi].kind.is_continuous();

        for ei in 0..state.enemies.len() {
            if marks.enemies[ei] || !hitbox.overlaps(&state.enemies[ei].hitbox()) {
                continue;
            }
            let enemy_id = state.enemies[ei].id;
            let damage = {
                let bullet = &mut state.bullets[bi];
                if continuous {
                    bullet.damage * dt
                } else {
                    if bullet.hit_ids.contains(&enemy_id) {
                        continue;
                    }
                    bullet.hit_ids.push(enemy_id);
                    bullet.hits_left = bullet.hits_left.saturating_sub(1);
                    bullet.damage
                }
            };

            if state.enemies[ei].apply_damage(damage) {
                destroy_enemy(state, ei, &mut marks);
            } else if !continuous {
                state.events.push(GameEvent::EnemyHit { id: enemy_id });
            }

            if !continuous && state.bullets[bi].hits_left == 0 {
                marks.bullets[bi] = true;
                break;
            }
        }

        if marks.bullets[bi] {
            continue;
        }

        let boss_hit = state
            .boss
            .as_ref()
            .filter(|boss| !boss.is_dead() && hitbox.overlaps(&boss.hitbox()))
            .map(|boss| boss.id);
        if let Some(boss_id) = boss_hit {
            let bullet = &mut state.bullets[bi];
            if continuous {
                let damage = bullet.damage * dt;
                damage_boss(state, damage);
            } else if !bullet.hit_ids.contains(&boss_id) {
                bullet.hit_ids.push(boss_id);
                bullet.hits_left = bullet.hits_left.saturating_sub(1);
                let damage = bullet.damage;
                if bullet.hits_left == 0 {
                    marks.bullets[bi] = true;
                }
                damage_boss(state, damage);
                state.events.push(GameEvent::EnemyHit { id: boss_id });
            }
        }
    }

    // 2. Enemy bullets against the player
    let player_box = state.player.hitbox();
    for bi in 0..state.bullets.len() {
        if state.player.is_dead() {
            break;
        }
        if marks.bullets[bi] || state.bullets[bi].owner != Owner::Enemy {
            continue;
        }
        if state.bullets[bi].hitbox().overlaps(&player_box) {
            marks.bullets[bi] = true;
            let damage = state.bullets[bi].damage;
            hurt_player(state, damage);
        }
    }

    // 3. Player against enemies (direct contact)
    for ei in 0..state.enemies.len() {
        if state.player.is_dead() {
            break;
        }
        if marks.enemies[ei] || !state.enemies[ei].hitbox().overlaps(&player_box) {
            continue;
        }
        if state.player.is_invincible() {
            continue;
        }
        let damage = state.enemies[ei].contact_damage;
        if contact_player(state, damage) {
            destroy_enemy(state, ei, &mut marks);
        } else {
            let penalty = state.tuning.enemy_contact_penalty;
            if state.enemies[ei].apply_damage(penalty) {
                destroy_enemy(state, ei, &mut marks);
            }
        }
    }

    // 4. Player against power-ups
    for pi in 0..state.powerups.len() {
        if state.player.is_dead() {
            break;
        }
        if marks.powerups[pi] || !state.powerups[pi].hitbox().overlaps(&player_box) {
            continue;
        }
        marks.powerups[pi] = true;
        let kind = state.powerups[pi].kind;
        apply_powerup(state, kind, &mut marks);
    }

    // 5. Player against the boss (direct contact)
    let boss_contact = state
        .boss
        .as_ref()
        .filter(|boss| !boss.is_dead() && boss.hitbox().overlaps(&player_box))
        .map(|boss| boss.contact_damage);
    if let Some(damage) = boss_contact {
        if !state.player.is_dead() && !state.player.is_invincible() {
            contact_player(state, damage);
            let penalty = state.tuning.boss_contact_penalty;
            damage_boss(state, penalty);
        }
    }

    // Compact once
    remove_marked_bullets(&mut state.bullets, &mut marks.bullets);
    retain_unmarked(&mut state.enemies, &marks.enemies);
    retain_unmarked(&mut state.powerups, &marks.powerups);
    if state.boss.as_ref().is_some_and(|boss| boss.is_dead()) {
        state.boss = None;
    }
    for drop in marks.drops {
        state.insert_spawn(Spawn::PowerUp(drop));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::state::{Boss, Enemy, EnemyKind, Movement};

    fn running_state() -> GameState {
        let mut state = GameState::with_seed(42);
        state.tuning.drop_chance = 0.0;
        state
    }

    fn add_enemy(state: &mut GameState, kind: EnemyKind, pos: Vec2) -> u32 {
        let mut enemy = Enemy::new(kind, Movement::Straight, pos.x, &state.tuning);
        enemy.pos = pos;
        state.insert_spawn(Spawn::Enemy(enemy)).expect("valid enemy")
    }

    fn explosions(state: &mut GameState) -> usize {
        state
            .drain_events()
            .iter()
            .filter(|e| matches!(e, GameEvent::Explosion { .. }))
            .count()
    }

    #[test]
    fn test_aabb_overlap() {
        let a = Hitbox::rect(Vec2::new(0.0, 0.0), Vec2::new(10.0, 10.0));
        let b = Hitbox::rect(Vec2::new(9.0, 0.0), Vec2::new(10.0, 10.0));
        let c = Hitbox::rect(Vec2::new(10.0, 0.0), Vec2::new(10.0, 10.0));
        assert!(a.overlaps(&b));
        // Touching edges do not overlap
        assert!(!a.overlaps(&c));
    }

    #[test]
    fn test_circle_overlaps() {
        let circle = Hitbox::circle(Vec2::new(0.0, 0.0), 10.0);
        assert!(circle.overlaps(&Hitbox::circle(Vec2::new(15.0, 0.0), 6.0)));
        assert!(!circle.overlaps(&Hitbox::circle(Vec2::new(15.0, 0.0), 4.0)));

        let rect = Hitbox::rect(Vec2::new(14.0, 0.0), Vec2::new(10.0, 10.0));
        assert!(circle.overlaps(&rect));
        assert!(rect.overlaps(&circle));

        // Corner case: diagonal distance exceeds the radius
        let corner = Hitbox::rect(Vec2::new(14.0, 14.0), Vec2::new(10.0, 10.0));
        assert!(!circle.overlaps(&corner));
    }

    #[test]
    fn test_kill_awards_score_and_one_explosion() {
        let mut state = running_state();
        add_enemy(&mut state, EnemyKind::Normal, Vec2::new(200.0, 200.0));
        state.spawn_bullet(Bullet::player_shot(
            BulletKind::Standard,
            Vec2::new(200.0, 205.0),
            500.0,
            1.0,
        ));

        resolve(&mut state, crate::consts::SIM_DT);
        assert!(state.enemies.is_empty());
        assert!(state.bullets.is_empty());
        assert_eq!(state.score, 10);
        assert_eq!(explosions(&mut state), 1);
    }

    #[test]
    fn test_piercing_hits_each_target_once() {
        let mut state = running_state();
        let id = add_enemy(&mut state, EnemyKind::Large, Vec2::new(200.0, 200.0));
        let bullet = Bullet::player_shot(BulletKind::Piercing, Vec2::new(200.0, 200.0), 500.0, 1.0)
            .with_hits(3);
        state.spawn_bullet(bullet);

        for _ in 0..5 {
            resolve(&mut state, crate::consts::SIM_DT);
        }
        let enemy = state.enemies.iter().find(|e| e.id == id).expect("enemy alive");
        assert_eq!(enemy.health, enemy.max_health - 1.0);
        assert_eq!(state.bullets.len(), 1);
        assert_eq!(state.bullets[0].hits_left, 2);
    }

    #[test]
    fn test_piercing_removed_after_last_hit() {
        let mut state = running_state();
        for i in 0..3 {
            add_enemy(&mut state, EnemyKind::Tough, Vec2::new(200.0, 100.0 + i as f32 * 10.0));
        }
        let bullet = Bullet::player_shot(BulletKind::Piercing, Vec2::new(200.0, 110.0), 500.0, 1.0)
            .with_hits(2);
        state.spawn_bullet(bullet);

        resolve(&mut state, crate::consts::SIM_DT);
        assert!(state.bullets.is_empty());
        let damaged = state.enemies.iter().filter(|e| e.health < e.max_health).count();
        assert_eq!(damaged, 2);
    }

    #[test]
    fn test_laser_damages_every_enemy_in_beam() {
        let mut state = running_state();
        add_enemy(&mut state, EnemyKind::Tank, Vec2::new(300.0, 50.0));
        add_enemy(&mut state, EnemyKind::Tank, Vec2::new(300.0, 300.0));
        add_enemy(&mut state, EnemyKind::Tank, Vec2::new(600.0, 300.0));
        let mut laser = Bullet::player_shot(
            BulletKind::Laser {
                duration: 0.6,
                initial_duration: 0.6,
            },
            Vec2::new(300.0, 540.0),
            0.0,
            6.0,
        );
        laser.size = Vec2::new(12.0, 12.0);
        state.spawn_bullet(laser);

        resolve(&mut state, 0.5);
        let hurt: Vec<f32> = state.enemies.iter().map(|e| e.max_health - e.health).collect();
        assert_eq!(hurt, vec![3.0, 3.0, 0.0]);
        // Continuous bullets are not consumed
        assert_eq!(state.bullets.len(), 1);
    }

    #[test]
    fn test_enemy_bullet_hits_player_once() {
        let mut state = running_state();
        let player_pos = state.player.pos;
        state.spawn_bullet(Bullet::enemy_shot(player_pos, Vec2::Y, 250.0, 10.0));
        state.spawn_bullet(Bullet::enemy_shot(player_pos, Vec2::Y, 250.0, 10.0));

        resolve(&mut state, crate::consts::SIM_DT);
        // Second bullet lands during the invincibility window
        assert_eq!(state.player.health, 90.0);
        assert!(state.bullets.is_empty());
    }

    #[test]
    fn test_shielded_contact_destroys_enemy() {
        let mut state = running_state();
        state.player.shield = 30.0;
        let player_pos = state.player.pos;
        add_enemy(&mut state, EnemyKind::Normal, player_pos);

        resolve(&mut state, crate::consts::SIM_DT);
        assert!(state.enemies.is_empty());
        assert_eq!(state.player.shield, 30.0 - state.tuning.contact_damage);
        assert_eq!(state.player.health, state.player.max_health);
        assert_eq!(state.score, state.tuning.enemy_kill_score);
    }

    #[test]
    fn test_unshielded_contact_hurts_both() {
        let mut state = running_state();
        let player_pos = state.player.pos;
        add_enemy(&mut state, EnemyKind::Normal, player_pos);

        resolve(&mut state, crate::consts::SIM_DT);
        assert_eq!(
            state.player.health,
            state.player.max_health - state.tuning.contact_damage
        );
        // The contact penalty exceeds a normal enemy's health
        assert!(state.enemies.is_empty());
    }

    #[test]
    fn test_powerup_pickup_removes_item() {
        let mut state = running_state();
        state.player.health = 50.0;
        let player_pos = state.player.pos;
        let powerup = PowerUp::new(PowerUpKind::Health, player_pos, 24.0, 100.0);
        state.insert_spawn(Spawn::PowerUp(powerup));

        resolve(&mut state, crate::consts::SIM_DT);
        assert!(state.powerups.is_empty());
        assert_eq!(state.player.health, 50.0 + state.tuning.health_pickup);
    }

    #[test]
    fn test_boss_contact_does_not_destroy_boss() {
        let mut state = running_state();
        let mut boss = Boss::new(100.0, &state.tuning);
        boss.pos = state.player.pos;
        state.insert_spawn(Spawn::Boss(boss));

        resolve(&mut state, crate::consts::SIM_DT);
        let boss = state.boss.as_ref().expect("boss survives contact");
        assert_eq!(boss.health, 100.0 - state.tuning.boss_contact_penalty);
        assert_eq!(
            state.player.health,
            state.player.max_health - state.tuning.boss_contact_damage
        );
    }

    #[test]
    fn test_boss_kill_removes_boss() {
        let mut state = running_state();
        let mut boss = Boss::new(100.0, &state.tuning);
        boss.pos = Vec2::new(400.0, 100.0);
        boss.health = 1.0;
        state.insert_spawn(Spawn::Boss(boss));
        state.spawn_bullet(Bullet::player_shot(
            BulletKind::Standard,
            Vec2::new(400.0, 110.0),
            500.0,
            1.0,
        ));

        resolve(&mut state, crate::consts::SIM_DT);
        assert!(state.boss.is_none());
        assert_eq!(state.score, state.tuning.boss_kill_score);
    }

    #[test]
    fn test_destroyed_quantum_takes_partner() {
        let mut state = running_state();
        add_enemy(&mut state, EnemyKind::Normal, Vec2::new(200.0, 200.0));
        let a = Bullet::player_shot(BulletKind::Standard, Vec2::new(200.0, 200.0), 500.0, 1.0);
        let b = Bullet::player_shot(BulletKind::Standard, Vec2::new(500.0, 400.0), 500.0, 1.0);
        state.spawn_quantum_pair(a, b);

        resolve(&mut state, crate::consts::SIM_DT);
        assert!(state.enemies.is_empty());
        assert!(state.bullets.is_empty());
    }

    #[test]
    fn test_retain_unmarked() {
        let mut items = vec![1, 2, 3, 4, 5];
        retain_unmarked(&mut items, &[false, true, true, false, true]);
        assert_eq!(items, vec![1, 4]);
    }
}
