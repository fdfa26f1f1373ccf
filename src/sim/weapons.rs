//! Player firing patterns
//!
//! Each weapon kind and level maps to a volley of bullets leaving the nose
//! of the ship. Volleys are plain values; the tick inserts them into the
//! state so ids stay on the single counter.

use glam::Vec2;

use super::state::{Bullet, BulletKind, Owner, Player, WeaponKind};
use crate::direction_from_up;
use crate::tuning::Tuning;

/// Radius an EMP pulse starts at
const EMP_START_RADIUS: f32 = 8.0;

/// One unit of a volley
#[derive(Debug, Clone)]
pub enum Shot {
    Single(Bullet),
    /// Two bullets linked as a quantum pair
    Pair(Bullet, Bullet),
}

/// Seconds between volleys for a weapon
pub fn cooldown(weapon: WeaponKind, tuning: &Tuning) -> f32 {
    let scale = match weapon {
        WeaponKind::Laser => 3.0,
        WeaponKind::Emp | WeaponKind::BlackHole => 6.0,
        WeaponKind::Missile | WeaponKind::Split => 2.0,
        _ => 1.0,
    };
    tuning.fire_interval * scale
}

fn angled(kind: BulletKind, pos: Vec2, angle: f32, speed: f32, damage: f32) -> Bullet {
    let mut bullet = Bullet::player_shot(kind, pos, speed, damage);
    bullet.vel = direction_from_up(angle) * speed;
    bullet
}

/// Fan of `count` angles spaced `step` radians apart, centred on straight up
fn fan_angles(count: u8, step: f32) -> impl Iterator<Item = f32> {
    let half = (count.saturating_sub(1)) as f32 / 2.0;
    (0..count).map(move |i| (i as f32 - half) * step)
}

/// Build the volley for the player's current weapon and level
pub fn volley(player: &Player, tuning: &Tuning) -> Vec<Shot> {
    let muzzle = player.pos - Vec2::new(0.0, player.size.y / 2.0);
    let level = player.weapon_level.max(1);
    let speed = tuning.bullet_speed;
    let damage = tuning.bullet_damage;

    match player.weapon {
        WeaponKind::Standard => {
            // Parallel barrels, 10 px apart
            let half = (level - 1) as f32 * 5.0;
            (0..level)
                .map(|i| {
                    let offset = Vec2::new(i as f32 * 10.0 - half, 0.0);
                    Shot::Single(Bullet::player_shot(BulletKind::Standard, muzzle + offset, speed, damage))
                })
                .collect()
        }
        WeaponKind::Spread => fan_angles(1 + 2 * level, 0.15)
            .map(|angle| Shot::Single(angled(BulletKind::Standard, muzzle, angle, speed, damage)))
            .collect(),
        WeaponKind::Piercing => {
            let hits = tuning.pierce_hits + (level - 1) as u32;
            let bullet = Bullet::player_shot(BulletKind::Piercing, muzzle, speed, damage).with_hits(hits);
            vec![Shot::Single(bullet)]
        }
        WeaponKind::Laser => {
            let mut beam = Bullet::player_shot(
                BulletKind::Laser {
                    duration: tuning.laser_duration_secs,
                    initial_duration: tuning.laser_duration_secs,
                },
                muzzle,
                0.0,
                tuning.laser_dps * level as f32,
            );
            beam.size.x = tuning.laser_width * (1.0 + 0.5 * (level - 1) as f32);
            vec![Shot::Single(beam)]
        }
        WeaponKind::Homing => fan_angles(level, 0.3)
            .map(|angle| {
                Shot::Single(angled(
                    BulletKind::Homing { target: None },
                    muzzle,
                    angle,
                    tuning.homing_speed,
                    damage,
                ))
            })
            .collect(),
        WeaponKind::Missile => fan_angles(level, 0.2)
            .map(|angle| {
                Shot::Single(angled(
                    BulletKind::Missile { target: None },
                    muzzle,
                    angle,
                    tuning.missile_speed,
                    tuning.missile_damage,
                ))
            })
            .collect(),
        WeaponKind::Emp => {
            let max_radius = tuning.emp_max_radius * (1.0 + 0.25 * (level - 1) as f32);
            let pulse = Bullet::new(
                Owner::Player,
                BulletKind::Emp {
                    radius: EMP_START_RADIUS.min(max_radius),
                    max_radius,
                },
                player.pos,
                Vec2::ZERO,
                tuning.emp_dps,
                Vec2::splat(max_radius * 2.0),
            );
            vec![Shot::Single(pulse)]
        }
        WeaponKind::Split => {
            let bullet = Bullet::player_shot(
                BulletKind::Split {
                    split_count: tuning.split_count,
                    child_count: tuning.split_children + (level - 1),
                    split_at_y: tuning.first_split_y(),
                },
                muzzle,
                speed,
                damage * 2.0,
            );
            vec![Shot::Single(bullet)]
        }
        WeaponKind::BlackHole => {
            let max_radius = tuning.black_hole_max_radius * (1.0 + 0.25 * (level - 1) as f32);
            let hole = Bullet::new(
                Owner::Player,
                BulletKind::BlackHole {
                    radius: tuning.black_hole_radius,
                    max_radius,
                    duration: tuning.black_hole_secs,
                },
                muzzle,
                Vec2::new(0.0, -tuning.black_hole_speed),
                tuning.black_hole_dps,
                Vec2::splat(tuning.black_hole_radius * 2.0),
            );
            vec![Shot::Single(hole)]
        }
        WeaponKind::Quantum => {
            let gap = Vec2::new(tuning.quantum_spacing / 2.0, 0.0);
            let damage = damage * level as f32;
            let left = Bullet::player_shot(BulletKind::Standard, muzzle - gap, speed, damage);
            let right = Bullet::player_shot(BulletKind::Standard, muzzle + gap, speed, damage);
            vec![Shot::Pair(left, right)]
        }
    }
}
