//! Data-driven game balance
//!
//! Every numeric constant that shapes gameplay lives here so balance can be
//! tweaked (or loaded from JSON) without touching simulation code. Missing
//! fields in a JSON document fall back to the defaults below.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::PLAYFIELD_HEIGHT;

/// Errors raised when loading a tuning document
#[derive(Debug, Error)]
pub enum TuningError {
    /// JSON could not be parsed
    #[error("Failed to parse tuning: {0}")]
    Parse(#[from] serde_json::Error),

    /// A value is outside its legal range
    #[error("Invalid tuning value '{field}': {details}")]
    Invalid { field: &'static str, details: String },
}

/// Balance constants for a run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    // === Player ===
    pub player_width: f32,
    pub player_height: f32,
    /// Base movement speed (pixels/s)
    pub player_speed: f32,
    /// Distance of the ship centre from the bottom edge at spawn
    pub player_spawn_margin: f32,
    /// Seconds between shots
    pub fire_interval: f32,
    /// Invincibility window after taking damage (seconds)
    pub invincibility_secs: f32,
    pub shield_cap: f32,

    // === Damage model ===
    /// Damage the player takes from touching an enemy
    pub contact_damage: f32,
    /// Damage an enemy takes from touching the player
    pub enemy_contact_penalty: f32,
    /// Damage the player takes from touching the boss
    pub boss_contact_damage: f32,
    /// Damage the boss takes from touching the player
    pub boss_contact_penalty: f32,

    // === Scoring ===
    pub enemy_kill_score: u64,
    pub boss_kill_score: u64,
    pub coin_score: u64,
    /// Chance an enemy drops something on death
    pub drop_chance: f32,
    /// Fraction of drops that are coins (the rest are power-ups)
    pub coin_drop_share: f32,

    // === Power-ups ===
    /// Per-tick spawn probability
    pub powerup_chance: f32,
    pub powerup_size: f32,
    pub powerup_speed: f32,
    pub health_pickup: f32,
    pub shield_pickup: f32,
    pub weapon_duration_secs: f32,
    pub speed_boost_factor: f32,
    pub speed_boost_secs: f32,

    // === Spawning & difficulty ===
    pub enemy_spawn_interval: f32,
    pub min_spawn_interval: f32,
    /// Difficulty added per level beyond the first
    pub level_difficulty_step: f32,
    /// Seconds of level time per +1 difficulty
    pub difficulty_time_scale: f32,
    pub zigzag_chance: f32,
    pub wave_chance: f32,
    pub boss_score_threshold: u64,

    // === Levels ===
    pub level_count: u32,
    /// Health restored on level advance
    pub level_heal: f32,
    /// Optional score-based advance (level N ends at N * step points)
    pub level_score_step: Option<u64>,

    // === Boss ===
    pub boss_base_health: f32,
    pub boss_health_per_level: f32,
    pub boss_width: f32,
    pub boss_height: f32,
    pub boss_hold_y: f32,
    pub boss_descent_speed: f32,
    pub boss_sway_amplitude: f32,
    pub boss_sway_frequency: f32,
    pub boss_bullet_speed: f32,
    pub boss_bullet_damage: f32,

    // === Bullets ===
    pub bullet_speed: f32,
    pub bullet_damage: f32,
    pub enemy_bullet_speed: f32,
    pub enemy_bullet_damage: f32,
    pub pierce_hits: u32,
    pub laser_duration_secs: f32,
    pub laser_width: f32,
    /// Continuous damage per second for beam/area weapons
    pub laser_dps: f32,
    pub emp_growth: f32,
    pub emp_max_radius: f32,
    pub emp_dps: f32,
    pub homing_speed: f32,
    pub missile_speed: f32,
    pub missile_damage: f32,
    pub split_count: u8,
    pub split_children: u8,
    /// Total fan angle for split children (radians)
    pub split_spread: f32,
    /// First split line as a fraction of playfield height (from the top)
    pub split_line: f32,
    /// How much higher each generation's split line sits (fraction of height)
    pub split_step: f32,
    pub black_hole_speed: f32,
    pub black_hole_radius: f32,
    pub black_hole_max_radius: f32,
    pub black_hole_growth: f32,
    pub black_hole_secs: f32,
    /// Attraction speed toward the centre (pixels/s)
    pub black_hole_pull: f32,
    pub black_hole_dps: f32,
    /// Per-tick swap probability for quantum pairs
    pub quantum_swap_chance: f32,
    /// Horizontal gap between the two halves of a quantum pair
    pub quantum_spacing: f32,

    // === Effects ===
    pub explosion_particles: u32,
    pub max_particles: usize,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            player_width: 40.0,
            player_height: 40.0,
            player_speed: 300.0,
            player_spawn_margin: 60.0,
            fire_interval: 0.2,
            invincibility_secs: 0.5,
            shield_cap: 100.0,

            contact_damage: 20.0,
            enemy_contact_penalty: 50.0,
            boss_contact_damage: 30.0,
            boss_contact_penalty: 20.0,

            enemy_kill_score: 10,
            boss_kill_score: 100,
            coin_score: 5,
            drop_chance: 0.1,
            coin_drop_share: 0.7,

            powerup_chance: 0.005,
            powerup_size: 24.0,
            powerup_speed: 100.0,
            health_pickup: 25.0,
            shield_pickup: 50.0,
            weapon_duration_secs: 10.0,
            speed_boost_factor: 1.5,
            speed_boost_secs: 5.0,

            enemy_spawn_interval: 1.5,
            min_spawn_interval: 0.25,
            level_difficulty_step: 0.5,
            difficulty_time_scale: 10.0,
            zigzag_chance: 0.3,
            wave_chance: 0.1,
            boss_score_threshold: 500,

            level_count: 3,
            level_heal: 20.0,
            level_score_step: None,

            boss_base_health: 100.0,
            boss_health_per_level: 50.0,
            boss_width: 120.0,
            boss_height: 80.0,
            boss_hold_y: 100.0,
            boss_descent_speed: 60.0,
            boss_sway_amplitude: 200.0,
            boss_sway_frequency: 0.8,
            boss_bullet_speed: 220.0,
            boss_bullet_damage: 10.0,

            bullet_speed: 500.0,
            bullet_damage: 1.0,
            enemy_bullet_speed: 250.0,
            enemy_bullet_damage: 10.0,
            pierce_hits: 3,
            laser_duration_secs: 0.6,
            laser_width: 12.0,
            laser_dps: 6.0,
            emp_growth: 240.0,
            emp_max_radius: 160.0,
            emp_dps: 4.0,
            homing_speed: 400.0,
            missile_speed: 320.0,
            missile_damage: 3.0,
            split_count: 2,
            split_children: 3,
            split_spread: 0.8,
            split_line: 0.7,
            split_step: 0.3,
            black_hole_speed: 120.0,
            black_hole_radius: 10.0,
            black_hole_max_radius: 90.0,
            black_hole_growth: 60.0,
            black_hole_secs: 3.0,
            black_hole_pull: 120.0,
            black_hole_dps: 2.0,
            quantum_swap_chance: 0.05,
            quantum_spacing: 20.0,

            explosion_particles: 12,
            max_particles: 512,
        }
    }
}

impl Tuning {
    /// Parse and validate a JSON tuning document
    pub fn from_json(json: &str) -> Result<Self, TuningError> {
        let tuning: Tuning = serde_json::from_str(json)?;
        tuning.validate()?;
        Ok(tuning)
    }

    /// Check ranges the simulation relies on
    pub fn validate(&self) -> Result<(), TuningError> {
        fn positive(field: &'static str, value: f32) -> Result<(), TuningError> {
            if value.is_finite() && value > 0.0 {
                Ok(())
            } else {
                Err(TuningError::Invalid {
                    field,
                    details: format!("expected a positive number, got {value}"),
                })
            }
        }
        fn probability(field: &'static str, value: f32) -> Result<(), TuningError> {
            if (0.0..=1.0).contains(&value) {
                Ok(())
            } else {
                Err(TuningError::Invalid {
                    field,
                    details: format!("expected a probability in [0, 1], got {value}"),
                })
            }
        }

        positive("player_speed", self.player_speed)?;
        positive("fire_interval", self.fire_interval)?;
        positive("shield_cap", self.shield_cap)?;
        positive("enemy_spawn_interval", self.enemy_spawn_interval)?;
        positive("min_spawn_interval", self.min_spawn_interval)?;
        positive("difficulty_time_scale", self.difficulty_time_scale)?;
        positive("boss_base_health", self.boss_base_health)?;
        positive("laser_duration_secs", self.laser_duration_secs)?;
        positive("emp_max_radius", self.emp_max_radius)?;
        positive("black_hole_secs", self.black_hole_secs)?;
        probability("powerup_chance", self.powerup_chance)?;
        probability("drop_chance", self.drop_chance)?;
        probability("coin_drop_share", self.coin_drop_share)?;
        probability("quantum_swap_chance", self.quantum_swap_chance)?;
        probability("zigzag_chance + wave_chance", self.zigzag_chance + self.wave_chance)?;
        probability("split_line", self.split_line)?;

        if self.level_count == 0 {
            return Err(TuningError::Invalid {
                field: "level_count",
                details: "at least one level is required".to_string(),
            });
        }
        if self.boss_score_threshold == 0 {
            return Err(TuningError::Invalid {
                field: "boss_score_threshold",
                details: "must be non-zero".to_string(),
            });
        }
        if self.black_hole_radius > self.black_hole_max_radius {
            return Err(TuningError::Invalid {
                field: "black_hole_radius",
                details: "initial radius exceeds max radius".to_string(),
            });
        }
        Ok(())
    }

    /// Y coordinate of the first split line
    pub fn first_split_y(&self) -> f32 {
        PLAYFIELD_HEIGHT * self.split_line
    }

    /// Vertical distance between successive split lines
    pub fn split_step_y(&self) -> f32 {
        PLAYFIELD_HEIGHT * self.split_step
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(Tuning::default().validate().is_ok());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let tuning = Tuning::from_json(r#"{ "contact_damage": 10.0, "shield_cap": 50.0 }"#)
            .expect("partial tuning should parse");
        assert_eq!(tuning.contact_damage, 10.0);
        assert_eq!(tuning.shield_cap, 50.0);
        assert_eq!(tuning.enemy_kill_score, Tuning::default().enemy_kill_score);
    }

    #[test]
    fn test_invalid_probability_rejected() {
        let err = Tuning::from_json(r#"{ "powerup_chance": 1.5 }"#).unwrap_err();
        assert!(matches!(err, TuningError::Invalid { field: "powerup_chance", .. }));
    }

    #[test]
    fn test_garbage_rejected() {
        assert!(matches!(
            Tuning::from_json("not json"),
            Err(TuningError::Parse(_))
        ));
    }

    #[test]
    fn test_zero_levels_rejected() {
        let tuning = Tuning {
            level_count: 0,
            ..Default::default()
        };
        assert!(tuning.validate().is_err());
    }
}
