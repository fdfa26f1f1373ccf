//! Game settings and preferences
//!
//! Persisted separately from high scores through a `KeyValueStore`.

use std::collections::HashSet;
use std::hash::Hash;

use serde::{Deserialize, Serialize};

use crate::persistence::{KeyValueStore, PersistenceError, load_json, save_json};
use crate::sim::state::{EnemyKind, PowerUpKind, WeaponKind};

/// Difficulty preset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Difficulty {
    Easy,
    #[default]
    Normal,
    Hard,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "Easy",
            Difficulty::Normal => "Normal",
            Difficulty::Hard => "Hard",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "easy" => Some(Difficulty::Easy),
            "normal" | "medium" => Some(Difficulty::Normal),
            "hard" => Some(Difficulty::Hard),
            _ => None,
        }
    }

    /// Starting value of the difficulty curve
    pub fn base(&self) -> f32 {
        match self {
            Difficulty::Easy => 0.75,
            Difficulty::Normal => 1.0,
            Difficulty::Hard => 1.5,
        }
    }
}

/// Game settings/preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub difficulty: Difficulty,

    // === Run ===
    /// Player health at the start of a run
    pub initial_health: f32,
    /// Total run length in seconds, split evenly across levels
    pub game_duration_secs: f32,
    /// Weapons that may appear as power-ups
    pub enabled_weapons: Vec<WeaponKind>,
    /// Enemy kinds the spawner draws from
    pub enabled_enemies: Vec<EnemyKind>,
    /// Fire continuously without holding the fire action
    pub auto_fire: bool,

    // === Visual Effects ===
    /// Particle effects (explosions)
    pub particles: bool,

    // === Audio ===
    /// Master volume (0.0 - 1.0)
    pub master_volume: f32,
    /// Sound effects volume (0.0 - 1.0)
    pub sfx_volume: f32,
    /// Music volume (0.0 - 1.0)
    pub music_volume: f32,
    pub muted: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            difficulty: Difficulty::Normal,

            initial_health: 100.0,
            game_duration_secs: 180.0,
            enabled_weapons: WeaponKind::ALL.to_vec(),
            enabled_enemies: EnemyKind::ALL.to_vec(),
            auto_fire: true,

            particles: true,

            master_volume: 0.8,
            sfx_volume: 1.0,
            music_volume: 0.7,
            muted: false,
        }
    }
}

impl Settings {
    /// Storage key
    pub const STORAGE_KEY: &'static str = "nova_strike_settings";

    /// Create settings for a difficulty preset
    pub fn from_difficulty(difficulty: Difficulty) -> Self {
        Self {
            difficulty,
            ..Self::default()
        }
    }

    /// Enemy kinds to spawn (falls back to `Normal` when none are enabled)
    pub fn enemy_kinds(&self) -> Vec<EnemyKind> {
        if self.enabled_enemies.is_empty() {
            vec![EnemyKind::Normal]
        } else {
            self.enabled_enemies.clone()
        }
    }

    /// Power-up kinds that can spawn: the utility pickups plus a grant for
    /// every enabled weapon other than the default
    pub fn powerup_kinds(&self) -> Vec<PowerUpKind> {
        let mut kinds = vec![
            PowerUpKind::Health,
            PowerUpKind::Shield,
            PowerUpKind::SpeedBoost,
            PowerUpKind::Bomb,
        ];
        kinds.extend(
            self.enabled_weapons
                .iter()
                .filter(|w| **w != WeaponKind::Standard)
                .map(|w| PowerUpKind::Weapon(*w)),
        );
        kinds
    }

    /// Clamp values into usable ranges
    pub fn sanitized(mut self) -> Self {
        let defaults = Self::default();
        if !(self.initial_health.is_finite() && self.initial_health > 0.0) {
            self.initial_health = defaults.initial_health;
        }
        if !(self.game_duration_secs.is_finite() && self.game_duration_secs > 0.0) {
            self.game_duration_secs = defaults.game_duration_secs;
        }
        self.master_volume = self.master_volume.clamp(0.0, 1.0);
        self.sfx_volume = self.sfx_volume.clamp(0.0, 1.0);
        self.music_volume = self.music_volume.clamp(0.0, 1.0);
        dedup_in_order(&mut self.enabled_weapons);
        dedup_in_order(&mut self.enabled_enemies);
        self
    }

    /// Load settings, falling back to defaults on any failure
    pub fn load(store: &dyn KeyValueStore) -> Self {
        match load_json::<Settings>(store, Self::STORAGE_KEY) {
            Ok(Some(settings)) => {
                log::info!("Loaded settings");
                settings.sanitized()
            }
            Ok(None) => {
                log::info!("Using default settings");
                Self::default()
            }
            Err(err) => {
                log::warn!("Failed to load settings, using defaults: {}", err);
                Self::default()
            }
        }
    }

    pub fn save(&self, store: &mut dyn KeyValueStore) -> Result<(), PersistenceError> {
        save_json(store, Self::STORAGE_KEY, self)?;
        log::info!("Settings saved");
        Ok(())
    }
}

/// Drop repeated entries anywhere in the list, keeping first occurrences
fn dedup_in_order<T: Copy + Eq + Hash>(items: &mut Vec<T>) {
    let mut seen = HashSet::new();
    items.retain(|item| seen.insert(*item));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::MemoryStore;

    #[test]
    fn test_difficulty_from_str() {
        assert_eq!(Difficulty::from_str("HARD"), Some(Difficulty::Hard));
        assert_eq!(Difficulty::from_str("medium"), Some(Difficulty::Normal));
        assert_eq!(Difficulty::from_str("nightmare"), None);
        assert!(Difficulty::Hard.base() > Difficulty::Easy.base());
    }

    #[test]
    fn test_powerups_follow_enabled_weapons() {
        let settings = Settings {
            enabled_weapons: vec![WeaponKind::Standard, WeaponKind::Laser],
            ..Default::default()
        };
        let kinds = settings.powerup_kinds();
        assert!(kinds.contains(&PowerUpKind::Weapon(WeaponKind::Laser)));
        assert!(!kinds.contains(&PowerUpKind::Weapon(WeaponKind::Standard)));
        assert!(!kinds.contains(&PowerUpKind::Coin));
        assert_eq!(kinds.len(), 5);
    }

    #[test]
    fn test_empty_enemy_set_falls_back() {
        let settings = Settings {
            enabled_enemies: Vec::new(),
            ..Default::default()
        };
        assert_eq!(settings.enemy_kinds(), vec![EnemyKind::Normal]);
    }

    #[test]
    fn test_save_then_load() {
        let mut store = MemoryStore::new();
        let settings = Settings {
            difficulty: Difficulty::Hard,
            muted: true,
            ..Default::default()
        };
        settings.save(&mut store).unwrap();
        assert_eq!(Settings::load(&store), settings);
    }

    #[test]
    fn test_corrupt_settings_fall_back_to_defaults() {
        let mut store = MemoryStore::new();
        store.set(Settings::STORAGE_KEY, "][").unwrap();
        assert_eq!(Settings::load(&store), Settings::default());
    }

    #[test]
    fn test_partial_document_is_sanitized() {
        let mut store = MemoryStore::new();
        store
            .set(
                Settings::STORAGE_KEY,
                r#"{ "initial_health": -5.0, "master_volume": 3.0 }"#,
            )
            .unwrap();
        let settings = Settings::load(&store);
        assert_eq!(settings.initial_health, 100.0);
        assert_eq!(settings.master_volume, 1.0);
        assert_eq!(settings.difficulty, Difficulty::Normal);
    }

    #[test]
    fn test_sanitized_drops_scattered_duplicates() {
        let settings = Settings {
            enabled_enemies: vec![EnemyKind::Normal, EnemyKind::Tough, EnemyKind::Normal],
            enabled_weapons: vec![WeaponKind::Laser, WeaponKind::Standard, WeaponKind::Laser],
            ..Default::default()
        }
        .sanitized();
        assert_eq!(settings.enabled_enemies, vec![EnemyKind::Normal, EnemyKind::Tough]);
        assert_eq!(settings.enabled_weapons, vec![WeaponKind::Laser, WeaponKind::Standard]);
    }
}
