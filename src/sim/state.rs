//! Game state and core simulation types
//!
//! Entities are plain data. Everything except the player carries an id from
//! a single counter, so cross references (homing targets, quantum partners)
//! are ids into the owning collections rather than pointers.

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::collision::{Hitbox, Shape};
use super::spawner::{Spawn, Spawner};
use crate::consts::*;
use crate::settings::Settings;
use crate::tuning::Tuning;

/// Run state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Waiting for the start action
    Idle,
    /// Active gameplay
    Running,
    /// Simulation frozen, only resume/restart accepted
    Paused,
    /// Final level completed (terminal)
    Victory,
    /// Player destroyed (terminal)
    GameOver,
}

impl GamePhase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, GamePhase::Victory | GamePhase::GameOver)
    }
}

/// Which side fired a bullet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Owner {
    Player,
    Enemy,
}

/// Player weapon variants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum WeaponKind {
    #[default]
    Standard,
    Spread,
    Piercing,
    Laser,
    Homing,
    Missile,
    Emp,
    Split,
    BlackHole,
    Quantum,
}

impl WeaponKind {
    pub const ALL: [WeaponKind; 10] = [
        WeaponKind::Standard,
        WeaponKind::Spread,
        WeaponKind::Piercing,
        WeaponKind::Laser,
        WeaponKind::Homing,
        WeaponKind::Missile,
        WeaponKind::Emp,
        WeaponKind::Split,
        WeaponKind::BlackHole,
        WeaponKind::Quantum,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            WeaponKind::Standard => "standard",
            WeaponKind::Spread => "spread",
            WeaponKind::Piercing => "piercing",
            WeaponKind::Laser => "laser",
            WeaponKind::Homing => "homing",
            WeaponKind::Missile => "missile",
            WeaponKind::Emp => "emp",
            WeaponKind::Split => "split",
            WeaponKind::BlackHole => "blackHole",
            WeaponKind::Quantum => "quantum",
        }
    }
}

/// Maximum weapon level
pub const MAX_WEAPON_LEVEL: u8 = 3;

/// Enemy archetypes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EnemyKind {
    Normal,
    Fast,
    Tough,
    Small,
    Large,
    Turret,
    Tank,
    Aircraft,
}

/// Fixed per-kind stats
#[derive(Debug, Clone, Copy)]
pub struct EnemyProfile {
    pub size: Vec2,
    pub speed: f32,
    pub health: f32,
    /// Seconds between shots (None = never fires)
    pub fire_interval: Option<f32>,
    /// Shots aim at the player instead of straight down
    pub aimed: bool,
    pub zigzag_amplitude: f32,
    /// Zigzag spatial frequency (radians per pixel of descent)
    pub zigzag_k: f32,
    /// Wave temporal frequency (radians per second)
    pub wave_frequency: f32,
    /// Multiplier on the tuned contact damage
    pub contact_scale: f32,
    pub color: u32,
}

/// Base enemy descent speed (pixels/s)
pub const BASE_ENEMY_SPEED: f32 = 100.0;
/// Base enemy health
pub const BASE_ENEMY_HEALTH: f32 = 1.0;

impl EnemyKind {
    pub const ALL: [EnemyKind; 8] = [
        EnemyKind::Normal,
        EnemyKind::Fast,
        EnemyKind::Tough,
        EnemyKind::Small,
        EnemyKind::Large,
        EnemyKind::Turret,
        EnemyKind::Tank,
        EnemyKind::Aircraft,
    ];

    pub fn profile(&self) -> EnemyProfile {
        let base = EnemyProfile {
            size: Vec2::new(40.0, 40.0),
            speed: BASE_ENEMY_SPEED,
            health: BASE_ENEMY_HEALTH,
            fire_interval: None,
            aimed: false,
            zigzag_amplitude: 60.0,
            zigzag_k: 0.02,
            wave_frequency: 2.0,
            contact_scale: 1.0,
            color: 0xFF4444,
        };
        match self {
            EnemyKind::Normal => base,
            EnemyKind::Fast => EnemyProfile {
                size: Vec2::new(30.0, 30.0),
                speed: BASE_ENEMY_SPEED * 2.0,
                zigzag_amplitude: 40.0,
                color: 0xFFAA00,
                ..base
            },
            EnemyKind::Tough => EnemyProfile {
                size: Vec2::new(44.0, 44.0),
                speed: BASE_ENEMY_SPEED * 0.8,
                health: BASE_ENEMY_HEALTH * 3.0,
                color: 0x8844FF,
                ..base
            },
            EnemyKind::Small => EnemyProfile {
                size: Vec2::new(24.0, 24.0),
                speed: BASE_ENEMY_SPEED * 1.5,
                zigzag_amplitude: 80.0,
                zigzag_k: 0.03,
                contact_scale: 0.5,
                color: 0x44FF88,
                ..base
            },
            EnemyKind::Large => EnemyProfile {
                size: Vec2::new(64.0, 64.0),
                speed: BASE_ENEMY_SPEED * 0.6,
                health: BASE_ENEMY_HEALTH * 5.0,
                zigzag_amplitude: 30.0,
                contact_scale: 1.5,
                color: 0xFF44AA,
                ..base
            },
            EnemyKind::Turret => EnemyProfile {
                speed: BASE_ENEMY_SPEED * 0.5,
                health: BASE_ENEMY_HEALTH * 4.0,
                fire_interval: Some(1.8),
                aimed: true,
                zigzag_amplitude: 20.0,
                color: 0x888888,
                ..base
            },
            EnemyKind::Tank => EnemyProfile {
                size: Vec2::new(56.0, 48.0),
                speed: BASE_ENEMY_SPEED * 0.4,
                health: BASE_ENEMY_HEALTH * 8.0,
                fire_interval: Some(2.5),
                zigzag_amplitude: 20.0,
                contact_scale: 1.5,
                color: 0x556B2F,
                ..base
            },
            EnemyKind::Aircraft => EnemyProfile {
                size: Vec2::new(36.0, 36.0),
                speed: BASE_ENEMY_SPEED * 1.8,
                health: BASE_ENEMY_HEALTH * 2.0,
                fire_interval: Some(1.2),
                wave_frequency: 3.0,
                color: 0x44AAFF,
                ..base
            },
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EnemyKind::Normal => "normal",
            EnemyKind::Fast => "fast",
            EnemyKind::Tough => "tough",
            EnemyKind::Small => "small",
            EnemyKind::Large => "large",
            EnemyKind::Turret => "turret",
            EnemyKind::Tank => "tank",
            EnemyKind::Aircraft => "aircraft",
        }
    }
}

/// Enemy movement variant, fixed at spawn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Movement {
    Straight,
    /// Lateral offset follows the descent: `sin(y * k) * amplitude`
    Zigzag,
    /// Lateral offset follows time alive: `sin(age * w) * amplitude`
    Wave,
}

/// An enemy ship
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Enemy {
    pub id: u32,
    pub kind: EnemyKind,
    pub movement: Movement,
    pub pos: Vec2,
    /// Centre line the zigzag/wave sway oscillates around
    pub anchor_x: f32,
    /// Seconds alive
    pub age: f32,
    pub speed: f32,
    pub size: Vec2,
    pub health: f32,
    pub max_health: f32,
    /// Damage dealt to the player on touch
    pub contact_damage: f32,
    pub fire_interval: Option<f32>,
    pub fire_cooldown: f32,
}

impl Enemy {
    /// Create an enemy of the given kind at the top edge. The id is assigned
    /// on insertion into the state.
    pub fn new(kind: EnemyKind, movement: Movement, x: f32, tuning: &Tuning) -> Self {
        let profile = kind.profile();
        Self {
            id: 0,
            kind,
            movement,
            pos: Vec2::new(x, 0.0),
            anchor_x: x,
            age: 0.0,
            speed: profile.speed,
            size: profile.size,
            health: profile.health,
            max_health: profile.health,
            contact_damage: tuning.contact_damage * profile.contact_scale,
            fire_interval: profile.fire_interval,
            fire_cooldown: profile.fire_interval.unwrap_or(0.0),
        }
    }

    pub fn hitbox(&self) -> Hitbox {
        Hitbox::rect(self.pos, self.size)
    }

    /// Reduce health (clamped at 0). Returns true if the enemy died.
    pub fn apply_damage(&mut self, amount: f32) -> bool {
        self.health = (self.health - amount.max(0.0)).max(0.0);
        self.is_dead()
    }

    pub fn is_dead(&self) -> bool {
        self.health <= 0.0
    }
}

/// Boss attack patterns, one per phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttackPattern {
    /// Single shot at the player
    Aimed,
    /// Five-way downward fan
    Spread,
    /// Wide fan plus an aimed shot
    Barrage,
}

impl AttackPattern {
    pub fn for_phase(phase: u8) -> Self {
        match phase {
            0 | 1 => AttackPattern::Aimed,
            2 => AttackPattern::Spread,
            _ => AttackPattern::Barrage,
        }
    }

    /// Seconds between regular shots
    pub fn shot_interval(&self) -> f32 {
        match self {
            AttackPattern::Aimed => 1.5,
            AttackPattern::Spread => 1.2,
            AttackPattern::Barrage => 0.6,
        }
    }

    /// Seconds between ring attacks
    pub fn special_interval(&self) -> f32 {
        match self {
            AttackPattern::Aimed => 6.0,
            AttackPattern::Spread => 5.0,
            AttackPattern::Barrage => 4.0,
        }
    }
}

/// Highest boss phase
pub const MAX_BOSS_PHASE: u8 = 3;

/// The boss (at most one alive)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Boss {
    pub id: u32,
    pub pos: Vec2,
    pub size: Vec2,
    pub health: f32,
    pub max_health: f32,
    /// 1..=3, never decreases
    pub phase: u8,
    pub attack: AttackPattern,
    pub shot_interval: f32,
    pub shot_cooldown: f32,
    pub special_interval: f32,
    pub special_cooldown: f32,
    pub contact_damage: f32,
    /// Seconds on station (drives the sway)
    pub age: f32,
}

impl Boss {
    pub fn new(max_health: f32, tuning: &Tuning) -> Self {
        let attack = AttackPattern::for_phase(1);
        Self {
            id: 0,
            pos: Vec2::new(PLAYFIELD_WIDTH / 2.0, 0.0),
            size: Vec2::new(tuning.boss_width, tuning.boss_height),
            health: max_health,
            max_health,
            phase: 1,
            attack,
            shot_interval: attack.shot_interval(),
            shot_cooldown: attack.shot_interval(),
            special_interval: attack.special_interval(),
            special_cooldown: attack.special_interval(),
            contact_damage: tuning.boss_contact_damage,
            age: 0.0,
        }
    }

    pub fn hitbox(&self) -> Hitbox {
        Hitbox::rect(self.pos, self.size)
    }

    pub fn health_fraction(&self) -> f32 {
        if self.max_health > 0.0 {
            self.health / self.max_health
        } else {
            0.0
        }
    }

    /// Reduce health and advance the phase if a threshold was crossed.
    /// Returns the new phase when it changed.
    pub fn apply_damage(&mut self, amount: f32) -> Option<u8> {
        self.health = (self.health - amount.max(0.0)).max(0.0);
        self.update_phase()
    }

    /// Restore health. Never lowers the phase.
    pub fn heal(&mut self, amount: f32) {
        self.health = (self.health + amount.max(0.0)).min(self.max_health);
    }

    pub fn is_dead(&self) -> bool {
        self.health <= 0.0
    }

    fn update_phase(&mut self) -> Option<u8> {
        let fraction = self.health_fraction();
        let target = if fraction <= 0.25 {
            3
        } else if fraction <= 0.5 {
            2
        } else {
            1
        };
        if target <= self.phase {
            return None;
        }
        self.phase = target.min(MAX_BOSS_PHASE);
        self.attack = AttackPattern::for_phase(self.phase);
        self.shot_interval = self.attack.shot_interval();
        self.special_interval = self.attack.special_interval();
        self.shot_cooldown = self.shot_cooldown.min(self.shot_interval);
        self.special_cooldown = self.special_cooldown.min(self.special_interval);
        Some(self.phase)
    }
}

/// Bullet variants with their per-kind state
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum BulletKind {
    Standard,
    /// Survives `hits_left` hits
    Piercing,
    /// Stationary full-height beam
    Laser { duration: f32, initial_duration: f32 },
    Homing { target: Option<u32> },
    Missile { target: Option<u32> },
    Emp { radius: f32, max_radius: f32 },
    Split { split_count: u8, child_count: u8, split_at_y: f32 },
    BlackHole { radius: f32, max_radius: f32, duration: f32 },
    Quantum { partner: Option<u32> },
}

impl BulletKind {
    /// Area/beam kinds damage every overlapped target each tick instead of
    /// being consumed on hit
    pub fn is_continuous(&self) -> bool {
        matches!(
            self,
            BulletKind::Laser { .. } | BulletKind::Emp { .. } | BulletKind::BlackHole { .. }
        )
    }
}

/// A projectile
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bullet {
    pub id: u32,
    pub owner: Owner,
    pub kind: BulletKind,
    pub pos: Vec2,
    pub vel: Vec2,
    pub speed: f32,
    /// Damage per hit (per second for continuous kinds)
    pub damage: f32,
    pub size: Vec2,
    /// Hits remaining before removal
    pub hits_left: u32,
    /// Targets already struck (discrete bullets hit each target once)
    #[serde(default)]
    pub hit_ids: Vec<u32>,
}

impl Bullet {
    pub fn new(owner: Owner, kind: BulletKind, pos: Vec2, vel: Vec2, damage: f32, size: Vec2) -> Self {
        Self {
            id: 0,
            owner,
            kind,
            pos,
            vel,
            speed: vel.length(),
            damage,
            size,
            hits_left: 1,
            hit_ids: Vec::new(),
        }
    }

    /// Straight shot owned by the player, moving up
    pub fn player_shot(kind: BulletKind, pos: Vec2, speed: f32, damage: f32) -> Self {
        Self::new(
            Owner::Player,
            kind,
            pos,
            Vec2::new(0.0, -speed),
            damage,
            Vec2::new(6.0, 14.0),
        )
    }

    /// Enemy shot travelling along `dir`
    pub fn enemy_shot(pos: Vec2, dir: Vec2, speed: f32, damage: f32) -> Self {
        Self::new(
            Owner::Enemy,
            BulletKind::Standard,
            pos,
            dir.normalize_or(Vec2::Y) * speed,
            damage,
            Vec2::new(8.0, 8.0),
        )
    }

    pub fn with_hits(mut self, hits: u32) -> Self {
        self.hits_left = hits.max(1);
        self
    }

    pub fn hitbox(&self) -> Hitbox {
        match self.kind {
            BulletKind::Laser { .. } => Hitbox {
                center: Vec2::new(self.pos.x, PLAYFIELD_HEIGHT / 2.0),
                shape: Shape::Rect {
                    half: Vec2::new(self.size.x / 2.0, PLAYFIELD_HEIGHT / 2.0),
                },
            },
            BulletKind::Emp { radius, .. } | BulletKind::BlackHole { radius, .. } => Hitbox {
                center: self.pos,
                shape: Shape::Circle { radius },
            },
            _ => Hitbox::rect(self.pos, self.size),
        }
    }

    /// Beam opacity for lasers (1 for everything else)
    pub fn alpha(&self) -> f32 {
        match self.kind {
            BulletKind::Laser {
                duration,
                initial_duration,
            } if initial_duration > 0.0 => (duration / initial_duration).clamp(0.0, 1.0),
            _ => 1.0,
        }
    }

    pub fn partner(&self) -> Option<u32> {
        match self.kind {
            BulletKind::Quantum { partner } => partner,
            _ => None,
        }
    }

    pub fn target(&self) -> Option<u32> {
        match self.kind {
            BulletKind::Homing { target } | BulletKind::Missile { target } => target,
            _ => None,
        }
    }
}

/// Power-up variants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PowerUpKind {
    Health,
    Shield,
    SpeedBoost,
    Bomb,
    Coin,
    Weapon(WeaponKind),
}

/// A falling pickup
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PowerUp {
    pub id: u32,
    pub kind: PowerUpKind,
    pub pos: Vec2,
    pub size: Vec2,
    pub speed: f32,
}

impl PowerUp {
    pub fn new(kind: PowerUpKind, pos: Vec2, size: f32, speed: f32) -> Self {
        Self {
            id: 0,
            kind,
            pos,
            size: Vec2::splat(size),
            speed,
        }
    }

    pub fn hitbox(&self) -> Hitbox {
        Hitbox::rect(self.pos, self.size)
    }
}

/// A particle for visual effects
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Particle {
    pub pos: Vec2,
    pub vel: Vec2,
    pub color: u32,
    pub life: f32, // 0-1, decreases over time
    pub size: f32,
}

/// Timed player effects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EffectKind {
    /// Granted weapon reverts to standard on expiry
    Weapon,
    SpeedBoost,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimedEffect {
    pub kind: EffectKind,
    pub remaining: f32,
}

/// How a hit was split between shield and health
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DamageOutcome {
    pub absorbed: f32,
    pub to_health: f32,
}

/// The player's ship
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    pub pos: Vec2,
    pub size: Vec2,
    pub base_speed: f32,
    pub health: f32,
    pub max_health: f32,
    pub shield: f32,
    pub shield_cap: f32,
    pub weapon: WeaponKind,
    pub weapon_level: u8,
    pub fire_cooldown: f32,
    pub invincible_timer: f32,
    pub speed_boost_factor: f32,
    pub effects: Vec<TimedEffect>,
}

impl Player {
    pub fn new(max_health: f32, tuning: &Tuning) -> Self {
        Self {
            pos: Vec2::new(
                PLAYFIELD_WIDTH / 2.0,
                PLAYFIELD_HEIGHT - tuning.player_spawn_margin,
            ),
            size: Vec2::new(tuning.player_width, tuning.player_height),
            base_speed: tuning.player_speed,
            health: max_health,
            max_health,
            shield: 0.0,
            shield_cap: tuning.shield_cap,
            weapon: WeaponKind::Standard,
            weapon_level: 1,
            fire_cooldown: 0.0,
            invincible_timer: 0.0,
            speed_boost_factor: tuning.speed_boost_factor,
            effects: Vec::new(),
        }
    }

    pub fn hitbox(&self) -> Hitbox {
        Hitbox::rect(self.pos, self.size)
    }

    pub fn half_size(&self) -> Vec2 {
        self.size / 2.0
    }

    pub fn is_dead(&self) -> bool {
        self.health <= 0.0
    }

    pub fn is_invincible(&self) -> bool {
        self.invincible_timer > 0.0
    }

    /// Apply damage through the shield first; excess carries into health
    pub fn apply_damage(&mut self, amount: f32) -> DamageOutcome {
        let amount = amount.max(0.0);
        let absorbed = amount.min(self.shield);
        self.shield -= absorbed;
        let to_health = amount - absorbed;
        self.health = (self.health - to_health).max(0.0);
        DamageOutcome {
            absorbed,
            to_health,
        }
    }

    pub fn heal(&mut self, amount: f32) {
        self.health = (self.health + amount.max(0.0)).min(self.max_health);
    }

    pub fn add_shield(&mut self, amount: f32) {
        self.shield = (self.shield + amount.max(0.0)).min(self.shield_cap);
    }

    /// Current movement speed including an active boost
    pub fn speed(&self) -> f32 {
        if self.effect_remaining(EffectKind::SpeedBoost).is_some() {
            self.base_speed * self.speed_boost_factor
        } else {
            self.base_speed
        }
    }

    pub fn effect_remaining(&self, kind: EffectKind) -> Option<f32> {
        self.effects
            .iter()
            .find(|e| e.kind == kind)
            .map(|e| e.remaining)
    }

    /// Start an effect, or restart its timer if already active
    pub fn start_effect(&mut self, kind: EffectKind, secs: f32) {
        match self.effects.iter_mut().find(|e| e.kind == kind) {
            Some(effect) => effect.remaining = secs,
            None => self.effects.push(TimedEffect {
                kind,
                remaining: secs,
            }),
        }
    }

    /// Switch weapons; collecting the current weapon again raises its level
    pub fn grant_weapon(&mut self, weapon: WeaponKind, secs: f32) {
        if self.weapon == weapon && weapon != WeaponKind::Standard {
            self.weapon_level = (self.weapon_level + 1).min(MAX_WEAPON_LEVEL);
        } else {
            self.weapon = weapon;
            self.weapon_level = 1;
        }
        self.start_effect(EffectKind::Weapon, secs);
    }

    /// Count down effect and cooldown timers; reverts expired effects.
    /// Returns the effects that ended this tick.
    pub fn tick_timers(&mut self, dt: f32) -> Vec<EffectKind> {
        self.fire_cooldown = (self.fire_cooldown - dt).max(0.0);
        self.invincible_timer = (self.invincible_timer - dt).max(0.0);

        let mut expired = Vec::new();
        for effect in &mut self.effects {
            effect.remaining -= dt;
            if effect.remaining <= 0.0 {
                expired.push(effect.kind);
            }
        }
        self.effects.retain(|e| e.remaining > 0.0);

        if expired.contains(&EffectKind::Weapon) {
            self.weapon = WeaponKind::Standard;
            self.weapon_level = 1;
        }
        expired
    }
}

/// Notifications for audio/UI adapters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    Shoot { weapon: WeaponKind },
    Explosion { pos: Vec2 },
    EnemyHit { id: u32 },
    PowerUp { kind: PowerUpKind },
    PlayerHit { damage: f32 },
    BossSpawned,
    BossPhase { phase: u8 },
    LevelUp { level: u32 },
    Victory,
    GameOver,
}

impl GameEvent {
    /// Event name as seen by the UI layer
    pub fn name(&self) -> &'static str {
        match self {
            GameEvent::Shoot { .. } => "shoot",
            GameEvent::Explosion { .. } => "explosion",
            GameEvent::EnemyHit { .. } => "enemyHit",
            GameEvent::PowerUp { .. } => "powerUp",
            GameEvent::PlayerHit { .. } => "playerHit",
            GameEvent::BossSpawned => "bossSpawned",
            GameEvent::BossPhase { .. } => "bossPhase",
            GameEvent::LevelUp { .. } => "levelUp",
            GameEvent::Victory => "victory",
            GameEvent::GameOver => "gameOver",
        }
    }
}

/// Scalar state for the HUD
#[derive(Debug, Clone, Serialize)]
pub struct HudState {
    pub phase: GamePhase,
    pub score: u64,
    pub health: f32,
    pub max_health: f32,
    pub shield: f32,
    pub level: u32,
    pub level_count: u32,
    pub elapsed: f32,
    pub level_time_left: f32,
    pub weapon: WeaponKind,
    pub weapon_level: u8,
    pub boss_health: Option<f32>,
}

/// Complete simulation state, owned by the host and passed to `tick`
#[derive(Debug, Clone)]
pub struct GameState {
    /// Run seed for reproducibility
    pub seed: u64,
    pub settings: Settings,
    pub tuning: Tuning,
    pub phase: GamePhase,
    /// Current level (1-based)
    pub level: u32,
    pub score: u64,
    pub kills: u32,
    /// Seconds of running time this run
    pub elapsed: f32,
    /// Seconds of running time this level
    pub level_elapsed: f32,
    /// Simulation tick counter
    pub time_ticks: u64,
    pub player: Player,
    /// Active enemies (sorted by id for determinism)
    pub enemies: Vec<Enemy>,
    pub boss: Option<Boss>,
    /// Active bullets of both sides (sorted by id for determinism)
    pub bullets: Vec<Bullet>,
    pub powerups: Vec<PowerUp>,
    /// Visual particles (not gameplay-affecting)
    pub particles: Vec<Particle>,
    pub spawner: Spawner,
    /// Events raised since the last drain
    pub events: Vec<GameEvent>,
    pub rng: Pcg32,
    /// Next entity ID
    next_id: u32,
}

impl GameState {
    pub fn new(seed: u64, settings: Settings, tuning: Tuning) -> Self {
        let player = Player::new(settings.initial_health, &tuning);
        Self {
            seed,
            settings,
            tuning,
            phase: GamePhase::Idle,
            level: 1,
            score: 0,
            kills: 0,
            elapsed: 0.0,
            level_elapsed: 0.0,
            time_ticks: 0,
            player,
            enemies: Vec::new(),
            boss: None,
            bullets: Vec::new(),
            powerups: Vec::new(),
            particles: Vec::new(),
            spawner: Spawner::new(),
            events: Vec::new(),
            rng: Pcg32::seed_from_u64(seed),
            next_id: 1,
        }
    }

    /// New state with default settings and tuning
    pub fn with_seed(seed: u64) -> Self {
        Self::new(seed, Settings::default(), Tuning::default())
    }

    /// Return to `Idle` with a fresh run. Timers, entities and score are
    /// replaced wholesale; the RNG stream and id counter carry on.
    pub fn reset(&mut self) {
        self.phase = GamePhase::Idle;
        self.level = 1;
        self.score = 0;
        self.kills = 0;
        self.elapsed = 0.0;
        self.level_elapsed = 0.0;
        self.time_ticks = 0;
        self.player = Player::new(self.settings.initial_health, &self.tuning);
        self.enemies.clear();
        self.boss = None;
        self.bullets.clear();
        self.powerups.clear();
        self.particles.clear();
        self.spawner = Spawner::new();
        self.events.clear();
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Current difficulty (grows with level and total run time, never drops)
    pub fn difficulty(&self) -> f32 {
        self.settings.difficulty.base()
            + (self.level.saturating_sub(1)) as f32 * self.tuning.level_difficulty_step
            + self.elapsed / self.tuning.difficulty_time_scale
    }

    /// Seconds per level
    pub fn level_duration(&self) -> f32 {
        self.settings.game_duration_secs / self.tuning.level_count.max(1) as f32
    }

    pub fn boss_alive(&self) -> bool {
        self.boss.is_some()
    }

    /// Insert a spawner product, assigning its id. Entities with
    /// nonsensical geometry are dropped with a warning.
    pub fn insert_spawn(&mut self, spawn: Spawn) -> Option<u32> {
        if !spawn.is_valid() {
            log::warn!("Dropping invalid spawn: {:?}", spawn);
            return None;
        }
        let id = self.next_entity_id();
        match spawn {
            Spawn::Enemy(mut enemy) => {
                enemy.id = id;
                log::debug!("Spawned {} enemy #{}", enemy.kind.as_str(), id);
                self.enemies.push(enemy);
            }
            Spawn::PowerUp(mut powerup) => {
                powerup.id = id;
                self.powerups.push(powerup);
            }
            Spawn::Boss(mut boss) => {
                if self.boss.is_some() {
                    log::warn!("Boss spawn ignored: a boss is already alive");
                    return None;
                }
                boss.id = id;
                log::info!("Boss #{} spawned (health {})", id, boss.max_health);
                self.boss = Some(boss);
                self.events.push(GameEvent::BossSpawned);
            }
        }
        Some(id)
    }

    /// Add a bullet, assigning its id
    pub fn spawn_bullet(&mut self, mut bullet: Bullet) -> u32 {
        let id = self.next_entity_id();
        bullet.id = id;
        self.bullets.push(bullet);
        id
    }

    /// Add two bullets linked as a quantum pair
    pub fn spawn_quantum_pair(&mut self, mut a: Bullet, mut b: Bullet) -> (u32, u32) {
        let id_a = self.next_entity_id();
        let id_b = self.next_entity_id();
        a.id = id_a;
        b.id = id_b;
        a.kind = BulletKind::Quantum {
            partner: Some(id_b),
        };
        b.kind = BulletKind::Quantum {
            partner: Some(id_a),
        };
        self.bullets.push(a);
        self.bullets.push(b);
        (id_a, id_b)
    }

    /// Ids and positions of everything player bullets can target
    pub fn targets(&self) -> Vec<(u32, Vec2)> {
        let mut targets: Vec<(u32, Vec2)> = self.enemies.iter().map(|e| (e.id, e.pos)).collect();
        if let Some(boss) = &self.boss {
            targets.push((boss.id, boss.pos));
        }
        targets
    }

    /// Queue an explosion event with a particle burst
    pub fn explode(&mut self, pos: Vec2, color: u32) {
        self.events.push(GameEvent::Explosion { pos });
        if !self.settings.particles {
            return;
        }

        // Hash-based jitter keeps cosmetic effects off the gameplay RNG
        let count = self.tuning.explosion_particles;
        for j in 0..count {
            let hash = (self.time_ticks as u32)
                .wrapping_mul(2654435761)
                .wrapping_add(j * 7919)
                .wrapping_add((pos.x as u32).wrapping_mul(31));
            let rand1 = (hash % 1000) as f32 / 1000.0;
            let rand2 = ((hash >> 10) % 1000) as f32 / 1000.0;

            let angle = std::f32::consts::TAU * (j as f32 / count.max(1) as f32) + rand1 * 0.5;
            let speed = 60.0 + rand2 * 140.0;
            self.particles.push(Particle {
                pos,
                vel: Vec2::new(angle.cos(), angle.sin()) * speed,
                color,
                life: 1.0,
                size: 2.0 + rand1 * 3.0,
            });
        }

        let max = self.tuning.max_particles;
        if self.particles.len() > max {
            let excess = self.particles.len() - max;
            self.particles.drain(..excess);
        }
    }

    /// Take all events raised since the last call
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn hud(&self) -> HudState {
        HudState {
            phase: self.phase,
            score: self.score,
            health: self.player.health,
            max_health: self.player.max_health,
            shield: self.player.shield,
            level: self.level,
            level_count: self.tuning.level_count,
            elapsed: self.elapsed,
            level_time_left: (self.level_duration() - self.level_elapsed).max(0.0),
            weapon: self.player.weapon,
            weapon_level: self.player.weapon_level,
            boss_health: self.boss.as_ref().map(|b| b.health_fraction()),
        }
    }

    /// Ensure collections are sorted by ID for deterministic iteration
    pub fn normalize_order(&mut self) {
        self.enemies.sort_by_key(|e| e.id);
        self.bullets.sort_by_key(|b| b.id);
        self.powerups.sort_by_key(|p| p.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tuning() -> Tuning {
        Tuning::default()
    }

    #[test]
    fn test_kind_defaults() {
        let normal = EnemyKind::Normal.profile();
        let tough = EnemyKind::Tough.profile();
        let fast = EnemyKind::Fast.profile();
        assert_eq!(tough.health, normal.health * 3.0);
        assert_eq!(fast.speed, normal.speed * 2.0);
    }

    #[test]
    fn test_shield_absorbs_first() {
        let mut player = Player::new(100.0, &tuning());
        player.shield = 30.0;

        let outcome = player.apply_damage(20.0);
        assert_eq!(player.shield, 10.0);
        assert_eq!(player.health, 100.0);
        assert_eq!(outcome.to_health, 0.0);

        let outcome = player.apply_damage(25.0);
        assert_eq!(player.shield, 0.0);
        assert_eq!(player.health, 85.0);
        assert_eq!(outcome.absorbed, 10.0);
    }

    #[test]
    fn test_health_clamped() {
        let mut player = Player::new(50.0, &tuning());
        player.apply_damage(500.0);
        assert_eq!(player.health, 0.0);
        assert!(player.is_dead());

        player.heal(1000.0);
        assert_eq!(player.health, 50.0);
    }

    #[test]
    fn test_shield_capped() {
        let mut player = Player::new(100.0, &tuning());
        player.add_shield(80.0);
        player.add_shield(80.0);
        assert_eq!(player.shield, player.shield_cap);
    }

    #[test]
    fn test_speed_boost_does_not_stack() {
        let t = tuning();
        let mut player = Player::new(100.0, &t);
        player.start_effect(EffectKind::SpeedBoost, 5.0);
        player.tick_timers(3.0);
        player.start_effect(EffectKind::SpeedBoost, 5.0);

        assert_eq!(player.speed(), t.player_speed * t.speed_boost_factor);
        assert_eq!(player.effect_remaining(EffectKind::SpeedBoost), Some(5.0));

        player.tick_timers(5.0);
        assert_eq!(player.speed(), t.player_speed);
    }

    #[test]
    fn test_weapon_expires_to_standard() {
        let mut player = Player::new(100.0, &tuning());
        player.grant_weapon(WeaponKind::Laser, 1.0);
        player.grant_weapon(WeaponKind::Laser, 1.0);
        assert_eq!(player.weapon, WeaponKind::Laser);
        assert_eq!(player.weapon_level, 2);

        let expired = player.tick_timers(1.5);
        assert_eq!(expired, vec![EffectKind::Weapon]);
        assert_eq!(player.weapon, WeaponKind::Standard);
        assert_eq!(player.weapon_level, 1);
    }

    #[test]
    fn test_boss_phase_is_monotonic() {
        let mut boss = Boss::new(100.0, &tuning());
        boss.health = 51.0;
        assert_eq!(boss.apply_damage(2.0), Some(2));
        assert_eq!(boss.attack, AttackPattern::Spread);

        boss.heal(100.0);
        assert_eq!(boss.health, 100.0);
        assert_eq!(boss.phase, 2);

        // Skipping straight past 25% lands in phase 3
        assert_eq!(boss.apply_damage(80.0), Some(3));
        assert_eq!(boss.attack, AttackPattern::Barrage);
        assert_eq!(boss.apply_damage(1.0), None);
    }

    #[test]
    fn test_laser_alpha() {
        let mut bullet = Bullet::player_shot(
            BulletKind::Laser {
                duration: 0.3,
                initial_duration: 0.6,
            },
            Vec2::new(100.0, 500.0),
            0.0,
            1.0,
        );
        assert!((bullet.alpha() - 0.5).abs() < 1e-6);
        bullet.kind = BulletKind::Standard;
        assert_eq!(bullet.alpha(), 1.0);
    }

    #[test]
    fn test_quantum_pair_is_symmetric() {
        let mut state = GameState::with_seed(1);
        let shot = Bullet::player_shot(BulletKind::Standard, Vec2::new(100.0, 500.0), 500.0, 1.0);
        let (a, b) = state.spawn_quantum_pair(shot.clone(), shot);
        assert_eq!(state.bullets[0].partner(), Some(b));
        assert_eq!(state.bullets[1].partner(), Some(a));
    }

    #[test]
    fn test_invalid_spawn_dropped() {
        let mut state = GameState::with_seed(1);
        let mut powerup = PowerUp::new(PowerUpKind::Health, Vec2::new(100.0, 0.0), 24.0, 100.0);
        powerup.size = Vec2::new(f32::NAN, -3.0);
        assert_eq!(state.insert_spawn(Spawn::PowerUp(powerup)), None);
        assert!(state.powerups.is_empty());
    }

    #[test]
    fn test_second_boss_rejected() {
        let mut state = GameState::with_seed(1);
        let boss = Boss::new(100.0, &state.tuning);
        assert!(state.insert_spawn(Spawn::Boss(boss.clone())).is_some());
        assert!(state.insert_spawn(Spawn::Boss(boss)).is_none());
        assert!(state.boss_alive());
    }

    #[test]
    fn test_explosion_respects_particle_setting() {
        let mut state = GameState::with_seed(1);
        state.explode(Vec2::new(10.0, 10.0), 0xFFFFFF);
        assert_eq!(state.particles.len(), state.tuning.explosion_particles as usize);

        state.settings.particles = false;
        state.particles.clear();
        state.explode(Vec2::new(10.0, 10.0), 0xFFFFFF);
        assert!(state.particles.is_empty());
        assert_eq!(state.drain_events().len(), 2);
    }
}
