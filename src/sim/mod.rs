//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Stable iteration order (by entity ID)
//! - No rendering or platform dependencies

pub mod behavior;
pub mod clock;
pub mod collision;
pub mod spawner;
pub mod state;
pub mod tick;
pub mod weapons;

pub use clock::FixedStepper;
pub use collision::{Hitbox, Shape, resolve};
pub use spawner::{Spawn, SpawnContext, Spawner};
pub use state::{
    Boss, Bullet, BulletKind, Enemy, EnemyKind, GameEvent, GamePhase, GameState, HudState,
    Movement, Owner, Player, PowerUp, PowerUpKind, WeaponKind,
};
pub use tick::{EventSink, TickInput, dispatch_events, tick};
