//! Nova Strike - an arcade space shooter simulation core
//!
//! Core modules:
//! - `sim`: Deterministic simulation (entities, spawning, behaviours, collisions, clock)
//! - `tuning`: Data-driven game balance
//! - `settings`: Player preferences
//! - `persistence`: Key-value storage for settings and high scores
//! - `audio`: Event-to-sound adapter

pub mod audio;
pub mod highscores;
pub mod persistence;
pub mod settings;
pub mod sim;
pub mod tuning;

pub use highscores::HighScores;
pub use settings::{Difficulty, Settings};
pub use tuning::Tuning;

use glam::Vec2;

/// Game configuration constants
pub mod consts {
    /// Fixed simulation timestep (60 Hz, one tick per animation frame)
    pub const SIM_DT: f32 = 1.0 / 60.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;
    /// Longest frame delta the host loop will feed into the accumulator
    pub const MAX_FRAME_DT: f32 = 0.1;

    /// Playfield dimensions (y grows downward)
    pub const PLAYFIELD_WIDTH: f32 = 800.0;
    pub const PLAYFIELD_HEIGHT: f32 = 600.0;
}

/// Whether a point lies inside the playfield rectangle (edges inclusive)
#[inline]
pub fn in_playfield(pos: Vec2) -> bool {
    use consts::*;
    pos.x >= 0.0 && pos.x <= PLAYFIELD_WIDTH && pos.y >= 0.0 && pos.y <= PLAYFIELD_HEIGHT
}

/// Clamp a centre x so an entity of the given half-width stays on the playfield
#[inline]
pub fn clamp_x(x: f32, half_width: f32) -> f32 {
    let max = (consts::PLAYFIELD_WIDTH - half_width).max(half_width);
    x.clamp(half_width, max)
}

/// Unit vector for an angle measured from straight up (positive = clockwise)
#[inline]
pub fn direction_from_up(angle: f32) -> Vec2 {
    Vec2::new(angle.sin(), -angle.cos())
}

/// Install the platform logger
#[cfg(not(target_arch = "wasm32"))]
pub fn init_logging() {
    let _ = env_logger::try_init();
}

/// Install the platform logger
#[cfg(target_arch = "wasm32")]
pub fn init_logging() {
    console_error_panic_hook::set_once();
    let _ = console_log::init_with_level(log::Level::Info);
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen::prelude::wasm_bindgen(start)]
pub fn wasm_start() {
    init_logging();
    log::info!("Nova Strike core loaded");
}
