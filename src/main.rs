//! Nova Strike headless runner
//!
//! Plays a seeded autopilot session through the fixed-step driver, logging
//! HUD snapshots and recording the result in the high-score table.
//!
//! Usage: `nova-strike [seed] [max_seconds]`
//!
//! Environment:
//! - `NOVA_STRIKE_DATA`: directory for settings and high scores (default `.nova-strike`)
//! - `NOVA_STRIKE_TUNING`: path to a JSON tuning document
//! - `RUST_LOG`: log filter (e.g. `info`, `debug`)

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    native::run();
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_start in the library
}

#[cfg(not(target_arch = "wasm32"))]
mod native {
    use nova_strike::audio::AudioManager;
    use nova_strike::consts::*;
    use nova_strike::persistence::FileStore;
    use nova_strike::sim::{FixedStepper, GamePhase, GameState, TickInput, dispatch_events};
    use nova_strike::{HighScores, Settings, Tuning};

    /// Simulated frame delta (a steady 60 fps display)
    const FRAME_DT: f32 = 1.0 / 60.0;
    /// Seconds between HUD log lines
    const HUD_INTERVAL: f32 = 10.0;

    fn load_tuning() -> Tuning {
        let Ok(path) = std::env::var("NOVA_STRIKE_TUNING") else {
            return Tuning::default();
        };
        match std::fs::read_to_string(&path) {
            Ok(json) => match Tuning::from_json(&json) {
                Ok(tuning) => {
                    log::info!("Loaded tuning from {}", path);
                    tuning
                }
                Err(err) => {
                    log::warn!("Ignoring tuning file {}: {}", path, err);
                    Tuning::default()
                }
            },
            Err(err) => {
                log::warn!("Could not read tuning file {}: {}", path, err);
                Tuning::default()
            }
        }
    }

    fn now_ms() -> f64 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_secs_f64() * 1000.0)
            .unwrap_or(0.0)
    }

    pub fn run() {
        nova_strike::init_logging();

        let mut args = std::env::args().skip(1);
        let seed = args
            .next()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or_else(|| now_ms() as u64);
        let max_seconds = args
            .next()
            .and_then(|s| s.parse::<f32>().ok())
            .unwrap_or(600.0);

        let data_dir = std::env::var("NOVA_STRIKE_DATA").unwrap_or_else(|_| ".nova-strike".into());
        let mut store = FileStore::new(&data_dir);

        let settings = Settings::load(&store);
        if let Err(err) = settings.save(&mut store) {
            log::warn!("Could not write settings: {}", err);
        }
        let tuning = load_tuning();

        log::info!("Nova Strike (headless) starting with seed {}", seed);
        let mut audio = AudioManager::from_settings(&settings);
        let mut state = GameState::new(seed, settings, tuning);
        let mut stepper = FixedStepper::new();
        let mut input = TickInput {
            start: true,
            autopilot: true,
            ..Default::default()
        };

        let mut sounds = 0usize;
        let mut next_hud = 0.0;
        let mut wall = 0.0;
        while !state.phase.is_terminal() && wall < max_seconds {
            stepper.advance(FRAME_DT, &mut state, &mut input);
            wall += FRAME_DT;

            dispatch_events(&mut state, &mut audio);
            sounds += audio.drain().len();

            if state.elapsed >= next_hud {
                next_hud += HUD_INTERVAL;
                match serde_json::to_string(&state.hud()) {
                    Ok(hud) => log::info!("HUD {}", hud),
                    Err(err) => log::warn!("HUD serialization failed: {}", err),
                }
            }
        }

        let outcome = match state.phase {
            GamePhase::Victory => "victory",
            GamePhase::GameOver => "game over",
            _ => "time limit",
        };
        println!("Nova Strike run (seed {})", seed);
        println!("  outcome:   {}", outcome);
        println!("  score:     {}", state.score);
        println!("  kills:     {}", state.kills);
        println!("  level:     {}/{}", state.level, state.tuning.level_count);
        println!("  time:      {:.1}s ({} ticks at {:.0} Hz)", state.elapsed, state.time_ticks, 1.0 / SIM_DT);
        println!("  sounds:    {}", sounds);

        let mut scores = HighScores::load(&store);
        match scores.add_score(state.score, state.level, now_ms()) {
            Some(rank) => {
                println!("  new high score, rank #{}", rank);
                if let Err(err) = scores.save(&mut store) {
                    log::warn!("Could not save high scores: {}", err);
                }
            }
            None => println!("  best so far: {}", scores.top_score().unwrap_or(0)),
        }
    }
}
