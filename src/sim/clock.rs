//! Fixed-step driver
//!
//! Converts variable frame deltas into whole `SIM_DT` ticks.

use super::state::GameState;
use super::tick::{TickInput, tick};
use crate::consts::*;

#[derive(Debug, Clone, Default)]
pub struct FixedStepper {
    accumulator: f32,
}

impl FixedStepper {
    pub fn new() -> Self {
        Self::default()
    }

    /// Leftover time not yet simulated
    pub fn accumulator(&self) -> f32 {
        self.accumulator
    }

    pub fn reset(&mut self) {
        self.accumulator = 0.0;
    }

    /// Run as many ticks as `frame_dt` covers (at most `MAX_SUBSTEPS`).
    /// One-shot flags in `input` are cleared after the first tick that sees
    /// them. Returns the number of ticks run.
    pub fn advance(&mut self, frame_dt: f32, state: &mut GameState, input: &mut TickInput) -> u32 {
        let dt = frame_dt.clamp(0.0, MAX_FRAME_DT);
        self.accumulator += dt;

        let mut substeps = 0;
        while self.accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
            tick(state, input, SIM_DT);
            self.accumulator -= SIM_DT;
            substeps += 1;

            // Clear one-shot inputs after processing
            input.pause = false;
            input.start = false;
            input.restart = false;
        }

        // Drop backlog the substep cap could not absorb
        if substeps == MAX_SUBSTEPS {
            self.accumulator = self.accumulator.min(SIM_DT);
        }
        substeps
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::state::GamePhase;

    #[test]
    fn test_accumulates_partial_frames() {
        let mut state = GameState::with_seed(1);
        let mut input = TickInput::default();
        let mut stepper = FixedStepper::new();

        assert_eq!(stepper.advance(SIM_DT * 0.6, &mut state, &mut input), 0);
        assert_eq!(stepper.advance(SIM_DT * 0.6, &mut state, &mut input), 1);
        assert!((stepper.accumulator() - SIM_DT * 0.2).abs() < 1e-5);
    }

    #[test]
    fn test_long_frames_are_capped() {
        let mut state = GameState::with_seed(1);
        let mut input = TickInput::default();
        let mut stepper = FixedStepper::new();
        // 0.1 s worth of ticks, give or take float rounding
        let ticks = stepper.advance(5.0, &mut state, &mut input);
        assert!((5..=6).contains(&ticks));
    }

    #[test]
    fn test_one_shot_flags_cleared() {
        let mut state = GameState::with_seed(1);
        let mut input = TickInput {
            start: true,
            pause: false,
            ..Default::default()
        };
        let mut stepper = FixedStepper::new();
        stepper.advance(SIM_DT * 3.0, &mut state, &mut input);
        assert!(!input.start);
        assert_eq!(state.phase, GamePhase::Running);

        input.pause = true;
        stepper.advance(SIM_DT * 3.0, &mut state, &mut input);
        // Toggled once, not three times
        assert_eq!(state.phase, GamePhase::Paused);
    }
}
