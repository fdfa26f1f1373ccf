//! Property tests for simulation invariants

use glam::Vec2;
use nova_strike::consts::*;
use nova_strike::in_playfield;
use nova_strike::sim::state::Player;
use nova_strike::sim::{GameEvent, GameState, TickInput, tick};
use nova_strike::{Difficulty, Tuning};
use proptest::prelude::*;

fn difficulty() -> impl Strategy<Value = Difficulty> {
    prop_oneof![
        Just(Difficulty::Easy),
        Just(Difficulty::Normal),
        Just(Difficulty::Hard),
    ]
}

/// A per-tick input drawn at random (no pause or restart)
fn tick_input() -> impl Strategy<Value = TickInput> {
    (-2.0f32..2.0, -2.0f32..2.0, any::<bool>()).prop_map(|(x, y, fire)| TickInput {
        movement: Vec2::new(x, y),
        fire,
        start: true,
        ..Default::default()
    })
}

proptest! {
    #[test]
    fn damage_never_heals(
        health in 1.0f32..200.0,
        shield in 0.0f32..100.0,
        damage in 0.0f32..500.0,
    ) {
        let mut player = Player::new(health, &Tuning::default());
        player.shield = shield;
        let outcome = player.apply_damage(damage);

        prop_assert!(player.health <= health);
        prop_assert!(player.health >= 0.0);
        prop_assert!(player.shield >= 0.0 && player.shield <= shield);
        // Shield takes the hit first
        prop_assert_eq!(outcome.absorbed, damage.min(shield));
        prop_assert!((outcome.to_health - (damage - shield).max(0.0)).abs() < 1e-3);
    }

    #[test]
    fn heal_and_shield_stay_bounded(
        damage in 0.0f32..300.0,
        heal in 0.0f32..300.0,
        shield in 0.0f32..300.0,
    ) {
        let tuning = Tuning::default();
        let mut player = Player::new(100.0, &tuning);
        player.apply_damage(damage);
        player.heal(heal);
        player.add_shield(shield);
        prop_assert!(player.health >= 0.0 && player.health <= player.max_health);
        prop_assert!(player.shield >= 0.0 && player.shield <= tuning.shield_cap);
    }

    #[test]
    fn at_most_one_boss(
        seed in any::<u64>(),
        bumps in prop::collection::vec(0u64..400, 1..200),
    ) {
        let mut state = GameState::with_seed(seed);
        let input = TickInput { start: true, autopilot: true, ..Default::default() };

        for bump in bumps {
            let had_boss = state.boss.is_some();
            state.score += bump;
            tick(&mut state, &input, SIM_DT);
            let spawned = state
                .drain_events()
                .iter()
                .filter(|e| matches!(e, GameEvent::BossSpawned))
                .count();
            prop_assert!(spawned <= 1);
            if spawned == 1 {
                prop_assert!(!had_boss);
            }
            if state.phase.is_terminal() {
                break;
            }
        }
    }

    #[test]
    fn live_entities_stay_on_the_playfield(
        seed in any::<u64>(),
        difficulty in difficulty(),
        inputs in prop::collection::vec(tick_input(), 1..300),
    ) {
        let mut state = GameState::with_seed(seed);
        state.settings.difficulty = difficulty;
        state.tuning.powerup_chance = 0.05;

        for input in &inputs {
            tick(&mut state, input, SIM_DT);

            let half = state.player.half_size();
            prop_assert!(state.player.pos.x >= half.x && state.player.pos.x <= PLAYFIELD_WIDTH - half.x);
            prop_assert!(state.player.pos.y >= half.y && state.player.pos.y <= PLAYFIELD_HEIGHT - half.y);
            prop_assert!(state.enemies.iter().all(|e| in_playfield(e.pos)));
            prop_assert!(state.bullets.iter().all(|b| in_playfield(b.pos)));
            prop_assert!(state.powerups.iter().all(|p| in_playfield(p.pos)));

            // Quantum pairs are symmetric while both halves live
            for bullet in &state.bullets {
                if let Some(partner) = bullet.partner() {
                    let other = state.bullets.iter().find(|b| b.id == partner);
                    prop_assert!(other.is_some_and(|o| o.partner() == Some(bullet.id)));
                }
            }

            if state.phase.is_terminal() {
                break;
            }
        }
    }

    #[test]
    fn collections_stay_sorted_by_id(seed in any::<u64>(), ticks in 1usize..400) {
        let mut state = GameState::with_seed(seed);
        let input = TickInput { start: true, autopilot: true, ..Default::default() };
        for _ in 0..ticks {
            tick(&mut state, &input, SIM_DT);
        }
        prop_assert!(state.enemies.windows(2).all(|w| w[0].id < w[1].id));
        prop_assert!(state.bullets.windows(2).all(|w| w[0].id < w[1].id));
        prop_assert!(state.powerups.windows(2).all(|w| w[0].id < w[1].id));
    }
}
