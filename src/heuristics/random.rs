//! Uniform random rollout: play each simulation out to completion choosing
//! a uniformly random legal command and a probability-weighted random
//! outcome at every step, then average the terminal game value.
//!
//! Grounded on `original_source/Core40KLearn`'s `UniformRandomEstimator`
//! (`ComputeValueEstimate`) and `SelectRandomly.h`'s weighted-choice helper.

use anyhow::Result;
use log::trace;
use rand::Rng;

use crate::core::game::GameState;
use crate::core::side::Team;

use super::Evaluator;

pub struct UniformRolloutEvaluator {
    pub num_simulations: usize,
}

impl UniformRolloutEvaluator {
    pub fn new(num_simulations: usize) -> Self {
        Self { num_simulations }
    }
}

impl Evaluator for UniformRolloutEvaluator {
    fn compute_value_estimate(&self, state: &GameState, team: Team) -> Result<f64> {
        let mut result_sum = 0.0;

        for _ in 0..self.num_simulations {
            let mut cur_state = state.clone();

            while !cur_state.is_finished() {
                let cmds = cur_state.commands()?;
                let chosen_cmd = &cmds[rand::rng().random_range(0..cmds.len())];

                let (results, probs) = chosen_cmd.apply(&cur_state)?;
                let result_idx = select_weighted(&probs);
                cur_state = results[result_idx].clone();
            }

            result_sum += cur_state.game_value(team)? as f64;
        }

        let estimate = result_sum / self.num_simulations as f64;
        trace!("rollout estimate for {:?}: {}", team, estimate);
        Ok(estimate)
    }
}

/// Picks an index proportionally to `weights`, which must sum to 1 (spec
/// P1). Mirrors `SelectRandomly.h`'s cumulative-sum walk.
fn select_weighted(weights: &[f64]) -> usize {
    let mut roll = rand::rng().random_range(0.0..1.0);
    for (idx, &w) in weights.iter().enumerate() {
        if roll < w {
            return idx;
        }
        roll -= w;
    }
    weights.len() - 1
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::board::Board;
    use crate::core::phase::Phase;
    use crate::core::position::Position;
    use crate::core::unit::{MeleeWeapon, RangedWeapon, Unit};

    fn sample_unit() -> Unit {
        Unit {
            name: "Squad".into(),
            count: 1,
            movement: 6.0,
            ws: 3,
            bs: 3,
            t: 4,
            w: 1,
            total_w: 1,
            a: 1,
            ld: 7,
            sv: 3,
            inv: 7,
            ranged: RangedWeapon { range: 24.0, s: 4, ap: -1, dmg: 1, shots: 1 },
            melee: MeleeWeapon { s: 4, ap: 0, dmg: 1 },
            models_lost_this_phase: 0,
            rg_is_rapid: false,
            rg_is_heavy: false,
            moved_this_turn: false,
            fired_this_turn: false,
            attempted_charge_this_turn: false,
            successful_charge_this_turn: false,
            fought_this_turn: false,
            moved_out_of_combat_this_turn: false,
        }
    }

    /// A lone surviving team always rolls out to a win for itself.
    #[test]
    fn rollout_of_a_trivial_win_is_exactly_one() {
        let mut board = Board::new(25, 1.0);
        board.set_unit(Position::new(0, 0), sample_unit(), Team::T0).unwrap();
        let state = GameState::new(Team::T0, Team::T0, Phase::Movement, board, None, None).unwrap();

        let evaluator = UniformRolloutEvaluator::new(4);
        let estimate = evaluator.compute_value_estimate(&state, Team::T0).unwrap();
        assert!((estimate - 1.0).abs() < 1e-9);
        let estimate_opp = evaluator.compute_value_estimate(&state, Team::T1).unwrap();
        assert!((estimate_opp + 1.0).abs() < 1e-9);
    }
}
