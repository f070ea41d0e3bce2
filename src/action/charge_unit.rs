//! ChargeUnit: a charge declaration, composed with the overwatch shots it
//! provokes, followed by a 2d6 charge-distance roll (spec §4.5, §4.6).

use anyhow::Result;
use std::fmt;

use crate::core::game::GameState;
use crate::core::mechanics;
use crate::core::phase::Phase;
use crate::core::position::Position;
use crate::core::side::Team;

use super::{compose, merge_into, Action, OverwatchShot};

const MAX_CHARGE_DISTANCE: f64 = 12.0;

#[derive(Debug, Clone, PartialEq)]
pub struct ChargeUnit {
    pub src: Position,
    pub dst: Position,
    pub team: Team,
    pub overwatch: Vec<OverwatchShot>,
}

impl ChargeUnit {
    pub fn apply(&self, state: &GameState) -> Result<(Vec<GameState>, Vec<f64>)> {
        // Compose every precomputed overwatch shot onto the input state
        // before resolving the charge itself (spec §4.5).
        let mut states = vec![state.clone()];
        let mut probs = vec![1.0];
        for shot in &self.overwatch {
            let (s, p) = compose(&Action::OverwatchShot(shot.clone()), &states, &probs)?;
            states = s;
            probs = p;
        }

        let mut out_states: Vec<GameState> = Vec::new();
        let mut out_probs: Vec<f64> = Vec::new();

        for (branch_state, branch_prob) in states.into_iter().zip(probs.into_iter()) {
            if branch_state.is_finished() {
                merge_into(&mut out_states, &mut out_probs, branch_state, branch_prob);
                continue;
            }

            if !branch_state.board.is_occupied(self.src)? {
                // Charger was destroyed by overwatch; the charge is a no-op.
                merge_into(&mut out_states, &mut out_probs, branch_state, branch_prob);
                continue;
            }

            let min_required = branch_state.board.distance(self.src, self.dst).ceil() as i32;
            let (pass, fail) = mechanics::charge_pass_probability(min_required);

            let mut charger = branch_state.board.unit_at(self.src)?.clone();
            charger.attempted_charge_this_turn = true;

            if fail > 0.0 {
                let mut board = branch_state.board.clone();
                board.set_unit(self.src, charger.clone(), self.team)?;
                let fail_state = GameState::new(
                    branch_state.internal_team,
                    branch_state.acting_team,
                    branch_state.phase,
                    board,
                    Some(branch_state.turn_limit),
                    Some(branch_state.turn_number),
                )?;
                merge_into(&mut out_states, &mut out_probs, fail_state, branch_prob * fail);
            }

            if pass > 0.0 {
                let mut board = branch_state.board.clone();
                let mut moved = charger.clone();
                moved.successful_charge_this_turn = true;
                board.clear(self.src)?;
                board.set_unit(self.dst, moved, self.team)?;
                let pass_state = GameState::new(
                    branch_state.internal_team,
                    branch_state.acting_team,
                    branch_state.phase,
                    board,
                    Some(branch_state.turn_limit),
                    Some(branch_state.turn_number),
                )?;
                merge_into(&mut out_states, &mut out_probs, pass_state, branch_prob * pass);
            }
        }

        Ok((out_states, out_probs))
    }
}

impl fmt::Display for ChargeUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "charge {} -> {}", self.src, self.dst)
    }
}

pub fn generate(state: &GameState) -> Vec<Action> {
    if state.phase != Phase::Charge {
        return Vec::new();
    }
    let team = state.acting_team;
    let opponent = team.opponent();
    let board = &state.board;
    let mut out = Vec::new();

    for src in board.all_unit_positions(team) {
        let unit = board.unit_at(src).expect("position came from all_unit_positions");
        if unit.attempted_charge_this_turn || unit.moved_out_of_combat_this_turn {
            continue;
        }
        if board.has_adjacent_enemy(src, team) {
            continue;
        }
        if !unit.has_melee_weapon() {
            continue;
        }

        for dx in -12..=12 {
            for dy in -12..=12 {
                let dst = Position::new(src.x + dx, src.y + dy);
                if !dst.in_bounds(board.board_size) {
                    continue;
                }
                if board.is_occupied(dst).unwrap_or(true) {
                    continue;
                }
                if !board.has_adjacent_enemy(dst, team) {
                    continue;
                }
                if board.distance(src, dst) > MAX_CHARGE_DISTANCE {
                    continue;
                }

                let overwatch = overwatch_shots_for(board, src, dst, team, opponent);
                out.push(Action::ChargeUnit(ChargeUnit { src, dst, team, overwatch }));
            }
        }
    }

    out
}

/// One Overwatch action per enemy adjacent to `dst` with a standard ranged
/// weapon, in range of `src`, not already in melee (spec §4.5).
fn overwatch_shots_for(
    board: &crate::core::board::Board,
    src: Position,
    dst: Position,
    charger_team: Team,
    defender_team: Team,
) -> Vec<OverwatchShot> {
    let mut shots = Vec::new();
    for enemy_pos in board.all_unit_positions(defender_team) {
        if enemy_pos.chebyshev_dist(&dst) > 1 {
            continue;
        }
        let enemy = board.unit_at(enemy_pos).expect("position came from all_unit_positions");
        if !enemy.has_ranged_weapon() {
            continue;
        }
        if board.has_adjacent_enemy(enemy_pos, defender_team) {
            continue;
        }
        if board.distance(src, enemy_pos) > enemy.ranged.range {
            continue;
        }
        shots.push(OverwatchShot {
            shooter: enemy_pos,
            charger_origin: src,
            charger_team,
        });
    }
    shots
}
