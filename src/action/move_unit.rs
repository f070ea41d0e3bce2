//! MoveUnit: deterministic repositioning during the MOVEMENT phase.

use anyhow::Result;
use std::fmt;

use crate::core::game::GameState;
use crate::core::phase::Phase;
use crate::core::position::Position;
use crate::core::side::Team;

use super::Action;

#[derive(Debug, Clone, PartialEq)]
pub struct MoveUnit {
    pub src: Position,
    pub dst: Position,
    pub team: Team,
}

impl MoveUnit {
    pub fn apply(&self, state: &GameState) -> Result<(Vec<GameState>, Vec<f64>)> {
        let mut board = state.board.clone();
        let mut unit = board.unit_at(self.src)?.clone();

        unit.moved_out_of_combat_this_turn = board.has_adjacent_enemy(self.src, self.team);
        unit.moved_this_turn = true;

        board.clear(self.src)?;
        board.set_unit(self.dst, unit, self.team)?;

        let successor = GameState::new(
            state.internal_team,
            state.acting_team,
            state.phase,
            board,
            Some(state.turn_limit),
            Some(state.turn_number),
        )?;

        Ok((vec![successor], vec![1.0]))
    }
}

impl fmt::Display for MoveUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "move {} -> {}", self.src, self.dst)
    }
}

pub fn generate(state: &GameState) -> Vec<Action> {
    if state.phase != Phase::Movement {
        return Vec::new();
    }
    let team = state.acting_team;
    let board = &state.board;
    let mut out = Vec::new();

    for src in board.all_unit_positions(team) {
        let unit = board.unit_at(src).expect("position came from all_unit_positions");
        if unit.moved_this_turn {
            continue;
        }
        for dst in board.squares_in_range(src, unit.movement) {
            if dst == src {
                continue;
            }
            if board.is_occupied(dst).unwrap_or(true) {
                continue;
            }
            if board.has_adjacent_enemy(dst, team) {
                continue;
            }
            out.push(Action::MoveUnit(MoveUnit { src, dst, team }));
        }
    }

    out
}
