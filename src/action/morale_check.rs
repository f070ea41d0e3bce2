//! MoraleCheck: a phase-boundary morale test, applied to every unit that
//! lost models during the phase (spec §4.5, §4.6). Always a HELPER action,
//! composed into EndPhase's Composite.

use anyhow::Result;
use std::fmt;

use crate::core::game::GameState;
use crate::core::mechanics;
use crate::core::position::Position;

#[derive(Debug, Clone, PartialEq)]
pub struct MoraleCheck {
    pub pos: Position,
}

impl MoraleCheck {
    pub fn apply(&self, state: &GameState) -> Result<(Vec<GameState>, Vec<f64>)> {
        let board = &state.board;
        let unit = board.unit_at(self.pos)?.clone();
        let team = board.team_at(self.pos)?;

        let dist = mechanics::morale_distribution(&unit);

        let mut out_states = Vec::with_capacity(dist.len());
        let mut out_probs = Vec::with_capacity(dist.len());

        for (new_unit, prob) in dist {
            let mut board = board.clone();
            if new_unit.is_destroyed() {
                board.clear(self.pos)?;
            } else {
                board.set_unit(self.pos, new_unit, team)?;
            }

            let successor = GameState::new(
                state.internal_team,
                state.acting_team,
                state.phase,
                board,
                Some(state.turn_limit),
                Some(state.turn_number),
            )?;
            out_states.push(successor);
            out_probs.push(prob);
        }

        Ok((out_states, out_probs))
    }
}

impl fmt::Display for MoraleCheck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "morale check {}", self.pos)
    }
}
