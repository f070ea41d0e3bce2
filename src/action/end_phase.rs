//! EndPhase: generated as a `Composite` of a `MoraleCheck` per unit that
//! lost models this phase, followed by the deterministic phase-advance
//! transition (spec §4.6). Exactly one instance is applicable per
//! non-terminal state, except during FIGHT where it additionally requires
//! both teams' fightable-unit lists to be empty (spec P8).

use anyhow::Result;
use std::fmt;

use crate::core::game::GameState;
use crate::core::phase::Phase;
use crate::core::side::Team;

use super::fight_unit::can_team_still_fight;
use super::{Action, CommandType, Composite, MoraleCheck};

/// The deterministic per-phase bookkeeping transition: resets
/// `models_lost_this_phase` on every unit, resets turn-level flags when
/// wrapping out of FIGHT, advances the phase cyclically, and handles the
/// internal-team flip / acting-team handoff and turn-number increment
/// (spec §4.6, P7).
#[derive(Debug, Clone, PartialEq)]
pub struct AdvancePhase;

impl AdvancePhase {
    pub fn apply(&self, state: &GameState) -> Result<(Vec<GameState>, Vec<f64>)> {
        let mut board = state.board.clone();
        let was_fight = state.phase.is_fight();

        for pos in board.all_occupied_positions() {
            let unit = board.unit_at_mut(pos)?;
            unit.reset_phase_flags();
            if was_fight {
                unit.reset_turn_flags();
            }
        }

        let next_phase = state.phase.next();

        let (next_internal, next_acting, next_turn_number) = if was_fight {
            let flipped_internal = state.internal_team.opponent();
            let turn_number = if state.internal_team == Team::T1 {
                state.turn_number + 1
            } else {
                state.turn_number
            };

            (flipped_internal, flipped_internal, turn_number)
        } else {
            // The only handoff-relevant wrap is CHARGE -> FIGHT: if the
            // internal team has no fightable units but the opponent does,
            // the opponent acts first (spec §4.6, original_source's
            // EndPhaseCommand.cpp "about to change to the fight phase" case).
            let next_acting = if next_phase == Phase::Fight
                && !can_team_still_fight(&board, state.internal_team)
                && can_team_still_fight(&board, state.internal_team.opponent())
            {
                state.internal_team.opponent()
            } else {
                state.internal_team
            };

            (state.internal_team, next_acting, state.turn_number)
        };

        let successor = GameState::new(
            next_internal,
            next_acting,
            next_phase,
            board,
            Some(state.turn_limit),
            Some(next_turn_number),
        )?;

        Ok((vec![successor], vec![1.0]))
    }
}

impl fmt::Display for AdvancePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "advance phase")
    }
}

/// Whether EndPhase is applicable in `state` (spec P8): always outside
/// FIGHT; during FIGHT, only once neither team has a fightable unit left.
fn end_phase_applicable(state: &GameState) -> bool {
    if !state.phase.is_fight() {
        return true;
    }
    !can_team_still_fight(&state.board, Team::T0) && !can_team_still_fight(&state.board, Team::T1)
}

pub fn generate(state: &GameState) -> Vec<Action> {
    if !end_phase_applicable(state) {
        return Vec::new();
    }

    let mut actions: Vec<Action> = state
        .board
        .all_occupied_positions()
        .into_iter()
        .filter(|&pos| state.board.unit_at(pos).map(|u| u.models_lost_this_phase > 0).unwrap_or(false))
        .map(|pos| Action::MoraleCheck(MoraleCheck { pos }))
        .collect();

    actions.push(Action::AdvancePhase(AdvancePhase));

    vec![Action::Composite(Composite { actions, reported_type: CommandType::EndPhase })]
}
