//! FightUnit: melee resolution during the FIGHT phase, including the
//! interleaved acting-team handoff (spec §4.6).

use anyhow::Result;
use std::fmt;

use crate::core::game::GameState;
use crate::core::mechanics;
use crate::core::phase::Phase;
use crate::core::position::Position;
use crate::core::side::Team;

use super::Action;

#[derive(Debug, Clone, PartialEq)]
pub struct FightUnit {
    pub src: Position,
    pub tgt: Position,
    pub team: Team,
}

impl FightUnit {
    pub fn apply(&self, state: &GameState) -> Result<(Vec<GameState>, Vec<f64>)> {
        let board = &state.board;
        let attacker = board.unit_at(self.src)?.clone();
        let target = board.unit_at(self.tgt)?.clone();

        let attacks = attacker.melee_attack_count();
        let p = mechanics::penetration_probability(
            attacker.ws,
            attacker.melee.s,
            target.t,
            target.sv,
            attacker.melee.ap,
            target.inv,
        );
        let damage_dist = mechanics::damage_distribution(&target, attacks, p, attacker.melee.dmg);

        let mut out_states = Vec::with_capacity(damage_dist.len());
        let mut out_probs = Vec::with_capacity(damage_dist.len());

        for (new_target, prob) in damage_dist {
            let mut board = board.clone();
            let mut attacker_copy = attacker.clone();
            attacker_copy.fought_this_turn = true;
            board.set_unit(self.src, attacker_copy, self.team)?;

            if new_target.is_destroyed() {
                board.clear(self.tgt)?;
            } else {
                board.set_unit(self.tgt, new_target, self.team.opponent())?;
            }

            let next_acting_team = next_acting_team(&board, state.internal_team, self.team);

            let successor = GameState::new(
                state.internal_team,
                next_acting_team,
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

impl fmt::Display for FightUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "fight {} -> {}", self.src, self.tgt)
    }
}

/// Whether `team` has at least one unit that can still fight on `board`:
/// has a melee weapon, has not fought this turn, and is adjacent to an
/// enemy (spec §4.6 FightUnit step 1).
pub fn can_team_still_fight(board: &crate::core::board::Board, team: Team) -> bool {
    board.all_unit_positions(team).into_iter().any(|pos| {
        let unit = board.unit_at(pos).expect("position came from all_unit_positions");
        unit.can_still_fight() && board.has_adjacent_enemy(pos, team)
    })
}

/// Post-fight acting-team selection (spec §4.6 FightUnit steps 1-4).
fn next_acting_team(board: &crate::core::board::Board, internal_team: Team, acting_team: Team) -> Team {
    let other = acting_team.opponent();
    if can_team_still_fight(board, other) {
        other
    } else if can_team_still_fight(board, acting_team) {
        acting_team
    } else {
        internal_team
    }
}

pub fn generate(state: &GameState) -> Vec<Action> {
    if state.phase != Phase::Fight {
        return Vec::new();
    }
    let team = state.acting_team;
    let opponent = team.opponent();
    let board = &state.board;
    let mut out = Vec::new();

    for src in board.all_unit_positions(team) {
        let unit = board.unit_at(src).expect("position came from all_unit_positions");
        if !unit.can_still_fight() {
            continue;
        }

        for tgt in board.all_unit_positions(opponent) {
            if src.chebyshev_dist(&tgt) > 1 {
                continue;
            }
            out.push(Action::FightUnit(FightUnit { src, tgt, team }));
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::board::Board;
    use crate::core::unit::{MeleeWeapon, RangedWeapon, Unit};

    fn fighter() -> Unit {
        Unit {
            name: "Fighter".into(),
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
            ranged: RangedWeapon { range: 0.0, s: 0, ap: 0, dmg: 0, shots: 0 },
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

    #[test]
    fn p8_end_phase_gate_matches_fightable_units() {
        let mut board = Board::new(25, 1.0);
        board.set_unit(Position::new(5, 5), fighter(), Team::T0).unwrap();
        board.set_unit(Position::new(6, 6), fighter(), Team::T1).unwrap();
        assert!(can_team_still_fight(&board, Team::T0));
        assert!(can_team_still_fight(&board, Team::T1));
    }

    #[test]
    fn next_acting_team_falls_back_to_acting_side() {
        let mut board = Board::new(25, 1.0);
        board.set_unit(Position::new(5, 5), fighter(), Team::T0).unwrap();
        let mut already_fought = fighter();
        already_fought.fought_this_turn = true;
        board.set_unit(Position::new(6, 6), already_fought, Team::T1).unwrap();
        // T1's only unit already fought -> can't fight -> falls back to T0 (acting), then internal.
        assert!(!can_team_still_fight(&board, Team::T1));
        assert_eq!(next_acting_team(&board, Team::T0, Team::T0), Team::T0);
    }
}
