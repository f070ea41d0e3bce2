//! ShootUnit: ranged-weapon damage resolution during the SHOOTING phase.

use anyhow::Result;
use std::fmt;

use crate::core::game::GameState;
use crate::core::mechanics;
use crate::core::phase::Phase;
use crate::core::position::Position;
use crate::core::side::Team;

use super::Action;

#[derive(Debug, Clone, PartialEq)]
pub struct ShootUnit {
    pub src: Position,
    pub tgt: Position,
    pub team: Team,
}

impl ShootUnit {
    pub fn apply(&self, state: &GameState) -> Result<(Vec<GameState>, Vec<f64>)> {
        let board = &state.board;
        let shooter = board.unit_at(self.src)?.clone();
        let target = board.unit_at(self.tgt)?.clone();

        let distance = board.distance(self.src, self.tgt);
        let attacks = shooter.ranged_attack_count(distance);
        let p = mechanics::penetration_probability(
            shooter.ranged_hit_skill(),
            shooter.ranged.s,
            target.t,
            target.sv,
            shooter.ranged.ap,
            target.inv,
        );

        let damage_dist = mechanics::damage_distribution(&target, attacks, p, shooter.ranged.dmg);

        let mut out_states = Vec::with_capacity(damage_dist.len());
        let mut out_probs = Vec::with_capacity(damage_dist.len());

        for (new_target, prob) in damage_dist {
            let mut board = board.clone();
            let mut shooter_copy = shooter.clone();
            shooter_copy.fired_this_turn = true;
            board.set_unit(self.src, shooter_copy, self.team)?;

            if new_target.is_destroyed() {
                board.clear(self.tgt)?;
            } else {
                board.set_unit(self.tgt, new_target, self.team.opponent())?;
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

impl fmt::Display for ShootUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "shoot {} -> {}", self.src, self.tgt)
    }
}

pub fn generate(state: &GameState) -> Vec<Action> {
    if state.phase != Phase::Shooting {
        return Vec::new();
    }
    let team = state.acting_team;
    let opponent = team.opponent();
    let board = &state.board;
    let mut out = Vec::new();

    for src in board.all_unit_positions(team) {
        let unit = board.unit_at(src).expect("position came from all_unit_positions");
        if unit.fired_this_turn || unit.moved_out_of_combat_this_turn {
            continue;
        }
        if !unit.has_ranged_weapon() {
            continue;
        }
        if board.has_adjacent_enemy(src, team) {
            continue;
        }

        for tgt in board.all_unit_positions(opponent) {
            if board.has_adjacent_enemy(tgt, opponent) {
                continue;
            }
            if board.distance(src, tgt) > unit.ranged.range {
                continue;
            }
            out.push(Action::ShootUnit(ShootUnit { src, tgt, team }));
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::board::Board;
    use crate::core::unit::{MeleeWeapon, RangedWeapon, Unit};

    fn shooter() -> Unit {
        Unit {
            name: "Shooter".into(),
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

    fn target() -> Unit {
        Unit { t: 4, sv: 3, inv: 7, ..shooter() }
    }

    /// S1: shooter (0,0) vs target (2,2), both count=1/w=1/total_w=1.
    #[test]
    fn s1_shooting_produces_two_outcomes_with_expected_probabilities() {
        let mut board = Board::new(25, 1.0);
        board.set_unit(Position::new(0, 0), shooter(), Team::T0).unwrap();
        board.set_unit(Position::new(2, 2), target(), Team::T1).unwrap();
        let state = GameState::new(Team::T0, Team::T0, Phase::Shooting, board, None, None).unwrap();

        let shoot = ShootUnit { src: Position::new(0, 0), tgt: Position::new(2, 2), team: Team::T0 };
        let (states, probs) = shoot.apply(&state).unwrap();
        assert_eq!(states.len(), 2);
        let total: f64 = probs.iter().sum();
        assert!((total - 1.0).abs() < 1e-9);

        let cleared = states.iter().position(|s| !s.board.is_occupied(Position::new(2, 2)).unwrap());
        assert!(cleared.is_some());
        assert!((probs[cleared.unwrap()] - 1.0 / 6.0).abs() < 1e-9);
    }

    #[test]
    fn generate_excludes_shooters_in_melee() {
        let mut board = Board::new(25, 1.0);
        board.set_unit(Position::new(5, 5), shooter(), Team::T0).unwrap();
        board.set_unit(Position::new(6, 6), target(), Team::T1).unwrap();
        let state = GameState::new(Team::T0, Team::T0, Phase::Shooting, board, None, None).unwrap();
        assert!(generate(&state).is_empty());
    }
}
