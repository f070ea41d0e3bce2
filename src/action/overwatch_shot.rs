//! OverwatchShot: defender ranged fire (forced hit-skill 6) interposed
//! between a charge's declaration and its resolution. Only ever applied as
//! part of a `ChargeUnit`'s composition, never enumerated directly in
//! `commands()` (spec §4.5, §4.6).

use anyhow::Result;
use std::fmt;

use crate::core::game::GameState;
use crate::core::mechanics;
use crate::core::position::Position;
use crate::core::side::Team;

#[derive(Debug, Clone, PartialEq)]
pub struct OverwatchShot {
    pub shooter: Position,
    pub charger_origin: Position,
    pub charger_team: Team,
}

impl OverwatchShot {
    pub fn apply(&self, state: &GameState) -> Result<(Vec<GameState>, Vec<f64>)> {
        let board = &state.board;

        if !board.is_occupied(self.charger_origin)? {
            return Ok((vec![state.clone()], vec![1.0]));
        }

        let shooter = board.unit_at(self.shooter)?.clone();
        let charger = board.unit_at(self.charger_origin)?.clone();

        let p = mechanics::penetration_probability(
            6, // overwatch forces hit_skill := 6
            shooter.ranged.s,
            charger.t,
            charger.sv,
            shooter.ranged.ap,
            charger.inv,
        );
        let distance = board.distance(self.shooter, self.charger_origin);
        let attacks = shooter.ranged_attack_count(distance);
        let damage_dist = mechanics::damage_distribution(&charger, attacks, p, shooter.ranged.dmg);

        let mut out_states = Vec::with_capacity(damage_dist.len());
        let mut out_probs = Vec::with_capacity(damage_dist.len());

        for (new_charger, prob) in damage_dist {
            let mut board = board.clone();
            if new_charger.is_destroyed() {
                board.clear(self.charger_origin)?;
            } else {
                board.set_unit(self.charger_origin, new_charger, self.charger_team)?;
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

impl fmt::Display for OverwatchShot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "overwatch {} -> {}", self.shooter, self.charger_origin)
    }
}
