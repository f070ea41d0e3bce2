//! Action protocol: a tagged-sum command hierarchy (design note §9) whose
//! `apply` produces a successor-state distribution, plus the transition
//! algebra (§4.4) that composes an action over an input distribution and
//! merges duplicate successor states.
//!
//! Grounded on the teacher's `GameAction`/`BoardAction` enums
//! (`core/action.rs`) for the tagged-sum-over-a-common-surface idiom, but
//! the teacher's actions are deterministic file commands; these carry a
//! weighted successor distribution instead of a single mutation.

mod charge_unit;
mod composite;
pub(crate) mod end_phase;
pub(crate) mod fight_unit;
mod morale_check;
mod move_unit;
mod overwatch_shot;
mod shoot_unit;

pub use charge_unit::ChargeUnit;
pub use composite::Composite;
pub use end_phase::AdvancePhase;
pub use fight_unit::FightUnit;
pub use morale_check::MoraleCheck;
pub use move_unit::MoveUnit;
pub use overwatch_shot::OverwatchShot;
pub use shoot_unit::ShootUnit;

use anyhow::Result;
use std::fmt;

use crate::core::game::GameState;
use crate::core::position::Position;

/// How a caller should classify a command (spec §3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandType {
    UnitOrder,
    EndPhase,
    Helper,
}

/// The tagged sum over every concrete action kind (spec §3, §4.6).
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    MoveUnit(MoveUnit),
    ShootUnit(ShootUnit),
    ChargeUnit(ChargeUnit),
    FightUnit(FightUnit),
    OverwatchShot(OverwatchShot),
    MoraleCheck(MoraleCheck),
    AdvancePhase(AdvancePhase),
    Composite(Composite),
}

impl Action {
    /// Applies this action to a single non-finished state, returning a
    /// distribution of distinct successor states with probabilities
    /// summing to 1 (spec P1). Finished-state passthrough and multi-state
    /// composition are handled by `compose`, not here.
    pub fn apply_one(&self, state: &GameState) -> Result<(Vec<GameState>, Vec<f64>)> {
        match self {
            Action::MoveUnit(a) => a.apply(state),
            Action::ShootUnit(a) => a.apply(state),
            Action::ChargeUnit(a) => a.apply(state),
            Action::FightUnit(a) => a.apply(state),
            Action::OverwatchShot(a) => a.apply(state),
            Action::MoraleCheck(a) => a.apply(state),
            Action::AdvancePhase(a) => a.apply(state),
            Action::Composite(a) => a.apply(state),
        }
    }

    /// Public single-state entry point: `apply(state) -> ([state], [prob])`
    /// (spec §6 External Interfaces), implemented as composition over the
    /// trivial one-state, probability-1 input distribution.
    pub fn apply(&self, state: &GameState) -> Result<(Vec<GameState>, Vec<f64>)> {
        compose(self, std::slice::from_ref(state), &[1.0])
    }

    pub fn equals(&self, other: &Action) -> bool {
        self == other
    }

    pub fn type_tag(&self) -> CommandType {
        match self {
            Action::MoveUnit(_) | Action::ShootUnit(_) | Action::ChargeUnit(_) | Action::FightUnit(_) => {
                CommandType::UnitOrder
            }
            Action::OverwatchShot(_) | Action::MoraleCheck(_) | Action::AdvancePhase(_) => CommandType::Helper,
            Action::Composite(c) => c.reported_type,
        }
    }

    pub fn source_position(&self) -> Option<Position> {
        match self {
            Action::MoveUnit(a) => Some(a.src),
            Action::ShootUnit(a) => Some(a.src),
            Action::ChargeUnit(a) => Some(a.src),
            Action::FightUnit(a) => Some(a.src),
            _ => None,
        }
    }

    pub fn target_position(&self) -> Option<Position> {
        match self {
            Action::MoveUnit(a) => Some(a.dst),
            Action::ShootUnit(a) => Some(a.tgt),
            Action::ChargeUnit(a) => Some(a.dst),
            Action::FightUnit(a) => Some(a.tgt),
            _ => None,
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::MoveUnit(a) => write!(f, "{}", a),
            Action::ShootUnit(a) => write!(f, "{}", a),
            Action::ChargeUnit(a) => write!(f, "{}", a),
            Action::FightUnit(a) => write!(f, "{}", a),
            Action::OverwatchShot(a) => write!(f, "{}", a),
            Action::MoraleCheck(a) => write!(f, "{}", a),
            Action::AdvancePhase(a) => write!(f, "{}", a),
            Action::Composite(a) => write!(f, "{}", a),
        }
    }
}

/// The §4.4 transition algebra: composes `action` over an input
/// distribution `(states, probs)`. Finished input states pass through
/// unchanged; non-finished states are expanded via `apply_one` and their
/// successor probabilities scaled by the input probability, with duplicate
/// successor states merged by summing probability (spec P2).
pub fn compose(action: &Action, states: &[GameState], probs: &[f64]) -> Result<(Vec<GameState>, Vec<f64>)> {
    debug_assert_eq!(states.len(), probs.len());
    let mut out_states: Vec<GameState> = Vec::new();
    let mut out_probs: Vec<f64> = Vec::new();

    for (s, &p) in states.iter().zip(probs.iter()) {
        if s.is_finished() {
            merge_into(&mut out_states, &mut out_probs, s.clone(), p);
            continue;
        }
        let (rs, qs) = action.apply_one(s)?;
        debug_assert_eq!(rs.len(), qs.len());
        for (r, q) in rs.into_iter().zip(qs.into_iter()) {
            merge_into(&mut out_states, &mut out_probs, r, p * q);
        }
    }

    Ok((out_states, out_probs))
}

/// Merges `(state, prob)` into an accumulating output distribution: linear
/// scan for an equal state, summing probability on a hit (design note §9 —
/// distributions stay small, so a linear scan suffices over hashing).
pub(crate) fn merge_into(states: &mut Vec<GameState>, probs: &mut Vec<f64>, state: GameState, prob: f64) {
    if let Some(idx) = states.iter().position(|existing| *existing == state) {
        probs[idx] += prob;
    } else {
        states.push(state);
        probs.push(prob);
    }
}

/// The global, compile-time-known table of action generators, invoked in a
/// fixed order (design note §9): MOVE, SHOOT, CHARGE, FIGHT, END_PHASE.
/// Each generator internally gates on the state's current phase, so only
/// the generators matching `state.phase` (plus EndPhase, gated separately)
/// contribute actions.
pub fn generate_commands(state: &GameState) -> Vec<Action> {
    let mut commands = Vec::new();
    commands.extend(move_unit::generate(state));
    commands.extend(shoot_unit::generate(state));
    commands.extend(charge_unit::generate(state));
    commands.extend(fight_unit::generate(state));
    commands.extend(end_phase::generate(state));
    commands
}
