//! Immutable game-state snapshot: board + acting team + internal team +
//! phase + turn counters, plus action enumeration and termination.
//!
//! Grounded on the teacher's `GameState` (`core/game.rs`) for the
//! `ensure!`/`bail!`-validated constructor idiom, generalized from a
//! FEN-serializable multi-board Minions state into the spec's single-board
//! phase-structured state (no FEN: this core has no persisted wire format,
//! spec §6).

use anyhow::{ensure, Result};

use crate::action::{self, Action};

use super::board::Board;
use super::phase::Phase;
use super::side::Team;

#[derive(Debug, Clone)]
pub struct GameState {
    pub internal_team: Team,
    pub acting_team: Team,
    pub phase: Phase,
    pub board: Board,
    /// Negative means unbounded; otherwise strictly positive.
    pub turn_limit: i32,
    pub turn_number: i32,
}

impl PartialEq for GameState {
    /// Equality excludes turn counters: the MCTS tree uses
    /// `{internal_team, acting_team, phase, board}` as its de-duplication
    /// key (spec §6).
    fn eq(&self, other: &Self) -> bool {
        self.internal_team == other.internal_team
            && self.acting_team == other.acting_team
            && self.phase == other.phase
            && self.board == other.board
    }
}

impl Eq for GameState {}

impl GameState {
    pub fn new(
        internal_team: Team,
        acting_team: Team,
        phase: Phase,
        board: Board,
        turn_limit: Option<i32>,
        turn_number: Option<i32>,
    ) -> Result<Self> {
        let turn_limit = turn_limit.unwrap_or(-1);
        let turn_number = turn_number.unwrap_or(0);
        ensure!(turn_number >= 0, "turn_number must be >= 0, got {}", turn_number);
        ensure!(
            turn_limit < 0 || turn_limit > 0,
            "turn_limit must be negative (unbounded) or strictly positive"
        );
        ensure!(
            phase == Phase::Fight || acting_team == internal_team,
            "acting_team must equal internal_team outside of FIGHT"
        );

        let state = Self {
            internal_team,
            acting_team,
            phase,
            board,
            turn_limit,
            turn_number,
        };

        ensure!(
            state.is_finished() || !state.commands()?.is_empty(),
            "a non-terminal state must have at least one applicable action"
        );

        Ok(state)
    }

    pub fn internal_team(&self) -> Team {
        self.internal_team
    }

    pub fn acting_team(&self) -> Team {
        self.acting_team
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn turn_limit(&self) -> i32 {
        self.turn_limit
    }

    pub fn turn_number(&self) -> i32 {
        self.turn_number
    }

    pub fn has_turn_limit(&self) -> bool {
        self.turn_limit > 0
    }

    pub fn is_finished(&self) -> bool {
        let (t0, t1) = self.board.unit_counts();
        if t0 == 0 || t1 == 0 {
            return true;
        }
        self.has_turn_limit() && self.turn_number >= self.turn_limit
    }

    /// +1 if only the opposing team is empty, -1 if only `team` is empty, 0
    /// if both are empty or the turn limit was reached with both present.
    pub fn game_value(&self, team: Team) -> Result<i32> {
        ensure!(self.is_finished(), "game_value requires a finished state");
        let (t0, t1) = self.board.unit_counts();
        let team_empty = match team {
            Team::T0 => t0 == 0,
            Team::T1 => t1 == 0,
        };
        let opponent_empty = match team {
            Team::T0 => t1 == 0,
            Team::T1 => t0 == 0,
        };
        Ok(match (team_empty, opponent_empty) {
            (true, true) => 0,
            (true, false) => -1,
            (false, true) => 1,
            (false, false) => 0, // turn limit reached, both still present
        })
    }

    /// Union of applicable commands in stable order: MOVE, SHOOT, CHARGE,
    /// FIGHT, END_PHASE (spec §4.3).
    pub fn commands(&self) -> Result<Vec<Action>> {
        ensure!(!self.is_finished(), "cannot enumerate commands on a finished state");
        Ok(action::generate_commands(self))
    }
}

impl std::fmt::Display for GameState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "turn {} | internal={} acting={} phase={:?} | units={:?}",
            self.turn_number,
            self.internal_team,
            self.acting_team,
            self.phase,
            self.board.unit_counts()
        )
    }
}
