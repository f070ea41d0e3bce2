//! Team identity and a small team-indexed array, mirroring the board's
//! own side-indexing convention.

use anyhow::{anyhow, Result};
use colored::Colorize;
use num_derive::{FromPrimitive, ToPrimitive};
use num_traits::{FromPrimitive, ToPrimitive};
use std::fmt;
use std::ops::Not;

/// A team (player) in the game: 0 or 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, FromPrimitive, ToPrimitive)]
pub enum Team {
    T0,
    T1,
}

impl Team {
    pub fn from_index(idx: usize) -> Result<Self> {
        FromPrimitive::from_usize(idx).ok_or_else(|| anyhow!("invalid team index: {}", idx))
    }

    pub fn index(&self) -> usize {
        ToPrimitive::to_usize(self).expect("Team always maps to an index")
    }

    pub fn opponent(&self) -> Team {
        !*self
    }
}

/// Colored team labels for diagnostic display, matching the teacher's
/// `Side` Display impl (`core/display.rs`: yellow vs. blue).
impl fmt::Display for Team {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Team::T0 => write!(f, "{}", "T0".yellow()),
            Team::T1 => write!(f, "{}", "T1".blue()),
        }
    }
}

impl Not for Team {
    type Output = Team;

    fn not(self) -> Team {
        match self {
            Team::T0 => Team::T1,
            Team::T1 => Team::T0,
        }
    }
}

/// Array indexed by team, following the teacher's `SideArray` pattern.
#[derive(Debug, Clone, PartialEq)]
pub struct TeamArray<T> {
    values: [T; 2],
}

impl<T> TeamArray<T> {
    pub fn new(t0: T, t1: T) -> Self {
        Self { values: [t0, t1] }
    }

    pub fn get(&self, team: Team) -> &T {
        &self.values[team.index()]
    }

    pub fn get_mut(&mut self, team: Team) -> &mut T {
        &mut self.values[team.index()]
    }
}

impl<T> std::ops::Index<Team> for TeamArray<T> {
    type Output = T;

    fn index(&self, team: Team) -> &T {
        self.get(team)
    }
}

impl<T> std::ops::IndexMut<Team> for TeamArray<T> {
    fn index_mut(&mut self, team: Team) -> &mut T {
        self.get_mut(team)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opponent_is_involutive() {
        assert_eq!(Team::T0.opponent(), Team::T1);
        assert_eq!(Team::T1.opponent().opponent(), Team::T1);
    }

    #[test]
    fn team_array_indexing() {
        let arr = TeamArray::new(10, 20);
        assert_eq!(arr[Team::T0], 10);
        assert_eq!(arr[Team::T1], 20);
    }
}
