//! Spatial model: occupancy keyed by position, plus range/adjacency queries.
//!
//! Grounded on the teacher's `Board` (`core/board/board.rs`) but reworked
//! from a hex map with a `HashMap<Loc, Piece>` into a square grid keyed by a
//! `BTreeMap<Position, (Team, Unit)>` — the ordered map gives the
//! deterministic occupancy iteration order the spec's EndPhase morale
//! ordering and MCTS reproducibility both depend on (spec §5).

use anyhow::{ensure, Context, Result};
use std::collections::BTreeMap;

use super::position::Position;
use super::side::Team;
use super::unit::Unit;

#[derive(Debug, Clone, PartialEq)]
pub struct Board {
    pub board_size: i32,
    pub scale: f64,
    occupants: BTreeMap<Position, (Team, Unit)>,
}

impl Board {
    pub fn new(board_size: i32, scale: f64) -> Self {
        Self {
            board_size,
            scale,
            occupants: BTreeMap::new(),
        }
    }

    fn check_bounds(&self, pos: Position) -> Result<()> {
        ensure!(pos.in_bounds(self.board_size), "position {} out of bounds", pos);
        Ok(())
    }

    pub fn is_occupied(&self, pos: Position) -> Result<bool> {
        self.check_bounds(pos)?;
        Ok(self.occupants.contains_key(&pos))
    }

    pub fn set_unit(&mut self, pos: Position, unit: Unit, team: Team) -> Result<()> {
        self.check_bounds(pos)?;
        self.occupants.insert(pos, (team, unit));
        Ok(())
    }

    pub fn unit_at(&self, pos: Position) -> Result<&Unit> {
        ensure!(self.is_occupied(pos)?, "no unit at {}", pos);
        Ok(&self.occupants[&pos].1)
    }

    pub fn unit_at_mut(&mut self, pos: Position) -> Result<&mut Unit> {
        ensure!(self.is_occupied(pos)?, "no unit at {}", pos);
        Ok(&mut self.occupants.get_mut(&pos).context("unreachable")?.1)
    }

    pub fn team_at(&self, pos: Position) -> Result<Team> {
        ensure!(self.is_occupied(pos)?, "no unit at {}", pos);
        Ok(self.occupants[&pos].0)
    }

    pub fn clear(&mut self, pos: Position) -> Result<()> {
        ensure!(self.is_occupied(pos)?, "no unit at {} to clear", pos);
        self.occupants.remove(&pos);
        debug_assert!(!self.is_occupied(pos).unwrap());
        Ok(())
    }

    /// Positions with a unit of `team`, in board (BTreeMap) order.
    pub fn all_unit_positions(&self, team: Team) -> Vec<Position> {
        self.occupants
            .iter()
            .filter(|(_, (t, _))| *t == team)
            .map(|(pos, _)| *pos)
            .collect()
    }

    /// Unit records parallel to `all_unit_positions(team)`.
    pub fn all_unit_stats(&self, team: Team) -> Vec<Unit> {
        self.occupants
            .iter()
            .filter(|(_, (t, _))| *t == team)
            .map(|(_, (_, u))| u.clone())
            .collect()
    }

    /// All occupied positions in board order, independent of team —
    /// used by EndPhase to order its morale checks (spec §4.6).
    pub fn all_occupied_positions(&self) -> Vec<Position> {
        self.occupants.keys().copied().collect()
    }

    /// Any occupant in the 8-neighborhood of `pos` (Chebyshev distance <= 1,
    /// excluding `pos` itself) belonging to the opposing team.
    pub fn has_adjacent_enemy(&self, pos: Position, team: Team) -> bool {
        pos.neighbors8().into_iter().any(|n| {
            n.in_bounds(self.board_size)
                && self
                    .occupants
                    .get(&n)
                    .map(|(t, _)| *t != team)
                    .unwrap_or(false)
        })
    }

    /// Positions within `radius_real` of `center` by Euclidean cell distance
    /// scaled by `scale`, including `center`, excluding out-of-bounds cells.
    pub fn squares_in_range(&self, center: Position, radius_real: f64) -> Vec<Position> {
        let cell_radius = (radius_real / self.scale).ceil() as i32;
        let mut out = Vec::new();
        for dx in -cell_radius..=cell_radius {
            for dy in -cell_radius..=cell_radius {
                let candidate = Position::new(center.x + dx, center.y + dy);
                if !candidate.in_bounds(self.board_size) {
                    continue;
                }
                if self.distance(center, candidate) <= radius_real {
                    out.push(candidate);
                }
            }
        }
        out.sort();
        out
    }

    /// Euclidean cell distance scaled by `scale`, computed in double
    /// precision throughout (spec §9's resolved precision question).
    pub fn distance(&self, a: Position, b: Position) -> f64 {
        let dx = (a.x - b.x) as f64;
        let dy = (a.y - b.y) as f64;
        self.scale * (dx * dx + dy * dy).sqrt()
    }

    pub fn unit_counts(&self) -> (usize, usize) {
        let t0 = self.occupants.values().filter(|(t, _)| *t == Team::T0).count();
        let t1 = self.occupants.values().filter(|(t, _)| *t == Team::T1).count();
        (t0, t1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::unit::{MeleeWeapon, RangedWeapon};

    fn dummy_unit(name: &str) -> Unit {
        Unit {
            name: name.into(),
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

    #[test]
    fn set_unit_out_of_bounds_fails() {
        let mut b = Board::new(25, 1.0);
        assert!(b.set_unit(Position::new(25, 0), dummy_unit("a"), Team::T0).is_err());
    }

    #[test]
    fn clear_requires_occupied() {
        let mut b = Board::new(25, 1.0);
        assert!(b.clear(Position::new(0, 0)).is_err());
        b.set_unit(Position::new(0, 0), dummy_unit("a"), Team::T0).unwrap();
        assert!(b.clear(Position::new(0, 0)).is_ok());
        assert!(!b.is_occupied(Position::new(0, 0)).unwrap());
    }

    #[test]
    fn has_adjacent_enemy_uses_chebyshev() {
        let mut b = Board::new(25, 1.0);
        b.set_unit(Position::new(5, 5), dummy_unit("a"), Team::T0).unwrap();
        b.set_unit(Position::new(6, 6), dummy_unit("b"), Team::T1).unwrap();
        assert!(b.has_adjacent_enemy(Position::new(5, 5), Team::T0));
        assert!(!b.has_adjacent_enemy(Position::new(5, 5), Team::T1));
        assert!(!b.has_adjacent_enemy(Position::new(3, 3), Team::T0));
    }

    #[test]
    fn squares_in_range_includes_center_and_respects_scale() {
        let b = Board::new(25, 2.0);
        let cells = b.squares_in_range(Position::new(10, 10), 2.0);
        assert!(cells.contains(&Position::new(10, 10)));
        // With scale 2.0, only adjacent cells (dist 2.0*sqrt(2)=2.83 > 2.0 for diagonal)
        // are included for orthogonal neighbors (dist exactly 2.0).
        assert!(cells.contains(&Position::new(11, 10)));
        assert!(!cells.contains(&Position::new(11, 11)));
    }

    #[test]
    fn unit_counts_per_team() {
        let mut b = Board::new(25, 1.0);
        b.set_unit(Position::new(0, 0), dummy_unit("a"), Team::T0).unwrap();
        b.set_unit(Position::new(1, 1), dummy_unit("b"), Team::T1).unwrap();
        b.set_unit(Position::new(2, 2), dummy_unit("c"), Team::T1).unwrap();
        assert_eq!(b.unit_counts(), (1, 2));
    }
}
