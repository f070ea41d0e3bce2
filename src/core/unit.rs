//! Per-unit (squad) numeric state and per-phase flags.
//!
//! Damage mutates these fields only through `crate::core::mechanics`; the
//! struct itself stays pure data, structurally comparable, matching the
//! teacher's `Piece`/`PieceState` split but flattened into one record since
//! the spec keeps identity, stats and flags on a single `Unit`.

/// A squad's ranged-weapon profile. Absent (all-zero `shots`) means the unit
/// has no ranged attack.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RangedWeapon {
    pub range: f64,
    pub s: i32,
    pub ap: i32,
    pub dmg: i32,
    pub shots: i32,
}

/// A squad's melee-weapon profile.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeleeWeapon {
    pub s: i32,
    pub ap: i32,
    pub dmg: i32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Unit {
    // Identity
    pub name: String,

    // Numeric stats
    pub count: i32,
    pub movement: f64,
    pub ws: i32,
    pub bs: i32,
    pub t: i32,
    pub w: i32,
    pub total_w: i32,
    pub a: i32,
    pub ld: i32,
    pub sv: i32,
    pub inv: i32,
    pub ranged: RangedWeapon,
    pub melee: MeleeWeapon,
    pub models_lost_this_phase: i32,

    // Phase/turn flags
    pub rg_is_rapid: bool,
    pub rg_is_heavy: bool,
    pub moved_this_turn: bool,
    pub fired_this_turn: bool,
    pub attempted_charge_this_turn: bool,
    pub successful_charge_this_turn: bool,
    pub fought_this_turn: bool,
    pub moved_out_of_combat_this_turn: bool,
}

impl Unit {
    /// `count = ceil(total_w / w)`, never negative.
    pub fn recompute_count(&mut self) {
        debug_assert!(self.w > 0, "unit {} has non-positive per-model wounds", self.name);
        if self.total_w <= 0 {
            self.count = 0;
        } else {
            self.count = ((self.total_w as f64) / (self.w as f64)).ceil() as i32;
        }
    }

    pub fn is_destroyed(&self) -> bool {
        self.count <= 0 || self.total_w <= 0
    }

    /// A "standard ranged weapon": range, strength, damage and shots all
    /// strictly positive (spec §4.6, ShootUnit generator).
    pub fn has_ranged_weapon(&self) -> bool {
        self.ranged.range > 0.0 && self.ranged.s > 0 && self.ranged.dmg > 0 && self.ranged.shots > 0
    }

    /// A "standard melee weapon": strength and damage strictly positive.
    pub fn has_melee_weapon(&self) -> bool {
        self.melee.s > 0 && self.melee.dmg > 0
    }

    /// Total ranged attacks this unit fires this activation, applying the
    /// rapid-fire doubling when the target sits within half range.
    pub fn ranged_attack_count(&self, target_distance: f64) -> i32 {
        let mut shots = self.ranged.shots;
        if self.rg_is_rapid && target_distance <= self.ranged.range / 2.0 {
            shots *= 2;
        }
        self.count * shots
    }

    /// Total melee attacks this unit makes when fighting.
    pub fn melee_attack_count(&self) -> i32 {
        self.count * self.a
    }

    /// Effective ranged hit skill, forcing 6 when a heavy weapon was fired
    /// after moving (spec §4.5).
    pub fn ranged_hit_skill(&self) -> i32 {
        if self.rg_is_heavy && self.moved_this_turn {
            6
        } else {
            self.bs
        }
    }

    pub fn reset_phase_flags(&mut self) {
        self.models_lost_this_phase = 0;
    }

    pub fn reset_turn_flags(&mut self) {
        self.attempted_charge_this_turn = false;
        self.fired_this_turn = false;
        self.fought_this_turn = false;
        self.moved_out_of_combat_this_turn = false;
        self.moved_this_turn = false;
        self.successful_charge_this_turn = false;
    }

    /// Whether this unit can still take part in fighting this FIGHT phase:
    /// has a melee weapon, has not fought, and has not been fully resolved
    /// out of combat. Adjacency to an enemy is checked by the caller (it
    /// needs board context this struct does not have).
    pub fn can_still_fight(&self) -> bool {
        self.has_melee_weapon() && !self.fought_this_turn
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_unit() -> Unit {
        Unit {
            name: "Test Squad".into(),
            count: 5,
            movement: 6.0,
            ws: 3,
            bs: 3,
            t: 4,
            w: 1,
            total_w: 5,
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
    fn recompute_count_ceils() {
        let mut u = base_unit();
        u.w = 2;
        u.total_w = 5;
        u.recompute_count();
        assert_eq!(u.count, 3);
    }

    #[test]
    fn recompute_count_clamps_at_zero() {
        let mut u = base_unit();
        u.total_w = 0;
        u.recompute_count();
        assert_eq!(u.count, 0);
        assert!(u.is_destroyed());
    }

    #[test]
    fn rapid_fire_doubles_within_half_range() {
        let mut u = base_unit();
        u.rg_is_rapid = true;
        u.count = 5;
        assert_eq!(u.ranged_attack_count(11.0), 10);
        assert_eq!(u.ranged_attack_count(13.0), 5);
    }

    #[test]
    fn heavy_weapon_moved_forces_hit_skill_six() {
        let mut u = base_unit();
        u.rg_is_heavy = true;
        u.moved_this_turn = true;
        assert_eq!(u.ranged_hit_skill(), 6);
        u.moved_this_turn = false;
        assert_eq!(u.ranged_hit_skill(), 3);
    }
}
