//! Probabilistic combat mechanics: penetration probability, binomial damage
//! distributions, morale, and the two-dice charge distribution. Grounded on
//! the teacher's `try_attack` (`core/board/board.rs`) for the shape of a
//! single-attack resolution, generalized here into an analytic distribution
//! over successor `Unit` records per spec §4.5.

use lazy_static::lazy_static;

use super::unit::Unit;

lazy_static! {
    /// The 2d6 sum distribution, indexed `[2..=12]` at `TWO_DICE_DISTRIBUTION[s-2]`.
    /// Precomputed once rather than on every charge resolution, matching the
    /// teacher's `PATH_MAPS` static-table pattern (`core/loc.rs`).
    static ref TWO_DICE_DISTRIBUTION: [f64; 11] = {
        let mut counts = [0.0f64; 11];
        for d1 in 1..=6 {
            for d2 in 1..=6 {
                counts[(d1 + d2 - 2) as usize] += 1.0;
            }
        }
        for c in counts.iter_mut() {
            *c /= 36.0;
        }
        counts
    };
}

/// Hit probability for a single attack, clamped nonnegative. Heavy-weapon
/// movement penalty is applied by the caller via `Unit::ranged_hit_skill`.
pub fn hit_probability(hit_skill: i32) -> f64 {
    ((7 - hit_skill) as f64 / 6.0).max(0.0)
}

/// Wound probability from the strength/toughness ratio table (spec §4.5).
pub fn wound_probability(s: i32, t: i32) -> f64 {
    let r = s as f64 / t as f64;
    if r >= 2.0 {
        5.0 / 6.0
    } else if r > 1.0 {
        4.0 / 6.0
    } else if r == 1.0 {
        3.0 / 6.0
    } else if r > 0.5 {
        2.0 / 6.0
    } else {
        1.0 / 6.0
    }
}

pub fn armor_save_probability(sv: i32, ap: i32) -> f64 {
    ((7 - sv + ap) as f64 / 6.0).max(0.0)
}

pub fn invuln_save_probability(inv: i32) -> f64 {
    ((7 - inv) as f64 / 6.0).max(0.0)
}

pub fn effective_save_probability(sv: i32, ap: i32, inv: i32) -> f64 {
    armor_save_probability(sv, ap).max(invuln_save_probability(inv))
}

/// Penetration probability for a single attack: hit * wound * (1 - save).
pub fn penetration_probability(hit_skill: i32, s: i32, t: i32, sv: i32, ap: i32, inv: i32) -> f64 {
    let p_hit = hit_probability(hit_skill);
    let p_wound = wound_probability(s, t);
    let p_save = effective_save_probability(sv, ap, inv);
    p_hit * p_wound * (1.0 - p_save)
}

fn binomial_coefficient(n: i32, k: i32) -> f64 {
    if k < 0 || k > n {
        return 0.0;
    }
    let k = k.min(n - k);
    let mut result = 1.0;
    for i in 0..k {
        result = result * (n - i) as f64 / (i + 1) as f64;
    }
    result
}

pub fn binomial_pmf(n: i32, k: i32, p: f64) -> f64 {
    binomial_coefficient(n, k) * p.powi(k) * (1.0 - p).powi(n - k)
}

/// The analytic damage distribution from `attacks` total attacks, each
/// independently penetrating with probability `p` and dealing
/// `min(weapon_dmg, target.w)` damage on success (spec §4.5, P4). Returns
/// distinct successor `Unit` records: consecutive `k` that clip `total_w`
/// to zero collapse into a single "destroyed" entry.
pub fn damage_distribution(target: &Unit, attacks: i32, p: f64, weapon_dmg: i32) -> Vec<(Unit, f64)> {
    let per_attack_damage = weapon_dmg.min(target.w);
    let mut out: Vec<(Unit, f64)> = Vec::new();

    for k in 0..=attacks {
        let prob = binomial_pmf(attacks, k, p);
        if prob <= 0.0 && attacks > 0 {
            continue;
        }
        let mut successor = target.clone();
        successor.total_w = (target.total_w - k * per_attack_damage).max(0);
        let prior_count = successor.count;
        successor.recompute_count();
        successor.models_lost_this_phase += prior_count - successor.count;

        merge_unit_outcome(&mut out, successor, prob);
    }

    out
}

/// Merge a new `(Unit, probability)` outcome into an accumulating list,
/// summing probability when the unit record already appears as the most
/// recently pushed entry (damage-distribution `k` values are monotonic, so
/// only adjacent merges can occur; spec §4.5 and design note §9).
fn merge_unit_outcome(out: &mut Vec<(Unit, f64)>, unit: Unit, prob: f64) {
    if let Some(last) = out.last_mut() {
        if last.0 == unit {
            last.1 += prob;
            return;
        }
    }
    out.push((unit, prob));
}

/// Morale distribution at a unit that lost models this phase (spec §4.5).
/// `r_min = ld - models_lost + 1`; if `r_min >= 7` no further losses are
/// possible. Otherwise rolls `1..=6` uniformly, each causing an additional
/// loss of `max(0, models_lost + roll - ld)` capped at the unit's `count`.
pub fn morale_distribution(unit: &Unit) -> Vec<(Unit, f64)> {
    let r_min = unit.ld - unit.models_lost_this_phase + 1;
    let mut out: Vec<(Unit, f64)> = Vec::new();

    if r_min >= 7 {
        out.push((unit.clone(), 1.0));
        return out;
    }

    for roll in 1..=6 {
        let additional_loss = (unit.models_lost_this_phase + roll - unit.ld)
            .max(0)
            .min(unit.count);
        let mut successor = unit.clone();
        if additional_loss > 0 {
            successor.count -= additional_loss;
            successor.total_w = if successor.count == 0 {
                0
            } else {
                (successor.count as f64 * successor.w as f64).round() as i32
            };
        }
        merge_unit_outcome(&mut out, successor, 1.0 / 6.0);
    }

    out
}

/// The two-dice (2d6) sum distribution, indexed `[2..=12]` at `result[s-2]`.
pub fn two_dice_distribution() -> [f64; 11] {
    *TWO_DICE_DISTRIBUTION
}

/// Charge fail/pass probability given the minimum 2d6 roll required to
/// reach the destination (spec §4.5).
pub fn charge_pass_probability(min_required: i32) -> (f64, f64) {
    let dist = *TWO_DICE_DISTRIBUTION;
    let fail: f64 = if min_required <= 2 {
        0.0
    } else {
        (2..min_required.min(13)).map(|s| dist[(s - 2) as usize]).sum()
    };
    (1.0 - fail, fail)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::unit::{MeleeWeapon, RangedWeapon};

    const EPS: f64 = 1e-9;

    fn shooter_s1() -> Unit {
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

    /// S1 (shooting single-shot hit/miss): pH=4/6, pW=3/6, pAS=3/6, p=1/6.
    #[test]
    fn s1_single_shot_penetration_probability() {
        let p = penetration_probability(3, 4, 4, 3, -1, 7);
        assert!((p - 1.0 / 6.0).abs() < EPS);
    }

    #[test]
    fn s1_damage_distribution_two_outcomes() {
        let target = shooter_s1();
        let p = penetration_probability(3, 4, 4, 3, -1, 7);
        let dist = damage_distribution(&target, 1, p, 1);
        assert_eq!(dist.len(), 2);
        let total: f64 = dist.iter().map(|(_, p)| p).sum();
        assert!((total - 1.0).abs() < EPS);
        let intact = dist.iter().find(|(u, _)| u.count == 1).unwrap();
        let cleared = dist.iter().find(|(u, _)| u.count == 0).unwrap();
        assert!((intact.1 - 5.0 / 6.0).abs() < EPS);
        assert!((cleared.1 - 1.0 / 6.0).abs() < EPS);
    }

    /// S2 (rapid-fire doubling): count=5, shots=1, rapid -> N=10, 11 outcomes.
    #[test]
    fn s2_rapid_fire_eleven_outcomes() {
        let mut target = shooter_s1();
        target.count = 5;
        target.total_w = 50;
        target.w = 5;
        let p = penetration_probability(3, 4, 4, 3, -1, 7);
        let dist = damage_distribution(&target, 10, p, 1);
        assert_eq!(dist.len(), 11);
        let all_miss = &dist[0];
        assert!((all_miss.1 - (1.0 - p).powi(10)).abs() < EPS);
    }

    /// S3 (morale): ld=8, models_lost=2 -> r_min=7, single successor prob 1.
    #[test]
    fn s3_morale_no_further_loss() {
        let mut u = shooter_s1();
        u.ld = 8;
        u.count = 3;
        u.total_w = 3;
        u.w = 1;
        u.models_lost_this_phase = 2;
        let dist = morale_distribution(&u);
        assert_eq!(dist.len(), 1);
        assert!((dist[0].1 - 1.0).abs() < EPS);
        assert_eq!(dist[0].0.count, 3);
    }

    #[test]
    fn two_dice_distribution_sums_to_one() {
        let dist = two_dice_distribution();
        let total: f64 = dist.iter().sum();
        assert!((total - 1.0).abs() < EPS);
        assert!((dist[0] - 1.0 / 36.0).abs() < EPS); // sum=2
        assert!((dist[10] - 1.0 / 36.0).abs() < EPS); // sum=12
    }

    /// S4: min_req=12 -> fail = 35/36 (all sums 2..=11), pass = 1/36.
    #[test]
    fn s4_charge_distance_pass_fail() {
        let (pass, fail) = charge_pass_probability(12);
        assert!((pass - 1.0 / 36.0).abs() < EPS);
        assert!((fail - 35.0 / 36.0).abs() < EPS);
    }

    #[test]
    fn wound_probability_table() {
        assert!((wound_probability(8, 4) - 5.0 / 6.0).abs() < EPS); // r=2
        assert!((wound_probability(6, 4) - 4.0 / 6.0).abs() < EPS); // r=1.5
        assert!((wound_probability(4, 4) - 3.0 / 6.0).abs() < EPS); // r=1
        assert!((wound_probability(3, 4) - 2.0 / 6.0).abs() < EPS); // r=0.75
        assert!((wound_probability(2, 4) - 1.0 / 6.0).abs() < EPS); // r=0.5
    }
}
