//! End-to-end benchmark of the Select/Update/Commit cycle against a uniform
//! rollout evaluator, the shape of work a real training loop spends most of
//! its time in.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use pprof::criterion::{Output, PProfProfiler};

use gauntlet::config::SelfPlayConfig;
use gauntlet::core::board::Board;
use gauntlet::core::phase::Phase;
use gauntlet::core::position::Position;
use gauntlet::core::side::Team;
use gauntlet::core::unit::{MeleeWeapon, RangedWeapon, Unit};
use gauntlet::heuristics::{Evaluator, UniformRolloutEvaluator};
use gauntlet::{GameState, SelfPlayManager};

fn squad(name: &str) -> Unit {
    Unit {
        name: name.to_string(),
        count: 5,
        movement: 6.0,
        ws: 3,
        bs: 3,
        t: 4,
        w: 1,
        total_w: 5,
        a: 2,
        ld: 7,
        sv: 3,
        inv: 7,
        ranged: RangedWeapon { range: 18.0, s: 4, ap: -1, dmg: 1, shots: 2 },
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

fn initial_state() -> GameState {
    let mut board = Board::new(25, 1.0);
    board.set_unit(Position::new(2, 2), squad("Attack Squad"), Team::T0).unwrap();
    board.set_unit(Position::new(20, 20), squad("Defense Squad"), Team::T1).unwrap();
    GameState::new(Team::T0, Team::T0, Phase::Movement, board, None, None).unwrap()
}

fn bench_select_update_round(c: &mut Criterion) {
    let config = SelfPlayConfig { num_simulations: 16, ..SelfPlayConfig::default() };
    let evaluator = UniformRolloutEvaluator::new(4);

    c.bench_function("selfplay/4 games x 16 simulations to commit", |b| {
        b.iter(|| {
            let mut manager = SelfPlayManager::with_seed(config.clone(), 1);
            manager.reset(4, &initial_state()).unwrap();

            while !manager.ready_to_commit() {
                let leaves = manager.select().unwrap();
                let mut values = Vec::with_capacity(leaves.len());
                let mut policies = Vec::with_capacity(leaves.len());
                for leaf in &leaves {
                    let value = evaluator.compute_value_estimate(leaf, leaf.acting_team()).unwrap();
                    let num_actions = leaf.commands().unwrap().len();
                    values.push(value);
                    policies.push(vec![1.0 / num_actions as f64; num_actions]);
                }
                manager.update(&values, &policies).unwrap();
            }

            black_box(manager.commit().unwrap());
        })
    });
}

criterion_group! {
    name = benches;
    config = Criterion::default().sample_size(20).with_profiler(PProfProfiler::new(100, Output::Flamegraph(None)));
    targets = bench_select_update_round
}
criterion_main!(benches);
