//! Self-play demo binary: runs the `SelfPlayManager` against a uniform
//! random rollout evaluator for a small configurable number of games, and
//! logs every move committed at the root.
//!
//! Grounded on the clap `Parser`/`Subcommand` CLI shape used by
//! `batconjurer-hammerhead`'s MCTS self-play binary, adapted to this
//! crate's `env_logger`-based ambient logging instead of `tracing`.

use clap::Parser;
use log::info;

use gauntlet::config::{GameConfig, SelfPlayConfig};
use gauntlet::core::board::Board;
use gauntlet::core::phase::Phase;
use gauntlet::core::position::Position;
use gauntlet::core::side::Team;
use gauntlet::core::unit::{MeleeWeapon, RangedWeapon, Unit};
use gauntlet::heuristics::{Evaluator, UniformRolloutEvaluator};
use gauntlet::{GameState, SelfPlayManager};

#[derive(Parser)]
#[command(version, about = "Self-play driver for the gauntlet tactical-combat engine", long_about = None)]
struct Args {
    /// Number of simultaneous self-play games.
    #[arg(long, default_value_t = 4)]
    num_games: usize,

    /// Root simulations accumulated per game before committing a move.
    #[arg(long, default_value_t = 50)]
    num_simulations: u32,

    /// Rollouts performed per leaf evaluation.
    #[arg(long, default_value_t = 8)]
    rollouts_per_leaf: usize,

    /// UCB1 exploration constant.
    #[arg(long, default_value_t = std::f64::consts::SQRT_2)]
    exploration_c: f64,

    /// Final-policy temperature (0 selects the most-visited action).
    #[arg(long, default_value_t = 1.0)]
    temperature: f64,

    /// Board edge length.
    #[arg(long, default_value_t = 25)]
    board_size: i32,

    /// Hard cap on turn count (negative means unbounded).
    #[arg(long, default_value_t = -1)]
    turn_limit: i32,

    /// RNG seed for the self-play manager.
    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// Worker-pool thread count for Select/Update (1 runs sequentially).
    #[arg(long, default_value_t = 1)]
    num_threads: usize,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let game_config = GameConfig { board_size: args.board_size, scale: 1.0, turn_limit: args.turn_limit };
    let selfplay_config = SelfPlayConfig {
        exploration_c: args.exploration_c,
        temperature: args.temperature,
        num_simulations: args.num_simulations,
        num_threads: args.num_threads,
    };

    let initial_state = demo_skirmish(&game_config)?;
    let evaluator = UniformRolloutEvaluator::new(args.rollouts_per_leaf);

    let mut manager = SelfPlayManager::with_seed(selfplay_config, args.seed);
    manager.reset(args.num_games, &initial_state)?;

    info!("starting self-play over {} games", args.num_games);

    while !manager.all_finished() {
        while !manager.ready_to_commit() {
            let leaves = manager.select()?;
            let mut values = Vec::with_capacity(leaves.len());
            let mut policies = Vec::with_capacity(leaves.len());
            for leaf in &leaves {
                let value = evaluator.compute_value_estimate(leaf, leaf.acting_team())?;
                let num_actions = leaf.commands()?.len();
                values.push(value);
                policies.push(vec![1.0 / num_actions as f64; num_actions]);
            }
            manager.update(&values, &policies)?;
        }

        manager.commit()?;
        for (game_id, state) in manager.running_game_ids().iter().zip(manager.current_states().iter()) {
            info!("game {}: {}", game_id, state);
        }
    }

    let values = manager.game_values()?;
    for (game_id, value) in values.iter().enumerate() {
        info!("game {} finished with team-0 value {}", game_id, value);
    }

    Ok(())
}

/// A minimal two-squad skirmish used to demonstrate the self-play loop: one
/// ranged-heavy squad per side, placed far enough apart that Movement is the
/// opening phase's only useful order.
fn demo_skirmish(config: &GameConfig) -> anyhow::Result<GameState> {
    let squad = |name: &str| Unit {
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
    };

    let mut board = Board::new(config.board_size, config.scale);
    board.set_unit(Position::new(2, 2), squad("Attack Squad"), Team::T0)?;
    board.set_unit(Position::new(config.board_size - 3, config.board_size - 3), squad("Defense Squad"), Team::T1)?;

    GameState::new(
        Team::T0,
        Team::T0,
        Phase::Movement,
        board,
        if config.turn_limit > 0 { Some(config.turn_limit) } else { None },
        None,
    )
}
