//! The Self-Play Manager: drives several simultaneous search trees through
//! the Select/Update/Commit cycle (spec §4.9).
//!
//! Grounded on `original_source/Core40KLearn/SelfPlayManager.{h,cpp}` for
//! the Idle/Waiting state machine and the per-game running-array bookkeeping,
//! rebuilt around this crate's `Arc<Mutex<Node>>` tree (`mcts::node`)
//! instead of the original's raw-pointer `MCTSNodeArray`. All value
//! estimates held in the tree are with respect to team 0, matching the
//! original's documented convention; `Update` negates caller-supplied
//! values when the selected leaf's acting team is team 1.
//!
//! Select and Update each spread their per-game work over a `rayon` worker
//! pool when `SelfPlayConfig::num_threads > 1` (spec §5's two named
//! parallel regions). Distinct games own disjoint trees, so two jobs never
//! touch the same node; the one shared resource, the manager's RNG, is only
//! ever drawn from sequentially on the calling thread — once per game,
//! before any job is dispatched — and each job then carries its own seeded
//! `StdRng` (spec §5: "RNG is a single per-manager instance; sequential
//! access only").

use anyhow::{ensure, Result};
use log::{debug, info};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::SelfPlayConfig;
use crate::core::game::GameState;
use crate::core::side::Team;
use crate::mcts::{self, NodeRef, Ucb1Policy};

struct GameSlot {
    root: NodeRef,
    game_id: usize,
}

/// The result of one game's Select descent (spec §4.9): a tree already at
/// its simulation quota, a terminal leaf (already backpropagated with its
/// true value), or a non-terminal leaf awaiting external evaluation.
enum SelectOutcome {
    AlreadyDone,
    Terminal,
    NeedsEvaluation(NodeRef),
}

pub struct SelfPlayManager {
    config: SelfPlayConfig,
    policy: Ucb1Policy,
    rng: StdRng,
    games: Vec<GameSlot>,
    waiting: bool,
    selected_leaves: Vec<Option<NodeRef>>,
    selected_indices: Vec<usize>,
    game_values: Vec<Option<f64>>,
    pool: Option<rayon::ThreadPool>,
}

impl SelfPlayManager {
    pub fn new(config: SelfPlayConfig) -> Self {
        Self::with_seed(config, 0)
    }

    pub fn with_seed(config: SelfPlayConfig, seed: u64) -> Self {
        let policy = Ucb1Policy::new(config.exploration_c);
        let pool = if config.num_threads > 1 {
            Some(
                rayon::ThreadPoolBuilder::new()
                    .num_threads(config.num_threads)
                    .build()
                    .expect("building a worker pool with a positive thread count cannot fail"),
            )
        } else {
            None
        };
        Self {
            config,
            policy,
            rng: StdRng::seed_from_u64(seed),
            games: Vec::new(),
            waiting: false,
            selected_leaves: Vec::new(),
            selected_indices: Vec::new(),
            game_values: Vec::new(),
            pool,
        }
    }

    /// Cancels all current games and starts `num_games` fresh copies of
    /// `initial_state`. PRECONDITION: `!initial_state.is_finished()`.
    pub fn reset(&mut self, num_games: usize, initial_state: &GameState) -> Result<()> {
        ensure!(!initial_state.is_finished(), "cannot reset self-play from a finished state");
        self.games = (0..num_games)
            .map(|game_id| GameSlot { root: mcts::Node::new_root(initial_state.clone()), game_id })
            .collect();
        self.waiting = false;
        self.selected_leaves = Vec::new();
        self.selected_indices = Vec::new();
        self.game_values = vec![None; num_games];
        info!("self-play reset with {} games", num_games);
        Ok(())
    }

    pub fn is_waiting(&self) -> bool {
        self.waiting
    }

    pub fn ready_to_commit(&self) -> bool {
        !self.games.is_empty()
            && self.games.iter().all(|g| g.root.lock().unwrap().num_estimates >= self.config.num_simulations as u64)
    }

    pub fn all_finished(&self) -> bool {
        self.games.is_empty()
    }

    /// Traverses each tree whose root has not yet accumulated
    /// `num_simulations` estimates, following UCB1 to a leaf. Degenerate
    /// single-action non-terminal leaves are expanded in-place and the
    /// descent continues through them. Terminal leaves are backpropagated
    /// immediately using their true game value and excluded from the
    /// returned list; every other selected leaf's state is returned for
    /// external evaluation.
    pub fn select(&mut self) -> Result<Vec<GameState>> {
        ensure!(!self.waiting, "cannot Select while waiting on Update");
        ensure!(!self.ready_to_commit(), "cannot Select when already ready to commit");
        ensure!(!self.all_finished(), "cannot Select with no running games");

        // Draw one descent seed per game sequentially from the shared RNG
        // before dispatching any work (spec §5). Each job below then owns
        // a private `StdRng`, so the parallel region never touches
        // `self.rng`.
        let seeds: Vec<u64> = (0..self.games.len()).map(|_| self.rng.random()).collect();
        let threshold = self.config.num_simulations as u64;

        let games = &self.games;
        let policy = &self.policy;
        let outcomes: Vec<Result<SelectOutcome>> = if let Some(pool) = &self.pool {
            use rayon::prelude::*;
            pool.install(|| {
                games
                    .par_iter()
                    .zip(seeds.par_iter())
                    .map(|(slot, &seed)| Self::select_one(slot, policy, threshold, seed))
                    .collect()
            })
        } else {
            games
                .iter()
                .zip(seeds.iter())
                .map(|(slot, &seed)| Self::select_one(slot, policy, threshold, seed))
                .collect()
        };

        let mut leaf_states = Vec::new();
        let mut selected_leaves = Vec::with_capacity(self.games.len());
        let mut selected_indices = Vec::new();

        for (game_idx, outcome) in outcomes.into_iter().enumerate() {
            match outcome? {
                SelectOutcome::AlreadyDone | SelectOutcome::Terminal => selected_leaves.push(None),
                SelectOutcome::NeedsEvaluation(leaf) => {
                    leaf_states.push(leaf.lock().unwrap().state.clone());
                    selected_indices.push(game_idx);
                    selected_leaves.push(Some(leaf));
                }
            }
        }

        self.selected_leaves = selected_leaves;
        self.selected_indices = selected_indices;
        self.waiting = true;
        debug!("select produced {} leaves needing evaluation", leaf_states.len());
        Ok(leaf_states)
    }

    /// One game's Select descent, parallel-safe: takes its own seeded RNG
    /// rather than the manager's shared one, and only ever mutates nodes
    /// reachable from `slot`'s own root (spec §4.9, §5).
    fn select_one(slot: &GameSlot, policy: &Ucb1Policy, threshold: u64, seed: u64) -> Result<SelectOutcome> {
        let root = slot.root.clone();
        if root.lock().unwrap().num_estimates >= threshold {
            return Ok(SelectOutcome::AlreadyDone);
        }

        let mut rng = StdRng::seed_from_u64(seed);
        let path = mcts::select(&root, policy, Team::T0, &mut rng)?;
        let mut leaf = path.last().expect("descent always visits at least the root").clone();

        loop {
            if leaf.lock().unwrap().is_terminal() {
                let game_value = leaf.lock().unwrap().state.game_value(Team::T0)?;
                mcts::add_value_statistic(&leaf, game_value);
                return Ok(SelectOutcome::Terminal);
            }

            let num_actions = leaf.lock().unwrap().num_actions()?;
            if num_actions == 1 {
                mcts::expand(&leaf, vec![1.0])?;
                leaf = mcts::sample_edge(&leaf, 0, &mut rng)?;
                continue;
            }

            return Ok(SelectOutcome::NeedsEvaluation(leaf));
        }
    }

    /// Expands each non-terminal selected leaf with its supplied prior
    /// policy and backpropagates its supplied value estimate (negated if
    /// the leaf's acting team is team 1, since the tree stores team-0
    /// values). `value_estimates` and `policies` must have one entry per
    /// state `select` returned.
    pub fn update(&mut self, value_estimates: &[f64], policies: &[Vec<f64>]) -> Result<()> {
        ensure!(self.waiting, "Update called without a preceding Select");
        ensure!(
            value_estimates.len() == self.selected_indices.len() && policies.len() == self.selected_indices.len(),
            "value_estimates/policies length must match the number of leaves Select returned"
        );

        // Each selected leaf belongs to a distinct game's tree (`select`
        // records at most one leaf per game index), so expanding and
        // backpropagating them is safe to spread across the worker pool:
        // no two jobs ever share an ancestor chain (spec §5).
        let jobs: Vec<(NodeRef, f64, Vec<f64>)> = self
            .selected_indices
            .iter()
            .enumerate()
            .map(|(k, &game_idx)| {
                let leaf = self.selected_leaves[game_idx].clone().expect("a selected index always has a live leaf");
                let acting_team = leaf.lock().unwrap().state.acting_team;
                let value = if acting_team == Team::T0 { value_estimates[k] } else { -value_estimates[k] };
                (leaf, value, policies[k].clone())
            })
            .collect();

        let apply_job = |(leaf, value, prior): (NodeRef, f64, Vec<f64>)| -> Result<()> {
            mcts::expand(&leaf, prior)?;
            mcts::add_value_statistic(&leaf, value);
            Ok(())
        };

        if let Some(pool) = &self.pool {
            use rayon::prelude::*;
            pool.install(|| jobs.into_par_iter().map(apply_job).collect::<Result<Vec<()>>>())?;
        } else {
            jobs.into_iter().map(apply_job).collect::<Result<Vec<()>>>()?;
        }

        self.waiting = false;
        self.selected_leaves = Vec::new();
        self.selected_indices = Vec::new();
        Ok(())
    }

    /// For each tree, samples an action from the final policy (visit-count
    /// argmax at `temperature == 0`, else visits^(1/temperature)
    /// normalized), applies it, samples a successor, and makes that
    /// successor the new (detached) root. Finished games are recorded into
    /// `game_values` and dropped from the running set.
    pub fn commit(&mut self) -> Result<()> {
        ensure!(self.ready_to_commit(), "Commit called before every tree reached num_simulations");
        ensure!(!self.all_finished(), "Commit called with no running games");

        let mut finished = Vec::new();

        for game_idx in 0..self.games.len() {
            let root = self.games[game_idx].root.clone();
            let policy = self.final_policy(&root)?;
            let action_idx = mcts::sample_weighted(&policy, &mut self.rng);

            let weights: Vec<f64> =
                root.lock().unwrap().children_for_action(action_idx)?.iter().map(|e| e.weight).collect();
            let chosen = mcts::sample_weighted(&weights, &mut self.rng);
            let new_root = root.lock().unwrap().children_for_action(action_idx)?[chosen].child.clone();
            mcts::detach(&new_root)?;

            self.games[game_idx].root = new_root.clone();

            if new_root.lock().unwrap().is_terminal() {
                let game_value = new_root.lock().unwrap().state.game_value(Team::T0)?;
                let game_id = self.games[game_idx].game_id;
                self.game_values[game_id] = Some(game_value);
                finished.push(game_idx);
            }
        }

        for &game_idx in finished.iter().rev() {
            let game_id = self.games[game_idx].game_id;
            self.games.remove(game_idx);
            debug!("game {} finished", game_id);
        }

        Ok(())
    }

    fn final_policy(&self, root: &NodeRef) -> Result<Vec<f64>> {
        let num_actions = root.lock().unwrap().num_actions()?;
        let visits: Vec<f64> =
            (0..num_actions).map(|i| root.lock().unwrap().action_visit_count(i).unwrap_or(0) as f64).collect();

        if self.config.temperature == 0.0 {
            let argmax = visits
                .iter()
                .enumerate()
                .fold((0usize, f64::NEG_INFINITY), |(bi, bv), (i, &v)| if v > bv { (i, v) } else { (bi, bv) })
                .0;
            let mut one_hot = vec![0.0; num_actions];
            one_hot[argmax] = 1.0;
            Ok(one_hot)
        } else {
            let powered: Vec<f64> = visits.iter().map(|&v| v.powf(1.0 / self.config.temperature)).collect();
            let sum: f64 = powered.iter().sum();
            if sum > 0.0 {
                Ok(powered.iter().map(|&p| p / sum).collect())
            } else {
                Ok(vec![1.0 / num_actions as f64; num_actions])
            }
        }
    }

    pub fn current_states(&self) -> Vec<GameState> {
        self.games.iter().map(|g| g.root.lock().unwrap().state.clone()).collect()
    }

    pub fn current_action_distributions(&self) -> Result<Vec<Vec<f64>>> {
        ensure!(self.ready_to_commit(), "action distributions are only defined once ready to commit");
        self.games.iter().map(|g| self.final_policy(&g.root)).collect()
    }

    pub fn tree_sizes(&self) -> Vec<u64> {
        self.games.iter().map(|g| g.root.lock().unwrap().num_estimates).collect()
    }

    pub fn running_game_ids(&self) -> Vec<usize> {
        self.games.iter().map(|g| g.game_id).collect()
    }

    pub fn game_values(&self) -> Result<Vec<f64>> {
        ensure!(self.all_finished(), "game_values is only defined once all games are finished");
        Ok(self.game_values.iter().map(|v| v.expect("all_finished implies every slot was recorded")).collect())
    }
}
