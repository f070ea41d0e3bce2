//! Self-play engine for a phase-structured tactical combat game: board and
//! unit state (`core`), the stochastic action protocol and transition
//! algebra (`action`), the Monte Carlo tree search driver (`mcts`), leaf
//! evaluators (`heuristics`), and the batched Self-Play Manager
//! (`selfplay`) that ties them together.

pub mod action;
pub mod config;
pub mod core;
pub mod heuristics;
pub mod mcts;
pub mod selfplay;

pub use action::{Action, CommandType};
pub use config::{GameConfig, SelfPlayConfig};
pub use core::{Board, GameState, Phase, Position, Team, Unit};
pub use heuristics::{Evaluator, UniformRolloutEvaluator};
pub use selfplay::SelfPlayManager;
