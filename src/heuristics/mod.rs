//! Leaf-value estimation: the interface the Self-Play Manager's Update step
//! calls to turn an expanded leaf into a scalar value estimate (spec §5).
//!
//! Grounded on `original_source/Core40KLearn`'s `IValueEstimator` interface
//! (used by `UniformRandomEstimator`), generalized to Rust's trait-object
//! idiom the way the teacher exposes its own AI strategies as trait objects
//! (`ai/general.rs`).

pub mod random;

pub use random::UniformRolloutEvaluator;

use anyhow::Result;

use crate::core::game::GameState;
use crate::core::side::Team;

/// Estimates the value of `state` from `team`'s perspective, in the same
/// `[-1, 1]` range as `GameState::game_value` (spec §5).
pub trait Evaluator {
    fn compute_value_estimate(&self, state: &GameState, team: Team) -> Result<f64>;
}
