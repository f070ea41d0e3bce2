//! Monte Carlo Tree Search: node storage (§4.7), tree policy (§4.8), and the
//! descent driver the Self-Play Manager's Select step calls into.

pub mod node;
pub mod policy;

pub use node::{add_value_statistic, detach, expand, Edge, Node, NodeRef};
pub use policy::{TreePolicy, Ucb1Policy};

use anyhow::{ensure, Result};
use rand::Rng;

use crate::core::side::Team;

/// One simulation's descent from `root` down to a leaf (or terminal) node,
/// following `policy` at every expanded node (spec §4.8). Returns the path
/// of nodes visited, root first, leaf last. Takes `rng` explicitly rather
/// than reaching for a thread-local: the design calls for a single RNG
/// instance per manager, accessed sequentially (spec §5).
pub fn select(root: &NodeRef, policy: &dyn TreePolicy, root_team: Team, rng: &mut impl Rng) -> Result<Vec<NodeRef>> {
    let mut path = vec![root.clone()];
    loop {
        let current = path.last().unwrap().clone();
        let is_leaf = current.lock().unwrap().is_leaf();
        let is_terminal = current.lock().unwrap().is_terminal();
        if is_leaf || is_terminal {
            break;
        }

        let action_idx = policy.select_action(&current.lock().unwrap(), root_team)?;
        let edges_len = current.lock().unwrap().children_for_action(action_idx)?.len();
        ensure!(edges_len > 0, "expanded action must have at least one chance outcome");

        let child = sample_edge(&current, action_idx, rng)?;
        path.push(child);
    }
    Ok(path)
}

/// Samples one of `node`'s action-`idx` children proportionally to its edge
/// weight (a chance node has no agent to apply a tree policy to).
pub fn sample_edge(node: &NodeRef, action_idx: usize, rng: &mut impl Rng) -> Result<NodeRef> {
    let weights: Vec<f64> = node.lock().unwrap().children_for_action(action_idx)?.iter().map(|e| e.weight).collect();
    let chosen = sample_weighted(&weights, rng);
    Ok(node.lock().unwrap().children_for_action(action_idx)?[chosen].child.clone())
}

/// Samples an index proportionally to `weights`, which must sum to (close
/// to) 1 (spec P1).
pub fn sample_weighted(weights: &[f64], rng: &mut impl Rng) -> usize {
    let total: f64 = weights.iter().sum();
    let mut roll = rng.random_range(0.0..total.max(f64::MIN_POSITIVE));
    for (idx, &w) in weights.iter().enumerate() {
        if roll < w {
            return idx;
        }
        roll -= w;
    }
    weights.len() - 1
}
