//! The per-state search-tree node: chance children, value/visit
//! aggregation, and weighted backpropagation (spec §4.7).
//!
//! Grounded on the teacher's bump-arena `MCTSNode` (`ai/mcts.rs`) for the
//! node shape (state, stats, lazily-built children), but rebuilt on
//! `Arc<Mutex<Node>>` children with a `Weak` parent back-reference instead
//! of an arena allocator (design note §9): the Self-Play Manager commits
//! and detaches subtrees repeatedly over a long-running game, and an arena
//! that never reclaims memory would leak across a self-play run. `Mutex`
//! over `RefCell` so the tree can be mutated from worker-pool threads.

use anyhow::{ensure, Result};
use std::sync::{Arc, Mutex, Weak};

use crate::action::Action;
use crate::core::game::GameState;

/// `Arc<Mutex<_>>` rather than `Rc<RefCell<_>>` (design note §9): distinct
/// games' trees must be mutable concurrently from separate worker-pool
/// threads during Select/Update (spec §5), which requires `Send + Sync`
/// nodes. A single node is never locked re-entrantly by this crate's own
/// code, so the `Mutex` never contends within one thread's call stack.
pub type NodeRef = Arc<Mutex<Node>>;

/// A child state reached via a particular action, with the probability of
/// arriving there given the parent's chosen action.
pub struct Edge {
    pub child: NodeRef,
    pub weight: f64,
}

pub struct Node {
    pub state: GameState,
    parent: Option<Weak<Mutex<Node>>>,
    pub w_from_parent: f64,
    expanded: bool,
    prior: Option<Vec<f64>>,
    actions: Option<Vec<Action>>,
    /// Per-action child list, same order/length as that action's `apply()`
    /// output.
    children: Option<Vec<Vec<Edge>>>,
    pub value_sum: f64,
    pub weight_sum: f64,
    pub num_estimates: u64,
}

impl Node {
    pub fn new_root(state: GameState) -> NodeRef {
        Arc::new(Mutex::new(Node {
            state,
            parent: None,
            w_from_parent: 1.0,
            expanded: false,
            prior: None,
            actions: None,
            children: None,
            value_sum: 0.0,
            weight_sum: 0.0,
            num_estimates: 0,
        }))
    }

    fn new_child(state: GameState, parent: &NodeRef, w_from_parent: f64) -> NodeRef {
        Arc::new(Mutex::new(Node {
            state,
            parent: Some(Arc::downgrade(parent)),
            w_from_parent,
            expanded: false,
            prior: None,
            actions: None,
            children: None,
            value_sum: 0.0,
            weight_sum: 0.0,
            num_estimates: 0,
        }))
    }

    pub fn is_leaf(&self) -> bool {
        !self.expanded
    }

    pub fn is_terminal(&self) -> bool {
        self.state.is_finished()
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    pub fn parent(&self) -> Option<NodeRef> {
        self.parent.as_ref().and_then(Weak::upgrade)
    }

    /// Lazily materialized legal-action list. Empty for terminal states,
    /// since `commands()` is undefined there.
    pub fn actions(&mut self) -> Result<&[Action]> {
        if self.actions.is_none() {
            let acts = if self.is_terminal() { Vec::new() } else { self.state.commands()? };
            self.actions = Some(acts);
        }
        Ok(self.actions.as_ref().expect("just initialized"))
    }

    pub fn num_actions(&mut self) -> Result<usize> {
        Ok(self.actions()?.len())
    }

    pub fn prior(&self) -> Result<&[f64]> {
        ensure!(!self.is_leaf(), "prior is undefined on a leaf node");
        Ok(self.prior.as_ref().expect("expanded node always carries a prior"))
    }

    pub fn children_for_action(&self, action_idx: usize) -> Result<&[Edge]> {
        ensure!(!self.is_leaf(), "children are undefined on a leaf node");
        Ok(&self.children.as_ref().expect("expanded node always carries children")[action_idx])
    }

    pub fn child_count(&self) -> usize {
        self.children.as_ref().map(|c| c.iter().map(|edges| edges.len()).sum()).unwrap_or(0)
    }

    pub fn value_estimate(&self) -> f64 {
        if self.num_estimates > 0 {
            self.value_sum / self.weight_sum
        } else {
            0.0
        }
    }

    /// Visit count of a single action: the sum of `num_estimates` across
    /// that action's children.
    pub fn action_visit_count(&self, action_idx: usize) -> Result<u64> {
        Ok(self
            .children_for_action(action_idx)?
            .iter()
            .map(|e| e.child.lock().unwrap().num_estimates)
            .sum())
    }

    /// Total visits across all actions (sum over children's num_estimates).
    pub fn total_visit_count(&self) -> Result<u64> {
        let children = self.children.as_ref().expect("expanded");
        Ok(children.iter().flatten().map(|e| e.child.lock().unwrap().num_estimates).sum())
    }

    /// Visit-weighted action value estimate: the edge-weighted average of
    /// visited children's `value_estimate`, defaulting to 0 when no child
    /// has been visited (spec §4.7).
    pub fn action_value_estimate(&self, action_idx: usize) -> Result<f64> {
        let edges = self.children_for_action(action_idx)?;
        let mut weighted_sum = 0.0;
        let mut weight_total = 0.0;
        for edge in edges {
            let child = edge.child.lock().unwrap();
            if child.num_estimates > 0 {
                weighted_sum += edge.weight * child.value_estimate();
                weight_total += edge.weight;
            }
        }
        if weight_total > 0.0 {
            Ok(weighted_sum / weight_total)
        } else {
            Ok(0.0)
        }
    }
}

/// Expand a leaf node with the given prior, creating one subtree of chance
/// children per action (spec §4.7). Requires `is_leaf() && !is_terminal()
/// && prior.len() == num_actions`.
pub fn expand(node: &NodeRef, prior: Vec<f64>) -> Result<()> {
    let num_actions = node.lock().unwrap().num_actions()?;
    {
        let n = node.lock().unwrap();
        ensure!(n.is_leaf(), "cannot expand a non-leaf node");
        ensure!(!n.is_terminal(), "cannot expand a terminal node");
    }
    ensure!(
        prior.len() == num_actions,
        "prior length {} does not match action count {}",
        prior.len(),
        num_actions
    );

    let actions: Vec<Action> = node.lock().unwrap().actions()?.to_vec();
    let mut all_children: Vec<Vec<Edge>> = Vec::with_capacity(actions.len());

    for action in &actions {
        let state = node.lock().unwrap().state.clone();
        let (states, probs) = action.apply(&state)?;
        let mut edges = Vec::with_capacity(states.len());
        for (s, p) in states.into_iter().zip(probs.into_iter()) {
            let child = Node::new_child(s, node, p);
            edges.push(Edge { child, weight: p });
        }
        all_children.push(edges);
    }

    let mut n = node.lock().unwrap();
    n.prior = Some(prior);
    n.children = Some(all_children);
    n.expanded = true;
    Ok(())
}

/// Walk from `node` to the root, accumulating `value_sum`/`weight_sum`
/// weighted by the product of `w_from_parent` edge weights along the path
/// (spec §4.7, P5).
pub fn add_value_statistic(node: &NodeRef, v: f64) {
    let mut running_weight = 1.0;
    let mut current = node.clone();
    loop {
        let parent = {
            let mut n = current.lock().unwrap();
            n.value_sum += v * running_weight;
            n.weight_sum += running_weight;
            n.num_estimates += 1;
            running_weight *= n.w_from_parent;
            n.parent()
        };
        match parent {
            Some(p) => current = p,
            None => break,
        }
    }
}

/// Severs the parent back-pointer, making `node` a root. Precondition:
/// `!is_root()`.
pub fn detach(node: &NodeRef) -> Result<()> {
    let mut n = node.lock().unwrap();
    ensure!(!n.is_root(), "cannot detach an already-root node");
    n.parent = None;
    n.w_from_parent = 1.0;
    Ok(())
}
