use super::node::SearchNode;
use mill_core::AssignmentConstraint;
use std::fmt;

/// Why a region left the search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PruneReason {
    /// No price vector realises the assignment.
    Infeasible,
    /// Bound no better than the best known value on arrival.
    Bound,
    /// Dropped from the frontier after the best known value improved.
    Retroactive,
}

impl fmt::Display for PruneReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PruneReason::Infeasible => write!(f, "infeasible"),
            PruneReason::Bound => write!(f, "bound"),
            PruneReason::Retroactive => write!(f, "retroactive"),
        }
    }
}

/// Observer hooks into a branch and bound run. Every hook defaults to doing
/// nothing.
pub trait SearchMonitor {
    /// A node finished evaluation (primal and relaxation computed).
    fn on_node_evaluated(&mut self, _node: &SearchNode) {}

    /// A node became the incumbent.
    fn on_incumbent(&mut self, _node: &SearchNode) {}

    fn on_pruned(&mut self, _constraint: &AssignmentConstraint, _reason: PruneReason) {}

    fn name(&self) -> &str {
        "SearchMonitor"
    }
}

impl fmt::Debug for dyn SearchMonitor + '_ {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SearchMonitor({})", self.name())
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpMonitor;

impl SearchMonitor for NoOpMonitor {
    fn name(&self) -> &str {
        "NoOpMonitor"
    }
}

/// Keeps every evaluated node; useful for inspecting a run after the fact.
#[derive(Debug, Clone, Default)]
pub struct RecordingMonitor {
    pub evaluated: Vec<SearchNode>,
    pub incumbents: Vec<i64>,
    pub pruned: Vec<(AssignmentConstraint, PruneReason)>,
}

impl SearchMonitor for RecordingMonitor {
    fn on_node_evaluated(&mut self, node: &SearchNode) {
        self.evaluated.push(node.clone());
    }

    fn on_incumbent(&mut self, node: &SearchNode) {
        self.incumbents.push(node.primal_value);
    }

    fn on_pruned(&mut self, constraint: &AssignmentConstraint, reason: PruneReason) {
        self.pruned.push((constraint.clone(), reason));
    }

    fn name(&self) -> &str {
        "RecordingMonitor"
    }
}
