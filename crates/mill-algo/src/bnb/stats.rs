use serde::Serialize;
use std::time::Duration;

/// Counters collected while enumerating follower assignments.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BnbStatistics {
    /// Nodes taken off the frontier, root included.
    pub nodes_explored: u64,
    /// Children generated by branching.
    pub nodes_created: u64,
    /// Children whose assignment no price vector realises.
    pub infeasible_children: u64,
    /// Children discarded on arrival because their bound could not beat the
    /// best known value.
    pub prunings_bound: u64,
    /// Frontier nodes removed after a better value was found elsewhere.
    pub prunings_retroactive: u64,
    /// Nodes whose bound met their own primal value.
    pub certified_nodes: u64,
    /// Fully assigned nodes whose gap stayed open.
    pub unresolved_leaves: u64,
    /// Nodes whose relaxation came out below their primal value.
    pub bound_violations: u64,
    pub max_depth: u64,
    pub time_total: Duration,
}

impl BnbStatistics {
    #[inline]
    pub fn on_node_explored(&mut self) {
        self.nodes_explored = self.nodes_explored.saturating_add(1);
    }

    #[inline]
    pub fn on_node_created(&mut self, depth: usize) {
        self.nodes_created = self.nodes_created.saturating_add(1);
        self.max_depth = self.max_depth.max(depth as u64);
    }

    #[inline]
    pub fn on_infeasible(&mut self) {
        self.infeasible_children = self.infeasible_children.saturating_add(1);
    }

    #[inline]
    pub fn on_pruning_bound(&mut self) {
        self.prunings_bound = self.prunings_bound.saturating_add(1);
    }

    #[inline]
    pub fn on_pruning_retroactive(&mut self, count: usize) {
        self.prunings_retroactive = self.prunings_retroactive.saturating_add(count as u64);
    }

    #[inline]
    pub fn on_certified(&mut self) {
        self.certified_nodes = self.certified_nodes.saturating_add(1);
    }

    #[inline]
    pub fn on_unresolved_leaf(&mut self) {
        self.unresolved_leaves = self.unresolved_leaves.saturating_add(1);
    }

    #[inline]
    pub fn on_bound_violation(&mut self) {
        self.bound_violations = self.bound_violations.saturating_add(1);
    }

    #[inline]
    pub fn set_total_time(&mut self, duration: Duration) {
        self.time_total = duration;
    }
}

impl std::fmt::Display for BnbStatistics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Branch and bound statistics:")?;
        writeln!(f, "  Nodes explored:        {}", self.nodes_explored)?;
        writeln!(f, "  Nodes created:         {}", self.nodes_created)?;
        writeln!(f, "  Max depth reached:     {}", self.max_depth)?;
        writeln!(f, "  Infeasible children:   {}", self.infeasible_children)?;
        writeln!(f, "  Prunings (bound):      {}", self.prunings_bound)?;
        writeln!(f, "  Prunings (retroactive):{}", self.prunings_retroactive)?;
        writeln!(f, "  Certified nodes:       {}", self.certified_nodes)?;
        writeln!(f, "  Unresolved leaves:     {}", self.unresolved_leaves)?;
        writeln!(f, "  Bound violations:      {}", self.bound_violations)?;
        writeln!(f, "  Total time:            {:.2?}", self.time_total)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_created_nodes_track_depth() {
        let mut stats = BnbStatistics::default();
        stats.on_node_created(2);
        stats.on_node_created(1);
        assert_eq!(stats.nodes_created, 2);
        assert_eq!(stats.max_depth, 2);
    }

    #[test]
    fn test_display_lists_counters() {
        let mut stats = BnbStatistics::default();
        stats.on_pruning_retroactive(3);
        let text = stats.to_string();
        assert!(text.contains("Prunings (retroactive):3"));
    }
}
