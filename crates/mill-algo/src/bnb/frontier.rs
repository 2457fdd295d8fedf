use super::node::SearchNode;
use std::collections::{BTreeSet, HashMap, VecDeque};

/// Open nodes, visited first-in first-out.
///
/// A bound-ordered index sits next to the queue so that every node whose
/// bound falls to or below the best known value can be dropped at once.
#[derive(Debug, Default)]
pub struct Frontier {
    queue: VecDeque<u64>,
    by_bound: BTreeSet<(i64, u64)>,
    nodes: HashMap<u64, SearchNode>,
}

impl Frontier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, node: SearchNode) {
        self.queue.push_back(node.id);
        self.by_bound.insert((node.bound(), node.id));
        self.nodes.insert(node.id, node);
    }

    /// Oldest node still open.
    pub fn pop(&mut self) -> Option<SearchNode> {
        while let Some(id) = self.queue.pop_front() {
            if let Some(node) = self.nodes.remove(&id) {
                self.by_bound.remove(&(node.bound(), id));
                return Some(node);
            }
        }
        None
    }

    /// Remove and return every node with `bound <= value`.
    pub fn prune_at_or_below(&mut self, value: i64) -> Vec<SearchNode> {
        let keep = self.by_bound.split_off(&(value.saturating_add(1), 0));
        let dropped = std::mem::replace(&mut self.by_bound, keep);
        dropped
            .into_iter()
            .filter_map(|(_, id)| self.nodes.remove(&id))
            .collect()
    }

    /// Highest bound among open nodes.
    pub fn best_bound(&self) -> Option<i64> {
        self.by_bound.last().map(|(b, _)| *b)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mill_core::{AssignmentConstraint, PriceVector};

    fn node(id: u64, upper_bound: f64) -> SearchNode {
        SearchNode {
            id,
            constraint: AssignmentConstraint::empty(),
            upper_bound,
            primal_prices: PriceVector::default(),
            primal_value: 0,
        }
    }

    #[test]
    fn test_pops_in_insertion_order() {
        let mut frontier = Frontier::new();
        frontier.push(node(1, 9.0));
        frontier.push(node(2, 4.0));
        frontier.push(node(3, 12.0));
        assert_eq!(frontier.best_bound(), Some(12));
        assert_eq!(frontier.pop().map(|n| n.id), Some(1));
        assert_eq!(frontier.pop().map(|n| n.id), Some(2));
        assert_eq!(frontier.len(), 1);
    }

    #[test]
    fn test_retroactive_prune_skips_dropped_ids() {
        let mut frontier = Frontier::new();
        frontier.push(node(1, 5.0));
        frontier.push(node(2, 8.0));
        frontier.push(node(3, 6.0));

        let dropped = frontier.prune_at_or_below(6);
        let mut ids: Vec<u64> = dropped.iter().map(|n| n.id).collect();
        ids.sort_unstable();
        assert_eq!(ids, vec![1, 3]);

        assert_eq!(frontier.pop().map(|n| n.id), Some(2));
        assert!(frontier.pop().is_none());
        assert!(frontier.is_empty());
        assert_eq!(frontier.best_bound(), None);
    }
}
