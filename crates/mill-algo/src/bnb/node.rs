use mill_core::{AssignmentConstraint, PriceVector};
use serde::Serialize;

/// Slack added before flooring a relaxation value. Objectives are integral,
/// so `floor(ub + ε)` is still a valid bound.
pub const BOUND_EPSILON: f64 = 1e-6;

/// One evaluated region of the assignment tree.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchNode {
    pub id: u64,
    pub constraint: AssignmentConstraint,
    /// LP relaxation value
    pub upper_bound: f64,
    /// Best consistent follower prices found inside the region
    pub primal_prices: PriceVector,
    pub primal_value: i64,
}

impl SearchNode {
    /// Integral upper bound on any value reachable inside this region.
    #[inline]
    pub fn bound(&self) -> i64 {
        (self.upper_bound + BOUND_EPSILON).floor() as i64
    }

    /// Gap closed: the primal value is optimal for this region.
    #[inline]
    pub fn is_certified(&self) -> bool {
        self.bound() <= self.primal_value
    }

    #[inline]
    pub fn depth(&self) -> usize {
        self.constraint.depth()
    }
}
