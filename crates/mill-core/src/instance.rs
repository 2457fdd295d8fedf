//! Problem data for the leader/follower pricing game.

use crate::error::{MillError, MillResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The two competing pricing agents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    /// Commits to its prices first.
    Leader,
    /// Responds to the leader's prices.
    Follower,
}

impl Side {
    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Leader => "leader",
            Side::Follower => "follower",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Borrowed view of one facility.
#[derive(Debug, Clone, Copy)]
pub struct Facility<'a> {
    pub side: Side,
    pub index: usize,
    /// Cost to serve each client
    pub costs: &'a [i64],
    /// Highest price any client could still afford
    pub price_upper_bound: i64,
}

impl Facility<'_> {
    /// Total cost a client pays when served here at `price`.
    #[inline]
    pub fn total_cost(&self, client: usize, price: i64) -> i64 {
        self.costs[client] + price
    }
}

/// Immutable problem instance with derived price bounds.
///
/// Built once through [`Instance::new`], which validates dimensions and signs
/// and derives the per-facility price upper bounds. There is no way to mutate
/// an instance afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Instance {
    costs_leader: Vec<Vec<i64>>,
    costs_follower: Vec<Vec<i64>>,
    budgets: Vec<i64>,
    p_upper_bound: Vec<i64>,
    q_upper_bound: Vec<i64>,
}

impl Instance {
    /// Validate the raw data and derive the price bounds.
    ///
    /// `costs_leader[i][j]` is the cost for leader facility `i` to serve client
    /// `j`, likewise for the follower. The client count is `budgets.len()`.
    pub fn new(
        costs_leader: Vec<Vec<i64>>,
        costs_follower: Vec<Vec<i64>>,
        budgets: Vec<i64>,
    ) -> MillResult<Self> {
        let clients = budgets.len();

        if let Some((j, b)) = budgets.iter().enumerate().find(|(_, b)| **b < 0) {
            return Err(MillError::Validation(format!(
                "budget of client {} is negative ({})",
                j, b
            )));
        }
        validate_costs(Side::Leader, &costs_leader, clients)?;
        validate_costs(Side::Follower, &costs_follower, clients)?;

        let p_upper_bound = derive_upper_bounds(&costs_leader, &budgets);
        let q_upper_bound = derive_upper_bounds(&costs_follower, &budgets);

        Ok(Self {
            costs_leader,
            costs_follower,
            budgets,
            p_upper_bound,
            q_upper_bound,
        })
    }

    #[inline]
    pub fn leader_facility_count(&self) -> usize {
        self.costs_leader.len()
    }

    #[inline]
    pub fn follower_facility_count(&self) -> usize {
        self.costs_follower.len()
    }

    #[inline]
    pub fn facility_count(&self, side: Side) -> usize {
        self.costs(side).len()
    }

    #[inline]
    pub fn clients_count(&self) -> usize {
        self.budgets.len()
    }

    #[inline]
    pub fn budgets(&self) -> &[i64] {
        &self.budgets
    }

    #[inline]
    pub fn budget(&self, client: usize) -> i64 {
        self.budgets[client]
    }

    pub fn costs_leader(&self) -> &[Vec<i64>] {
        &self.costs_leader
    }

    pub fn costs_follower(&self) -> &[Vec<i64>] {
        &self.costs_follower
    }

    /// Cost matrix of one side, indexed `[facility][client]`.
    #[inline]
    pub fn costs(&self, side: Side) -> &[Vec<i64>] {
        match side {
            Side::Leader => &self.costs_leader,
            Side::Follower => &self.costs_follower,
        }
    }

    /// Leader price upper bounds.
    pub fn p_upper_bound(&self) -> &[i64] {
        &self.p_upper_bound
    }

    /// Follower price upper bounds.
    pub fn q_upper_bound(&self) -> &[i64] {
        &self.q_upper_bound
    }

    #[inline]
    pub fn upper_bounds(&self, side: Side) -> &[i64] {
        match side {
            Side::Leader => &self.p_upper_bound,
            Side::Follower => &self.q_upper_bound,
        }
    }

    pub fn facility(&self, side: Side, index: usize) -> Facility<'_> {
        Facility {
            side,
            index,
            costs: &self.costs(side)[index],
            price_upper_bound: self.upper_bounds(side)[index],
        }
    }

    pub fn facilities(&self, side: Side) -> impl Iterator<Item = Facility<'_>> + '_ {
        (0..self.facility_count(side)).map(move |i| self.facility(side, i))
    }

    /// Check that `prices` has one in-range entry per facility of `side`.
    pub fn check_prices(&self, side: Side, prices: &[i64]) -> MillResult<()> {
        let bounds = self.upper_bounds(side);
        if prices.len() != bounds.len() {
            return Err(MillError::Validation(format!(
                "{} price vector has {} entries, instance has {} {} facilities",
                side,
                prices.len(),
                bounds.len(),
                side
            )));
        }
        for (i, (&p, &ub)) in prices.iter().zip(bounds).enumerate() {
            if p < 0 {
                return Err(MillError::Validation(format!(
                    "{} price {} at facility {} is negative",
                    side, p, i
                )));
            }
            if p > ub {
                return Err(MillError::Validation(format!(
                    "{} price {} at facility {} exceeds its upper bound {}",
                    side, p, i, ub
                )));
            }
        }
        Ok(())
    }
}

fn validate_costs(side: Side, costs: &[Vec<i64>], clients: usize) -> MillResult<()> {
    for (i, row) in costs.iter().enumerate() {
        if row.len() != clients {
            return Err(MillError::Validation(format!(
                "{} facility {} has {} costs, expected one per client ({})",
                side,
                i,
                row.len(),
                clients
            )));
        }
        if let Some((j, c)) = row.iter().enumerate().find(|(_, c)| **c < 0) {
            return Err(MillError::Validation(format!(
                "{} facility {} has negative cost {} for client {}",
                side, i, c, j
            )));
        }
    }
    Ok(())
}

/// `max_j (budget_j - cost_ij)`, clipped at zero.
fn derive_upper_bounds(costs: &[Vec<i64>], budgets: &[i64]) -> Vec<i64> {
    costs
        .iter()
        .map(|row| {
            row.iter()
                .zip(budgets)
                .map(|(c, b)| b - c)
                .max()
                .unwrap_or(0)
                .max(0)
        })
        .collect()
}
