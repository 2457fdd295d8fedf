//! Branch and bound over client-to-facility assignments.
//!
//! Computes the follower's best response to fixed leader prices. The tree
//! decides clients in index order; every node pins a prefix of clients either
//! to one follower facility or to `Unserved`. Each node is evaluated in three
//! steps:
//!
//! 1. an integer feasibility solve yields a price vector realising the pinned
//!    prefix (no vector: the child is dropped);
//! 2. a light constrained VND from that vector gives the primal value, and the
//!    rounded relaxation prices are tried as a second candidate;
//! 3. the LP relaxation of the constrained model gives the upper bound.
//!
//! Nodes whose floored bound meets their primal value are certified. Open nodes
//! wait in a FIFO [`Frontier`] and are dropped as soon as the best known value
//! reaches their bound.

pub mod frontier;
pub mod monitor;
pub mod node;
pub mod stats;

pub use frontier::Frontier;
pub use monitor::{NoOpMonitor, PruneReason, RecordingMonitor, SearchMonitor};
pub use node::{SearchNode, BOUND_EPSILON};
pub use stats::BnbStatistics;

use crate::allocation::{constrained_follower_revenue, LeaderOffers};
use crate::budget::SearchBudget;
use crate::follower::{ExactFollower, FollowerResponse};
use crate::solver::MipSolver;
use crate::vnd::{ConstrainedFollowerObjective, ConstrainedResample, VndConfig, VndEngine};
use mill_core::{AssignmentConstraint, Instance, MillResult};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Branch and bound configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BnbConfig {
    /// Descent used for node primal values
    pub vnd: VndConfig,
    /// Limits on explored nodes and wall-clock time
    pub budget: SearchBudget,
    /// Allowed shortfall of a relaxation below its node's primal value
    pub bound_tolerance: f64,
}

impl Default for BnbConfig {
    fn default() -> Self {
        Self {
            vnd: VndConfig::light(),
            budget: SearchBudget::default(),
            bound_tolerance: 1e-6,
        }
    }
}

/// How a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BnbStatus {
    /// The incumbent is the follower's best response.
    Optimal,
    /// Best value found, but the budget ran out or some fully assigned region
    /// kept an open gap above it.
    Feasible,
    /// Nothing was evaluated.
    NoCertifiedOptimum,
}

/// Result of a branch and bound run.
#[derive(Debug, Clone)]
pub struct BnbOutcome {
    pub status: BnbStatus,
    pub incumbent: Option<FollowerResponse>,
    /// Highest bound left open when the run stopped
    pub open_bound: Option<i64>,
    pub statistics: BnbStatistics,
}

impl BnbOutcome {
    pub fn value(&self) -> Option<i64> {
        self.incumbent.as_ref().map(|r| r.revenue)
    }
}

/// Follower best-response enumerator.
pub struct BranchAndBound<'a> {
    instance: &'a Instance,
    solver: &'a dyn MipSolver,
    config: &'a BnbConfig,
}

impl<'a> BranchAndBound<'a> {
    pub fn new(instance: &'a Instance, solver: &'a dyn MipSolver, config: &'a BnbConfig) -> Self {
        Self {
            instance,
            solver,
            config,
        }
    }

    /// Best response to `leader_prices` without observation.
    pub fn solve(&self, leader_prices: &[i64], seed: u64) -> MillResult<BnbOutcome> {
        self.solve_with_monitor(leader_prices, seed, &mut NoOpMonitor)
    }

    pub fn solve_with_monitor(
        &self,
        leader_prices: &[i64],
        seed: u64,
        monitor: &mut dyn SearchMonitor,
    ) -> MillResult<BnbOutcome> {
        let clock = self.config.budget.start();
        let offers = LeaderOffers::new(self.instance, leader_prices);
        let mut run = Run {
            instance: self.instance,
            exact: ExactFollower::new(self.instance, self.solver),
            offers: &offers,
            config: self.config,
            rng: StdRng::seed_from_u64(seed),
            frontier: Frontier::new(),
            stats: BnbStatistics::default(),
            incumbent: None,
            best_primal: None,
            open_leaf_bound: None,
            next_id: 0,
        };

        if clock.exhausted(0) {
            run.stats.set_total_time(clock.elapsed());
            return Ok(run.finish(false, monitor));
        }

        run.stats.on_node_explored();
        run.consider(AssignmentConstraint::empty(), monitor)?;

        let mut budget_hit = false;
        while let Some(node) = run.frontier.pop() {
            if clock.exhausted(run.stats.nodes_explored as usize) {
                let open_bound = node.bound();
                run.frontier.push(node);
                debug!(open_bound, "branch and bound budget exhausted");
                budget_hit = true;
                break;
            }
            run.stats.on_node_explored();

            if node.constraint.is_complete(self.instance.clients_count()) {
                run.stats.on_unresolved_leaf();
                run.open_leaf_bound = run.open_leaf_bound.max(Some(node.bound()));
                debug!(
                    constraint = %node.constraint,
                    bound = node.bound(),
                    primal = node.primal_value,
                    "leaf gap left open"
                );
                continue;
            }

            for child in node
                .constraint
                .children(self.instance.follower_facility_count())
            {
                run.consider(child, monitor)?;
            }
        }

        run.stats.set_total_time(clock.elapsed());
        let outcome = run.finish(budget_hit, monitor);
        info!(
            status = ?outcome.status,
            value = ?outcome.value(),
            nodes = outcome.statistics.nodes_explored,
            "branch and bound finished"
        );
        Ok(outcome)
    }
}

/// Mutable state of one run.
struct Run<'r> {
    instance: &'r Instance,
    exact: ExactFollower<'r>,
    offers: &'r LeaderOffers,
    config: &'r BnbConfig,
    rng: StdRng,
    frontier: Frontier,
    stats: BnbStatistics,
    /// Best certified node
    incumbent: Option<SearchNode>,
    /// Node holding the best primal value seen anywhere
    best_primal: Option<SearchNode>,
    /// Highest bound among fully assigned nodes that stayed open
    open_leaf_bound: Option<i64>,
    next_id: u64,
}

impl Run<'_> {
    fn best_value(&self) -> Option<i64> {
        self.best_primal.as_ref().map(|n| n.primal_value)
    }

    /// Evaluate one region and file it as certified, open or pruned.
    fn consider(
        &mut self,
        constraint: AssignmentConstraint,
        monitor: &mut dyn SearchMonitor,
    ) -> MillResult<()> {
        if !constraint.is_empty() {
            self.stats.on_node_created(constraint.depth());
        }

        let Some(node) = self.evaluate(constraint.clone())? else {
            self.stats.on_infeasible();
            monitor.on_pruned(&constraint, PruneReason::Infeasible);
            return Ok(());
        };
        monitor.on_node_evaluated(&node);

        if node.upper_bound < node.primal_value as f64 - self.config.bound_tolerance {
            self.stats.on_bound_violation();
            warn!(
                constraint = %node.constraint,
                upper_bound = node.upper_bound,
                primal = node.primal_value,
                "relaxation below primal value"
            );
        }

        if self.best_value().map_or(true, |best| node.primal_value > best) {
            self.best_primal = Some(node.clone());
        }
        let best = self.best_value().unwrap_or(i64::MIN);

        if node.is_certified() {
            self.stats.on_certified();
            let improves = self
                .incumbent
                .as_ref()
                .map_or(true, |inc| node.primal_value > inc.primal_value);
            if improves {
                monitor.on_incumbent(&node);
                self.incumbent = Some(node);
            }
        } else if node.bound() > best {
            debug!(
                constraint = %node.constraint,
                bound = node.bound(),
                primal = node.primal_value,
                "node kept open"
            );
            self.frontier.push(node);
        } else {
            self.stats.on_pruning_bound();
            monitor.on_pruned(&node.constraint, PruneReason::Bound);
        }

        let dropped = self.frontier.prune_at_or_below(best);
        self.stats.on_pruning_retroactive(dropped.len());
        for node in &dropped {
            monitor.on_pruned(&node.constraint, PruneReason::Retroactive);
        }
        Ok(())
    }

    fn evaluate(&mut self, constraint: AssignmentConstraint) -> MillResult<Option<SearchNode>> {
        let Some(first) = self.exact.first_vector(self.offers, &constraint)? else {
            return Ok(None);
        };
        if constrained_follower_revenue(self.instance, self.offers, &constraint, &first).is_none() {
            debug!(constraint = %constraint, "feasibility vector failed the consistency check");
            return Ok(None);
        }
        let Some(relaxed) = self.exact.relaxation_bound(self.offers, &constraint)? else {
            return Ok(None);
        };

        let engine = VndEngine::new(
            &self.config.vnd,
            ConstrainedResample::new(self.instance, self.offers, &constraint),
            ConstrainedFollowerObjective::new(self.instance, self.offers, &constraint),
        );
        let descent = engine.run(first, &mut self.rng)?;

        let (mut primal_prices, mut primal_value) = (descent.prices, descent.value);
        if let Some(value) = constrained_follower_revenue(
            self.instance,
            self.offers,
            &constraint,
            &relaxed.rounded_prices,
        ) {
            if value > primal_value {
                primal_value = value;
                primal_prices = relaxed.rounded_prices;
            }
        }

        let id = self.next_id;
        self.next_id += 1;
        Ok(Some(SearchNode {
            id,
            constraint,
            upper_bound: relaxed.bound,
            primal_prices,
            primal_value,
        }))
    }

    fn finish(mut self, budget_hit: bool, monitor: &mut dyn SearchMonitor) -> BnbOutcome {
        // Every region outside the best primal node is certified or bounded
        // out, so that node is the best response once the frontier is empty.
        if let Some(best) = self.best_primal.take() {
            let promote = self
                .incumbent
                .as_ref()
                .map_or(true, |inc| best.primal_value > inc.primal_value);
            if promote {
                monitor.on_incumbent(&best);
                self.incumbent = Some(best);
            }
        }

        let open_bound = self.frontier.best_bound().max(self.open_leaf_bound);
        let status = match &self.incumbent {
            None => BnbStatus::NoCertifiedOptimum,
            Some(inc) => {
                let gap_open = open_bound.map_or(false, |b| b > inc.primal_value);
                if budget_hit || gap_open {
                    BnbStatus::Feasible
                } else {
                    BnbStatus::Optimal
                }
            }
        };

        BnbOutcome {
            status,
            incumbent: self.incumbent.map(|n| FollowerResponse {
                prices: n.primal_prices,
                revenue: n.primal_value,
            }),
            open_bound,
            statistics: self.stats,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::solver::GoodLpSolver;

    #[test]
    fn test_single_client_duopoly() {
        let instance = Instance::new(vec![vec![0]], vec![vec![0]], vec![10]).unwrap();
        let config = BnbConfig::default();
        let solver = GoodLpSolver;
        let outcome = BranchAndBound::new(&instance, &solver, &config)
            .solve(&[6], 1)
            .unwrap();

        assert_eq!(outcome.status, BnbStatus::Optimal);
        assert_eq!(outcome.value(), Some(5));
    }

    #[test]
    fn test_zero_budget_reports_no_optimum() {
        let instance = Instance::new(vec![vec![0]], vec![vec![0]], vec![10]).unwrap();
        let config = BnbConfig {
            budget: SearchBudget::unlimited().with_max_iterations(0),
            ..BnbConfig::default()
        };
        let solver = GoodLpSolver;
        let outcome = BranchAndBound::new(&instance, &solver, &config)
            .solve(&[6], 1)
            .unwrap();

        assert_eq!(outcome.status, BnbStatus::NoCertifiedOptimum);
        assert!(outcome.incumbent.is_none());
    }

    #[test]
    fn test_monitor_sees_every_evaluated_node() {
        let instance = Instance::new(
            vec![vec![0, 0]],
            vec![vec![0, 1], vec![1, 0]],
            vec![10, 10],
        )
        .unwrap();
        let config = BnbConfig::default();
        let solver = GoodLpSolver;
        let mut monitor = RecordingMonitor::default();
        let outcome = BranchAndBound::new(&instance, &solver, &config)
            .solve_with_monitor(&[7], 3, &mut monitor)
            .unwrap();

        assert!(!monitor.evaluated.is_empty());
        assert_eq!(monitor.evaluated[0].constraint, AssignmentConstraint::empty());
        assert_eq!(outcome.statistics.bound_violations, 0);
        assert_eq!(monitor.incumbents.last().copied(), outcome.value());
    }
}
