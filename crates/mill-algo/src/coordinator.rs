//! Bilevel search: leader descent with a full follower response per candidate.
//!
//! The leader runs [`VndEngine`] over its own price space. Scoring a leader
//! candidate means computing the follower's response to it through a
//! [`FollowerResponder`] and applying the allocation rule to both vectors.
//! Nothing is cached across leader vectors.

use crate::allocation::{follower_revenue, leader_revenue, LeaderOffers};
use crate::bnb::{BnbConfig, BnbStatus, BranchAndBound};
use crate::follower::{ExactFollower, FollowerResponse};
use crate::solver::MipSolver;
use crate::vnd::{
    Evaluation, FollowerObjective, Objective, StopReason, UniformResample, VndConfig, VndEngine,
};
use anyhow::anyhow;
use mill_core::{Instance, MillError, MillResult, PriceVector};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::{debug, info};

/// Seed used when none is configured.
pub const DEFAULT_SEED: u64 = 123123;

/// How the follower answers each leader candidate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FollowerStrategy {
    /// Heuristic descent over follower prices.
    #[default]
    Vnd,
    /// Exact MIP best response.
    Exact,
    /// Exact best response most favourable to the leader.
    Cooperative,
    /// Exact best response by assignment enumeration.
    #[serde(rename = "bnb", alias = "branch_and_bound", alias = "branch-and-bound")]
    BranchAndBound,
}

impl FollowerStrategy {
    pub fn from_str(input: &str) -> anyhow::Result<Self> {
        match input.to_ascii_lowercase().as_str() {
            "vnd" => Ok(FollowerStrategy::Vnd),
            "exact" => Ok(FollowerStrategy::Exact),
            "cooperative" => Ok(FollowerStrategy::Cooperative),
            "bnb" | "branch_and_bound" | "branch-and-bound" => {
                Ok(FollowerStrategy::BranchAndBound)
            }
            other => Err(anyhow!(
                "unknown follower strategy '{}'; supported values: {}",
                other,
                Self::available().join(", ")
            )),
        }
    }

    pub fn available() -> &'static [&'static str] {
        &["vnd", "exact", "cooperative", "bnb"]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FollowerStrategy::Vnd => "vnd",
            FollowerStrategy::Exact => "exact",
            FollowerStrategy::Cooperative => "cooperative",
            FollowerStrategy::BranchAndBound => "bnb",
        }
    }
}

/// Computes the follower's answer to one leader price vector.
///
/// `seed` seeds any randomised search the responder runs.
pub trait FollowerResponder: Sync {
    fn respond(&self, leader_prices: &[i64], seed: u64) -> MillResult<FollowerResponse>;

    fn name(&self) -> &str;
}

/// Follower VND from the canonical start.
pub struct VndResponder<'a> {
    instance: &'a Instance,
    config: &'a VndConfig,
}

impl<'a> VndResponder<'a> {
    pub fn new(instance: &'a Instance, config: &'a VndConfig) -> Self {
        Self { instance, config }
    }
}

impl FollowerResponder for VndResponder<'_> {
    fn respond(&self, leader_prices: &[i64], seed: u64) -> MillResult<FollowerResponse> {
        let offers = LeaderOffers::new(self.instance, leader_prices);
        let bounds = self.instance.q_upper_bound();
        let engine = VndEngine::new(
            self.config,
            UniformResample::new(bounds),
            FollowerObjective::new(self.instance, &offers),
        );
        let outcome = engine.run(
            PriceVector::canonical_start(bounds),
            &mut StdRng::seed_from_u64(seed),
        )?;
        Ok(FollowerResponse {
            prices: outcome.prices,
            revenue: outcome.value,
        })
    }

    fn name(&self) -> &str {
        "vnd"
    }
}

pub struct ExactResponder<'a> {
    exact: ExactFollower<'a>,
}

impl<'a> ExactResponder<'a> {
    pub fn new(instance: &'a Instance, solver: &'a dyn MipSolver) -> Self {
        Self {
            exact: ExactFollower::new(instance, solver),
        }
    }
}

impl FollowerResponder for ExactResponder<'_> {
    fn respond(&self, leader_prices: &[i64], _seed: u64) -> MillResult<FollowerResponse> {
        self.exact.best_response(leader_prices)
    }

    fn name(&self) -> &str {
        "exact"
    }
}

pub struct CooperativeResponder<'a> {
    exact: ExactFollower<'a>,
}

impl<'a> CooperativeResponder<'a> {
    pub fn new(instance: &'a Instance, solver: &'a dyn MipSolver) -> Self {
        Self {
            exact: ExactFollower::new(instance, solver),
        }
    }
}

impl FollowerResponder for CooperativeResponder<'_> {
    fn respond(&self, leader_prices: &[i64], _seed: u64) -> MillResult<FollowerResponse> {
        self.exact.cooperative_response(leader_prices)
    }

    fn name(&self) -> &str {
        "cooperative"
    }
}

pub struct BnbResponder<'a> {
    bnb: BranchAndBound<'a>,
}

impl<'a> BnbResponder<'a> {
    pub fn new(instance: &'a Instance, solver: &'a dyn MipSolver, config: &'a BnbConfig) -> Self {
        Self {
            bnb: BranchAndBound::new(instance, solver, config),
        }
    }
}

impl FollowerResponder for BnbResponder<'_> {
    fn respond(&self, leader_prices: &[i64], seed: u64) -> MillResult<FollowerResponse> {
        let outcome = self.bnb.solve(leader_prices, seed)?;
        if outcome.status == BnbStatus::Feasible {
            debug!(open_bound = ?outcome.open_bound, "follower response not proven optimal");
        }
        outcome.incumbent.ok_or_else(|| {
            MillError::Config("branch and bound budget too small to evaluate the root".into())
        })
    }

    fn name(&self) -> &str {
        "bnb"
    }
}

/// Responder for `strategy`, configured from the matching section of `config`.
pub fn build_responder<'a>(
    strategy: FollowerStrategy,
    instance: &'a Instance,
    solver: &'a dyn MipSolver,
    config: &'a CoordinatorConfig,
) -> Box<dyn FollowerResponder + 'a> {
    match strategy {
        FollowerStrategy::Vnd => Box::new(VndResponder::new(instance, &config.follower_vnd)),
        FollowerStrategy::Exact => Box::new(ExactResponder::new(instance, solver)),
        FollowerStrategy::Cooperative => Box::new(CooperativeResponder::new(instance, solver)),
        FollowerStrategy::BranchAndBound => {
            Box::new(BnbResponder::new(instance, solver, &config.bnb))
        }
    }
}

/// Leader revenue under the follower's response.
struct LeaderObjective<'a> {
    instance: &'a Instance,
    responder: &'a dyn FollowerResponder,
    follower_calls: AtomicUsize,
}

impl Objective for LeaderObjective<'_> {
    type Detail = FollowerResponse;

    fn evaluate(
        &self,
        prices: &PriceVector,
        seed: u64,
    ) -> MillResult<Option<Evaluation<FollowerResponse>>> {
        self.follower_calls.fetch_add(1, Ordering::Relaxed);
        let response = self.responder.respond(prices, seed)?;
        let value = leader_revenue(self.instance, prices, &response.prices);
        Ok(Some(Evaluation {
            value,
            detail: response,
        }))
    }
}

/// Coordinator configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoordinatorConfig {
    pub strategy: FollowerStrategy,
    /// Outer descent over leader prices
    pub leader_vnd: VndConfig,
    /// Follower descent for the `vnd` strategy
    pub follower_vnd: VndConfig,
    /// Enumerator settings for the `bnb` strategy
    pub bnb: BnbConfig,
    pub seed: u64,
    /// Re-solve the follower cooperatively at the final leader prices
    pub verify_exact: bool,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            strategy: FollowerStrategy::default(),
            leader_vnd: VndConfig::default(),
            follower_vnd: VndConfig::default(),
            bnb: BnbConfig::default(),
            seed: DEFAULT_SEED,
            verify_exact: false,
        }
    }
}

/// Exact follower re-solve against the final leader prices.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExactCheck {
    pub follower_prices: PriceVector,
    pub follower_revenue: i64,
    /// Leader revenue when the follower plays the exact response
    pub leader_revenue: i64,
    /// Exact minus heuristic follower revenue
    pub follower_gap: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BilevelSolution {
    pub leader_prices: PriceVector,
    pub follower_prices: PriceVector,
    pub leader_revenue: i64,
    pub follower_revenue: i64,
    /// Accepted leader moves
    pub iterations: usize,
    pub follower_evaluations: usize,
    pub stop_reason: StopReason,
    pub exact_check: Option<ExactCheck>,
    pub elapsed_secs: f64,
}

impl BilevelSolution {
    /// Leader revenue to report: the exact check when one was run.
    pub fn reported_revenue(&self) -> i64 {
        self.exact_check
            .as_ref()
            .map_or(self.leader_revenue, |c| c.leader_revenue)
    }
}

pub struct BilevelCoordinator<'a> {
    instance: &'a Instance,
    solver: &'a dyn MipSolver,
    config: &'a CoordinatorConfig,
}

impl<'a> BilevelCoordinator<'a> {
    pub fn new(
        instance: &'a Instance,
        solver: &'a dyn MipSolver,
        config: &'a CoordinatorConfig,
    ) -> Self {
        Self {
            instance,
            solver,
            config,
        }
    }

    pub fn solve(&self) -> MillResult<BilevelSolution> {
        let responder = build_responder(
            self.config.strategy,
            self.instance,
            self.solver,
            self.config,
        );
        let objective = LeaderObjective {
            instance: self.instance,
            responder: responder.as_ref(),
            follower_calls: AtomicUsize::new(0),
        };
        let bounds = self.instance.p_upper_bound();
        let engine = VndEngine::new(
            &self.config.leader_vnd,
            UniformResample::new(bounds),
            &objective,
        );

        info!(
            strategy = responder.name(),
            leaders = self.instance.leader_facility_count(),
            followers = self.instance.follower_facility_count(),
            clients = self.instance.clients_count(),
            "bilevel search started"
        );

        let mut rng = StdRng::seed_from_u64(self.config.seed);
        let outcome = engine.run(PriceVector::canonical_start(bounds), &mut rng)?;
        let follower = outcome.detail;
        let follower_revenue_value =
            follower_revenue(self.instance, &outcome.prices, &follower.prices);

        info!(
            leader_revenue = outcome.value,
            follower_revenue = follower_revenue_value,
            iterations = outcome.iterations,
            "bilevel search finished"
        );

        let exact_check = if self.config.verify_exact {
            Some(self.exact_check(&outcome.prices, follower_revenue_value)?)
        } else {
            None
        };

        Ok(BilevelSolution {
            leader_prices: outcome.prices,
            follower_prices: follower.prices,
            leader_revenue: outcome.value,
            follower_revenue: follower_revenue_value,
            iterations: outcome.iterations,
            follower_evaluations: objective.follower_calls.load(Ordering::Relaxed),
            stop_reason: outcome.stop_reason,
            exact_check,
            elapsed_secs: outcome.elapsed.as_secs_f64(),
        })
    }

    fn exact_check(&self, leader_prices: &[i64], heuristic_revenue: i64) -> MillResult<ExactCheck> {
        let response =
            ExactFollower::new(self.instance, self.solver).cooperative_response(leader_prices)?;
        let leader = leader_revenue(self.instance, leader_prices, &response.prices);
        info!(
            exact_follower_revenue = response.revenue,
            leader_revenue = leader,
            "exact follower check"
        );
        Ok(ExactCheck {
            follower_gap: response.revenue - heuristic_revenue,
            follower_revenue: response.revenue,
            follower_prices: response.prices,
            leader_revenue: leader,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::solver::GoodLpSolver;

    fn duopoly() -> Instance {
        Instance::new(vec![vec![0, 0]], vec![vec![0, 0]], vec![10, 10]).unwrap()
    }

    #[test]
    fn test_strategy_parsing() {
        assert_eq!(
            FollowerStrategy::from_str("BNB").unwrap(),
            FollowerStrategy::BranchAndBound
        );
        assert!(FollowerStrategy::from_str("greedy").is_err());
        for name in FollowerStrategy::available() {
            assert_eq!(FollowerStrategy::from_str(name).unwrap().as_str(), *name);
        }
    }

    #[test]
    fn test_strategy_serde_names_match_cli_names() {
        let json = serde_json::to_string(&FollowerStrategy::BranchAndBound).unwrap();
        assert_eq!(json, "\"bnb\"");
        for name in ["bnb", "branch_and_bound", "branch-and-bound"] {
            let parsed: FollowerStrategy = serde_json::from_str(&format!("\"{}\"", name)).unwrap();
            assert_eq!(parsed, FollowerStrategy::BranchAndBound);
            assert_eq!(FollowerStrategy::from_str(name).unwrap(), FollowerStrategy::BranchAndBound);
        }
    }

    #[test]
    fn test_built_responders_report_their_strategy() {
        let instance = duopoly();
        let solver = GoodLpSolver;
        let config = CoordinatorConfig::default();
        for name in FollowerStrategy::available() {
            let strategy = FollowerStrategy::from_str(name).unwrap();
            let responder = build_responder(strategy, &instance, &solver, &config);
            assert_eq!(responder.name(), *name);
        }
    }

    #[test]
    fn test_follower_undercuts_canonical_leader() {
        let instance = duopoly();
        let solver = GoodLpSolver;
        let responder = ExactResponder::new(&instance, &solver);
        // canonical leader price is 5
        let response = responder.respond(&[5], 0).unwrap();
        assert_eq!(response.revenue, 8);
        assert_eq!(leader_revenue(&instance, &[5], &response.prices), 0);
    }

    #[test]
    fn test_cooperative_strategy_finds_leader_optimum() {
        let instance = duopoly();
        let solver = GoodLpSolver;
        let config = CoordinatorConfig {
            strategy: FollowerStrategy::Cooperative,
            ..CoordinatorConfig::default()
        };
        let solution = BilevelCoordinator::new(&instance, &solver, &config)
            .solve()
            .unwrap();

        assert_eq!(solution.leader_prices.as_slice(), &[1]);
        assert_eq!(solution.leader_revenue, 2);
        assert_eq!(solution.follower_revenue, 0);
        assert_eq!(solution.stop_reason, StopReason::LocalOptimum);
    }

    #[test]
    fn test_solution_serializes() {
        let instance = duopoly();
        let solver = GoodLpSolver;
        let config = CoordinatorConfig {
            leader_vnd: VndConfig::light(),
            follower_vnd: VndConfig::light(),
            verify_exact: true,
            ..CoordinatorConfig::default()
        };
        let solution = BilevelCoordinator::new(&instance, &solver, &config)
            .solve()
            .unwrap();
        let check = solution.exact_check.as_ref().unwrap();
        assert_eq!(check.leader_revenue, solution.reported_revenue());

        let json = serde_json::to_string(&solution).unwrap();
        assert!(json.contains("\"leader_prices\""));
        assert!(json.contains("\"stop_reason\""));
    }
}
