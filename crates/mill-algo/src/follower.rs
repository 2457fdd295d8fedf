//! Exact follower responses through a MIP backend.

use crate::allocation::{
    constrained_follower_revenue, follower_revenue_against, leader_revenue, LeaderOffers,
};
use crate::model::{feasibility_model, FollowerFormulation, ModelVariant};
use crate::solver::{MipSolver, SolveStatus};
use mill_core::{AssignmentConstraint, Instance, MillError, MillResult, PriceVector};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Follower prices and the revenue they earn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FollowerResponse {
    pub prices: PriceVector,
    pub revenue: i64,
}

/// LP relaxation value of a constrained follower model.
#[derive(Debug, Clone, PartialEq)]
pub struct RelaxedBound {
    pub bound: f64,
    /// Relaxation prices rounded to the nearest integer
    pub rounded_prices: PriceVector,
}

/// Solves follower subproblems exactly against one instance.
#[derive(Clone, Copy)]
pub struct ExactFollower<'a> {
    instance: &'a Instance,
    solver: &'a dyn MipSolver,
}

impl<'a> ExactFollower<'a> {
    pub fn new(instance: &'a Instance, solver: &'a dyn MipSolver) -> Self {
        Self { instance, solver }
    }

    pub fn instance(&self) -> &'a Instance {
        self.instance
    }

    /// Revenue-maximising follower prices against `leader_prices`.
    pub fn best_response(&self, leader_prices: &[i64]) -> MillResult<FollowerResponse> {
        let offers = LeaderOffers::new(self.instance, leader_prices);
        self.best_response_against(&offers)
    }

    pub fn best_response_against(&self, offers: &LeaderOffers) -> MillResult<FollowerResponse> {
        let built = FollowerFormulation::new(self.instance, offers)
            .build(ModelVariant::Exact, &AssignmentConstraint::empty());

        match self.solver.solve(&built.model)? {
            SolveStatus::Optimal { objective, values } => {
                let prices = PriceVector::new(built.extract_prices(&values));
                let revenue = follower_revenue_against(self.instance, offers, &prices);
                debug!(objective, revenue, "exact follower response");
                Ok(FollowerResponse { prices, revenue })
            }
            // all prices at zero with nobody served is always feasible
            SolveStatus::Infeasible => Err(MillError::Solver(
                "follower model reported infeasible".to_string(),
            )),
        }
    }

    /// Best response that, among all revenue-optimal follower responses,
    /// leaves the leader the most revenue.
    pub fn cooperative_response(&self, leader_prices: &[i64]) -> MillResult<FollowerResponse> {
        let offers = LeaderOffers::new(self.instance, leader_prices);
        let exact = self.best_response_against(&offers)?;

        let built = FollowerFormulation::new(self.instance, &offers).build(
            ModelVariant::Cooperative {
                follower_target: exact.revenue,
            },
            &AssignmentConstraint::empty(),
        );

        let SolveStatus::Optimal { values, .. } = self.solver.solve(&built.model)? else {
            debug!("cooperative model infeasible, keeping plain best response");
            return Ok(exact);
        };

        let prices = PriceVector::new(built.extract_prices(&values));
        let revenue = follower_revenue_against(self.instance, &offers, &prices);
        if revenue < exact.revenue {
            return Ok(exact);
        }

        // rounding may have helped the follower; pick the leader-friendlier one
        let cooperative = FollowerResponse { prices, revenue };
        let keep_exact = revenue == exact.revenue
            && leader_revenue(self.instance, leader_prices, &exact.prices)
                > leader_revenue(self.instance, leader_prices, &cooperative.prices);
        Ok(if keep_exact { exact } else { cooperative })
    }

    /// Exact optimum of the follower under a partial assignment, `None` when
    /// no price vector realises it.
    pub fn constrained_optimum(
        &self,
        offers: &LeaderOffers,
        constraint: &AssignmentConstraint,
    ) -> MillResult<Option<FollowerResponse>> {
        let built =
            FollowerFormulation::new(self.instance, offers).build(ModelVariant::Exact, constraint);

        match self.solver.solve(&built.model)? {
            SolveStatus::Optimal { objective, values } => {
                let prices = PriceVector::new(built.extract_prices(&values));
                let revenue =
                    constrained_follower_revenue(self.instance, offers, constraint, &prices)
                        .unwrap_or_else(|| objective.round() as i64);
                Ok(Some(FollowerResponse { prices, revenue }))
            }
            SolveStatus::Infeasible => Ok(None),
        }
    }

    /// LP relaxation of the constrained model.
    pub fn relaxation_bound(
        &self,
        offers: &LeaderOffers,
        constraint: &AssignmentConstraint,
    ) -> MillResult<Option<RelaxedBound>> {
        let built = FollowerFormulation::new(self.instance, offers)
            .build(ModelVariant::Relaxation, constraint);

        match self.solver.solve(&built.model)? {
            SolveStatus::Optimal { objective, values } => Ok(Some(RelaxedBound {
                bound: objective,
                rounded_prices: PriceVector::new(built.extract_prices(&values)),
            })),
            SolveStatus::Infeasible => Ok(None),
        }
    }

    /// Some follower price vector consistent with the pinned clients of
    /// `constraint`, or `None` when none exists.
    pub fn first_vector(
        &self,
        offers: &LeaderOffers,
        constraint: &AssignmentConstraint,
    ) -> MillResult<Option<PriceVector>> {
        let (model, prices) = feasibility_model(self.instance, offers, constraint);
        match self.solver.solve(&model)? {
            SolveStatus::Optimal { values, .. } => Ok(Some(
                prices
                    .iter()
                    .map(|q| values[q.index()].round() as i64)
                    .collect(),
            )),
            SolveStatus::Infeasible => Ok(None),
        }
    }
}
