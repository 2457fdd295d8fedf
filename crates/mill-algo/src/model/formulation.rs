//! Follower best-response formulation.
//!
//! For fixed leader prices the follower problem is bilinear (revenue is price
//! times patronage). It is linearised with assignment binaries `x_ij` and
//! revenue variables `z_ij = q_i · x_ij` through [`price_link`]:
//!
//! ```text
//! max  Σ z_ij
//! s.t. Σ_i (b_j - c_ij) x_ij - Σ_i z_ij >= 0           budget
//!      q_k + c_kj - Σ_i (c_ij x_ij + z_ij) >= 0  ∀k     cheapest facility
//!      Σ_i x_ij <= 1                                    one facility
//!      (c_ij + 1) x_ij + z_ij <= L_j                    beat the leader
//!      0 <= q_i <= q̄_i integer, x_ij binary, z_ij >= 0
//! ```
//!
//! `L_j` is the leader's best total cost at client `j`; clients the leader
//! cannot serve have no such row. Integer data makes `+ 1` a strict
//! undercut.

use super::fragment::price_link;
use super::linear::{LinearModel, Sense, VarId, VarKind};
use crate::allocation::LeaderOffers;
use mill_core::{Assignment, AssignmentConstraint, Instance};
use serde::{Deserialize, Serialize};

/// Which model to build from the shared formulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "variant")]
pub enum ModelVariant {
    /// Integral best response.
    Exact,
    /// Every variable continuous; an upper bound on `Exact`.
    Relaxation,
    /// Among responses earning at least `follower_target`, the one leaving
    /// the leader the most revenue.
    Cooperative { follower_target: i64 },
}

/// A built model plus handles to its structural variables.
#[derive(Debug, Clone)]
pub struct FollowerModel {
    pub model: LinearModel,
    pub variant: ModelVariant,
    /// `q[i]`
    pub prices: Vec<VarId>,
    /// `x[i][j]`
    pub assign: Vec<Vec<VarId>>,
    /// `z[i][j]`
    pub revenue: Vec<Vec<VarId>>,
    /// `y[j]`, cooperative variant only, `None` where the leader has no offer
    pub capture: Vec<Option<VarId>>,
}

impl FollowerModel {
    /// Follower prices from a solution vector, rounded to integers and clamped
    /// to the variable bounds.
    pub fn extract_prices(&self, values: &[f64]) -> Vec<i64> {
        self.prices
            .iter()
            .map(|&q| {
                let var = self.model.variable(q);
                let upper = var.upper.unwrap_or(f64::MAX);
                values[q.index()].round().clamp(var.lower, upper) as i64
            })
            .collect()
    }

    /// Follower revenue `Σ z` at a solution vector.
    pub fn follower_value(&self, values: &[f64]) -> f64 {
        self.revenue
            .iter()
            .flatten()
            .map(|z| values[z.index()])
            .sum()
    }
}

/// Builder for every variant of the follower model against one leader price
/// vector.
pub struct FollowerFormulation<'a> {
    instance: &'a Instance,
    offers: &'a LeaderOffers,
}

impl<'a> FollowerFormulation<'a> {
    pub fn new(instance: &'a Instance, offers: &'a LeaderOffers) -> Self {
        Self { instance, offers }
    }

    pub fn build(&self, variant: ModelVariant, constraint: &AssignmentConstraint) -> FollowerModel {
        let instance = self.instance;
        let costs = instance.costs_follower();
        let facilities = instance.follower_facility_count();
        let clients = instance.clients_count();
        let bounds = instance.q_upper_bound();

        let mut model = LinearModel::new(Sense::Maximise);

        let prices: Vec<VarId> = (0..facilities)
            .map(|i| model.add_var(format!("q_{i}"), VarKind::Integer, 0.0, Some(bounds[i] as f64)))
            .collect();
        let assign: Vec<Vec<VarId>> = (0..facilities)
            .map(|i| {
                (0..clients)
                    .map(|j| model.add_var(format!("x_{i}_{j}"), VarKind::Binary, 0.0, None))
                    .collect()
            })
            .collect();
        let revenue: Vec<Vec<VarId>> = (0..facilities)
            .map(|i| {
                (0..clients)
                    .map(|j| model.add_var(format!("z_{i}_{j}"), VarKind::Continuous, 0.0, None))
                    .collect()
            })
            .collect();

        for i in 0..facilities {
            for j in 0..clients {
                price_link(
                    &mut model,
                    &format!("{i}_{j}"),
                    prices[i],
                    assign[i][j],
                    revenue[i][j],
                    bounds[i] as f64,
                );
            }
        }

        for j in 0..clients {
            let budget = instance.budget(j);

            let mut terms = Vec::with_capacity(2 * facilities);
            for i in 0..facilities {
                terms.push((assign[i][j], (budget - costs[i][j]) as f64));
                terms.push((revenue[i][j], -1.0));
            }
            model.add_ge(format!("budget_{j}"), terms, 0.0);

            for k in 0..facilities {
                let mut terms = Vec::with_capacity(2 * facilities + 1);
                terms.push((prices[k], 1.0));
                for i in 0..facilities {
                    terms.push((assign[i][j], -(costs[i][j] as f64)));
                    terms.push((revenue[i][j], -1.0));
                }
                model.add_ge(format!("cheapest_{k}_{j}"), terms, -(costs[k][j] as f64));
            }

            let one: Vec<_> = (0..facilities).map(|i| (assign[i][j], 1.0)).collect();
            model.add_le(format!("one_{j}"), one, 1.0);

            if let Some(threshold) = self.offers.threshold(j) {
                for i in 0..facilities {
                    model.add_le(
                        format!("beat_{i}_{j}"),
                        vec![(assign[i][j], (costs[i][j] + 1) as f64), (revenue[i][j], 1.0)],
                        threshold as f64,
                    );
                }
            }
        }

        for (j, decision) in constraint.iter() {
            match decision {
                Assignment::Facility(k) => {
                    model.add_eq(format!("fix_{k}_{j}"), vec![(assign[k][j], 1.0)], 1.0);
                }
                Assignment::Unserved => {
                    for i in 0..facilities {
                        model.add_eq(format!("drop_{i}_{j}"), vec![(assign[i][j], 1.0)], 0.0);
                    }
                }
            }
        }

        let all_revenue: Vec<(VarId, f64)> =
            revenue.iter().flatten().map(|&z| (z, 1.0)).collect();
        let mut capture = vec![None; clients];

        match variant {
            ModelVariant::Exact => {
                model.set_objective(Sense::Maximise, all_revenue);
            }
            ModelVariant::Relaxation => {
                model.set_objective(Sense::Maximise, all_revenue);
                model.relax();
            }
            ModelVariant::Cooperative { follower_target } => {
                let mut objective = Vec::new();
                for j in 0..clients {
                    let Some(offer) = self.offers.get(j) else {
                        continue;
                    };
                    let y = model.add_var(format!("y_{j}"), VarKind::Binary, 0.0, None);
                    capture[j] = Some(y);
                    objective.push((y, offer.price as f64));

                    let mut terms = vec![(y, 1.0)];
                    terms.extend((0..facilities).map(|i| (assign[i][j], 1.0)));
                    model.add_le(format!("capture_{j}"), terms, 1.0);

                    // every follower facility must price itself above L_j
                    for i in 0..facilities {
                        let gap = offer.total_cost + 1 - costs[i][j];
                        if gap > 0 {
                            model.add_ge(
                                format!("cede_{i}_{j}"),
                                vec![(prices[i], 1.0), (y, -(gap as f64))],
                                0.0,
                            );
                        }
                    }
                }
                model.add_ge("target", all_revenue, follower_target as f64 - 0.5);
                model.set_objective(Sense::Maximise, objective);
            }
        }

        FollowerModel {
            model,
            variant,
            prices,
            assign,
            revenue,
            capture,
        }
    }
}

/// Integer feasibility model for the pinned part of a constraint.
///
/// Any solution is a follower price vector consistent with every
/// `client → facility` decision; the objective is empty.
pub fn feasibility_model(
    instance: &Instance,
    offers: &LeaderOffers,
    constraint: &AssignmentConstraint,
) -> (LinearModel, Vec<VarId>) {
    let costs = instance.costs_follower();
    let bounds = instance.q_upper_bound();
    let mut model = LinearModel::new(Sense::Maximise);

    let prices: Vec<VarId> = bounds
        .iter()
        .enumerate()
        .map(|(i, &ub)| model.add_var(format!("q_{i}"), VarKind::Integer, 0.0, Some(ub as f64)))
        .collect();

    for (j, k) in constraint.assigned() {
        let own = costs[k][j];
        model.add_le(
            format!("budget_{k}_{j}"),
            vec![(prices[k], 1.0)],
            (instance.budget(j) - own) as f64,
        );
        if let Some(threshold) = offers.threshold(j) {
            model.add_le(
                format!("beat_{k}_{j}"),
                vec![(prices[k], 1.0)],
                (threshold - 1 - own) as f64,
            );
        }
        for (i, row) in costs.iter().enumerate() {
            if i != k {
                model.add_le(
                    format!("cheapest_{k}_{i}_{j}"),
                    vec![(prices[k], 1.0), (prices[i], -1.0)],
                    (row[j] - own) as f64,
                );
            }
        }
    }

    (model, prices)
}
