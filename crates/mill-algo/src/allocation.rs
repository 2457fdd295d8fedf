//! Client allocation rule.
//!
//! Every client picks the affordable facility with the lowest total cost
//! (fixed cost plus posted price). The two sides compete on their best offers:
//!
//! - the strictly cheaper side captures the client and earns the price posted
//!   at its winning facility;
//! - an exact tie between the sides leaves the client contested, counted for
//!   neither side;
//! - within one side, equal total costs are broken toward the highest price,
//!   then the earliest facility index.
//!
//! The constrained evaluation at the bottom of this module scores follower
//! prices against a partial client assignment and is what branch and bound
//! optimises inside each node.

use mill_core::{Assignment, AssignmentConstraint, Instance, Side};
use serde::{Deserialize, Serialize};

/// Cheapest affordable offer of one side to one client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Offer {
    pub facility: usize,
    /// Fixed cost plus price
    pub total_cost: i64,
    pub price: i64,
}

/// Who ends up serving a client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "patron", rename_all = "snake_case")]
pub enum Patron {
    Leader { facility: usize, price: i64 },
    Follower { facility: usize, price: i64 },
    /// Both sides offer the same total cost.
    Contested,
    /// Nothing is affordable.
    Unserved,
}

impl Patron {
    /// Revenue this client brings to `side`.
    pub fn revenue_for(&self, side: Side) -> i64 {
        match (self, side) {
            (Patron::Leader { price, .. }, Side::Leader) => *price,
            (Patron::Follower { price, .. }, Side::Follower) => *price,
            _ => 0,
        }
    }
}

/// Best offer of the facilities described by `costs` (indexed
/// `[facility][client]`) to `client`.
pub fn best_offer(costs: &[Vec<i64>], prices: &[i64], budget: i64, client: usize) -> Option<Offer> {
    let mut best: Option<Offer> = None;
    for (facility, (row, &price)) in costs.iter().zip(prices).enumerate() {
        let total_cost = row[client] + price;
        if total_cost > budget {
            continue;
        }
        let better = match best {
            None => true,
            Some(b) => total_cost < b.total_cost || (total_cost == b.total_cost && price > b.price),
        };
        if better {
            best = Some(Offer {
                facility,
                total_cost,
                price,
            });
        }
    }
    best
}

/// Decide the patron of a client from both sides' best offers.
pub fn patron(leader: Option<Offer>, follower: Option<Offer>) -> Patron {
    match (leader, follower) {
        (None, None) => Patron::Unserved,
        (Some(l), None) => Patron::Leader {
            facility: l.facility,
            price: l.price,
        },
        (None, Some(f)) => Patron::Follower {
            facility: f.facility,
            price: f.price,
        },
        (Some(l), Some(f)) => {
            if l.total_cost < f.total_cost {
                Patron::Leader {
                    facility: l.facility,
                    price: l.price,
                }
            } else if f.total_cost < l.total_cost {
                Patron::Follower {
                    facility: f.facility,
                    price: f.price,
                }
            } else {
                Patron::Contested
            }
        }
    }
}

/// Leader best offers per client for one fixed leader price vector.
///
/// Follower searches evaluate thousands of candidate vectors against the same
/// leader prices, so the leader side is computed once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeaderOffers {
    offers: Vec<Option<Offer>>,
}

impl LeaderOffers {
    pub fn new(instance: &Instance, leader_prices: &[i64]) -> Self {
        let offers = (0..instance.clients_count())
            .map(|j| {
                best_offer(
                    instance.costs_leader(),
                    leader_prices,
                    instance.budget(j),
                    j,
                )
            })
            .collect();
        Self { offers }
    }

    #[inline]
    pub fn get(&self, client: usize) -> Option<Offer> {
        self.offers[client]
    }

    /// Total cost the follower must strictly undercut at `client`.
    #[inline]
    pub fn threshold(&self, client: usize) -> Option<i64> {
        self.offers[client].map(|o| o.total_cost)
    }

    pub fn len(&self) -> usize {
        self.offers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.offers.is_empty()
    }
}

/// Patron of every client.
pub fn allocate(
    instance: &Instance,
    leader_prices: &[i64],
    follower_prices: &[i64],
) -> Vec<Patron> {
    let offers = LeaderOffers::new(instance, leader_prices);
    allocate_against(instance, &offers, follower_prices)
}

/// Patron of every client against precomputed leader offers.
pub fn allocate_against(
    instance: &Instance,
    offers: &LeaderOffers,
    follower_prices: &[i64],
) -> Vec<Patron> {
    (0..instance.clients_count())
        .map(|j| {
            let follower = best_offer(
                instance.costs_follower(),
                follower_prices,
                instance.budget(j),
                j,
            );
            patron(offers.get(j), follower)
        })
        .collect()
}

/// Revenue of `side` under the given prices.
pub fn revenue(
    side: Side,
    instance: &Instance,
    leader_prices: &[i64],
    follower_prices: &[i64],
) -> i64 {
    allocate(instance, leader_prices, follower_prices)
        .iter()
        .map(|p| p.revenue_for(side))
        .sum()
}

pub fn leader_revenue(instance: &Instance, leader_prices: &[i64], follower_prices: &[i64]) -> i64 {
    revenue(Side::Leader, instance, leader_prices, follower_prices)
}

pub fn follower_revenue(
    instance: &Instance,
    leader_prices: &[i64],
    follower_prices: &[i64],
) -> i64 {
    revenue(Side::Follower, instance, leader_prices, follower_prices)
}

/// Follower revenue against precomputed leader offers.
pub fn follower_revenue_against(
    instance: &Instance,
    offers: &LeaderOffers,
    follower_prices: &[i64],
) -> i64 {
    (0..instance.clients_count())
        .map(|j| {
            let follower = best_offer(
                instance.costs_follower(),
                follower_prices,
                instance.budget(j),
                j,
            );
            patron(offers.get(j), follower).revenue_for(Side::Follower)
        })
        .sum()
}

/// Admissible interval for follower price `facility` when every other price
/// in `prices` is held fixed.
///
/// Each client pinned to `facility` caps the price (budget, strict undercut of
/// the leader, no dearer than any other follower facility). Each client pinned
/// elsewhere floors it, so `facility` never undercuts the assigned one.
/// Returns `None` when the interval is empty.
pub fn constraint_bounds(
    instance: &Instance,
    offers: &LeaderOffers,
    constraint: &AssignmentConstraint,
    prices: &[i64],
    facility: usize,
) -> Option<(i64, i64)> {
    let costs = instance.costs_follower();
    let mut lo = 0;
    let mut hi = instance.q_upper_bound()[facility];

    for (j, k) in constraint.assigned() {
        let own = costs[facility][j];
        if k == facility {
            hi = hi.min(instance.budget(j) - own);
            if let Some(threshold) = offers.threshold(j) {
                hi = hi.min(threshold - 1 - own);
            }
            for (i, row) in costs.iter().enumerate() {
                if i != facility {
                    hi = hi.min(row[j] + prices[i] - own);
                }
            }
        } else {
            lo = lo.max(costs[k][j] + prices[k] - own);
        }
    }

    (lo <= hi).then_some((lo, hi))
}

/// Whether `prices` realise every pinned assignment of `constraint`.
pub fn is_consistent(
    instance: &Instance,
    offers: &LeaderOffers,
    constraint: &AssignmentConstraint,
    prices: &[i64],
) -> bool {
    let costs = instance.costs_follower();
    let in_range = prices
        .iter()
        .zip(instance.q_upper_bound())
        .all(|(&q, &ub)| (0..=ub).contains(&q));
    if !in_range {
        return false;
    }

    constraint.assigned().all(|(j, k)| {
        let total = costs[k][j] + prices[k];
        total <= instance.budget(j)
            && offers.threshold(j).map_or(true, |l| total < l)
            && costs
                .iter()
                .zip(prices)
                .all(|(row, &q)| total <= row[j] + q)
    })
}

/// Follower revenue under a partial assignment.
///
/// Clients pinned to a facility pay its price, clients marked `Unserved`
/// contribute nothing, undecided clients follow the allocation rule. `None`
/// when `prices` violate the constraint.
pub fn constrained_follower_revenue(
    instance: &Instance,
    offers: &LeaderOffers,
    constraint: &AssignmentConstraint,
    prices: &[i64],
) -> Option<i64> {
    if !is_consistent(instance, offers, constraint, prices) {
        return None;
    }

    let revenue = (0..instance.clients_count())
        .map(|j| match constraint.get(j) {
            Some(Assignment::Facility(k)) => prices[k],
            Some(Assignment::Unserved) => 0,
            None => {
                let follower = best_offer(
                    instance.costs_follower(),
                    prices,
                    instance.budget(j),
                    j,
                );
                patron(offers.get(j), follower).revenue_for(Side::Follower)
            }
        })
        .sum();
    Some(revenue)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn duopoly() -> Instance {
        Instance::new(vec![vec![0, 0]], vec![vec![0, 0]], vec![10, 10]).unwrap()
    }

    #[test]
    fn test_cheaper_side_wins() {
        let instance = duopoly();
        assert_eq!(leader_revenue(&instance, &[3], &[5]), 6);
        assert_eq!(follower_revenue(&instance, &[3], &[5]), 0);
        assert_eq!(follower_revenue(&instance, &[3], &[2]), 4);
    }

    #[test]
    fn test_tie_between_sides_counts_for_neither() {
        let instance = duopoly();
        assert_eq!(leader_revenue(&instance, &[4], &[4]), 0);
        assert_eq!(follower_revenue(&instance, &[4], &[4]), 0);
        assert!(allocate(&instance, &[4], &[4])
            .iter()
            .all(|p| *p == Patron::Contested));
    }

    #[test]
    fn test_unaffordable_offer_is_ignored() {
        let instance = Instance::new(vec![vec![8]], vec![vec![0]], vec![10]).unwrap();
        // leader total 13 exceeds the budget, follower takes the client
        assert_eq!(follower_revenue(&instance, &[5], &[9]), 9);
        assert_eq!(leader_revenue(&instance, &[5], &[9]), 0);
    }

    #[test]
    fn test_tie_within_side_prefers_higher_price() {
        // facility 0: cost 3 + price 2, facility 1: cost 1 + price 4
        let costs = vec![vec![3], vec![1]];
        let offer = best_offer(&costs, &[2, 4], 10, 0).unwrap();
        assert_eq!(offer.facility, 1);
        assert_eq!(offer.price, 4);

        // equal price and cost, earliest index wins
        let costs = vec![vec![1], vec![1]];
        assert_eq!(best_offer(&costs, &[4, 4], 10, 0).unwrap().facility, 0);
    }

    #[test]
    fn test_poor_client_contributes_nothing() {
        let instance =
            Instance::new(vec![vec![5, 1]], vec![vec![6, 1]], vec![3, 10]).unwrap();
        let patrons = allocate(&instance, &[0], &[0]);
        assert_eq!(patrons[0], Patron::Unserved);
    }

    #[test]
    fn test_constraint_bounds_cap_assigned_facility() {
        let instance = Instance::new(
            vec![vec![0, 0]],
            vec![vec![1, 0], vec![0, 2]],
            vec![10, 10],
        )
        .unwrap();
        let offers = LeaderOffers::new(&instance, &[6]);
        let constraint =
            AssignmentConstraint::from_assignments(vec![Assignment::Facility(0)]);

        // client 0 at facility 0: 1 + q0 <= 10, < 6, <= 0 + q1
        let (lo, hi) = constraint_bounds(&instance, &offers, &constraint, &[0, 3], 0).unwrap();
        assert_eq!((lo, hi), (0, 2));

        // facility 1 must not undercut facility 0 at client 0
        let (lo, hi) = constraint_bounds(&instance, &offers, &constraint, &[4, 0], 1).unwrap();
        assert_eq!(lo, 5);
        assert_eq!(hi, instance.q_upper_bound()[1]);
    }

    #[test]
    fn test_constraint_bounds_report_empty_interval() {
        let instance = duopoly();
        let offers = LeaderOffers::new(&instance, &[0]);
        let constraint =
            AssignmentConstraint::from_assignments(vec![Assignment::Facility(0)]);
        // follower would need a total below 0
        assert!(constraint_bounds(&instance, &offers, &constraint, &[0], 0).is_none());
    }

    #[test]
    fn test_constrained_revenue_respects_assignment() {
        let instance = duopoly();
        let offers = LeaderOffers::new(&instance, &[5]);
        let pinned = AssignmentConstraint::from_assignments(vec![Assignment::Facility(0)]);
        let dropped = AssignmentConstraint::from_assignments(vec![Assignment::Unserved]);

        assert_eq!(
            constrained_follower_revenue(&instance, &offers, &pinned, &[4]),
            Some(8)
        );
        assert_eq!(
            constrained_follower_revenue(&instance, &offers, &pinned, &[5]),
            None
        );
        assert_eq!(
            constrained_follower_revenue(&instance, &offers, &dropped, &[4]),
            Some(4)
        );
        assert_eq!(
            constrained_follower_revenue(&instance, &offers, &AssignmentConstraint::empty(), &[4]),
            Some(follower_revenue(&instance, &[5], &[4]))
        );
    }
}
