use crate::allocation::{constrained_follower_revenue, follower_revenue_against, LeaderOffers};
use mill_core::{AssignmentConstraint, Instance, MillResult, PriceVector};

/// Score of one candidate together with whatever the objective computed on
/// the way (for the leader, the follower response it triggered).
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation<D> {
    pub value: i64,
    pub detail: D,
}

impl Evaluation<()> {
    pub fn plain(value: i64) -> Self {
        Self { value, detail: () }
    }
}

/// Function maximised by [`VndEngine`](super::VndEngine).
///
/// `seed` is drawn from the search's own generator for every candidate, so an
/// objective that runs a randomised search of its own stays reproducible no
/// matter in which order (or on which thread) candidates are evaluated.
/// `Ok(None)` rejects the candidate as inadmissible.
pub trait Objective: Sync {
    type Detail: Send;

    fn evaluate(
        &self,
        prices: &PriceVector,
        seed: u64,
    ) -> MillResult<Option<Evaluation<Self::Detail>>>;
}

/// Follower revenue against fixed leader prices.
#[derive(Debug, Clone, Copy)]
pub struct FollowerObjective<'a> {
    instance: &'a Instance,
    offers: &'a LeaderOffers,
}

impl<'a> FollowerObjective<'a> {
    pub fn new(instance: &'a Instance, offers: &'a LeaderOffers) -> Self {
        Self { instance, offers }
    }
}

impl Objective for FollowerObjective<'_> {
    type Detail = ();

    fn evaluate(&self, prices: &PriceVector, _seed: u64) -> MillResult<Option<Evaluation<()>>> {
        Ok(Some(Evaluation::plain(follower_revenue_against(
            self.instance,
            self.offers,
            prices,
        ))))
    }
}

/// Follower revenue under a partial client assignment; inconsistent vectors
/// are rejected.
#[derive(Debug, Clone, Copy)]
pub struct ConstrainedFollowerObjective<'a> {
    instance: &'a Instance,
    offers: &'a LeaderOffers,
    constraint: &'a AssignmentConstraint,
}

impl<'a> ConstrainedFollowerObjective<'a> {
    pub fn new(
        instance: &'a Instance,
        offers: &'a LeaderOffers,
        constraint: &'a AssignmentConstraint,
    ) -> Self {
        Self {
            instance,
            offers,
            constraint,
        }
    }
}

impl Objective for ConstrainedFollowerObjective<'_> {
    type Detail = ();

    fn evaluate(&self, prices: &PriceVector, _seed: u64) -> MillResult<Option<Evaluation<()>>> {
        Ok(
            constrained_follower_revenue(self.instance, self.offers, self.constraint, prices)
                .map(Evaluation::plain),
        )
    }
}

impl<T: Objective + ?Sized> Objective for &T {
    type Detail = T::Detail;

    fn evaluate(
        &self,
        prices: &PriceVector,
        seed: u64,
    ) -> MillResult<Option<Evaluation<Self::Detail>>> {
        (**self).evaluate(prices, seed)
    }
}
