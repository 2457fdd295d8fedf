//! Single-coordinate resampling moves.

use crate::allocation::{constraint_bounds, LeaderOffers};
use mill_core::{AssignmentConstraint, Instance, PriceVector};
use rand::Rng;

/// Proposes a neighbour of a price vector.
///
/// Implementations return a fresh vector and never touch `current`. `None`
/// means the drawn move had no admissible value.
pub trait Neighborhood {
    fn propose<R: Rng + ?Sized>(&self, current: &PriceVector, rng: &mut R) -> Option<PriceVector>;
}

/// Pick a facility uniformly and redraw its price uniformly in `[0, bound]`.
#[derive(Debug, Clone)]
pub struct UniformResample<'a> {
    upper_bounds: &'a [i64],
}

impl<'a> UniformResample<'a> {
    pub fn new(upper_bounds: &'a [i64]) -> Self {
        Self { upper_bounds }
    }
}

impl Neighborhood for UniformResample<'_> {
    fn propose<R: Rng + ?Sized>(&self, current: &PriceVector, rng: &mut R) -> Option<PriceVector> {
        if current.is_empty() {
            return None;
        }
        let facility = rng.gen_range(0..current.len());
        let bound = self.upper_bounds[facility].max(0);
        Some(current.with_price(facility, rng.gen_range(0..=bound)))
    }
}

/// Like [`UniformResample`] but draws from the interval that keeps the
/// follower vector consistent with a partial assignment.
#[derive(Debug, Clone)]
pub struct ConstrainedResample<'a> {
    instance: &'a Instance,
    offers: &'a LeaderOffers,
    constraint: &'a AssignmentConstraint,
}

impl<'a> ConstrainedResample<'a> {
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

impl Neighborhood for ConstrainedResample<'_> {
    fn propose<R: Rng + ?Sized>(&self, current: &PriceVector, rng: &mut R) -> Option<PriceVector> {
        if current.is_empty() {
            return None;
        }
        let facility = rng.gen_range(0..current.len());
        let (lo, hi) =
            constraint_bounds(self.instance, self.offers, self.constraint, current, facility)?;
        Some(current.with_price(facility, rng.gen_range(lo..=hi)))
    }
}
