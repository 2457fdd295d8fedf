//! Variable neighbourhood descent over integer price vectors.
//!
//! Each iteration draws a batch of `batch_factor × len` single-coordinate
//! moves from the current vector, scores them and moves to the best strictly
//! improving one. The run stops at the first batch without improvement or
//! when its [`SearchBudget`] runs out.
//!
//! All randomness flows from the `StdRng` passed to [`VndEngine::run`]: moves
//! are drawn from it sequentially and each candidate also receives a seed drawn
//! from it, so the batch can be scored in parallel with identical results.

pub mod neighborhood;
pub mod objective;

pub use neighborhood::{ConstrainedResample, Neighborhood, UniformResample};
pub use objective::{ConstrainedFollowerObjective, Evaluation, FollowerObjective, Objective};

use crate::budget::SearchBudget;
use mill_core::{MillError, MillResult, PriceVector};
use rand::rngs::StdRng;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Candidates per coordinate in the standard descent.
pub const STANDARD_BATCH_FACTOR: usize = 100;
/// Candidates per coordinate in the light descent run inside branch and bound.
pub const LIGHT_BATCH_FACTOR: usize = 10;

/// VND configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VndConfig {
    /// Batch size is `batch_factor × vector length`
    pub batch_factor: usize,
    pub budget: SearchBudget,
    /// Score each batch on the rayon pool (needs the `parallel` feature)
    pub parallel: bool,
}

impl Default for VndConfig {
    fn default() -> Self {
        Self {
            batch_factor: STANDARD_BATCH_FACTOR,
            budget: SearchBudget::default(),
            parallel: false,
        }
    }
}

impl VndConfig {
    /// Smaller batches for nested use.
    pub fn light() -> Self {
        Self {
            batch_factor: LIGHT_BATCH_FACTOR,
            ..Self::default()
        }
    }

    pub fn with_budget(mut self, budget: SearchBudget) -> Self {
        self.budget = budget;
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }
}

/// Why a descent ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// A full batch produced no improvement.
    LocalOptimum,
    /// Iteration or time limit reached.
    Budget,
}

/// Result of one descent.
#[derive(Debug, Clone)]
pub struct VndOutcome<D> {
    pub prices: PriceVector,
    pub value: i64,
    pub detail: D,
    /// Improving moves accepted
    pub iterations: usize,
    /// Objective calls, including the starting point
    pub evaluations: usize,
    pub stop_reason: StopReason,
    pub elapsed: Duration,
}

/// Descent driver over one neighbourhood and one objective.
pub struct VndEngine<'a, N, O> {
    config: &'a VndConfig,
    neighborhood: N,
    objective: O,
}

impl<'a, N, O> VndEngine<'a, N, O>
where
    N: Neighborhood,
    O: Objective,
{
    pub fn new(config: &'a VndConfig, neighborhood: N, objective: O) -> Self {
        Self {
            config,
            neighborhood,
            objective,
        }
    }

    /// Descend from `start`, which must be admissible for the objective.
    pub fn run(&self, start: PriceVector, rng: &mut StdRng) -> MillResult<VndOutcome<O::Detail>> {
        let clock = self.config.budget.start();
        let start_seed: u64 = rng.gen();
        let initial = self.objective.evaluate(&start, start_seed)?.ok_or_else(|| {
            MillError::Validation(format!("starting vector [{}] is not admissible", start))
        })?;

        let mut current = start;
        let mut value = initial.value;
        let mut detail = initial.detail;
        let mut iterations = 0;
        let mut evaluations = 1;
        let batch_size = self.config.batch_factor * current.len();

        let stop_reason = loop {
            if batch_size == 0 {
                break StopReason::LocalOptimum;
            }
            if clock.exhausted(iterations) {
                break StopReason::Budget;
            }

            let batch: Vec<(PriceVector, u64)> = (0..batch_size)
                .filter_map(|_| {
                    let candidate = self.neighborhood.propose(&current, &mut *rng);
                    let seed: u64 = rng.gen();
                    candidate.map(|c| (c, seed))
                })
                .collect();
            evaluations += batch.len();

            let scored = self.score(&batch);
            let mut best: Option<(usize, Evaluation<O::Detail>)> = None;
            for (index, result) in scored.into_iter().enumerate() {
                let Some(evaluation) = result? else {
                    continue;
                };
                let threshold = best.as_ref().map_or(value, |(_, b)| b.value);
                if evaluation.value > threshold {
                    best = Some((index, evaluation));
                }
            }

            match best {
                Some((index, evaluation)) => {
                    iterations += 1;
                    debug!(
                        iteration = iterations,
                        from = value,
                        to = evaluation.value,
                        "vnd accepted move"
                    );
                    current = batch[index].0.clone();
                    value = evaluation.value;
                    detail = evaluation.detail;
                }
                None => break StopReason::LocalOptimum,
            }
        };

        Ok(VndOutcome {
            prices: current,
            value,
            detail,
            iterations,
            evaluations,
            stop_reason,
            elapsed: clock.elapsed(),
        })
    }

    fn score(
        &self,
        batch: &[(PriceVector, u64)],
    ) -> Vec<MillResult<Option<Evaluation<O::Detail>>>> {
        let objective = &self.objective;

        #[cfg(feature = "parallel")]
        if self.config.parallel {
            return batch
                .par_iter()
                .map(|(prices, seed)| objective.evaluate(prices, *seed))
                .collect();
        }

        batch
            .iter()
            .map(|(prices, seed)| objective.evaluate(prices, *seed))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::allocation::{follower_revenue, LeaderOffers};
    use mill_core::Instance;
    use rand::SeedableRng;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Peak at `target`, value falls off with L1 distance.
    struct Peak {
        target: Vec<i64>,
        calls: AtomicUsize,
    }

    impl Objective for Peak {
        type Detail = ();

        fn evaluate(&self, prices: &PriceVector, _seed: u64) -> MillResult<Option<Evaluation<()>>> {
            self.calls.fetch_add(1, Ordering::Relaxed);
            let distance: i64 = prices
                .iter()
                .zip(&self.target)
                .map(|(a, b)| (a - b).abs())
                .sum();
            Ok(Some(Evaluation::plain(-distance)))
        }
    }

    fn peak(target: Vec<i64>) -> Peak {
        Peak {
            target,
            calls: AtomicUsize::new(0),
        }
    }

    #[test]
    fn test_climbs_to_separable_peak() {
        let bounds = [8, 8, 8];
        let config = VndConfig::default();
        let objective = peak(vec![3, 7, 1]);
        let engine = VndEngine::new(&config, UniformResample::new(&bounds), &objective);
        let mut rng = StdRng::seed_from_u64(123123);

        let outcome = engine
            .run(PriceVector::canonical_start(&bounds), &mut rng)
            .unwrap();

        assert_eq!(outcome.prices.as_slice(), &[3, 7, 1]);
        assert_eq!(outcome.value, 0);
        assert_eq!(outcome.stop_reason, StopReason::LocalOptimum);
        assert_eq!(outcome.evaluations, objective.calls.load(Ordering::Relaxed));
    }

    #[test]
    fn test_same_seed_same_outcome() {
        let instance = Instance::new(
            vec![vec![2, 4, 1], vec![3, 0, 5]],
            vec![vec![1, 2, 3], vec![4, 1, 0]],
            vec![12, 9, 11],
        )
        .unwrap();
        let offers = LeaderOffers::new(&instance, &[5, 5]);
        let config = VndConfig::light();
        let run = |seed| {
            let engine = VndEngine::new(
                &config,
                UniformResample::new(instance.q_upper_bound()),
                FollowerObjective::new(&instance, &offers),
            );
            engine
                .run(
                    PriceVector::canonical_start(instance.q_upper_bound()),
                    &mut StdRng::seed_from_u64(seed),
                )
                .unwrap()
        };

        let a = run(9);
        let b = run(9);
        assert_eq!(a.prices, b.prices);
        assert_eq!(a.value, b.value);
        assert_eq!(a.value, follower_revenue(&instance, &[5, 5], &a.prices));
    }

    #[cfg(feature = "parallel")]
    #[test]
    fn test_parallel_scoring_matches_sequential() {
        let bounds = [50, 50, 50, 50];
        let objective = peak(vec![11, 42, 7, 30]);
        let start = PriceVector::canonical_start(&bounds);

        let sequential = VndConfig::light();
        let parallel = VndConfig::light().with_parallel(true);
        let a = VndEngine::new(&sequential, UniformResample::new(&bounds), &objective)
            .run(start.clone(), &mut StdRng::seed_from_u64(5))
            .unwrap();
        let b = VndEngine::new(&parallel, UniformResample::new(&bounds), &objective)
            .run(start, &mut StdRng::seed_from_u64(5))
            .unwrap();

        assert_eq!(a.prices, b.prices);
        assert_eq!(a.iterations, b.iterations);
    }

    #[test]
    fn test_iteration_budget_stops_early() {
        let bounds = [1000];
        let config =
            VndConfig::default().with_budget(SearchBudget::unlimited().with_max_iterations(1));
        let objective = peak(vec![1000]);
        let outcome = VndEngine::new(&config, UniformResample::new(&bounds), &objective)
            .run(PriceVector::new(vec![0]), &mut StdRng::seed_from_u64(3))
            .unwrap();

        assert!(outcome.iterations <= 1);
        assert_eq!(outcome.stop_reason, StopReason::Budget);
    }

    #[test]
    fn test_empty_vector_is_a_local_optimum() {
        let config = VndConfig::default();
        let objective = peak(vec![]);
        let outcome = VndEngine::new(&config, UniformResample::new(&[]), &objective)
            .run(PriceVector::default(), &mut StdRng::seed_from_u64(3))
            .unwrap();
        assert_eq!(outcome.stop_reason, StopReason::LocalOptimum);
        assert_eq!(outcome.evaluations, 1);
    }
}
