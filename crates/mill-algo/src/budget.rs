//! Iteration and wall-clock limits shared by every search.

use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// Stop condition for a search run. `None` means unlimited.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchBudget {
    pub max_iterations: Option<usize>,
    pub time_limit_secs: Option<f64>,
}

impl SearchBudget {
    pub fn unlimited() -> Self {
        Self::default()
    }

    pub fn with_max_iterations(mut self, iterations: usize) -> Self {
        self.max_iterations = Some(iterations);
        self
    }

    pub fn with_time_limit(mut self, secs: f64) -> Self {
        self.time_limit_secs = Some(secs);
        self
    }

    /// Start the clock for one run.
    pub fn start(&self) -> BudgetClock {
        BudgetClock {
            budget: *self,
            started: Instant::now(),
        }
    }
}

/// A running [`SearchBudget`].
#[derive(Debug, Clone, Copy)]
pub struct BudgetClock {
    budget: SearchBudget,
    started: Instant,
}

impl BudgetClock {
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// True once either limit is reached after `iterations` completed steps.
    pub fn exhausted(&self, iterations: usize) -> bool {
        if let Some(max) = self.budget.max_iterations {
            if iterations >= max {
                return true;
            }
        }
        match self.budget.time_limit_secs {
            Some(secs) => self.started.elapsed().as_secs_f64() >= secs,
            None => false,
        }
    }
}
