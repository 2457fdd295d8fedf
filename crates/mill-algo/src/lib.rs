//! Algorithms for leader/follower facility pricing.
//!
//! - [`allocation`]: the client allocation rule and constrained evaluation
//! - [`vnd`]: seeded variable neighbourhood descent over price vectors
//! - [`model`] and [`solver`]: MIP/LP formulations and the good_lp backend
//! - [`follower`]: exact follower responses
//! - [`bnb`]: branch and bound over client assignments
//! - [`coordinator`]: the bilevel leader search

pub mod allocation;
pub mod bnb;
pub mod budget;
pub mod coordinator;
pub mod follower;
pub mod model;
pub mod solver;
pub mod vnd;

pub use allocation::{
    allocate, best_offer, follower_revenue, leader_revenue, revenue, LeaderOffers, Offer, Patron,
};
pub use bnb::{BnbConfig, BnbOutcome, BnbStatistics, BnbStatus, BranchAndBound};
pub use budget::SearchBudget;
pub use coordinator::{
    build_responder, BilevelCoordinator, BilevelSolution, CoordinatorConfig, ExactCheck,
    FollowerResponder, FollowerStrategy, DEFAULT_SEED,
};
pub use follower::{ExactFollower, FollowerResponse};
pub use solver::{GoodLpSolver, MipSolver, SolveStatus, SolverKind};
pub use vnd::{StopReason, VndConfig, VndEngine, VndOutcome};
