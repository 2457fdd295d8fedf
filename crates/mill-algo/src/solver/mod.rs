//! LP/MIP backends for [`LinearModel`](crate::model::LinearModel).

pub mod backend;
pub mod registry;

pub use backend::{GoodLpSolver, MipSolver, SolveStatus};
pub use registry::SolverKind;
