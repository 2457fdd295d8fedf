//! Linear models of the follower pricing problem.
//!
//! - [`linear`]: solver-neutral variables, rows and objective
//! - [`fragment`]: the big-M link `z = q·x` reused by every variant
//! - [`formulation`]: exact, relaxed and cooperative follower models plus the
//!   feasibility model used to seed constrained searches

pub mod formulation;
pub mod fragment;
pub mod linear;

pub use formulation::{feasibility_model, FollowerFormulation, FollowerModel, ModelVariant};
pub use fragment::price_link;
pub use linear::{LinearModel, Row, Sense, VarId, VarKind, Variable};
