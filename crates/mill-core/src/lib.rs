//! Core data model for Stackelberg facility pricing.
//!
//! A leader and a follower each own a set of facilities and post integer
//! prices; clients go to the cheapest affordable facility. This crate holds the
//! problem [`Instance`], the per-side [`PriceVector`], the partial
//! [`AssignmentConstraint`] used when enumerating follower responses, and the
//! shared [`MillError`] type. Algorithms live in `mill-algo`.

pub mod constraint;
pub mod error;
pub mod instance;
pub mod prices;

pub use constraint::{Assignment, AssignmentConstraint};
pub use error::{MillError, MillResult};
pub use instance::{Facility, Instance, Side};
pub use prices::PriceVector;
