//! Partial client-to-facility assignments explored by branch and bound.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Decision recorded for one client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Assignment {
    /// Served by this follower facility.
    Facility(usize),
    /// Not served by the follower.
    Unserved,
}

impl fmt::Display for Assignment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Assignment::Facility(k) => write!(f, "{}", k),
            Assignment::Unserved => f.write_str("-"),
        }
    }
}

/// Decisions for clients `0..depth`; later clients are undecided.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssignmentConstraint(Vec<Assignment>);

impl AssignmentConstraint {
    /// The root constraint: nothing decided.
    pub fn empty() -> Self {
        Self(Vec::new())
    }

    pub fn from_assignments(assignments: Vec<Assignment>) -> Self {
        Self(assignments)
    }

    /// Number of decided clients, which is also the tree depth.
    #[inline]
    pub fn depth(&self) -> usize {
        self.0.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Decision for `client`, `None` while undecided.
    #[inline]
    pub fn get(&self, client: usize) -> Option<Assignment> {
        self.0.get(client).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, Assignment)> + '_ {
        self.0.iter().copied().enumerate()
    }

    /// Clients pinned to a follower facility, as `(client, facility)`.
    pub fn assigned(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.iter().filter_map(|(j, a)| match a {
            Assignment::Facility(k) => Some((j, k)),
            Assignment::Unserved => None,
        })
    }

    /// All clients decided.
    pub fn is_complete(&self, clients: usize) -> bool {
        self.depth() >= clients
    }

    /// Copy extended by one decision for the next client.
    pub fn extended(&self, assignment: Assignment) -> Self {
        let mut next = Vec::with_capacity(self.0.len() + 1);
        next.extend_from_slice(&self.0);
        next.push(assignment);
        Self(next)
    }

    /// One child per follower facility, then the `Unserved` child.
    pub fn children(&self, follower_facilities: usize) -> Vec<Self> {
        (0..follower_facilities)
            .map(Assignment::Facility)
            .chain(std::iter::once(Assignment::Unserved))
            .map(|a| self.extended(a))
            .collect()
    }
}

impl fmt::Display for AssignmentConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (i, a) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{}", a)?;
        }
        f.write_str("]")
    }
}
