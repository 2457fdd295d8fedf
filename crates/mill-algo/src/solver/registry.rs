use super::backend::{GoodLpSolver, MipSolver};
use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Registry of available MIP backends.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SolverKind {
    #[default]
    Microlp,
}

impl SolverKind {
    pub fn from_str(input: &str) -> Result<Self> {
        match input.to_ascii_lowercase().as_str() {
            "microlp" | "default" => Ok(SolverKind::Microlp),
            other => Err(anyhow!(
                "unknown solver '{}'; supported values: {}",
                other,
                Self::available().join(", ")
            )),
        }
    }

    pub fn build_solver(self) -> Arc<dyn MipSolver> {
        match self {
            SolverKind::Microlp => Arc::new(GoodLpSolver),
        }
    }

    pub fn available() -> &'static [&'static str] {
        &["microlp"]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SolverKind::Microlp => "microlp",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_solver_kind_parsing() {
        assert_eq!(SolverKind::from_str("microlp").unwrap(), SolverKind::Microlp);
        assert_eq!(SolverKind::from_str("DEFAULT").unwrap(), SolverKind::Microlp);
        assert!(SolverKind::from_str("cplex").is_err());
    }

    #[test]
    fn test_built_solver_reports_its_id() {
        let solver = SolverKind::default().build_solver();
        assert_eq!(solver.id(), SolverKind::Microlp.as_str());
    }
}
