//! `mill` configuration file.
//!
//! Every section is optional; missing keys keep their defaults. Command line
//! flags are applied on top of the loaded file.
//!
//! ```toml
//! solver = "microlp"
//!
//! [coordinator]
//! strategy = "bnb"
//! seed = 7
//!
//! [coordinator.leader_vnd.budget]
//! time_limit_secs = 30.0
//!
//! [input]
//! facility_limit = 10
//! client_limit = 30
//! ```

use crate::cli::{InputArgs, SearchArgs};
use anyhow::{Context, Result};
use mill_algo::{CoordinatorConfig, FollowerStrategy, SolverKind};
use mill_io::ReadOptions;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MillConfig {
    /// MIP backend for exact follower work
    pub solver: SolverKind,
    pub coordinator: CoordinatorConfig,
    /// How instance files are split and clipped
    pub input: ReadOptions,
}

impl MillConfig {
    /// Load from `path`, or defaults when no file is given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let contents = fs::read_to_string(path)
            .with_context(|| format!("reading config file: {}", path.display()))?;
        Self::from_toml(&contents)
            .with_context(|| format!("parsing config file: {}", path.display()))
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    pub fn apply_input(&mut self, args: &InputArgs) {
        if let Some(share) = args.leader_share {
            self.input.leader_share = share;
        }
        if let Some(limit) = args.facility_limit {
            self.input.facility_limit = Some(limit);
        }
        if let Some(limit) = args.client_limit {
            self.input.client_limit = Some(limit);
        }
        if args.leaders_from_header {
            self.input.leaders_from_header = true;
        }
    }

    pub fn apply_solver(&mut self, solver: Option<&str>) -> Result<()> {
        if let Some(name) = solver {
            self.solver = SolverKind::from_str(name)?;
        }
        Ok(())
    }

    /// Apply search flags. Thread pool sizing is left to the caller.
    pub fn apply_search(&mut self, args: &SearchArgs) -> Result<()> {
        if let Some(strategy) = &args.strategy {
            self.coordinator.strategy = FollowerStrategy::from_str(strategy)?;
        }
        if let Some(seed) = args.seed {
            self.coordinator.seed = seed;
        }
        if args.verify_exact {
            self.coordinator.verify_exact = true;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mill_algo::DEFAULT_SEED;

    #[test]
    fn test_empty_file_gives_defaults() {
        assert_eq!(MillConfig::from_toml("").unwrap(), MillConfig::default());
        assert_eq!(MillConfig::load(None).unwrap(), MillConfig::default());
    }

    #[test]
    fn test_nested_sections_override_defaults() {
        let config = MillConfig::from_toml(
            r#"
            solver = "microlp"

            [coordinator]
            strategy = "bnb"
            seed = 7

            [coordinator.leader_vnd]
            batch_factor = 20

            [coordinator.leader_vnd.budget]
            time_limit_secs = 2.5

            [input]
            facility_limit = 10
            "#,
        )
        .unwrap();

        assert_eq!(config.coordinator.strategy, FollowerStrategy::BranchAndBound);
        assert_eq!(config.coordinator.seed, 7);
        assert_eq!(config.coordinator.leader_vnd.batch_factor, 20);
        assert_eq!(config.coordinator.leader_vnd.budget.time_limit_secs, Some(2.5));
        assert_eq!(config.coordinator.leader_vnd.budget.max_iterations, None);
        assert_eq!(config.input.facility_limit, Some(10));
        assert_eq!(config.input.leader_share, 0.5);
    }

    #[test]
    fn test_unknown_strategy_is_rejected() {
        let err = MillConfig::from_toml("[coordinator]\nstrategy = \"greedy\"").unwrap_err();
        assert!(format!("{:#}", err).contains("greedy"));
    }

    #[test]
    fn test_flags_override_file_values() {
        let mut config =
            MillConfig::from_toml("[input]\nleader_share = 0.3\nclient_limit = 4").unwrap();
        config.apply_input(&InputArgs {
            leader_share: Some(0.6),
            facility_limit: Some(8),
            client_limit: None,
            leaders_from_header: true,
        });
        assert_eq!(config.input.leader_share, 0.6);
        assert_eq!(config.input.facility_limit, Some(8));
        assert_eq!(config.input.client_limit, Some(4));
        assert!(config.input.leaders_from_header);

        config
            .apply_search(&SearchArgs {
                strategy: Some("cooperative".into()),
                seed: None,
                verify_exact: true,
                threads: None,
            })
            .unwrap();
        assert_eq!(config.coordinator.strategy, FollowerStrategy::Cooperative);
        assert_eq!(config.coordinator.seed, DEFAULT_SEED);
        assert!(config.coordinator.verify_exact);

        let bad = config.apply_search(&SearchArgs {
            strategy: Some("greedy".into()),
            ..SearchArgs::default()
        });
        assert!(bad.is_err());
    }

    #[test]
    fn test_solver_flag_is_parsed() {
        let mut config = MillConfig::default();
        config.apply_solver(None).unwrap();
        assert_eq!(config.solver, SolverKind::Microlp);
        config.apply_solver(Some("MICROLP")).unwrap();
        assert_eq!(config.solver, SolverKind::Microlp);

        let err = config.apply_solver(Some("cplex")).unwrap_err();
        assert!(err.to_string().contains("unknown solver 'cplex'"));
    }
}
