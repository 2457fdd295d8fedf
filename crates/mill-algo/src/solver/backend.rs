use crate::model::{LinearModel, Sense, VarId, VarKind};
use good_lp::solvers::microlp::microlp;
use good_lp::{
    constraint, variable, Expression, ProblemVariables, ResolutionError, Solution, SolverModel,
    Variable,
};
use mill_core::{MillError, MillResult};

/// Outcome of one model solve. Infeasibility is an expected answer, not an
/// error.
#[derive(Debug, Clone, PartialEq)]
pub enum SolveStatus {
    Optimal { objective: f64, values: Vec<f64> },
    Infeasible,
}

impl SolveStatus {
    pub fn is_optimal(&self) -> bool {
        matches!(self, SolveStatus::Optimal { .. })
    }
}

/// LP/MIP backend.
pub trait MipSolver: Send + Sync {
    /// Unique identifier (e.g. "microlp")
    fn id(&self) -> &str;

    fn solve(&self, model: &LinearModel) -> MillResult<SolveStatus>;
}

/// [`MipSolver`] over good_lp's pure-Rust microlp backend.
#[derive(Debug, Clone, Default)]
pub struct GoodLpSolver;

impl MipSolver for GoodLpSolver {
    fn id(&self) -> &str {
        "microlp"
    }

    fn solve(&self, model: &LinearModel) -> MillResult<SolveStatus> {
        let mut vars = ProblemVariables::new();
        let handles: Vec<Variable> = model
            .variables()
            .iter()
            .map(|v| {
                let mut def = variable().name(v.name.clone()).min(v.lower);
                if let Some(upper) = v.upper {
                    def = def.max(upper);
                }
                match v.kind {
                    VarKind::Continuous => {}
                    VarKind::Integer => def = def.integer(),
                    VarKind::Binary => def = def.binary(),
                }
                vars.add(def)
            })
            .collect();

        let expression = |terms: &[(VarId, f64)]| {
            let mut expr = Expression::from(0.0);
            for &(var, coef) in terms {
                expr += coef * handles[var.index()];
            }
            expr
        };

        let objective = expression(model.objective());
        let unsolved = match model.sense() {
            Sense::Maximise => vars.maximise(objective),
            Sense::Minimise => vars.minimise(objective),
        };
        let mut problem = unsolved.using(microlp);

        for row in model.rows() {
            let lhs = expression(&row.terms);
            match (row.lower, row.upper) {
                (Some(lo), Some(hi)) if lo == hi => {
                    problem = problem.with(constraint!(lhs == lo));
                }
                (lower, upper) => {
                    if let Some(lo) = lower {
                        problem = problem.with(constraint!(lhs.clone() >= lo));
                    }
                    if let Some(hi) = upper {
                        problem = problem.with(constraint!(lhs <= hi));
                    }
                }
            }
        }

        match problem.solve() {
            Ok(solution) => {
                let values: Vec<f64> = handles.iter().map(|&h| solution.value(h)).collect();
                Ok(SolveStatus::Optimal {
                    objective: model.objective_value(&values),
                    values,
                })
            }
            Err(ResolutionError::Infeasible) => Ok(SolveStatus::Infeasible),
            Err(ResolutionError::Unbounded) => {
                Err(MillError::Solver("model is unbounded".to_string()))
            }
            Err(e) => Err(MillError::Solver(format!("{:?}", e))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_solver_is_object_safe_and_send_sync() {
        fn _accepts(_s: &dyn MipSolver) {}
        fn _assert_send_sync<T: Send + Sync>() {}
        _assert_send_sync::<Box<dyn MipSolver>>();
    }

    #[test]
    fn test_solves_small_integer_program() {
        // max x + y, 2x + 2y <= 5, x, y integer >= 0
        let mut model = LinearModel::new(Sense::Maximise);
        let x = model.add_var("x", VarKind::Integer, 0.0, Some(10.0));
        let y = model.add_var("y", VarKind::Integer, 0.0, Some(10.0));
        model.add_le("cap", vec![(x, 2.0), (y, 2.0)], 5.0);
        model.set_objective(Sense::Maximise, vec![(x, 1.0), (y, 1.0)]);

        match GoodLpSolver.solve(&model).unwrap() {
            SolveStatus::Optimal { objective, values } => {
                assert!((objective - 2.0).abs() < 1e-6);
                assert!(model.is_feasible(&values, 1e-6));
            }
            SolveStatus::Infeasible => panic!("expected optimum"),
        }
    }

    #[test]
    fn test_relaxation_reaches_fractional_optimum() {
        let mut model = LinearModel::new(Sense::Maximise);
        let x = model.add_var("x", VarKind::Integer, 0.0, Some(10.0));
        model.add_le("cap", vec![(x, 2.0)], 5.0);
        model.set_objective(Sense::Maximise, vec![(x, 1.0)]);
        model.relax();

        let status = GoodLpSolver.solve(&model).unwrap();
        let SolveStatus::Optimal { objective, .. } = status else {
            panic!("expected optimum");
        };
        assert!((objective - 2.5).abs() < 1e-6);
    }

    #[test]
    fn test_infeasible_is_a_status() {
        let mut model = LinearModel::new(Sense::Maximise);
        let x = model.add_var("x", VarKind::Integer, 0.0, Some(3.0));
        model.add_ge("low", vec![(x, 1.0)], 5.0);

        assert_eq!(GoodLpSolver.solve(&model).unwrap(), SolveStatus::Infeasible);
    }
}
