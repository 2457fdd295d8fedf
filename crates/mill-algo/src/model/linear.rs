//! Solver-neutral linear model.
//!
//! Formulations are written against [`LinearModel`] and handed to a
//! [`MipSolver`](crate::solver::MipSolver) backend, which translates it to its
//! own API. Keeping the model as plain data lets tests inspect rows directly.

use serde::Serialize;

/// Index of a variable inside one [`LinearModel`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct VarId(usize);

impl VarId {
    #[inline]
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VarKind {
    Continuous,
    Integer,
    /// Integer in `[0, 1]`
    Binary,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Variable {
    pub name: String,
    pub kind: VarKind,
    pub lower: f64,
    /// `None` is unbounded above
    pub upper: Option<f64>,
}

/// Sparse row `lower <= Σ coef·var <= upper`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Row {
    pub name: String,
    pub terms: Vec<(VarId, f64)>,
    pub lower: Option<f64>,
    pub upper: Option<f64>,
}

impl Row {
    pub fn activity(&self, values: &[f64]) -> f64 {
        self.terms.iter().map(|(v, c)| c * values[v.index()]).sum()
    }

    pub fn is_satisfied(&self, values: &[f64], tolerance: f64) -> bool {
        let activity = self.activity(values);
        self.lower.map_or(true, |l| activity >= l - tolerance)
            && self.upper.map_or(true, |u| activity <= u + tolerance)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Sense {
    #[default]
    Maximise,
    Minimise,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct LinearModel {
    variables: Vec<Variable>,
    rows: Vec<Row>,
    objective: Vec<(VarId, f64)>,
    sense: Sense,
}

impl LinearModel {
    pub fn new(sense: Sense) -> Self {
        Self {
            sense,
            ..Self::default()
        }
    }

    pub fn add_var(
        &mut self,
        name: impl Into<String>,
        kind: VarKind,
        lower: f64,
        upper: Option<f64>,
    ) -> VarId {
        let (lower, upper) = match kind {
            VarKind::Binary => (0.0, Some(1.0)),
            _ => (lower, upper),
        };
        self.variables.push(Variable {
            name: name.into(),
            kind,
            lower,
            upper,
        });
        VarId(self.variables.len() - 1)
    }

    pub fn add_row(
        &mut self,
        name: impl Into<String>,
        terms: Vec<(VarId, f64)>,
        lower: Option<f64>,
        upper: Option<f64>,
    ) {
        self.rows.push(Row {
            name: name.into(),
            terms,
            lower,
            upper,
        });
    }

    /// `Σ terms <= rhs`
    pub fn add_le(&mut self, name: impl Into<String>, terms: Vec<(VarId, f64)>, rhs: f64) {
        self.add_row(name, terms, None, Some(rhs));
    }

    /// `Σ terms >= rhs`
    pub fn add_ge(&mut self, name: impl Into<String>, terms: Vec<(VarId, f64)>, rhs: f64) {
        self.add_row(name, terms, Some(rhs), None);
    }

    /// `Σ terms == rhs`
    pub fn add_eq(&mut self, name: impl Into<String>, terms: Vec<(VarId, f64)>, rhs: f64) {
        self.add_row(name, terms, Some(rhs), Some(rhs));
    }

    pub fn set_objective(&mut self, sense: Sense, terms: Vec<(VarId, f64)>) {
        self.sense = sense;
        self.objective = terms;
    }

    /// Drop integrality; binaries keep their `[0, 1]` box.
    pub fn relax(&mut self) {
        for var in &mut self.variables {
            var.kind = VarKind::Continuous;
        }
    }

    pub fn variables(&self) -> &[Variable] {
        &self.variables
    }

    pub fn variable(&self, id: VarId) -> &Variable {
        &self.variables[id.index()]
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn objective(&self) -> &[(VarId, f64)] {
        &self.objective
    }

    pub fn sense(&self) -> Sense {
        self.sense
    }

    pub fn is_integral(&self) -> bool {
        self.variables
            .iter()
            .any(|v| v.kind != VarKind::Continuous)
    }

    pub fn objective_value(&self, values: &[f64]) -> f64 {
        self.objective
            .iter()
            .map(|(v, c)| c * values[v.index()])
            .sum()
    }

    /// Every row and variable bound holds within `tolerance`.
    pub fn is_feasible(&self, values: &[f64], tolerance: f64) -> bool {
        let in_bounds = self.variables.iter().zip(values).all(|(var, &x)| {
            x >= var.lower - tolerance && var.upper.map_or(true, |u| x <= u + tolerance)
        });
        in_bounds && self.rows.iter().all(|r| r.is_satisfied(values, tolerance))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_binary_forces_unit_box() {
        let mut model = LinearModel::new(Sense::Maximise);
        let x = model.add_var("x", VarKind::Binary, -5.0, None);
        assert_eq!(model.variable(x).lower, 0.0);
        assert_eq!(model.variable(x).upper, Some(1.0));
    }

    #[test]
    fn test_relax_keeps_bounds() {
        let mut model = LinearModel::new(Sense::Maximise);
        let x = model.add_var("x", VarKind::Binary, 0.0, None);
        let q = model.add_var("q", VarKind::Integer, 0.0, Some(7.0));
        assert!(model.is_integral());
        model.relax();
        assert!(!model.is_integral());
        assert_eq!(model.variable(x).upper, Some(1.0));
        assert_eq!(model.variable(q).upper, Some(7.0));
    }

    #[test]
    fn test_feasibility_check_reads_rows() {
        let mut model = LinearModel::new(Sense::Maximise);
        let a = model.add_var("a", VarKind::Continuous, 0.0, None);
        let b = model.add_var("b", VarKind::Continuous, 0.0, None);
        model.add_le("cap", vec![(a, 1.0), (b, 2.0)], 4.0);
        model.add_eq("fix", vec![(a, 1.0)], 2.0);
        model.set_objective(Sense::Maximise, vec![(b, 1.0)]);

        assert!(model.is_feasible(&[2.0, 1.0], 1e-9));
        assert!(!model.is_feasible(&[2.0, 1.5], 1e-9));
        assert!(!model.is_feasible(&[1.0, 0.0], 1e-9));
        assert_eq!(model.objective_value(&[2.0, 1.0]), 1.0);
    }
}
