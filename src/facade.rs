//! Named shortcuts over an [`EquationSolver`] loaded with the built-in catalog.
use crate::catalog::{CatalogError, LoadReport};
use crate::solver::{Bindings, EquationSolver, SolveError};
use crate::units::Quantity;
use log::debug;

/// Thin wrapper that forwards each shortcut to `solve` with a fixed equation name.
#[derive(Debug, Clone)]
pub struct EngineeringCalculator {
    name: String,
    solver: EquationSolver,
}

impl EngineeringCalculator {
    /// Builds a calculator with every domain of the built-in catalog.
    pub fn new(name: impl Into<String>) -> Result<Self, CatalogError> {
        let mut solver = EquationSolver::new();
        let report = solver.load_builtin(&[])?;
        Ok(Self::from_parts(name, solver, &report))
    }

    /// Wraps an already configured solver.
    pub fn with_solver(name: impl Into<String>, solver: EquationSolver) -> Self {
        Self { name: name.into(), solver }
    }

    fn from_parts(name: impl Into<String>, solver: EquationSolver, report: &LoadReport) -> Self {
        let name = name.into();
        debug!(
            "Calculator '{}': {} equations, {} rules, {} catalog issues",
            name,
            report.equations_added,
            report.rules_added,
            report.issues.len()
        );
        Self { name, solver }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn solver(&self) -> &EquationSolver {
        &self.solver
    }

    pub fn solve(&self, equation: &str, bindings: &Bindings) -> Result<Quantity, SolveError> {
        self.solver.solve(equation, bindings)
    }

    /// `F = P * A`
    pub fn force(&self, bindings: &Bindings) -> Result<Quantity, SolveError> {
        self.solve("force", bindings)
    }

    /// `sigma = F / A`
    pub fn stress(&self, bindings: &Bindings) -> Result<Quantity, SolveError> {
        self.solve("stress", bindings)
    }

    pub fn drag_force(&self, bindings: &Bindings) -> Result<Quantity, SolveError> {
        self.solve("drag", bindings)
    }

    pub fn flow_rate(&self, bindings: &Bindings) -> Result<Quantity, SolveError> {
        self.solve("flow_rate", bindings)
    }

    pub fn reynolds_number(&self, bindings: &Bindings) -> Result<Quantity, SolveError> {
        self.solve("reynolds", bindings)
    }

    pub fn circle_area(&self, bindings: &Bindings) -> Result<Quantity, SolveError> {
        self.solve("circle_area", bindings)
    }

    pub fn cylinder_volume(&self, bindings: &Bindings) -> Result<Quantity, SolveError> {
        self.solve("cylinder_volume", bindings)
    }

    pub fn pipe_pressure_drop(&self, bindings: &Bindings) -> Result<Quantity, SolveError> {
        self.solve("pipe_pressure_drop", bindings)
    }

    /// Thin-walled vessel: `t = (P * d) / (2 * sigma_allow)`.
    pub fn kessel(&self, bindings: &Bindings) -> Result<Quantity, SolveError> {
        self.solve("kessel", bindings)
    }
}
