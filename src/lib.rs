//! Equation solving for engineering calculations.
//!
//! Named relations between physical quantities are solved for their single
//! unknown. Missing inputs are filled in through chained substitution rules
//! before the relation is isolated symbolically and the result is given the
//! target's registered unit.
pub mod algebra;
pub mod analysis;
pub mod catalog;
pub mod config;
pub mod display;
pub mod facade;
pub mod solver;
pub mod store;
pub mod units;

pub use catalog::{Catalog, CatalogError, LoadReport};
pub use config::{NewtonSettings, SolverSettings};
pub use facade::EngineeringCalculator;
pub use solver::{Bindings, EquationSolver, SolveError, SolveReport, SolveRequest};
pub use units::{Quantity, Unit};
