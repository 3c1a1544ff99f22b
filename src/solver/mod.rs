//! Solves one named equation for its single unknown.
pub mod bindings;
pub mod engine;
pub mod error;
pub mod newton;

pub use bindings::{Bindings, SolveRequest};
pub use engine::{AppliedDerivation, EquationSolver, SolveMethod, SolveReport};
pub use error::SolveError;
pub use newton::{find_root, NewtonError};
