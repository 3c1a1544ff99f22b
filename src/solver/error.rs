use crate::algebra::{EvalError, Expr, Relation};
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SolveError {
    #[error("Unknown equation '{0}'")]
    UnknownEquation(String),
    #[error("Equation '{equation}' is underdetermined: missing {missing:?} (derived: {available:?})")]
    Underdetermined {
        equation: String,
        missing: Vec<String>,
        available: Vec<String>,
    },
    #[error("Could not choose a symbol to solve for in equation '{equation}'")]
    UnresolvableTarget { equation: String },
    #[error("No solution for '{target}' in equation '{equation}' after rewriting to `{rewritten}` with {knowns:?}")]
    NoSolution {
        equation: String,
        target: String,
        rewritten: Relation,
        knowns: BTreeMap<String, f64>,
    },
    #[error("Solution `{expression}` for '{target}' in equation '{equation}' is not numeric: {source}")]
    NumericEvaluation {
        equation: String,
        target: String,
        expression: Expr,
        #[source]
        source: EvalError,
    },
    #[error("Value for '{symbol}' has unit '{found}', incompatible with registered unit '{expected}'")]
    IncompatibleUnit {
        symbol: String,
        expected: String,
        found: String,
    },
}
