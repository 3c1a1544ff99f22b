//! Symbolic expressions: parsing, simplification, substitution and isolation.
pub mod error;
pub mod expr;
pub mod parser;
pub mod simplify;
pub mod solve;

pub use error::{EvalError, ParseError};
pub use expr::{BinaryOp, Constant, Expr, Function, Relation};
pub use parser::{parse_expr, parse_relation, Namespace, OpenNamespace};
pub use solve::{solve_for, Assumptions, Solutions};
