//! Closure computation, target selection and rule-graph diagnostics.
pub mod closure;
pub mod selection;
pub mod topology;

pub use closure::{resolve, Closure};
pub use selection::{select_target, Selection, SelectionReason};
pub use topology::rule_cycles;
