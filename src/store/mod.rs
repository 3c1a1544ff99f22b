//! Symbol table, equation registry and substitution rule index.
pub mod error;
pub mod registry;
pub mod rules;
pub mod types;

pub use error::StoreError;
pub use registry::Registry;
pub use rules::RuleIndex;
pub use types::*;
