use crate::algebra::ParseError;
use crate::units::UnitError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    #[error("Symbol '{name}' is already registered with unit '{existing}', cannot redefine as '{requested}'")]
    SymbolConflict {
        name: String,
        existing: String,
        requested: String,
    },
    #[error("Invalid unit for symbol '{symbol}': {source}")]
    Unit {
        symbol: String,
        #[source]
        source: UnitError,
    },
    #[error("Equation '{equation}' references unregistered symbol '{symbol}'")]
    UnregisteredSymbol { equation: String, symbol: String },
    #[error("Equation '{equation}' metadata names '{symbol}', which does not appear in the relation")]
    MetadataSymbol { equation: String, symbol: String },
    #[error("Equation '{0}' is already registered")]
    DuplicateEquation(String),
    #[error("Failed to parse equation '{equation}': {source}")]
    Parse {
        equation: String,
        #[source]
        source: ParseError,
    },
}
