use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum UnitError {
    #[error("Unknown unit '{0}'")]
    UnknownUnit(String),
    #[error("Malformed unit expression '{0}'")]
    Malformed(String),
    #[error("Cannot convert from '{from}' to '{to}'")]
    Incompatible { from: String, to: String },
    #[error("Exponent out of range in unit '{0}'")]
    ExponentOverflow(String),
}
