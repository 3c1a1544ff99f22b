//! Error types for expression parsing and numeric evaluation.
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    #[error("Unexpected character '{ch}' at offset {offset}")]
    UnexpectedChar { ch: char, offset: usize },
    #[error("Invalid number literal '{0}'")]
    InvalidNumber(String),
    #[error("Unexpected token '{0}'")]
    UnexpectedToken(String),
    #[error("Unexpected end of input")]
    UnexpectedEnd,
    #[error("Unknown symbol '{0}'")]
    UnknownSymbol(String),
    #[error("Unknown function '{0}'")]
    UnknownFunction(String),
    #[error("Expected a single '=' in relation, found {0}")]
    MalformedRelation(usize),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EvalError {
    #[error("Symbol '{0}' has no numeric value")]
    UnboundSymbol(String),
    #[error("Expression evaluated to a non-finite value ({0})")]
    NonFinite(f64),
}
