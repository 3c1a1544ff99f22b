//! Physical units: parsing, dimensional analysis and magnitude conversion.
pub mod definitions;
pub mod error;
pub mod quantity;
pub mod unit;

pub use definitions::Dimension;
pub use error::UnitError;
pub use quantity::Quantity;
pub use unit::{Unit, UnitKind};
