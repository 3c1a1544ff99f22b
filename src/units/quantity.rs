//! A magnitude paired with a unit.
use super::error::UnitError;
use super::unit::Unit;
use serde::Serialize;
use std::fmt;
use std::ops::{Div, Mul};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Quantity {
    pub magnitude: f64,
    pub unit: Unit,
}

impl Quantity {
    pub fn new(magnitude: f64, unit: Unit) -> Self {
        Self { magnitude, unit }
    }

    /// Convenience constructor parsing the unit expression.
    pub fn with_unit(magnitude: f64, unit: &str) -> Result<Self, UnitError> {
        Ok(Self::new(magnitude, Unit::parse(unit)?))
    }

    pub fn dimensionless(magnitude: f64) -> Self {
        Self::new(magnitude, Unit::dimensionless())
    }

    /// Parses `"0.5 meter"`, `"100 Pa"` or a bare number.
    pub fn parse(input: &str) -> Result<Self, UnitError> {
        let input = input.trim();
        let (number, unit) = match input.split_once(char::is_whitespace) {
            Some((number, unit)) => (number, Some(unit)),
            None => (input, None),
        };
        let magnitude = number
            .parse::<f64>()
            .map_err(|_| UnitError::Malformed(input.to_string()))?;
        match unit {
            Some(unit) => Self::with_unit(magnitude, unit),
            None => Ok(Self::dimensionless(magnitude)),
        }
    }

    /// Builds a quantity in `unit` from a magnitude expressed in coherent SI.
    pub fn from_base(base_magnitude: f64, unit: Unit) -> Self {
        Self::new(base_magnitude / unit.scale(), unit)
    }

    /// Magnitude in coherent SI units.
    pub fn base_magnitude(&self) -> f64 {
        self.magnitude * self.unit.scale()
    }

    pub fn to_base_units(&self) -> Quantity {
        Quantity::new(self.base_magnitude(), self.unit.base_unit())
    }

    pub fn to(&self, target: &Unit) -> Result<Quantity, UnitError> {
        if !self.unit.is_compatible(target) {
            return Err(UnitError::Incompatible {
                from: self.unit.to_string(),
                to: target.to_string(),
            });
        }
        Ok(Quantity::from_base(self.base_magnitude(), target.clone()))
    }

    /// Approximate equality after conversion to coherent SI.
    pub fn approx_eq(&self, other: &Quantity, rel_tol: f64) -> bool {
        if !self.unit.is_compatible(&other.unit) {
            return false;
        }
        let (a, b) = (self.base_magnitude(), other.base_magnitude());
        (a - b).abs() <= rel_tol * a.abs().max(b.abs()).max(f64::MIN_POSITIVE)
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.unit == Unit::dimensionless() {
            write!(f, "{}", self.magnitude)
        } else {
            write!(f, "{} {}", self.magnitude, self.unit)
        }
    }
}

impl std::str::FromStr for Quantity {
    type Err = UnitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Quantity::parse(s)
    }
}

impl Mul for Quantity {
    type Output = Result<Quantity, UnitError>;

    fn mul(self, rhs: Quantity) -> Self::Output {
        let mut unit = self.unit;
        unit.multiply(&rhs.unit)?;
        Ok(Quantity::new(self.magnitude * rhs.magnitude, unit))
    }
}

impl Mul<f64> for Quantity {
    type Output = Quantity;

    fn mul(self, rhs: f64) -> Quantity {
        Quantity::new(self.magnitude * rhs, self.unit)
    }
}

impl Div for Quantity {
    type Output = Result<Quantity, UnitError>;

    fn div(self, rhs: Quantity) -> Self::Output {
        let mut unit = self.unit;
        unit.divide(&rhs.unit)?;
        Ok(Quantity::new(self.magnitude / rhs.magnitude, unit))
    }
}
