//! Parsed compound units and their classification.
use super::definitions::{self, Dimension, BASE_UNITS, DIMENSIONLESS};
use super::error::UnitError;
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;

/// Coarse classification used when choosing which symbol to solve for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum UnitKind {
    Dimensionless,
    /// A single unit of one base dimension, e.g. `meter` or `millisecond`.
    Base,
    /// Anything composite or named-derived: `meter^2`, `newton`, `meter/second`.
    Derived,
}

/// A product of named units with integer exponents.
/// Example: "kilogram/meter**3" -> { "kilogram": 1, "meter": -3 }
#[derive(Debug, Clone, PartialEq)]
pub struct Unit {
    terms: BTreeMap<String, i32>,
    scale: f64,
    dimension: Dimension,
}

impl Default for Unit {
    fn default() -> Self {
        Self::dimensionless()
    }
}

impl Unit {
    pub fn dimensionless() -> Self {
        Self {
            terms: BTreeMap::new(),
            scale: 1.0,
            dimension: DIMENSIONLESS,
        }
    }

    /// Parses expressions like `"meter"`, `"kg*m/s**2"`, `"Pa*s"` or `"1/s"`.
    pub fn parse(input: &str) -> Result<Self, UnitError> {
        if input.trim().is_empty() {
            return Err(UnitError::Malformed(input.to_string()));
        }
        let tokens = tokenize(input)?;
        let mut parser = UnitParser { tokens, pos: 0, source: input };
        let unit = parser.product()?;
        if parser.pos != parser.tokens.len() {
            return Err(UnitError::Malformed(input.to_string()));
        }
        Ok(unit)
    }

    fn atom(name: &str) -> Result<Self, UnitError> {
        let resolved =
            definitions::resolve(name).ok_or_else(|| UnitError::UnknownUnit(name.to_string()))?;
        if resolved.canonical == "dimensionless" {
            return Ok(Self::dimensionless());
        }
        let mut terms = BTreeMap::new();
        terms.insert(resolved.canonical, 1);
        Ok(Self {
            terms,
            scale: resolved.scale,
            dimension: resolved.dimension,
        })
    }

    /// Multiplies in place. Fails without modifying `self` if an exponent leaves the `i32` range.
    pub fn multiply(&mut self, other: &Self) -> Result<(), UnitError> {
        let mut terms = self.terms.clone();
        for (name, exp) in &other.terms {
            let entry = terms.entry(name.clone()).or_insert(0);
            *entry = entry.checked_add(*exp).ok_or_else(|| self.overflow())?;
        }
        terms.retain(|_, exp| *exp != 0);

        let mut dimension = self.dimension;
        for (d, o) in dimension.iter_mut().zip(other.dimension) {
            *d = d.checked_add(o).ok_or_else(|| self.overflow())?;
        }

        self.terms = terms;
        self.dimension = dimension;
        self.scale *= other.scale;
        Ok(())
    }

    pub fn divide(&mut self, other: &Self) -> Result<(), UnitError> {
        self.multiply(&other.powi(-1)?)
    }

    pub fn powi(&self, n: i32) -> Result<Self, UnitError> {
        if n == 0 {
            return Ok(Self::dimensionless());
        }
        let terms = self
            .terms
            .iter()
            .map(|(name, exp)| exp.checked_mul(n).map(|e| (name.clone(), e)).ok_or_else(|| self.overflow()))
            .collect::<Result<BTreeMap<_, _>, _>>()?;
        let mut dimension = self.dimension;
        for d in dimension.iter_mut() {
            *d = d.checked_mul(n).ok_or_else(|| self.overflow())?;
        }
        Ok(Self {
            terms,
            scale: self.scale.powi(n),
            dimension,
        })
    }

    fn overflow(&self) -> UnitError {
        UnitError::ExponentOverflow(self.to_string())
    }

    /// Multiplier taking a magnitude in this unit to coherent SI.
    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn dimension(&self) -> Dimension {
        self.dimension
    }

    pub fn is_dimensionless(&self) -> bool {
        self.dimension == DIMENSIONLESS
    }

    pub fn is_compatible(&self, other: &Unit) -> bool {
        self.dimension == other.dimension
    }

    /// The coherent SI unit with the same dimension.
    pub fn base_unit(&self) -> Unit {
        let mut terms = BTreeMap::new();
        for (name, exp) in BASE_UNITS.iter().zip(self.dimension) {
            if exp != 0 {
                terms.insert(name.to_string(), exp);
            }
        }
        Unit {
            terms,
            scale: 1.0,
            dimension: self.dimension,
        }
    }

    pub fn kind(&self) -> UnitKind {
        if self.is_dimensionless() {
            return UnitKind::Dimensionless;
        }
        let single_base = self.dimension.iter().filter(|d| **d != 0).count() == 1
            && self.dimension.contains(&1);
        if single_base && self.terms.len() == 1 && self.terms.values().all(|exp| *exp == 1) {
            UnitKind::Base
        } else {
            UnitKind::Derived
        }
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (num, den): (Vec<_>, Vec<_>) = self.terms.iter().partition(|(_, exp)| **exp > 0);
        let render = |terms: &[(&String, &i32)]| -> String {
            terms
                .iter()
                .map(|(name, exp)| {
                    if exp.abs() == 1 {
                        name.to_string()
                    } else {
                        format!("{}^{}", name, exp.abs())
                    }
                })
                .collect::<Vec<_>>()
                .join("*")
        };

        match (num.is_empty(), den.is_empty()) {
            (true, true) => f.write_str("dimensionless"),
            (false, true) => f.write_str(&render(&num)),
            (num_empty, false) => {
                let numerator = if num_empty { "1".to_string() } else { render(&num) };
                if den.len() == 1 {
                    write!(f, "{}/{}", numerator, render(&den))
                } else {
                    write!(f, "{}/({})", numerator, render(&den))
                }
            }
        }
    }
}

impl Serialize for Unit {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl std::str::FromStr for Unit {
    type Err = UnitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Unit::parse(s)
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Name(String),
    Int(i32),
    Star,
    Slash,
    Power,
    LParen,
    RParen,
}

fn tokenize(input: &str) -> Result<Vec<Token>, UnitError> {
    let malformed = || UnitError::Malformed(input.to_string());
    let mut tokens = Vec::new();
    let mut chars = input.chars().peekable();
    while let Some(&c) = chars.peek() {
        match c {
            c if c.is_whitespace() => {
                chars.next();
            }
            '*' => {
                chars.next();
                if chars.peek() == Some(&'*') {
                    chars.next();
                    tokens.push(Token::Power);
                } else {
                    tokens.push(Token::Star);
                }
            }
            '^' => {
                chars.next();
                tokens.push(Token::Power);
            }
            '/' => {
                chars.next();
                tokens.push(Token::Slash);
            }
            '(' => {
                chars.next();
                tokens.push(Token::LParen);
            }
            ')' => {
                chars.next();
                tokens.push(Token::RParen);
            }
            c if c.is_ascii_digit() || c == '-' => {
                let mut literal = String::new();
                literal.push(c);
                chars.next();
                while let Some(&d) = chars.peek() {
                    if d.is_ascii_digit() {
                        literal.push(d);
                        chars.next();
                    } else {
                        break;
                    }
                }
                tokens.push(Token::Int(literal.parse().map_err(|_| malformed())?));
            }
            c if c.is_alphabetic() || c == '_' => {
                let mut name = String::new();
                while let Some(&d) = chars.peek() {
                    if d.is_alphanumeric() || d == '_' {
                        name.push(d);
                        chars.next();
                    } else {
                        break;
                    }
                }
                tokens.push(Token::Name(name));
            }
            _ => return Err(malformed()),
        }
    }
    Ok(tokens)
}

struct UnitParser<'a> {
    tokens: Vec<Token>,
    pos: usize,
    source: &'a str,
}

impl UnitParser<'_> {
    fn malformed(&self) -> UnitError {
        UnitError::Malformed(self.source.to_string())
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    /// product := factor (('*' | '/') factor)*
    fn product(&mut self) -> Result<Unit, UnitError> {
        let mut acc = self.factor()?;
        loop {
            match self.tokens.get(self.pos) {
                Some(Token::Star) => {
                    self.pos += 1;
                    let rhs = self.factor()?;
                    acc.multiply(&rhs).map_err(|_| self.malformed())?;
                }
                Some(Token::Slash) => {
                    self.pos += 1;
                    let rhs = self.factor()?;
                    acc.divide(&rhs).map_err(|_| self.malformed())?;
                }
                _ => return Ok(acc),
            }
        }
    }

    /// factor := atom (('**' | '^') int)?
    fn factor(&mut self) -> Result<Unit, UnitError> {
        let base = self.atom()?;
        if self.tokens.get(self.pos) == Some(&Token::Power) {
            self.pos += 1;
            return match self.next() {
                Some(Token::Int(n)) => base.powi(n).map_err(|_| self.malformed()),
                _ => Err(self.malformed()),
            };
        }
        Ok(base)
    }

    fn atom(&mut self) -> Result<Unit, UnitError> {
        match self.next() {
            Some(Token::Name(name)) => Unit::atom(&name),
            Some(Token::Int(1)) => Ok(Unit::dimensionless()),
            Some(Token::LParen) => {
                let inner = self.product()?;
                match self.next() {
                    Some(Token::RParen) => Ok(inner),
                    _ => Err(self.malformed()),
                }
            }
            _ => Err(self.malformed()),
        }
    }
}
