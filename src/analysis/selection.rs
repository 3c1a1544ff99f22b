//! Choosing the unknown to solve for when the closure leaves no gap.
use crate::algebra::Expr;
use crate::store::EquationMetadata;
use crate::units::UnitKind;
use log::warn;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SelectionReason {
    /// Only one equation symbol was left to solve for.
    OnlyUnknown,
    NoDerivation,
    DeclaredOutput,
    DerivedUnit,
    FirstCandidate,
}

impl fmt::Display for SelectionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            SelectionReason::OnlyUnknown => "only unknown symbol",
            SelectionReason::NoDerivation => "no derivation available",
            SelectionReason::DeclaredOutput => "declared output",
            SelectionReason::DerivedUnit => "derived unit",
            SelectionReason::FirstCandidate => "first candidate",
        };
        f.write_str(text)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Selection {
    pub symbol: String,
    pub reason: SelectionReason,
}

impl Selection {
    fn new(symbol: &str, reason: SelectionReason) -> Self {
        Self { symbol: symbol.to_string(), reason }
    }
}

/// Picks the target among `candidates` (equation symbols not supplied by the
/// caller, in order of appearance). First match wins:
/// 1. a candidate with no derivation,
/// 2. the declared `output`,
/// 3. a candidate whose unit is `UnitKind::Derived`,
/// 4. the first candidate.
///
/// Returns `None` only when `candidates` is empty.
pub fn select_target<F>(
    equation: &str,
    candidates: &[String],
    derivations: &BTreeMap<String, Expr>,
    metadata: &EquationMetadata,
    unit_kind_of: F,
) -> Option<Selection>
where
    F: Fn(&str) -> Option<UnitKind>,
{
    let first = candidates.first()?;

    if let Some(symbol) = candidates.iter().find(|c| !derivations.contains_key(*c)) {
        return Some(Selection::new(symbol, SelectionReason::NoDerivation));
    }

    if let Some(output) = &metadata.output {
        if candidates.contains(output) {
            return Some(Selection::new(output, SelectionReason::DeclaredOutput));
        }
    }

    let derived = candidates
        .iter()
        .find(|c| unit_kind_of(c.as_str()) == Some(UnitKind::Derived));
    if let Some(symbol) = derived {
        if candidates.len() > 1 {
            warn!(
                "Equation '{}': picked '{}' among {:?} by unit kind; declare an `output` to make this explicit",
                equation, symbol, candidates
            );
        }
        return Some(Selection::new(symbol, SelectionReason::DerivedUnit));
    }

    Some(Selection::new(first, SelectionReason::FirstCandidate))
}
