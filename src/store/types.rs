use crate::algebra::{Expr, Relation};
use crate::units::Unit;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolProperties {
    #[serde(default = "default_true")]
    pub real: bool,
    #[serde(default = "default_true")]
    pub positive: bool,
}

fn default_true() -> bool {
    true
}

impl Default for SymbolProperties {
    fn default() -> Self {
        Self { real: true, positive: true }
    }
}

/// What a caller hands to `Registry::add_symbols`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymbolDefinition {
    pub units: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub properties: SymbolProperties,
}

impl SymbolDefinition {
    pub fn new(units: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            units: units.into(),
            description: description.into(),
            properties: SymbolProperties::default(),
        }
    }

    pub fn with_properties(mut self, properties: SymbolProperties) -> Self {
        self.properties = properties;
        self
    }
}

/// A registered quantity. Immutable once stored.
#[derive(Debug, Clone, PartialEq)]
pub struct Symbol {
    pub name: String,
    pub unit: Unit,
    pub description: String,
    pub properties: SymbolProperties,
}

/// Direction hints attached to an equation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EquationMetadata {
    pub output: Option<String>,
    #[serde(default)]
    pub inputs: Vec<String>,
    #[serde(default)]
    pub bidirectional: bool,
}

impl EquationMetadata {
    pub fn output(name: impl Into<String>, inputs: &[&str]) -> Self {
        Self {
            output: Some(name.into()),
            inputs: inputs.iter().map(|s| s.to_string()).collect(),
            bidirectional: false,
        }
    }

    pub fn bidirectional() -> Self {
        Self { bidirectional: true, ..Default::default() }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Equation {
    pub name: String,
    pub relation: Relation,
    pub metadata: EquationMetadata,
    /// Free symbols in order of first appearance, left-hand side first.
    pub symbols: Vec<String>,
}

impl Equation {
    pub fn new(name: impl Into<String>, relation: Relation, metadata: EquationMetadata) -> Self {
        let symbols = relation.symbols_in_order();
        Self { name: name.into(), relation, metadata, symbols }
    }

    pub fn free_symbols(&self) -> BTreeSet<String> {
        self.symbols.iter().cloned().collect()
    }
}

/// "`target` can be computed from `sources` through `expression`."
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubstitutionRule {
    pub target: String,
    pub sources: BTreeSet<String>,
    pub expression: Expr,
    pub priority: i32,
}

impl SubstitutionRule {
    /// Fewer required sources means a cheaper, more specific derivation.
    pub fn default_priority(source_count: usize) -> i32 {
        20 - source_count as i32
    }
}
