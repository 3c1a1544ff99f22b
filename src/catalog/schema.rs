//! Serde model of the equation catalog.
use super::error::CatalogError;
use crate::store::{EquationMetadata, SymbolDefinition};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

const BUILTIN_CATALOG: &str = include_str!("../../data/catalog.json");

/// Domains of symbols and equations, e.g. `geometry`, `mechanics`, `fluids`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    pub domains: BTreeMap<String, DomainSpec>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DomainSpec {
    #[serde(default)]
    pub symbols: BTreeMap<String, SymbolSpec>,
    #[serde(default)]
    pub equations: BTreeMap<String, EquationSpec>,
}

pub type SymbolSpec = SymbolDefinition;

/// Either a bare `"lhs = rhs"` string or an object with direction hints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EquationSpec {
    Expression(String),
    Detailed(DetailedEquation),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DetailedEquation {
    pub expression: String,
    #[serde(default)]
    pub output: Option<String>,
    #[serde(default)]
    pub inputs: Option<Vec<String>>,
    #[serde(default)]
    pub bidirectional: bool,
}

impl EquationSpec {
    pub fn expression(&self) -> &str {
        match self {
            EquationSpec::Expression(text) => text,
            EquationSpec::Detailed(detail) => &detail.expression,
        }
    }

    pub fn metadata(&self) -> EquationMetadata {
        match self {
            EquationSpec::Expression(_) => EquationMetadata::default(),
            EquationSpec::Detailed(detail) => EquationMetadata {
                output: detail.output.clone(),
                inputs: detail.inputs.clone().unwrap_or_default(),
                bidirectional: detail.bidirectional,
            },
        }
    }
}

impl Catalog {
    pub fn from_json_str(json: &str) -> Result<Self, CatalogError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&text)
    }

    /// The geometry, mechanics and fluids catalog shipped with the crate.
    pub fn builtin() -> Result<Self, CatalogError> {
        Self::from_json_str(BUILTIN_CATALOG)
    }

    pub fn domain_names(&self) -> impl Iterator<Item = &str> {
        self.domains.keys().map(String::as_str)
    }

    pub fn domain(&self, name: &str) -> Option<&DomainSpec> {
        self.domains.get(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_catalog_parses() {
        let catalog = Catalog::builtin().unwrap();
        assert_eq!(catalog.domain_names().collect::<Vec<_>>(), vec!["fluids", "geometry", "mechanics"]);

        let geometry = catalog.domain("geometry").unwrap();
        assert_eq!(geometry.symbols["rho"].units, "kilogram/meter**3");
        assert!(geometry.symbols["r"].properties.positive);

        let circle = &geometry.equations["circle_area"];
        assert_eq!(circle.expression(), "A = pi * r**2");
        assert_eq!(circle.metadata(), EquationMetadata::bidirectional());
        assert_eq!(geometry.equations["rectangle_area"].metadata(), EquationMetadata::output("A", &["l", "w"]));
        assert!(catalog.domain("mechanics").unwrap().symbols.contains_key("sigma_allow"));
    }

    #[test]
    fn test_bare_string_equation() {
        let catalog = Catalog::from_json_str(
            r#"{"domains": {"misc": {"symbols": {"x": {"units": "meter"}}, "equations": {"double": "y = 2 * x"}}}}"#,
        )
        .unwrap();
        let spec = &catalog.domains["misc"].equations["double"];
        assert_eq!(spec, &EquationSpec::Expression("y = 2 * x".into()));
        assert_eq!(spec.metadata(), EquationMetadata::default());
        assert_eq!(catalog.domains["misc"].symbols["x"].description, "");
    }

    #[test]
    fn test_unknown_metadata_key_is_rejected() {
        let json = r#"{"domains": {"misc": {"equations": {"e1": {"expression": "y = x", "direction": "forward"}}}}}"#;
        assert!(matches!(Catalog::from_json_str(json), Err(CatalogError::Json(_))));
    }
}
