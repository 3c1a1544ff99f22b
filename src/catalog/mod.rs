//! Equation catalog: schema, loading and rule auto-detection.
pub mod detect;
pub mod error;
pub mod schema;

pub use detect::{detect_rules, rule_candidates, DetectionOutcome, RuleCandidate};
pub use error::CatalogError;
pub use schema::{Catalog, DetailedEquation, DomainSpec, EquationSpec, SymbolSpec};

use crate::store::{Registry, RuleIndex};
use log::{debug, warn};
use serde::Serialize;
use std::fmt::Display;

/// A catalog entry that could not be loaded. Loading carries on without it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CatalogIssue {
    pub domain: String,
    pub entry: String,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LoadReport {
    pub domains: Vec<String>,
    pub symbols_added: usize,
    pub equations_added: usize,
    pub rules_added: usize,
    /// Rule candidates whose target could not be isolated.
    pub skipped_candidates: usize,
    pub issues: Vec<CatalogIssue>,
}

impl LoadReport {
    fn issue(&mut self, domain: &str, entry: &str, error: impl Display) {
        warn!("Catalog domain '{}': skipping '{}': {}", domain, entry, error);
        self.issues.push(CatalogIssue {
            domain: domain.to_string(),
            entry: entry.to_string(),
            message: error.to_string(),
        });
    }

    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }
}

/// Loads the named domains into `registry` and derives rules for the new equations.
///
/// Symbols of every requested domain are registered before any equation, so
/// an equation may use symbols declared by another requested domain. An
/// unknown domain name aborts before anything is touched; any other problem
/// only skips the offending entry and is recorded in the report.
pub fn load(
    catalog: &Catalog,
    registry: &mut Registry,
    rules: &mut RuleIndex,
    domains: &[&str],
) -> Result<LoadReport, CatalogError> {
    let specs = domains
        .iter()
        .map(|name| {
            catalog
                .domain(name)
                .map(|spec| (*name, spec))
                .ok_or_else(|| CatalogError::UnknownDomain(name.to_string()))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let mut report = LoadReport {
        domains: domains.iter().map(|d| d.to_string()).collect(),
        ..Default::default()
    };

    for (domain, spec) in &specs {
        for (name, definition) in &spec.symbols {
            match registry.add_symbol(name, definition) {
                Ok(true) => report.symbols_added += 1,
                Ok(false) => {}
                Err(e) => report.issue(domain, name, e),
            }
        }
    }

    let mut added = Vec::new();
    for (domain, spec) in &specs {
        for (name, equation) in &spec.equations {
            match registry.add_equation_str(name, equation.expression(), equation.metadata()) {
                Ok(_) => added.push(name.as_str()),
                Err(e) => report.issue(domain, name, e),
            }
        }
    }
    report.equations_added = added.len();

    for name in added {
        let Some(equation) = registry.equation(name) else {
            continue;
        };
        for outcome in detect_rules(equation, registry) {
            match outcome {
                DetectionOutcome::Rule(rule) => {
                    if rules.insert(rule) {
                        report.rules_added += 1;
                    }
                }
                DetectionOutcome::NoSolution { .. } => report.skipped_candidates += 1,
            }
        }
    }

    debug!(
        "Loaded {:?}: {} symbols, {} equations, {} rules, {} issues",
        report.domains,
        report.symbols_added,
        report.equations_added,
        report.rules_added,
        report.issues.len()
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn load_builtin(domains: &[&str]) -> (Registry, RuleIndex, LoadReport) {
        let catalog = Catalog::builtin().unwrap();
        let mut registry = Registry::new();
        let mut rules = RuleIndex::new();
        let report = load(&catalog, &mut registry, &mut rules, domains).unwrap();
        (registry, rules, report)
    }

    #[test_log::test]
    fn test_full_builtin_load_is_clean() {
        let (registry, rules, report) = load_builtin(&["geometry", "mechanics", "fluids"]);
        assert!(report.is_clean(), "{:?}", report.issues);
        assert_eq!(report.equations_added, 22);
        // b and h are declared by geometry and mechanics, L by geometry and fluids.
        assert_eq!(report.symbols_added, 34);
        assert_eq!(registry.symbol_count(), 34);
        assert_eq!(report.skipped_candidates, 0);
        assert_eq!(report.rules_added, rules.len());

        let area_sources: Vec<_> = rules.rules_for("A").iter().map(|r| r.sources.len()).collect();
        assert!(area_sources.windows(2).all(|w| w[0] <= w[1]));
        let radius: Vec<_> = rules.rules_for("r").iter().map(|r| r.expression.to_string()).collect();
        assert_eq!(radius, vec!["sqrt(A/pi)", "d/2"]);
        assert_eq!(rules.rules_for("sigma_allow").len(), 1);
    }

    #[test_log::test]
    fn test_missing_cross_domain_symbol_is_an_issue() {
        // Mechanics on its own lacks A, d, rho and L, which geometry declares.
        let (registry, _, report) = load_builtin(&["mechanics"]);
        let entries: Vec<_> = report.issues.iter().map(|i| i.entry.as_str()).collect();
        assert_eq!(entries, vec!["beam_deflection", "drag", "force", "kessel", "stress"]);
        assert!(report.issues[0].message.contains("'L'"));
        assert!(registry.equation("sigma_allow").is_some());
        assert!(registry.equation("force").is_none());
    }

    #[test_log::test]
    fn test_oversized_unit_exponent_is_an_issue() {
        let catalog = Catalog::from_json_str(
            r#"{"domains": {"lab": {
                "symbols": {"x": {"units": "meter"}, "y": {"units": "(meter**50000)**50000"}},
                "equations": {"twice": "x = 2 * x"}
            }}}"#,
        )
        .unwrap();
        let mut registry = Registry::new();
        let mut rules = RuleIndex::new();
        let report = load(&catalog, &mut registry, &mut rules, &["lab"]).unwrap();
        assert_eq!(report.issues.len(), 1);
        assert_eq!(report.issues[0].entry, "y");
        assert_eq!(report.symbols_added, 1);
        assert_eq!(report.equations_added, 1);
    }

    #[test]
    fn test_unknown_domain_aborts_before_mutation() {
        let catalog = Catalog::builtin().unwrap();
        let mut registry = Registry::new();
        let mut rules = RuleIndex::new();
        let err = load(&catalog, &mut registry, &mut rules, &["geometry", "optics"]).unwrap_err();
        assert!(matches!(err, CatalogError::UnknownDomain(ref d) if d == "optics"));
        assert_eq!(registry.symbol_count(), 0);
        assert!(rules.is_empty());
    }

    #[test_log::test]
    fn test_bad_entries_are_skipped_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"domains": {{"lab": {{
                "symbols": {{
                    "x": {{"units": "meter"}},
                    "y": {{"units": "meter**2"}},
                    "z": {{"units": "furlong"}}
                }},
                "equations": {{
                    "square": {{"expression": "y = x**2", "output": "y", "inputs": ["x"]}},
                    "broken": "y = x +",
                    "uses_z": "z = x"
                }}
            }}}}}}"#
        )
        .unwrap();

        let catalog = Catalog::from_path(file.path()).unwrap();
        let mut registry = Registry::new();
        let mut rules = RuleIndex::new();
        let report = load(&catalog, &mut registry, &mut rules, &["lab"]).unwrap();

        let entries: Vec<_> = report.issues.iter().map(|i| i.entry.as_str()).collect();
        assert_eq!(entries, vec!["z", "broken", "uses_z"]);
        assert_eq!(report.equations_added, 1);
        assert_eq!(rules.rules_for("y").len(), 1);
    }

    #[test]
    fn test_missing_file() {
        let err = Catalog::from_path("/nonexistent/catalog.json").unwrap_err();
        assert!(matches!(err, CatalogError::Io { .. }));
    }
}
