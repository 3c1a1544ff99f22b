//! Orchestrates closure, target selection, rewriting and solving for one equation.
use super::bindings::{Bindings, SolveRequest};
use super::error::SolveError;
use super::newton;
use crate::algebra::{solve_for, Assumptions, Expr, Relation};
use crate::analysis::{self, select_target, Selection, SelectionReason};
use crate::catalog::{self, Catalog, CatalogError, LoadReport};
use crate::config::SolverSettings;
use crate::store::{Equation, EquationMetadata, Registry, RuleIndex, StoreError, SymbolDefinition};
use crate::units::{Quantity, Unit};
use log::debug;
use rayon::prelude::*;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SolveMethod {
    Symbolic,
    Numeric,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AppliedDerivation {
    pub symbol: String,
    pub expression: Expr,
}

/// Everything that went into one solve, for tracing and serialization.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SolveReport {
    pub equation: String,
    pub target: String,
    pub reason: SelectionReason,
    /// Derivations substituted into the equation, in the order they were found.
    pub derivations: Vec<AppliedDerivation>,
    pub rewritten: Relation,
    pub substituted: Relation,
    pub method: SolveMethod,
    pub solution: Expr,
    pub value: Quantity,
}

/// Equation solver over a symbol table, an equation registry and a rule index.
///
/// Set up first (symbols, equations, rules), then solve. Solving takes `&self`
/// and can run from many threads at once.
#[derive(Debug, Clone, Default)]
pub struct EquationSolver {
    registry: Registry,
    rules: RuleIndex,
    settings: SolverSettings,
}

impl EquationSolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_settings(settings: SolverSettings) -> Self {
        Self { settings, ..Default::default() }
    }

    pub fn settings(&self) -> &SolverSettings {
        &self.settings
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn rules(&self) -> &RuleIndex {
        &self.rules
    }

    pub fn rule_cycles(&self) -> Vec<Vec<String>> {
        analysis::rule_cycles(&self.rules)
    }

    pub fn add_symbols<'a, I>(&mut self, definitions: I) -> Result<(), StoreError>
    where
        I: IntoIterator<Item = (&'a str, &'a SymbolDefinition)>,
    {
        self.registry.add_symbols(definitions)
    }

    pub fn add_equation(&mut self, name: &str, relation: Relation, metadata: EquationMetadata) -> Result<(), StoreError> {
        self.registry.add_equation(name, relation, metadata).map(|_| ())
    }

    pub fn add_equation_str(&mut self, name: &str, expression: &str, metadata: EquationMetadata) -> Result<(), StoreError> {
        self.registry.add_equation_str(name, expression, metadata).map(|_| ())
    }

    /// See [`RuleIndex::add_rule`]. Returns `false` if the rule was refused.
    pub fn add_substitution_rule<I, S>(&mut self, target: &str, sources: I, expression: Expr, priority: Option<i32>) -> bool
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.rules.add_rule(target, sources, expression, priority)
    }

    pub fn load_from_catalog(&mut self, catalog: &Catalog, domains: &[&str]) -> Result<LoadReport, CatalogError> {
        catalog::load(catalog, &mut self.registry, &mut self.rules, domains)
    }

    /// Loads domains of the built-in catalog; an empty list loads all of them.
    pub fn load_builtin(&mut self, domains: &[&str]) -> Result<LoadReport, CatalogError> {
        let catalog = Catalog::builtin()?;
        if domains.is_empty() {
            let all: Vec<&str> = catalog.domain_names().collect();
            return self.load_from_catalog(&catalog, &all);
        }
        self.load_from_catalog(&catalog, domains)
    }

    pub fn solve(&self, equation: &str, bindings: &Bindings) -> Result<Quantity, SolveError> {
        self.solve_with_report(equation, bindings).map(|report| report.value)
    }

    /// Solves independent requests in parallel.
    pub fn solve_batch(&self, requests: &[SolveRequest]) -> Vec<Result<Quantity, SolveError>> {
        requests
            .par_iter()
            .map(|request| self.solve(&request.equation, &request.bindings))
            .collect()
    }

    pub fn solve_with_report(&self, name: &str, bindings: &Bindings) -> Result<SolveReport, SolveError> {
        let equation = self
            .registry
            .equation(name)
            .ok_or_else(|| SolveError::UnknownEquation(name.to_string()))?;

        let knowns = self.base_values(bindings)?;
        let known_names: BTreeSet<String> = knowns.keys().cloned().collect();
        let closure = analysis::resolve(
            &self.rules,
            &known_names,
            &equation.free_symbols(),
            self.settings.closure_iteration_limit,
        );

        let selection = self.choose_target(equation, &known_names, &closure)?;
        let target = selection.symbol.as_str();
        debug!("Solving '{}' for '{}' ({})", name, target, selection.reason);

        let mut derivations: BTreeMap<String, Expr> = closure.derivations.clone();
        derivations.remove(target);
        let rewritten = self.rewrite(&equation.relation, &derivations);
        let substituted = rewritten.substitute_values(&knowns);

        let positive = self
            .registry
            .symbol(target)
            .map_or(true, |symbol| symbol.properties.positive);
        let (solution, method) = self
            .first_solution(&substituted, target, positive)
            .ok_or_else(|| SolveError::NoSolution {
                equation: name.to_string(),
                target: target.to_string(),
                rewritten: rewritten.clone(),
                knowns: knowns.clone(),
            })?;

        let value = match solution.evaluate() {
            Ok(v) => v,
            Err(_) => solution.simplify().evaluate().map_err(|source| SolveError::NumericEvaluation {
                equation: name.to_string(),
                target: target.to_string(),
                expression: solution.clone(),
                source,
            })?,
        };

        let unit = self
            .registry
            .symbol(target)
            .map(|symbol| symbol.unit.clone())
            .unwrap_or_else(Unit::dimensionless);

        let applied = closure
            .order
            .iter()
            .filter(|symbol| derivations.contains_key(*symbol))
            .map(|symbol| AppliedDerivation {
                symbol: symbol.clone(),
                expression: derivations[symbol].clone(),
            })
            .collect();

        Ok(SolveReport {
            equation: name.to_string(),
            target: target.to_string(),
            reason: selection.reason,
            derivations: applied,
            rewritten,
            substituted,
            method,
            solution,
            value: Quantity::from_base(value, unit),
        })
    }

    /// Binding magnitudes in coherent SI, checked against registered units.
    fn base_values(&self, bindings: &Bindings) -> Result<BTreeMap<String, f64>, SolveError> {
        let mut values = BTreeMap::new();
        for (name, quantity) in bindings {
            if let Some(symbol) = self.registry.symbol(name) {
                if !quantity.unit.is_compatible(&symbol.unit) {
                    return Err(SolveError::IncompatibleUnit {
                        symbol: name.clone(),
                        expected: symbol.unit.to_string(),
                        found: quantity.unit.to_string(),
                    });
                }
            }
            values.insert(name.clone(), quantity.base_magnitude());
        }
        Ok(values)
    }

    fn choose_target(
        &self,
        equation: &Equation,
        known: &BTreeSet<String>,
        closure: &analysis::Closure,
    ) -> Result<Selection, SolveError> {
        let missing: Vec<String> = equation
            .symbols
            .iter()
            .filter(|s| !known.contains(*s) && !closure.is_derived(s))
            .cloned()
            .collect();

        match missing.len() {
            0 => {
                let mut candidates: Vec<String> = equation
                    .symbols
                    .iter()
                    .filter(|s| !known.contains(*s))
                    .cloned()
                    .collect();
                if candidates.len() == 1 {
                    return Ok(Selection {
                        symbol: candidates.remove(0),
                        reason: SelectionReason::OnlyUnknown,
                    });
                }
                select_target(
                    &equation.name,
                    &candidates,
                    &closure.derivations,
                    &equation.metadata,
                    |symbol| self.registry.symbol(symbol).map(|s| s.unit.kind()),
                )
                .ok_or_else(|| SolveError::UnresolvableTarget {
                    equation: equation.name.clone(),
                })
            }
            1 => Ok(Selection {
                symbol: missing[0].clone(),
                reason: SelectionReason::OnlyUnknown,
            }),
            _ => Err(SolveError::Underdetermined {
                equation: equation.name.clone(),
                missing,
                available: closure.order.clone(),
            }),
        }
    }

    /// Substitutes derivations until the relation stops changing or the pass limit is hit.
    fn rewrite(&self, relation: &Relation, derivations: &BTreeMap<String, Expr>) -> Relation {
        let mut current = relation.clone();
        for _ in 0..self.settings.rewrite_pass_limit {
            let next = current.substitute_all(derivations);
            if next == current {
                break;
            }
            current = next;
        }
        current
    }

    fn first_solution(&self, relation: &Relation, target: &str, positive: bool) -> Option<(Expr, SolveMethod)> {
        if let Some(expr) = solve_for(relation, target, Assumptions { positive }).into_iter().next() {
            return Some((expr, SolveMethod::Symbolic));
        }

        let free = relation.free_symbols();
        if relation.occurrences(target) > 1 && free.len() == 1 && free.contains(target) {
            match newton::find_root(&relation.residual(), target, positive, &self.settings.newton) {
                Ok(root) => return Some((Expr::number(root), SolveMethod::Numeric)),
                Err(e) => debug!("Numeric fallback for '{}' failed: {}", target, e),
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    fn q(magnitude: f64, unit: &str) -> Quantity {
        Quantity::with_unit(magnitude, unit).unwrap()
    }

    fn builtin() -> EquationSolver {
        let mut solver = EquationSolver::new();
        let report = solver.load_builtin(&[]).unwrap();
        assert!(report.is_clean(), "{:?}", report.issues);
        solver
    }

    fn close(a: f64, b: f64, tol: f64) -> bool {
        (a - b).abs() <= tol * b.abs().max(1.0)
    }

    #[test_log::test]
    fn test_circle_area_round_trip() {
        let solver = builtin();
        let area = solver.solve("circle_area", &Bindings::new().with("r", q(0.5, "m"))).unwrap();
        assert!(close(area.magnitude, 0.7854, 1e-3));
        assert_eq!(area.unit.to_string(), "meter^2");

        let radius = solver
            .solve("circle_area", &Bindings::new().with("A", q(0.7854, "meter**2")))
            .unwrap();
        assert!(close(radius.magnitude, 0.5, 1e-3));
        assert_eq!(radius.unit.to_string(), "meter");
    }

    #[test_log::test]
    fn test_single_hop_substitution_matches_direct_area() {
        let solver = builtin();
        let via_radius = solver
            .solve("force", &Bindings::new().with("P", q(100.0, "Pa")).with("r", q(0.5, "m")))
            .unwrap();
        let via_area = solver
            .solve("force", &Bindings::new().with("P", q(100.0, "Pa")).with("A", q(PI * 0.25, "m**2")))
            .unwrap();
        assert!(close(via_radius.magnitude, via_area.magnitude, 1e-12));
        assert!(close(via_radius.magnitude, 25.0 * PI, 1e-12));
        assert_eq!(via_radius.unit.to_string(), "newton");

        // F and A are both derivable here, so the unit kind decides.
        let report = solver
            .solve_with_report("force", &Bindings::new().with("P", q(100.0, "Pa")).with("r", q(0.5, "m")))
            .unwrap();
        assert_eq!(report.target, "F");
        assert_eq!(report.reason, SelectionReason::DerivedUnit);
    }

    #[test_log::test]
    fn test_multi_hop_drag() {
        let solver = builtin();
        let bindings = Bindings::new()
            .with("rho", q(1.225, "kg/m**3"))
            .with("C_D", Quantity::dimensionless(0.47))
            .with("l", q(2.0, "m"))
            .with("w", q(1.0, "m"))
            .with("v", q(20.0, "m/s"));
        let report = solver.solve_with_report("drag", &bindings).unwrap();
        assert_eq!(report.target, "F_D");
        assert_eq!(report.reason, SelectionReason::DeclaredOutput);
        assert_eq!(report.derivations[0].symbol, "A");
        assert_eq!(report.derivations[0].expression.to_string(), "l*w");
        let expected = 0.5 * 1.225 * 0.47 * 2.0 * 20.0 * 20.0;
        assert!(close(report.value.magnitude, expected, 1e-12));
    }

    #[test_log::test]
    fn test_fewer_sources_rule_wins_when_both_apply() {
        let solver = builtin();
        let bindings = Bindings::new()
            .with("P", q(100.0, "Pa"))
            .with("l", q(2.0, "m"))
            .with("w", q(3.0, "m"))
            .with("r", q(0.5, "m"));
        let force = solver.solve("force", &bindings).unwrap();
        assert!(close(force.magnitude, 100.0 * PI * 0.25, 1e-12));
        assert!(!close(force.magnitude, 600.0, 1e-3));
    }

    #[test_log::test]
    fn test_no_knowns_is_underdetermined() {
        let solver = builtin();
        match solver.solve("force", &Bindings::new()) {
            Err(SolveError::Underdetermined { equation, missing, .. }) => {
                assert_eq!(equation, "force");
                assert_eq!(missing, vec!["F", "P", "A"]);
            }
            other => panic!("expected Underdetermined, got {:?}", other),
        }
    }

    #[test_log::test]
    fn test_cyclic_rules_terminate() {
        let mut solver = EquationSolver::new();
        let defs = [
            ("X", SymbolDefinition::new("meter", "")),
            ("Y", SymbolDefinition::new("meter", "")),
            ("Z", SymbolDefinition::new("meter**2", "")),
        ];
        solver.add_symbols(defs.iter().map(|(n, d)| (*n, d))).unwrap();
        solver.add_equation_str("product", "Z = X * Y", EquationMetadata::default()).unwrap();
        assert!(solver.add_substitution_rule("X", ["Y"], Expr::symbol("Y"), None));
        assert!(solver.add_substitution_rule("Y", ["X"], Expr::symbol("X"), None));
        assert_eq!(solver.rule_cycles(), vec![vec!["X".to_string(), "Y".to_string()]]);

        let err = solver
            .solve("product", &Bindings::new().with("Z", q(4.0, "m**2")))
            .unwrap_err();
        assert!(matches!(err, SolveError::Underdetermined { ref missing, .. } if missing == &["X", "Y"]));
    }

    #[test]
    fn test_unknown_equation() {
        let solver = EquationSolver::new();
        assert_eq!(
            solver.solve("nope", &Bindings::new()).unwrap_err(),
            SolveError::UnknownEquation("nope".into())
        );
    }

    #[test_log::test]
    fn test_non_coherent_units_convert_both_ways() {
        let mut solver = EquationSolver::new();
        let defs = [
            ("d", SymbolDefinition::new("millimeter", "Diameter")),
            ("r", SymbolDefinition::new("meter", "Radius")),
        ];
        solver.add_symbols(defs.iter().map(|(n, d)| (*n, d))).unwrap();
        solver.add_equation_str("diameter", "d = 2 * r", EquationMetadata::default()).unwrap();

        let d = solver.solve("diameter", &Bindings::new().with("r", q(5.0, "cm"))).unwrap();
        assert!(close(d.magnitude, 100.0, 1e-12));
        assert_eq!(d.unit.to_string(), "millimeter");
    }

    #[test]
    fn test_incompatible_binding_unit() {
        let solver = builtin();
        let err = solver
            .solve("circle_area", &Bindings::new().with("r", q(2.0, "s")))
            .unwrap_err();
        assert_eq!(
            err,
            SolveError::IncompatibleUnit {
                symbol: "r".into(),
                expected: "meter".into(),
                found: "second".into(),
            }
        );
    }

    #[test_log::test]
    fn test_positive_symbols_reject_negative_results() {
        let solver = builtin();
        let bindings = Bindings::new().with("A", q(2.0, "m**2")).with("l", q(-1.0, "m"));
        let err = solver.solve("rectangle_area", &bindings).unwrap_err();
        match err {
            SolveError::NoSolution { target, rewritten, knowns, .. } => {
                assert_eq!(target, "w");
                assert_eq!(rewritten.to_string(), "A = l*w");
                assert_eq!(knowns["l"], -1.0);
            }
            other => panic!("expected NoSolution, got {:?}", other),
        }
    }

    #[test_log::test]
    fn test_imaginary_result_is_a_numeric_failure() {
        let solver = builtin();
        let err = solver
            .solve("circle_area", &Bindings::new().with("A", q(-1.0, "m**2")))
            .unwrap_err();
        assert!(matches!(err, SolveError::NumericEvaluation { ref target, .. } if target == "r"), "{}", err);
    }

    #[test_log::test]
    fn test_numeric_fallback_for_repeated_target() {
        let mut solver = EquationSolver::new();
        let defs = [
            ("x", SymbolDefinition::new("dimensionless", "")),
            ("y", SymbolDefinition::new("dimensionless", "")),
        ];
        solver.add_symbols(defs.iter().map(|(n, d)| (*n, d))).unwrap();
        solver.add_equation_str("poly", "y = x * x + x", EquationMetadata::default()).unwrap();

        let report = solver
            .solve_with_report("poly", &Bindings::new().with("y", Quantity::dimensionless(12.0)))
            .unwrap();
        assert_eq!(report.method, SolveMethod::Numeric);
        assert!(close(report.value.magnitude, 3.0, 1e-9));
    }

    #[test_log::test]
    fn test_single_unsupplied_symbol_skips_the_heuristic() {
        // A is derivable from r, but it is the only symbol left to solve for.
        let solver = builtin();
        let bindings = Bindings::new()
            .with("F", q(50.0, "N"))
            .with("P", q(100.0, "Pa"))
            .with("r", q(0.5, "m"));
        let report = solver.solve_with_report("force", &bindings).unwrap();
        assert_eq!(report.target, "A");
        assert_eq!(report.reason, SelectionReason::OnlyUnknown);
        assert!(close(report.value.magnitude, 0.5, 1e-12));
        assert!(report.derivations.is_empty());
    }

    #[test_log::test]
    fn test_rewrite_follows_chained_derivations() {
        let solver = builtin();
        let bindings = Bindings::new().with("P", q(100.0, "Pa")).with("d", q(1.0, "m"));
        let report = solver.solve_with_report("force", &bindings).unwrap();
        assert_eq!(report.target, "F");
        let chain: Vec<_> = report.derivations.iter().map(|d| d.symbol.as_str()).collect();
        assert_eq!(chain, vec!["r", "A"]);
        assert_eq!(report.rewritten.to_string(), "F = P*pi*(d/2)**2");
        assert!(close(report.value.magnitude, 25.0 * PI, 1e-12));
    }

    #[test_log::test]
    fn test_radius_from_area_feeds_diameter() {
        let solver = builtin();
        let report = solver
            .solve_with_report("diameter", &Bindings::new().with("A", q(0.7854, "m**2")))
            .unwrap();
        assert_eq!(report.target, "d");
        assert_eq!(report.derivations[0].symbol, "r");
        assert!(close(report.value.magnitude, 1.0, 1e-3));
    }

    #[test]
    fn test_fully_supplied_equation_has_no_target() {
        let solver = builtin();
        let bindings = Bindings::new().with("A", q(0.7854, "m**2")).with("r", q(0.5, "m"));
        assert_eq!(
            solver.solve("circle_area", &bindings).unwrap_err(),
            SolveError::UnresolvableTarget { equation: "circle_area".into() }
        );
    }

    #[test_log::test]
    fn test_numeric_fallback_with_negative_initial_guess_terminates() {
        let settings = SolverSettings::from_json_str(r#"{"newton": {"initial_guess": -10.0}}"#).unwrap();
        let mut solver = EquationSolver::with_settings(settings);
        let defs = [
            ("x", SymbolDefinition::new("dimensionless", "")),
            ("y", SymbolDefinition::new("dimensionless", "")),
        ];
        solver.add_symbols(defs.iter().map(|(n, d)| (*n, d))).unwrap();
        solver.add_equation_str("poly", "y = x * x + x", EquationMetadata::default()).unwrap();

        let x = solver
            .solve("poly", &Bindings::new().with("y", Quantity::dimensionless(12.0)))
            .unwrap();
        assert!(close(x.magnitude, 3.0, 1e-9));
    }

    #[test_log::test]
    fn test_batch_matches_sequential() {
        let solver = builtin();
        let requests: Vec<SolveRequest> = (1..=8)
            .map(|i| SolveRequest::new("circle_area", Bindings::new().with("r", q(i as f64, "m"))))
            .collect();
        let results = solver.solve_batch(&requests);
        assert_eq!(results.len(), 8);
        for (i, result) in results.into_iter().enumerate() {
            let r = (i + 1) as f64;
            assert!(close(result.unwrap().magnitude, PI * r * r, 1e-12));
        }
        assert!(solver.solve_batch(&[SolveRequest::new("missing", Bindings::new())])[0].is_err());
    }

    #[test]
    fn test_report_serializes() {
        let solver = builtin();
        let report = solver
            .solve_with_report("circle_area", &Bindings::new().with("r", q(0.5, "m")))
            .unwrap();
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["target"], "A");
        assert_eq!(json["rewritten"], "A = pi*r**2");
        assert_eq!(json["value"]["unit"], "meter^2");
    }
}
