//! Derivation rules inferred from an equation and its direction hints.
use crate::algebra::{solve_for, Assumptions};
use crate::store::{Equation, Registry, SubstitutionRule};
use log::debug;
use std::collections::BTreeSet;

/// A (target, sources) pair worth trying to solve for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleCandidate {
    pub target: String,
    pub sources: BTreeSet<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DetectionOutcome {
    Rule(SubstitutionRule),
    NoSolution { target: String },
}

/// Candidates for `equation`:
/// - `bidirectional`: every symbol, the others as sources;
/// - `output` with `inputs`: that single direction;
/// - otherwise every symbol, provided the equation has at least two.
pub fn rule_candidates(equation: &Equation) -> Vec<RuleCandidate> {
    let meta = &equation.metadata;
    if !meta.bidirectional {
        if let Some(output) = &meta.output {
            if !meta.inputs.is_empty() {
                return vec![RuleCandidate {
                    target: output.clone(),
                    sources: meta.inputs.iter().cloned().collect(),
                }];
            }
        }
        if equation.symbols.len() < 2 {
            return Vec::new();
        }
    }

    equation
        .symbols
        .iter()
        .map(|target| RuleCandidate {
            target: target.clone(),
            sources: equation.symbols.iter().filter(|s| *s != target).cloned().collect(),
        })
        .collect()
}

/// Solves `equation` for the candidate's target; the first solution becomes the rule.
///
/// Symbols the solution mentions beyond the declared sources are added to them,
/// so that a rule never fires before its expression can be evaluated.
pub fn detect(equation: &Equation, candidate: &RuleCandidate, assumptions: Assumptions) -> DetectionOutcome {
    let solutions = solve_for(&equation.relation, &candidate.target, assumptions);
    let Some(expression) = solutions.into_iter().next() else {
        debug!(
            "Equation '{}': no closed form for '{}', skipping rule",
            equation.name, candidate.target
        );
        return DetectionOutcome::NoSolution {
            target: candidate.target.clone(),
        };
    };

    let mut sources = candidate.sources.clone();
    sources.extend(expression.free_symbols());
    sources.remove(&candidate.target);
    let priority = SubstitutionRule::default_priority(sources.len());
    DetectionOutcome::Rule(SubstitutionRule {
        target: candidate.target.clone(),
        sources,
        expression,
        priority,
    })
}

/// Runs every candidate of `equation`, using each target's registered properties.
pub fn detect_rules(equation: &Equation, registry: &Registry) -> Vec<DetectionOutcome> {
    rule_candidates(equation)
        .iter()
        .map(|candidate| {
            let positive = registry
                .symbol(&candidate.target)
                .map_or(true, |symbol| symbol.properties.positive);
            detect(equation, candidate, Assumptions { positive })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algebra::{parse_relation, OpenNamespace};
    use crate::store::EquationMetadata;

    fn equation(text: &str, metadata: EquationMetadata) -> Equation {
        Equation::new("eq", parse_relation(text, &OpenNamespace).unwrap(), metadata)
    }

    fn targets(candidates: &[RuleCandidate]) -> Vec<&str> {
        candidates.iter().map(|c| c.target.as_str()).collect()
    }

    #[test]
    fn test_output_and_inputs_give_one_candidate() {
        let eq = equation("A = pi * r**2", EquationMetadata::output("A", &["r"]));
        let candidates = rule_candidates(&eq);
        assert_eq!(targets(&candidates), vec!["A"]);
        assert_eq!(candidates[0].sources.len(), 1);
    }

    #[test]
    fn test_bidirectional_and_fallback_try_every_symbol() {
        let bi = equation("d = 2 * r", EquationMetadata::bidirectional());
        assert_eq!(targets(&rule_candidates(&bi)), vec!["d", "r"]);

        let plain = equation("F = P * A", EquationMetadata::default());
        let candidates = rule_candidates(&plain);
        assert_eq!(targets(&candidates), vec!["F", "P", "A"]);
        assert_eq!(candidates[1].sources.iter().collect::<Vec<_>>(), vec!["A", "F"]);

        // Output without inputs is not a complete direction.
        let partial = equation("F = P * A", EquationMetadata { output: Some("F".into()), ..Default::default() });
        assert_eq!(rule_candidates(&partial).len(), 3);

        let single = equation("x = 5", EquationMetadata::default());
        assert!(rule_candidates(&single).is_empty());
    }

    #[test]
    fn test_detect_builds_rule_with_default_priority() {
        let eq = equation("d = 2 * r", EquationMetadata::bidirectional());
        let outcomes: Vec<_> = rule_candidates(&eq)
            .iter()
            .map(|c| detect(&eq, c, Assumptions::default()))
            .collect();
        match &outcomes[1] {
            DetectionOutcome::Rule(rule) => {
                assert_eq!(rule.target, "r");
                assert_eq!(rule.expression.to_string(), "d/2");
                assert_eq!(rule.priority, 19);
            }
            other => panic!("expected a rule, got {:?}", other),
        }
    }

    #[test]
    fn test_repeated_target_is_reported_not_swallowed() {
        let eq = equation("y = x * x + x", EquationMetadata::bidirectional());
        let outcomes: Vec<_> = rule_candidates(&eq)
            .iter()
            .map(|c| detect(&eq, c, Assumptions::default()))
            .collect();
        assert!(matches!(&outcomes[0], DetectionOutcome::Rule(rule) if rule.target == "y"));
        assert_eq!(outcomes[1], DetectionOutcome::NoSolution { target: "x".into() });
    }

    #[test]
    fn test_undeclared_symbols_in_solution_become_sources() {
        let eq = equation("t = (P * d) / (sigma / sf)", EquationMetadata::output("t", &["P", "d", "sigma"]));
        let DetectionOutcome::Rule(rule) = detect(&eq, &rule_candidates(&eq)[0], Assumptions::default()) else {
            panic!("kessel should isolate t");
        };
        assert!(rule.sources.contains("sf"));
        assert_eq!(rule.priority, 16);
    }
}
