//! Fixpoint expansion of a known set through the substitution rules.
use crate::algebra::Expr;
use crate::store::RuleIndex;
use log::{debug, warn};
use std::collections::{BTreeMap, BTreeSet};

/// Everything reachable from the knowns for one solve call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Closure {
    /// Known symbols plus every derived one.
    pub calculable: BTreeSet<String>,
    /// Derived symbol -> expression over other calculable symbols.
    pub derivations: BTreeMap<String, Expr>,
    /// Derived symbols in acceptance order.
    pub order: Vec<String>,
    pub iterations: usize,
    /// Set when the pass limit stopped the expansion while it was still growing.
    pub truncated: bool,
}

impl Closure {
    pub fn is_derived(&self, symbol: &str) -> bool {
        self.derivations.contains_key(symbol)
    }
}

/// Expands `known` to every symbol derivable through `rules` that the equation
/// needs, directly or as a source of a needed symbol.
///
/// Each pass scans needed targets in lexicographic order and accepts the first
/// rule (highest priority) whose sources are all calculable. A symbol accepted
/// during a pass can feed later targets of the same pass. Never fails: symbols
/// that cannot be reached are simply absent from the result.
pub fn resolve(
    rules: &RuleIndex,
    known: &BTreeSet<String>,
    equation_symbols: &BTreeSet<String>,
    iteration_limit: usize,
) -> Closure {
    let mut closure = Closure {
        calculable: known.clone(),
        ..Default::default()
    };
    let limit = iteration_limit.max(1);

    loop {
        closure.iterations += 1;
        let needed = needed_targets(rules, &closure.calculable, equation_symbols);
        let mut changed = false;

        for target in &needed {
            if closure.calculable.contains(target) {
                continue;
            }
            let accepted = rules
                .rules_for(target)
                .iter()
                .find(|rule| rule.sources.is_subset(&closure.calculable));
            if let Some(rule) = accepted {
                debug!(
                    "Pass {}: derive '{}' from {:?} = {}",
                    closure.iterations, target, rule.sources, rule.expression
                );
                closure.derivations.insert(target.clone(), rule.expression.clone());
                closure.order.push(target.clone());
                closure.calculable.insert(target.clone());
                changed = true;
            }
        }

        if !changed {
            break;
        }
        if closure.iterations >= limit {
            closure.truncated = true;
            warn!(
                "Substitution closure stopped after {} passes with {} derivations",
                closure.iterations,
                closure.derivations.len()
            );
            break;
        }
    }
    closure
}

/// Equation symbols that are not yet calculable, plus, transitively, the
/// uncalculable sources of any rule for a needed symbol.
fn needed_targets(
    rules: &RuleIndex,
    calculable: &BTreeSet<String>,
    equation_symbols: &BTreeSet<String>,
) -> BTreeSet<String> {
    let mut needed: BTreeSet<String> = equation_symbols
        .iter()
        .filter(|s| !calculable.contains(*s))
        .cloned()
        .collect();
    let mut stack: Vec<String> = needed.iter().cloned().collect();

    while let Some(target) = stack.pop() {
        for rule in rules.rules_for(&target) {
            for source in &rule.sources {
                if !calculable.contains(source) && needed.insert(source.clone()) {
                    stack.push(source.clone());
                }
            }
        }
    }
    needed
}
