//! Per-target lists of substitution rules, kept in descending priority order.
use super::types::SubstitutionRule;
use crate::algebra::Expr;
use log::{trace, warn};
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, Default)]
pub struct RuleIndex {
    rules: BTreeMap<String, Vec<SubstitutionRule>>,
}

impl RuleIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a rule for `target`. Without an explicit priority the rule gets
    /// `20 - |sources|`. A rule listing its own target as a source is refused.
    pub fn add_rule<I, S>(&mut self, target: &str, sources: I, expression: Expr, priority: Option<i32>) -> bool
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let sources: BTreeSet<String> = sources.into_iter().map(Into::into).collect();
        let priority = priority.unwrap_or_else(|| SubstitutionRule::default_priority(sources.len()));
        self.insert(SubstitutionRule {
            target: target.to_string(),
            sources,
            expression,
            priority,
        })
    }

    pub fn insert(&mut self, rule: SubstitutionRule) -> bool {
        if rule.sources.contains(&rule.target) {
            warn!("Rejected substitution rule for '{}': target appears among its own sources", rule.target);
            return false;
        }
        trace!(
            "Rule {} <- {:?} (priority {}): {}",
            rule.target, rule.sources, rule.priority, rule.expression
        );
        let list = self.rules.entry(rule.target.clone()).or_default();
        list.push(rule);
        // Stable: equal priorities keep insertion order.
        list.sort_by(|a, b| b.priority.cmp(&a.priority));
        true
    }

    pub fn rules_for(&self, target: &str) -> &[SubstitutionRule] {
        self.rules.get(target).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Targets with at least one rule, in lexicographic order.
    pub fn targets(&self) -> impl Iterator<Item = &str> {
        self.rules.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &SubstitutionRule> {
        self.rules.values().flatten()
    }

    pub fn len(&self) -> usize {
        self.rules.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
