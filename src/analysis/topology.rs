use crate::store::RuleIndex;
use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::HashMap;

/// Builds the source -> target dependency graph of the rule index.
pub fn rule_graph(rules: &RuleIndex) -> DiGraph<String, ()> {
    let mut graph = DiGraph::new();
    let mut nodes: HashMap<String, NodeIndex> = HashMap::new();
    let mut node = |graph: &mut DiGraph<String, ()>, name: &str| {
        *nodes
            .entry(name.to_string())
            .or_insert_with(|| graph.add_node(name.to_string()))
    };

    for rule in rules.iter() {
        let target = node(&mut graph, &rule.target);
        for source in &rule.sources {
            let source = node(&mut graph, source);
            graph.update_edge(source, target, ());
        }
    }
    graph
}

/// Groups of symbols that can derive each other in a loop.
///
/// Cycles are legal in the rule index; the closure pass limit keeps them from
/// spinning. Reported here for diagnostics, each group and the list sorted.
pub fn rule_cycles(rules: &RuleIndex) -> Vec<Vec<String>> {
    let graph = rule_graph(rules);
    let mut cycles: Vec<Vec<String>> = tarjan_scc(&graph)
        .into_iter()
        .filter(|component| component.len() > 1)
        .map(|component| {
            let mut names: Vec<String> = component.into_iter().map(|i| graph[i].clone()).collect();
            names.sort();
            names
        })
        .collect();
    cycles.sort();
    cycles
}
