use crate::solver::{SolveMethod, SolveReport};
use std::fmt::Write;

/// Renders a solve report as a plain-text audit trail.
pub fn format_trace(report: &SolveReport) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "SOLVE TRACE for equation '{}':", report.equation);
    let _ = writeln!(out, "--------------------------------------------------");
    let _ = writeln!(out, "Target: {} ({})", report.target, report.reason);

    if report.derivations.is_empty() {
        let _ = writeln!(out, "Derivations: none");
    } else {
        let _ = writeln!(out, "Derivations:");
        let last = report.derivations.len() - 1;
        for (i, step) in report.derivations.iter().enumerate() {
            let connector = if i == last { "`--" } else { "|--" };
            let _ = writeln!(out, "{}[D{}] {} = {}", connector, i + 1, step.symbol, step.expression);
        }
    }

    let _ = writeln!(out, "Rewritten:   {}", report.rewritten);
    let _ = writeln!(out, "Substituted: {}", report.substituted);
    let method = match report.method {
        SolveMethod::Symbolic => "symbolic",
        SolveMethod::Numeric => "numeric",
    };
    let _ = writeln!(out, "Solution:    {} = {} [{}]", report.target, report.solution, method);
    let _ = writeln!(out, "Result:      {} = {}", report.target, report.value);
    out
}
