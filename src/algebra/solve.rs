//! Symbolic isolation of a single symbol in a relation.
use super::expr::{BinaryOp, Expr, Function, Relation};
use smallvec::SmallVec;

/// Candidate solutions, most preferred first.
pub type Solutions = SmallVec<[Expr; 2]>;

/// Algebraic properties of the symbol being solved for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Assumptions {
    pub positive: bool,
}

impl Default for Assumptions {
    fn default() -> Self {
        Self { positive: true }
    }
}

/// Solves `relation` for `target` by inverting the operations wrapped around it.
///
/// Only relations in which `target` occurs exactly once are handled; anything
/// else yields an empty list. Closed candidates that contradict a `positive`
/// assumption are dropped.
pub fn solve_for(relation: &Relation, target: &str, assumptions: Assumptions) -> Solutions {
    let (side, other) = match (
        relation.lhs.occurrences(target),
        relation.rhs.occurrences(target),
    ) {
        (1, 0) => (&relation.lhs, &relation.rhs),
        (0, 1) => (&relation.rhs, &relation.lhs),
        _ => return Solutions::new(),
    };

    let mut raw = Solutions::new();
    isolate(side, other.clone(), target, assumptions, &mut raw);

    let mut out = Solutions::new();
    for candidate in raw {
        let candidate = candidate.simplify();
        if candidate.free_symbols().is_empty() {
            if let Ok(v) = candidate.evaluate() {
                if assumptions.positive && v <= 0.0 {
                    continue;
                }
            }
        }
        if !out.contains(&candidate) {
            out.push(candidate);
        }
    }
    out
}

fn isolate(side: &Expr, other: Expr, target: &str, assumptions: Assumptions, out: &mut Solutions) {
    match side {
        Expr::Symbol(name) if name == target => out.push(other),
        Expr::Neg(inner) => isolate(inner, Expr::neg(other), target, assumptions, out),
        Expr::Call(Function::Sqrt, inner) => {
            isolate(inner, Expr::pow(other, Expr::number(2.0)), target, assumptions, out)
        }
        Expr::Call(func, inner) => {
            if let Some(inverse) = func.inverse() {
                isolate(inner, Expr::call(inverse, other), target, assumptions, out);
            }
        }
        Expr::Binary(op, a, b) => {
            let in_left = a.contains(target);
            let (a, b) = (a.as_ref(), b.as_ref());
            match (op, in_left) {
                (BinaryOp::Add, true) => isolate(a, Expr::sub(other, b.clone()), target, assumptions, out),
                (BinaryOp::Add, false) => isolate(b, Expr::sub(other, a.clone()), target, assumptions, out),
                (BinaryOp::Sub, true) => isolate(a, Expr::add(other, b.clone()), target, assumptions, out),
                (BinaryOp::Sub, false) => isolate(b, Expr::sub(a.clone(), other), target, assumptions, out),
                (BinaryOp::Mul, true) => isolate(a, Expr::div(other, b.clone()), target, assumptions, out),
                (BinaryOp::Mul, false) => isolate(b, Expr::div(other, a.clone()), target, assumptions, out),
                (BinaryOp::Div, true) => isolate(a, Expr::mul(other, b.clone()), target, assumptions, out),
                (BinaryOp::Div, false) => isolate(b, Expr::div(a.clone(), other), target, assumptions, out),
                (BinaryOp::Pow, true) => {
                    let root = if matches!(b, Expr::Number(n) if *n == 2.0) {
                        Expr::call(Function::Sqrt, other)
                    } else {
                        Expr::pow(other, Expr::div(Expr::number(1.0), b.clone()))
                    };
                    if is_even_integer(b) && !assumptions.positive {
                        isolate(a, root.clone(), target, assumptions, out);
                        isolate(a, Expr::neg(root), target, assumptions, out);
                    } else {
                        isolate(a, root, target, assumptions, out);
                    }
                }
                (BinaryOp::Pow, false) => {
                    let log_ratio = Expr::div(
                        Expr::call(Function::Ln, other),
                        Expr::call(Function::Ln, a.clone()),
                    );
                    isolate(b, log_ratio, target, assumptions, out);
                }
            }
        }
        // Constants, numbers and foreign symbols do not contain the target.
        _ => {}
    }
}

fn is_even_integer(expr: &Expr) -> bool {
    match expr {
        Expr::Number(n) => *n != 0.0 && n.fract() == 0.0 && (*n as i64) % 2 == 0,
        _ => false,
    }
}
