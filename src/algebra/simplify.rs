//! Bottom-up simplification: constant folding and algebraic identities.
use super::expr::{BinaryOp, Expr};

impl Expr {
    /// Returns a simplified, semantically equivalent expression.
    pub fn simplify(&self) -> Expr {
        match self {
            Expr::Number(_) | Expr::Constant(_) | Expr::Symbol(_) => self.clone(),
            Expr::Neg(inner) => simplify_neg(inner.simplify()),
            Expr::Call(func, inner) => {
                let arg = inner.simplify();
                if let Some(x) = closed_value(&arg) {
                    let folded = func.apply(x);
                    if folded.is_finite() {
                        return Expr::Number(folded);
                    }
                }
                Expr::call(*func, arg)
            }
            Expr::Binary(op, a, b) => simplify_binary(*op, a.simplify(), b.simplify()),
        }
    }
}

/// Value of a node that is a literal number or a named constant.
fn closed_value(expr: &Expr) -> Option<f64> {
    match expr {
        Expr::Number(n) => Some(*n),
        Expr::Constant(c) => Some(c.value()),
        _ => None,
    }
}

fn is_number(expr: &Expr, value: f64) -> bool {
    matches!(expr, Expr::Number(n) if *n == value)
}

fn simplify_neg(inner: Expr) -> Expr {
    match inner {
        Expr::Number(n) => Expr::Number(-n),
        Expr::Neg(x) => *x,
        other => Expr::neg(other),
    }
}

fn simplify_binary(op: BinaryOp, a: Expr, b: Expr) -> Expr {
    if let (Some(x), Some(y)) = (closed_value(&a), closed_value(&b)) {
        // Keep lone constants like `pi` symbolic unless paired with a literal.
        if matches!(a, Expr::Number(_)) || matches!(b, Expr::Number(_)) {
            let folded = op.apply(x, y);
            if folded.is_finite() {
                return Expr::Number(folded);
            }
        }
    }

    match op {
        BinaryOp::Add => {
            if is_number(&a, 0.0) {
                b
            } else if is_number(&b, 0.0) {
                a
            } else {
                Expr::add(a, b)
            }
        }
        BinaryOp::Sub => {
            if is_number(&b, 0.0) {
                a
            } else if is_number(&a, 0.0) {
                simplify_neg(b)
            } else if a == b {
                Expr::Number(0.0)
            } else {
                Expr::sub(a, b)
            }
        }
        BinaryOp::Mul => {
            if is_number(&a, 0.0) || is_number(&b, 0.0) {
                Expr::Number(0.0)
            } else if is_number(&a, 1.0) {
                b
            } else if is_number(&b, 1.0) {
                a
            } else {
                Expr::mul(a, b)
            }
        }
        BinaryOp::Div => {
            if is_number(&b, 1.0) {
                a
            } else if is_number(&a, 0.0) && !is_number(&b, 0.0) {
                Expr::Number(0.0)
            } else if a == b && !is_number(&a, 0.0) {
                Expr::Number(1.0)
            } else {
                Expr::div(a, b)
            }
        }
        BinaryOp::Pow => {
            if is_number(&b, 1.0) {
                a
            } else if is_number(&b, 0.0) || is_number(&a, 1.0) {
                Expr::Number(1.0)
            } else {
                Expr::pow(a, b)
            }
        }
    }
}
