//! Expression tree and equality relation used by the solver.
use super::error::EvalError;
use serde::{Serialize, Serializer};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Pow,
}

impl BinaryOp {
    fn precedence(self) -> u8 {
        match self {
            BinaryOp::Add | BinaryOp::Sub => 1,
            BinaryOp::Mul | BinaryOp::Div => 2,
            BinaryOp::Pow => 4,
        }
    }

    fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => " + ",
            BinaryOp::Sub => " - ",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Pow => "**",
        }
    }

    pub(crate) fn apply(self, a: f64, b: f64) -> f64 {
        match self {
            BinaryOp::Add => a + b,
            BinaryOp::Sub => a - b,
            BinaryOp::Mul => a * b,
            BinaryOp::Div => a / b,
            BinaryOp::Pow => a.powf(b),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Function {
    Sqrt,
    Exp,
    Ln,
    Sin,
    Cos,
    Tan,
    Asin,
    Acos,
    Atan,
}

impl Function {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "sqrt" => Some(Function::Sqrt),
            "exp" => Some(Function::Exp),
            "ln" | "log" => Some(Function::Ln),
            "sin" => Some(Function::Sin),
            "cos" => Some(Function::Cos),
            "tan" => Some(Function::Tan),
            "asin" => Some(Function::Asin),
            "acos" => Some(Function::Acos),
            "atan" => Some(Function::Atan),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Function::Sqrt => "sqrt",
            Function::Exp => "exp",
            Function::Ln => "ln",
            Function::Sin => "sin",
            Function::Cos => "cos",
            Function::Tan => "tan",
            Function::Asin => "asin",
            Function::Acos => "acos",
            Function::Atan => "atan",
        }
    }

    pub(crate) fn apply(self, x: f64) -> f64 {
        match self {
            Function::Sqrt => x.sqrt(),
            Function::Exp => x.exp(),
            Function::Ln => x.ln(),
            Function::Sin => x.sin(),
            Function::Cos => x.cos(),
            Function::Tan => x.tan(),
            Function::Asin => x.asin(),
            Function::Acos => x.acos(),
            Function::Atan => x.atan(),
        }
    }

    /// The function undoing `self`, on its principal branch.
    pub(crate) fn inverse(self) -> Option<Function> {
        match self {
            Function::Exp => Some(Function::Ln),
            Function::Ln => Some(Function::Exp),
            Function::Sin => Some(Function::Asin),
            Function::Cos => Some(Function::Acos),
            Function::Tan => Some(Function::Atan),
            Function::Asin => Some(Function::Sin),
            Function::Acos => Some(Function::Cos),
            Function::Atan => Some(Function::Tan),
            // sqrt is undone by squaring, handled by the isolator.
            Function::Sqrt => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Constant {
    Pi,
    E,
}

impl Constant {
    pub fn value(self) -> f64 {
        match self {
            Constant::Pi => std::f64::consts::PI,
            Constant::E => std::f64::consts::E,
        }
    }
}

/// A symbolic expression over named quantities.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Number(f64),
    Constant(Constant),
    Symbol(String),
    Neg(Box<Expr>),
    Binary(BinaryOp, Box<Expr>, Box<Expr>),
    Call(Function, Box<Expr>),
}

impl Expr {
    pub fn number(value: f64) -> Self {
        Expr::Number(value)
    }

    pub fn symbol(name: impl Into<String>) -> Self {
        Expr::Symbol(name.into())
    }

    pub fn binary(op: BinaryOp, lhs: Expr, rhs: Expr) -> Self {
        Expr::Binary(op, Box::new(lhs), Box::new(rhs))
    }

    pub fn add(lhs: Expr, rhs: Expr) -> Self {
        Self::binary(BinaryOp::Add, lhs, rhs)
    }

    pub fn sub(lhs: Expr, rhs: Expr) -> Self {
        Self::binary(BinaryOp::Sub, lhs, rhs)
    }

    pub fn mul(lhs: Expr, rhs: Expr) -> Self {
        Self::binary(BinaryOp::Mul, lhs, rhs)
    }

    pub fn div(lhs: Expr, rhs: Expr) -> Self {
        Self::binary(BinaryOp::Div, lhs, rhs)
    }

    pub fn pow(base: Expr, exponent: Expr) -> Self {
        Self::binary(BinaryOp::Pow, base, exponent)
    }

    pub fn neg(inner: Expr) -> Self {
        Expr::Neg(Box::new(inner))
    }

    pub fn call(func: Function, arg: Expr) -> Self {
        Expr::Call(func, Box::new(arg))
    }

    /// Returns the numeric value if this node is a literal number.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Expr::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Names of every symbol mentioned in the expression.
    pub fn free_symbols(&self) -> BTreeSet<String> {
        let mut out = BTreeSet::new();
        self.visit_symbols(&mut |name| {
            out.insert(name.to_string());
        });
        out
    }

    /// Appends symbol names in order of first appearance, skipping duplicates.
    pub(crate) fn collect_ordered(&self, out: &mut Vec<String>) {
        self.visit_symbols(&mut |name| {
            if !out.iter().any(|s| s == name) {
                out.push(name.to_string());
            }
        });
    }

    fn visit_symbols(&self, f: &mut impl FnMut(&str)) {
        match self {
            Expr::Number(_) | Expr::Constant(_) => {}
            Expr::Symbol(name) => f(name),
            Expr::Neg(inner) | Expr::Call(_, inner) => inner.visit_symbols(f),
            Expr::Binary(_, a, b) => {
                a.visit_symbols(f);
                b.visit_symbols(f);
            }
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.occurrences(name) > 0
    }

    /// Number of times `name` appears in the tree.
    pub fn occurrences(&self, name: &str) -> usize {
        match self {
            Expr::Number(_) | Expr::Constant(_) => 0,
            Expr::Symbol(s) => usize::from(s == name),
            Expr::Neg(inner) | Expr::Call(_, inner) => inner.occurrences(name),
            Expr::Binary(_, a, b) => a.occurrences(name) + b.occurrences(name),
        }
    }

    /// Replaces every symbol for which `lookup` yields a replacement.
    /// Replacements are not themselves rewritten again.
    pub fn map_symbols(&self, lookup: &impl Fn(&str) -> Option<Expr>) -> Expr {
        match self {
            Expr::Number(_) | Expr::Constant(_) => self.clone(),
            Expr::Symbol(name) => lookup(name).unwrap_or_else(|| self.clone()),
            Expr::Neg(inner) => Expr::neg(inner.map_symbols(lookup)),
            Expr::Call(func, inner) => Expr::call(*func, inner.map_symbols(lookup)),
            Expr::Binary(op, a, b) => {
                Expr::binary(*op, a.map_symbols(lookup), b.map_symbols(lookup))
            }
        }
    }

    pub fn substitute(&self, name: &str, replacement: &Expr) -> Expr {
        self.map_symbols(&|s| (s == name).then(|| replacement.clone()))
    }

    /// Simultaneous substitution of several symbols.
    pub fn substitute_all(&self, replacements: &BTreeMap<String, Expr>) -> Expr {
        self.map_symbols(&|s| replacements.get(s).cloned())
    }

    pub fn substitute_values(&self, values: &BTreeMap<String, f64>) -> Expr {
        self.map_symbols(&|s| values.get(s).map(|v| Expr::Number(*v)))
    }

    /// Evaluates the expression; every symbol must be resolvable through `lookup`.
    pub fn eval_with(&self, lookup: &impl Fn(&str) -> Option<f64>) -> Result<f64, EvalError> {
        let value = self.eval_raw(lookup)?;
        if value.is_finite() {
            Ok(value)
        } else {
            Err(EvalError::NonFinite(value))
        }
    }

    /// Numeric value of a closed expression.
    pub fn evaluate(&self) -> Result<f64, EvalError> {
        self.eval_with(&|_| None)
    }

    pub fn evaluate_in(&self, env: &HashMap<String, f64>) -> Result<f64, EvalError> {
        self.eval_with(&|name| env.get(name).copied())
    }

    fn eval_raw(&self, lookup: &impl Fn(&str) -> Option<f64>) -> Result<f64, EvalError> {
        match self {
            Expr::Number(n) => Ok(*n),
            Expr::Constant(c) => Ok(c.value()),
            Expr::Symbol(name) => {
                lookup(name).ok_or_else(|| EvalError::UnboundSymbol(name.clone()))
            }
            Expr::Neg(inner) => Ok(-inner.eval_raw(lookup)?),
            Expr::Call(func, inner) => Ok(func.apply(inner.eval_raw(lookup)?)),
            Expr::Binary(op, a, b) => Ok(op.apply(a.eval_raw(lookup)?, b.eval_raw(lookup)?)),
        }
    }

    fn precedence(&self) -> u8 {
        match self {
            Expr::Binary(op, _, _) => op.precedence(),
            Expr::Neg(_) => 3,
            Expr::Number(n) if n.is_sign_negative() => 3,
            _ => 5,
        }
    }
}

impl From<f64> for Expr {
    fn from(value: f64) -> Self {
        Expr::Number(value)
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Number(n) => write!(f, "{}", n),
            Expr::Constant(Constant::Pi) => write!(f, "pi"),
            Expr::Constant(Constant::E) => write!(f, "e"),
            Expr::Symbol(name) => write!(f, "{}", name),
            Expr::Neg(inner) => {
                if inner.precedence() < 3 {
                    write!(f, "-({})", inner)
                } else {
                    write!(f, "-{}", inner)
                }
            }
            Expr::Call(func, inner) => write!(f, "{}({})", func.name(), inner),
            Expr::Binary(op, a, b) => {
                let p = op.precedence();
                // Power is right-associative, everything else left-associative.
                let left_parens = if *op == BinaryOp::Pow {
                    a.precedence() <= p
                } else {
                    a.precedence() < p
                };
                let right_parens = match op {
                    BinaryOp::Sub | BinaryOp::Div => b.precedence() <= p,
                    _ => b.precedence() < p,
                };
                if left_parens {
                    write!(f, "({})", a)?;
                } else {
                    write!(f, "{}", a)?;
                }
                f.write_str(op.symbol())?;
                if right_parens {
                    write!(f, "({})", b)
                } else {
                    write!(f, "{}", b)
                }
            }
        }
    }
}

impl Serialize for Expr {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// An equality between two expressions.
#[derive(Debug, Clone, PartialEq)]
pub struct Relation {
    pub lhs: Expr,
    pub rhs: Expr,
}

impl Relation {
    pub fn new(lhs: Expr, rhs: Expr) -> Self {
        Self { lhs, rhs }
    }

    pub fn free_symbols(&self) -> BTreeSet<String> {
        let mut out = self.lhs.free_symbols();
        out.extend(self.rhs.free_symbols());
        out
    }

    /// Symbols in order of first appearance, left-hand side first.
    pub fn symbols_in_order(&self) -> Vec<String> {
        let mut out = Vec::new();
        self.lhs.collect_ordered(&mut out);
        self.rhs.collect_ordered(&mut out);
        out
    }

    pub fn occurrences(&self, name: &str) -> usize {
        self.lhs.occurrences(name) + self.rhs.occurrences(name)
    }

    pub fn map_sides(&self, f: impl Fn(&Expr) -> Expr) -> Relation {
        Relation::new(f(&self.lhs), f(&self.rhs))
    }

    pub fn substitute_all(&self, replacements: &BTreeMap<String, Expr>) -> Relation {
        self.map_sides(|side| side.substitute_all(replacements))
    }

    pub fn substitute_values(&self, values: &BTreeMap<String, f64>) -> Relation {
        self.map_sides(|side| side.substitute_values(values))
    }

    /// `lhs - rhs`, whose roots are the solutions of the relation.
    pub fn residual(&self) -> Expr {
        Expr::sub(self.lhs.clone(), self.rhs.clone())
    }
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} = {}", self.lhs, self.rhs)
    }
}

impl Serialize for Relation {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
