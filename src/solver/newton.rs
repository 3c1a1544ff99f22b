//! Damped Newton iteration on a single unknown, with a finite-difference slope.
use crate::algebra::{EvalError, Expr};
use crate::config::NewtonSettings;
use thiserror::Error;

const MAX_HALVINGS: usize = 64;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum NewtonError {
    #[error("Newton iteration did not converge in {steps} steps (|f(x)| = {residual})")]
    NoConvergence { steps: usize, residual: f64 },
    #[error("Derivative vanished at x = {0}")]
    FlatSlope(f64),
    #[error("Residual could not be evaluated: {0}")]
    Eval(#[from] EvalError),
}

/// Finds `x` such that `residual(x) = 0`, where `residual` depends on `symbol` only.
///
/// With `positive` set, a non-positive initial guess is moved to
/// `max(|guess|, 1)` and steps that would leave the positive half-line are
/// halved until they stay inside it.
pub fn find_root(
    residual: &Expr,
    symbol: &str,
    positive: bool,
    settings: &NewtonSettings,
) -> Result<f64, NewtonError> {
    let f = |x: f64| residual.eval_with(&|name| (name == symbol).then_some(x));

    let mut x = settings.initial_guess;
    if positive && (x.is_nan() || x <= 0.0) {
        x = settings.initial_guess.abs().max(1.0);
    }
    let mut fx = f(x)?;
    for _ in 0..settings.max_steps {
        if fx.abs() <= settings.tolerance * (1.0 + x.abs()) {
            return Ok(x);
        }
        let h = 1e-7 * x.abs().max(1.0);
        let slope = (f(x + h)? - fx) / h;
        if slope == 0.0 || !slope.is_finite() {
            return Err(NewtonError::FlatSlope(x));
        }

        let mut step = settings.damping * fx / slope;
        let mut halvings = 0;
        while positive && x - step <= 0.0 {
            if halvings == MAX_HALVINGS {
                return Err(NewtonError::NoConvergence {
                    steps: settings.max_steps,
                    residual: fx.abs(),
                });
            }
            step /= 2.0;
            halvings += 1;
        }
        x -= step;
        fx = f(x)?;
    }

    if fx.abs() <= settings.tolerance * (1.0 + x.abs()) {
        Ok(x)
    } else {
        Err(NewtonError::NoConvergence {
            steps: settings.max_steps,
            residual: fx.abs(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algebra::{parse_relation, OpenNamespace};

    fn residual(text: &str) -> Expr {
        parse_relation(text, &OpenNamespace).unwrap().residual()
    }

    #[test]
    fn test_quadratic_with_repeated_symbol() {
        let root = find_root(&residual("12 = x * x + x"), "x", true, &NewtonSettings::default()).unwrap();
        assert!((root - 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_positive_guard_keeps_iterate_positive() {
        // From x = 1 the full step crosses zero, where 1/x has a pole.
        let root = find_root(&residual("2 = 1 / x"), "x", true, &NewtonSettings::default()).unwrap();
        assert!((root - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_reports_non_convergence() {
        let settings = NewtonSettings { max_steps: 3, ..Default::default() };
        let err = find_root(&residual("0 = x * x + 1"), "x", false, &settings).unwrap_err();
        assert!(matches!(err, NewtonError::NoConvergence { steps: 3, .. } | NewtonError::FlatSlope(_)));
    }

    #[test]
    fn test_unbound_symbol_is_an_error() {
        let err = find_root(&residual("y = x * x"), "x", true, &NewtonSettings::default()).unwrap_err();
        assert_eq!(err, NewtonError::Eval(EvalError::UnboundSymbol("y".into())));
    }

    #[test]
    fn test_non_positive_guess_is_moved_inside_domain() {
        for guess in [-10.0, 0.0, f64::NAN] {
            let settings = NewtonSettings { initial_guess: guess, ..Default::default() };
            let root = find_root(&residual("12 = x * x + x"), "x", true, &settings).unwrap();
            assert!((root - 3.0).abs() < 1e-9, "guess {}: {}", guess, root);
        }
    }

    #[test]
    fn test_negative_guess_kept_when_sign_is_free() {
        let settings = NewtonSettings { initial_guess: -10.0, ..Default::default() };
        let root = find_root(&residual("12 = x * x + x"), "x", false, &settings).unwrap();
        assert!((root + 4.0).abs() < 1e-9);
    }
}
