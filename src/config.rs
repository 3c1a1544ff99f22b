//! Tunable limits for the solver, loadable from JSON.
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NewtonSettings {
    pub max_steps: usize,
    pub damping: f64,
    pub tolerance: f64,
    pub initial_guess: f64,
}

impl Default for NewtonSettings {
    fn default() -> Self {
        Self {
            max_steps: 60,
            damping: 1.0,
            tolerance: 1e-12,
            initial_guess: 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverSettings {
    /// Upper bound on closure passes; guards against cyclic rule sets.
    pub closure_iteration_limit: usize,
    /// Upper bound on derivation substitution passes while rewriting.
    pub rewrite_pass_limit: usize,
    pub newton: NewtonSettings,
}

impl Default for SolverSettings {
    fn default() -> Self {
        Self {
            closure_iteration_limit: 32,
            rewrite_pass_limit: 10,
            newton: NewtonSettings::default(),
        }
    }
}

impl SolverSettings {
    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
