use std::fmt;

use itertools::Itertools;
use serde::{Deserialize, Serialize};
use strum::Display;

/// Normalized outcome of a native solve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum OutcomeKind {
    /// A usable primal point and objective exist.
    Optimal,
    /// Infeasible, unbounded, stopped without an incumbent, or unrecognized.
    NoSolution,
}

/// Normalized status plus the engine's own status text for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SolveStatus {
    pub kind: OutcomeKind,
    pub raw: Option<String>,
}

impl SolveStatus {
    pub fn new(kind: OutcomeKind, raw: impl Into<String>) -> Self {
        Self {
            kind,
            raw: Some(raw.into()),
        }
    }

    pub fn is_optimal(&self) -> bool {
        self.kind == OutcomeKind::Optimal
    }
}

impl fmt::Display for SolveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.raw {
            Some(raw) => write!(f, "{} ({})", self.kind, raw),
            None => write!(f, "{}", self.kind),
        }
    }
}

/// Result of a successful solve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Solution {
    pub objective: f64,
    /// One value per variable, in original column order.
    pub primal: Vec<f64>,
    pub status: SolveStatus,
    /// Wall-clock seconds spent inside the native solve call.
    pub solve_time: f64,
}

/// Constraint classes an engine may be unable to express.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
pub enum ConstraintClass {
    #[strum(serialize = "integrality")]
    Integrality,
    #[strum(serialize = "second-order cone")]
    SecondOrderCone,
    #[strum(serialize = "exponential cone")]
    ExponentialCone,
}

/// Non-fatal conditions raised during a solve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SolveWarning {
    /// The engine cannot express these classes; they were dropped from the model.
    Ignored {
        backend: String,
        classes: Vec<ConstraintClass>,
    },
    /// The engine finished without a usable solution.
    NoSolution { backend: String, status: SolveStatus },
}

impl fmt::Display for SolveWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SolveWarning::Ignored { backend, classes } => write!(
                f,
                "The {} solver ignores {} constraints.",
                backend,
                classes.iter().join(" and ")
            ),
            SolveWarning::NoSolution { backend, status } => {
                write!(f, "{backend} failed to find the optimal solution: {status}")
            }
        }
    }
}

/// Everything a solve call produced: the solution if one exists, and every warning raised.
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome {
    pub backend: String,
    pub status: SolveStatus,
    pub solution: Option<Solution>,
    pub warnings: Vec<SolveWarning>,
}

impl Outcome {
    pub fn is_solved(&self) -> bool {
        self.solution.is_some()
    }

    pub fn into_solution(self) -> Option<Solution> {
        self.solution
    }
}
