//! Single-shot solve dispatch.
//!
//! A call validates the problem, looks the backend up by name, builds a
//! fresh native model and solves it once. There are no retries.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::adapters::{BackendRegistry, ParamMap, ParamValue};
use crate::error::{SolveError, SolveResult};
use crate::problem::ProblemIr;
use crate::solution::Outcome;

/// Per-call options: which engine, whether to print progress, engine parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolveOptions {
    pub backend: String,
    #[serde(default)]
    pub display: bool,
    #[serde(default)]
    pub params: ParamMap,
}

impl SolveOptions {
    pub fn new(backend: impl Into<String>) -> Self {
        Self {
            backend: backend.into(),
            display: false,
            params: ParamMap::new(),
        }
    }

    pub fn display(mut self, display: bool) -> Self {
        self.display = display;
        self
    }

    pub fn param(mut self, name: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }
}

#[derive(Debug, Clone)]
pub struct Dispatcher {
    registry: Arc<BackendRegistry>,
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new(BackendRegistry::shared())
    }
}

impl Dispatcher {
    pub fn new(registry: Arc<BackendRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &BackendRegistry {
        &self.registry
    }

    /// Solve `ir` on the backend named in `options`.
    ///
    /// Infeasible or unbounded problems are not errors: the outcome carries
    /// no solution and a warning instead.
    pub fn solve(&self, ir: &ProblemIr, options: &SolveOptions) -> SolveResult<Outcome> {
        ir.validate()?;
        let backend = self
            .registry
            .get(&options.backend)
            .ok_or_else(|| SolveError::UnknownBackend(options.backend.clone()))?;

        debug!(backend = backend.name(), vars = ir.num_vars(), rows = ir.num_rows(), "dispatching");
        let model = backend.build(ir)?;
        let outcome = model.solve(options)?;

        match &outcome.solution {
            Some(solution) => info!(
                backend = %outcome.backend,
                objective = solution.objective,
                solve_time = solution.solve_time,
                "solve finished"
            ),
            None => info!(backend = %outcome.backend, status = %outcome.status, "solve finished without solution"),
        }
        Ok(outcome)
    }

    /// Run [`Dispatcher::solve`] on tokio's blocking pool.
    pub async fn solve_blocking_task(
        &self,
        ir: Arc<ProblemIr>,
        options: SolveOptions,
    ) -> SolveResult<Outcome> {
        let dispatcher = self.clone();
        let backend = options.backend.clone();
        tokio::task::spawn_blocking(move || dispatcher.solve(&ir, &options))
            .await
            .map_err(|e| SolveError::engine(&backend, e))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::problem::{csr_from_rows, RowSense, VarType};

    fn bounded(lb: f64, ub: f64) -> ProblemIr {
        ProblemIr::new(
            vec![1.0],
            csr_from_rows(&[], 1),
            vec![],
            vec![],
            vec![lb],
            vec![ub],
            vec![VarType::Continuous],
        )
    }

    #[test]
    fn test_unknown_backend() {
        let err = Dispatcher::default()
            .solve(&bounded(1.0, 5.0), &SolveOptions::new("gurobi"))
            .unwrap_err();
        assert!(matches!(err, SolveError::UnknownBackend(ref name) if name == "gurobi"));
    }

    #[test]
    fn test_invalid_problem_rejected_before_lookup() {
        let ir = ProblemIr::new(
            vec![1.0, 2.0],
            csr_from_rows(&[vec![1.0, 1.0]], 2),
            vec![RowSense::Inequality],
            vec![1.0],
            vec![0.0],
            vec![1.0, 1.0],
            vec![VarType::Continuous; 2],
        );
        let err = Dispatcher::default()
            .solve(&ir, &SolveOptions::new("gurobi"))
            .unwrap_err();
        assert!(matches!(err, SolveError::InvalidProblem(_)));
    }

    #[test]
    fn test_options_builder_and_deserialize() {
        let options = SolveOptions::new("clarabel")
            .display(true)
            .param("max_iter", 50)
            .param("tol_feas", 1e-7);
        assert!(options.display);
        assert_eq!(options.params["max_iter"], ParamValue::Int(50));

        let parsed: SolveOptions =
            serde_json::from_str(r#"{"backend": "clarabel", "params": {"max_iter": 50, "tol_feas": 1e-7}}"#)
                .unwrap();
        assert!(!parsed.display);
        assert_eq!(parsed.params, options.params);
    }

    #[tokio::test]
    async fn test_solve_blocking_task() {
        let outcome = Dispatcher::default()
            .solve_blocking_task(Arc::new(bounded(1.0, 5.0)), SolveOptions::new("minilp"))
            .await
            .unwrap();
        let solution = outcome.solution.unwrap();
        assert!((solution.objective - 1.0).abs() < 1e-6);
    }
}
