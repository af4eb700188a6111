//! Problem builders shared by the integration tests.

#![allow(dead_code)]

use solver_dispatch::problem::csr_from_rows;
use solver_dispatch::{ProblemIr, RowSense, VarType};

pub const INF: f64 = f64::INFINITY;

pub const TOL: f64 = 1e-6;

pub fn init() {
    solver_dispatch::telemetry::init_tracing();
}

pub fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < TOL,
        "expected {expected}, got {actual}"
    );
}

/// `min x` with `1 <= x <= 5` and no constraints.
pub fn round_trip() -> ProblemIr {
    ProblemIr::new(
        vec![1.0],
        csr_from_rows(&[], 1),
        vec![],
        vec![],
        vec![1.0],
        vec![5.0],
        vec![VarType::Continuous],
    )
}

/// `x >= 2` and `x <= 1`.
pub fn infeasible() -> ProblemIr {
    ProblemIr::new(
        vec![1.0],
        csr_from_rows(&[vec![-1.0], vec![1.0]], 1),
        vec![RowSense::Inequality, RowSense::Inequality],
        vec![-2.0, 1.0],
        vec![-INF],
        vec![INF],
        vec![VarType::Continuous],
    )
}

/// `min -x0 - 2 x1` with `x0 + x1 <= 3.5`, `x1 <= 2.5`, `x0` continuous and
/// `x1` integer in `[0, 10]`. MILP optimum -5.5, LP relaxation -6.0.
pub fn small_milp() -> ProblemIr {
    ProblemIr::new(
        vec![-1.0, -2.0],
        csr_from_rows(&[vec![1.0, 1.0], vec![0.0, 1.0]], 2),
        vec![RowSense::Inequality; 2],
        vec![3.5, 2.5],
        vec![0.0, 0.0],
        vec![10.0, 10.0],
        vec![VarType::Continuous, VarType::Integer],
    )
}

/// 0/1 knapsack: values 5, 4, 3; weights 2, 3, 1; capacity 5. Optimum -9.
///
/// Declared bounds are wider than `[0, 1]` on purpose.
pub fn knapsack() -> ProblemIr {
    ProblemIr::new(
        vec![-5.0, -4.0, -3.0],
        csr_from_rows(&[vec![2.0, 3.0, 1.0]], 3),
        vec![RowSense::Inequality],
        vec![5.0],
        vec![-5.0, 0.0, -1.0],
        vec![10.0, 1.0, 3.0],
        vec![VarType::Binary; 3],
    )
}

/// `min t` with `t >= ||(x1, x2)||`, `x1 = 3`, `x2 = 4`. Optimum 5.
///
/// `t` lives in `[0, t_ub]`.
pub fn soc(t_ub: f64) -> ProblemIr {
    ProblemIr::new(
        vec![1.0, 0.0, 0.0],
        csr_from_rows(&[vec![0.0, 1.0, 0.0], vec![0.0, 0.0, 1.0]], 3),
        vec![RowSense::Equality; 2],
        vec![3.0, 4.0],
        vec![0.0, -INF, -INF],
        vec![t_ub, INF, INF],
        vec![VarType::Continuous; 3],
    )
    .with_soc(vec![vec![0, 1, 2]])
}

/// `max x` with `w >= u exp(x / u)`, `w = e^5`, `u = 1`. Optimum `x = 5`.
///
/// Columns are `(x, w, u)`; `x` is capped at `x_ub`.
pub fn exp_cone(x_ub: f64) -> ProblemIr {
    ProblemIr::new(
        vec![-1.0, 0.0, 0.0],
        csr_from_rows(&[vec![0.0, 1.0, 0.0], vec![0.0, 0.0, 1.0]], 3),
        vec![RowSense::Equality; 2],
        vec![5f64.exp(), 1.0],
        vec![-INF, -INF, -INF],
        vec![x_ub, INF, INF],
        vec![VarType::Continuous; 3],
    )
    .with_exp(vec![[0, 1, 2]])
}

/// `min -x` with `x >= 0` and nothing else.
pub fn unbounded_ray() -> ProblemIr {
    ProblemIr::new(
        vec![-1.0],
        csr_from_rows(&[], 1),
        vec![],
        vec![],
        vec![0.0],
        vec![INF],
        vec![VarType::Continuous],
    )
}

/// `min -x - y` with `x - y <= 1`, `x, y >= 0`.
pub fn unbounded_wedge() -> ProblemIr {
    ProblemIr::new(
        vec![-1.0, -1.0],
        csr_from_rows(&[vec![1.0, -1.0]], 2),
        vec![RowSense::Inequality],
        vec![1.0],
        vec![0.0, 0.0],
        vec![INF, INF],
        vec![VarType::Continuous; 2],
    )
}

/// No variables, rows `0 == eq` and `0 <= le`.
pub fn no_variables(eq: f64, le: f64) -> ProblemIr {
    ProblemIr::new(
        vec![],
        csr_from_rows(&[vec![], vec![]], 0),
        vec![RowSense::Equality, RowSense::Inequality],
        vec![eq, le],
        vec![],
        vec![],
        vec![],
    )
}
