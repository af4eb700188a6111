//! Canonical problem representation and validation.
//!
//! ```text
//! minimize    obj' x
//! subject to  linear[eq]   x == const[eq]
//!             linear[ineq] x <= const[ineq]
//!             lb <= x <= ub
//!             x[j] integer        for vtype[j] in {Integer, Binary}
//!             x[g[0]] >= || x[g[1..]] ||_2        for g in qmat
//!             y >= z exp(x / z), z > 0            for (x, y, z) in xmat
//! ```

use serde::{Deserialize, Serialize};
use sprs::{CsMat, TriMat};
use strum::{AsRefStr, Display};

use crate::error::{SolveError, SolveResult};

/// Variable type tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum VarType {
    Continuous,
    Integer,
    Binary,
}

/// Row tag: `Equality` rows read `a'x == b`, `Inequality` rows read `a'x <= b`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[strum(serialize_all = "snake_case")]
pub enum RowSense {
    Equality,
    Inequality,
}

/// Immutable description of one optimization problem.
///
/// The constraint matrix is always held in CSR storage so rows can be
/// sliced without densifying.
#[derive(Debug, Clone)]
pub struct ProblemIr {
    obj: Vec<f64>,
    linear: CsMat<f64>,
    sense: Vec<RowSense>,
    rhs: Vec<f64>,
    lb: Vec<f64>,
    ub: Vec<f64>,
    vtype: Vec<VarType>,
    qmat: Vec<Vec<usize>>,
    xmat: Vec<[usize; 3]>,
}

impl ProblemIr {
    /// Assemble a problem. Shapes are only checked by [`ProblemIr::validate`].
    pub fn new(
        obj: Vec<f64>,
        linear: CsMat<f64>,
        sense: Vec<RowSense>,
        rhs: Vec<f64>,
        lb: Vec<f64>,
        ub: Vec<f64>,
        vtype: Vec<VarType>,
    ) -> Self {
        let linear = if linear.is_csr() { linear } else { linear.to_csr() };
        Self {
            obj,
            linear,
            sense,
            rhs,
            lb,
            ub,
            vtype,
            qmat: Vec::new(),
            xmat: Vec::new(),
        }
    }

    /// Attach second-order cone groups `[t, v_1, ..., v_k]`.
    pub fn with_soc(mut self, qmat: Vec<Vec<usize>>) -> Self {
        self.qmat = qmat;
        self
    }

    /// Attach exponential cone triplets `(x, y, z)`.
    pub fn with_exp(mut self, xmat: Vec<[usize; 3]>) -> Self {
        self.xmat = xmat;
        self
    }

    pub fn num_vars(&self) -> usize {
        self.obj.len()
    }

    pub fn num_rows(&self) -> usize {
        self.rhs.len()
    }

    pub fn obj(&self) -> &[f64] {
        &self.obj
    }

    pub fn linear(&self) -> &CsMat<f64> {
        &self.linear
    }

    pub fn sense(&self) -> &[RowSense] {
        &self.sense
    }

    pub fn rhs(&self) -> &[f64] {
        &self.rhs
    }

    pub fn lb(&self) -> &[f64] {
        &self.lb
    }

    pub fn ub(&self) -> &[f64] {
        &self.ub
    }

    pub fn vtype(&self) -> &[VarType] {
        &self.vtype
    }

    pub fn qmat(&self) -> &[Vec<usize>] {
        &self.qmat
    }

    pub fn xmat(&self) -> &[[usize; 3]] {
        &self.xmat
    }

    pub fn has_integers(&self) -> bool {
        self.vtype.iter().any(|t| *t != VarType::Continuous)
    }

    /// Bounds as presented to an engine. Binary variables are clipped to `[0, 1]`.
    pub fn bounds(&self, col: usize) -> (f64, f64) {
        let (lb, ub) = (self.lb[col], self.ub[col]);
        match self.vtype[col] {
            VarType::Binary => (lb.max(0.0), ub.min(1.0)),
            _ => (lb, ub),
        }
    }

    /// Check every shape and index invariant.
    pub fn validate(&self) -> SolveResult<()> {
        let n = self.num_vars();
        let m = self.num_rows();

        if self.linear.cols() != n {
            return Err(SolveError::invalid(format!(
                "linear has {} columns, expected {}",
                self.linear.cols(),
                n
            )));
        }
        if self.linear.rows() != m {
            return Err(SolveError::invalid(format!(
                "linear has {} rows, expected {}",
                self.linear.rows(),
                m
            )));
        }
        if self.sense.len() != m {
            return Err(SolveError::invalid(format!(
                "sense has length {}, expected {}",
                self.sense.len(),
                m
            )));
        }
        for (name, len) in [
            ("lb", self.lb.len()),
            ("ub", self.ub.len()),
            ("vtype", self.vtype.len()),
        ] {
            if len != n {
                return Err(SolveError::invalid(format!(
                    "{name} has length {len}, expected {n}"
                )));
            }
        }

        if self.obj.iter().any(|c| !c.is_finite()) {
            return Err(SolveError::invalid("obj contains a non-finite coefficient"));
        }
        if self.rhs.iter().any(|c| c.is_nan()) {
            return Err(SolveError::invalid("const contains NaN"));
        }
        if self.linear.data().iter().any(|c| !c.is_finite()) {
            return Err(SolveError::invalid("linear contains a non-finite coefficient"));
        }

        for col in 0..n {
            let (lb, ub) = (self.lb[col], self.ub[col]);
            if lb.is_nan() || ub.is_nan() {
                return Err(SolveError::invalid(format!("variable {col} has a NaN bound")));
            }
            if lb == f64::INFINITY || ub == f64::NEG_INFINITY {
                return Err(SolveError::invalid(format!(
                    "variable {col} has bounds [{lb}, {ub}] that exclude every finite value"
                )));
            }
            if lb > ub {
                return Err(SolveError::invalid(format!(
                    "variable {col} has lower bound {lb} > upper bound {ub}"
                )));
            }
            let (lo, hi) = self.bounds(col);
            if lo > hi {
                return Err(SolveError::invalid(format!(
                    "binary variable {col} has bounds [{lb}, {ub}] disjoint from [0, 1]"
                )));
            }
        }

        for (k, group) in self.qmat.iter().enumerate() {
            if group.len() < 2 {
                return Err(SolveError::invalid(format!(
                    "second-order cone {k} has {} members, expected at least 2",
                    group.len()
                )));
            }
            check_members(group, n, "second-order cone", k)?;
        }
        for (k, triplet) in self.xmat.iter().enumerate() {
            check_members(triplet, n, "exponential cone", k)?;
        }

        Ok(())
    }
}

fn check_members(members: &[usize], n: usize, kind: &str, k: usize) -> SolveResult<()> {
    for (pos, &col) in members.iter().enumerate() {
        if col >= n {
            return Err(SolveError::invalid(format!(
                "{kind} {k} references variable {col} out of range (n={n})"
            )));
        }
        if members[..pos].contains(&col) {
            return Err(SolveError::invalid(format!(
                "{kind} {k} references variable {col} more than once"
            )));
        }
    }
    Ok(())
}

/// Build a CSR matrix from dense rows, dropping explicit zeros.
pub fn csr_from_rows(rows: &[Vec<f64>], cols: usize) -> CsMat<f64> {
    let mut tri = TriMat::new((rows.len(), cols));
    for (r, row) in rows.iter().enumerate() {
        for (c, &v) in row.iter().enumerate() {
            if v != 0.0 {
                tri.add_triplet(r, c, v);
            }
        }
    }
    tri.to_csr()
}
