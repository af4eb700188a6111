//! Clarabel interior point, driven directly.
//!
//! Clarabel solves `min q'x  s.t.  Ax + s = b, s in K`. Every constraint
//! the session receives becomes rows of `A`:
//! - equality rows go to the zero cone, inequality rows to the nonnegative cone
//! - finite variable bounds become nonnegative rows `x <= ub`, `-x <= -lb`
//! - cone members become rows `-x_j` with `b = 0`, so the slack is `x` itself

use clarabel::algebra::CscMatrix;
use clarabel::solver::{DefaultSettings, DefaultSolver, IPSolver, SupportedConeT};
use sprs::{CsMat, TriMat};

use super::params::{Param, ParamMap, ParamTable, Setter};
use super::{Backend, BlockId, BlockTerms, Capabilities, NativeResult, Session, VarRef};
use crate::error::{SolveError, SolveResult};
use crate::problem::{ConeLayout, RowSense, VarType};
use crate::status;

pub(crate) static CLARABEL_PARAMS: &[Param<DefaultSettings<f64>>] = &[
    Param {
        name: "max_iter",
        setter: Setter::Count(|s, v| s.max_iter = v),
    },
    Param {
        name: "time_limit",
        setter: Setter::Float(|s, v| s.time_limit = v),
    },
    Param {
        name: "verbose",
        setter: Setter::Bool(|s, v| s.verbose = v),
    },
    Param {
        name: "max_step_fraction",
        setter: Setter::Float(|s, v| s.max_step_fraction = v),
    },
    Param {
        name: "tol_gap_abs",
        setter: Setter::Float(|s, v| s.tol_gap_abs = v),
    },
    Param {
        name: "tol_gap_rel",
        setter: Setter::Float(|s, v| s.tol_gap_rel = v),
    },
    Param {
        name: "tol_feas",
        setter: Setter::Float(|s, v| s.tol_feas = v),
    },
    Param {
        name: "tol_infeas_abs",
        setter: Setter::Float(|s, v| s.tol_infeas_abs = v),
    },
    Param {
        name: "tol_infeas_rel",
        setter: Setter::Float(|s, v| s.tol_infeas_rel = v),
    },
    Param {
        name: "tol_ktratio",
        setter: Setter::Float(|s, v| s.tol_ktratio = v),
    },
    Param {
        name: "equilibrate_enable",
        setter: Setter::Bool(|s, v| s.equilibrate_enable = v),
    },
    Param {
        name: "equilibrate_max_iter",
        setter: Setter::Count(|s, v| s.equilibrate_max_iter = v),
    },
    Param {
        name: "presolve_enable",
        setter: Setter::Bool(|s, v| s.presolve_enable = v),
    },
    Param {
        name: "static_regularization_enable",
        setter: Setter::Bool(|s, v| s.static_regularization_enable = v),
    },
    Param {
        name: "direct_solve_method",
        setter: Setter::Str(|s, v| s.direct_solve_method = v),
    },
];

/// Clarabel defaults with console output off.
pub(crate) fn default_settings() -> DefaultSettings<f64> {
    DefaultSettings {
        verbose: false,
        ..DefaultSettings::default()
    }
}

/// Clarabel with second-order cones; exponential cones are dropped.
pub struct ClarabelSocpBackend;

impl Backend for ClarabelSocpBackend {
    fn name(&self) -> &'static str {
        "clarabel-socp"
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities {
            second_order_cones: true,
            cones: ConeLayout::CLARABEL,
            ..Capabilities::LP
        }
    }

    fn open(&self) -> Box<dyn Session> {
        Box::new(ClarabelSession::new(self.name()))
    }
}

/// Clarabel with second-order and exponential cones.
pub struct ClarabelBackend;

impl Backend for ClarabelBackend {
    fn name(&self) -> &'static str {
        "clarabel"
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities {
            second_order_cones: true,
            exponential_cones: true,
            cones: ConeLayout::CLARABEL,
            ..Capabilities::LP
        }
    }

    fn open(&self) -> Box<dyn Session> {
        Box::new(ClarabelSession::new(self.name()))
    }
}

pub struct ClarabelSession {
    backend: &'static str,
    /// Column offset of each block.
    offsets: Vec<(usize, usize)>,
    q: Vec<f64>,
    triplets: Vec<(usize, usize, f64)>,
    b: Vec<f64>,
    cones: Vec<SupportedConeT<f64>>,
    settings: DefaultSettings<f64>,
    solver: Option<DefaultSolver<f64>>,
    x: Option<Vec<f64>>,
}

impl ClarabelSession {
    pub fn new(backend: &'static str) -> Self {
        Self {
            backend,
            offsets: Vec::new(),
            q: Vec::new(),
            triplets: Vec::new(),
            b: Vec::new(),
            cones: Vec::new(),
            settings: default_settings(),
            solver: None,
            x: None,
        }
    }

    fn column(&self, var: VarRef) -> usize {
        self.offsets[var.block].0 + var.index
    }

    fn push_row(&mut self, entries: impl IntoIterator<Item = (usize, f64)>, rhs: f64) {
        let row = self.b.len();
        self.triplets
            .extend(entries.into_iter().map(|(col, v)| (row, col, v)));
        self.b.push(rhs);
    }

    /// Append a cone, merging runs of zero and nonnegative rows.
    fn push_cone(&mut self, cone: SupportedConeT<f64>) {
        use SupportedConeT::{NonnegativeConeT, ZeroConeT};
        match (self.cones.last_mut(), cone) {
            (Some(ZeroConeT(a)), ZeroConeT(b)) => *a += b,
            (Some(NonnegativeConeT(a)), NonnegativeConeT(b)) => *a += b,
            (_, cone) => self.cones.push(cone),
        }
    }

    fn push_members(&mut self, cols: &[usize]) {
        for &col in cols {
            self.push_row([(col, -1.0)], 0.0);
        }
    }

    fn constraint_matrix(&self) -> CscMatrix<f64> {
        let (m, n) = (self.b.len(), self.q.len());
        let mut tri = TriMat::new((m, n));
        for &(row, col, v) in &self.triplets {
            tri.add_triplet(row, col, v);
        }
        let csc: CsMat<f64> = tri.to_csc();
        let (colptr, rowval, nzval) = csc.into_raw_storage();
        CscMatrix::new(m, n, colptr, rowval, nzval)
    }
}

impl Session for ClarabelSession {
    fn add_variables(
        &mut self,
        _vtype: VarType,
        lb: &[f64],
        ub: &[f64],
        obj: &[f64],
    ) -> SolveResult<BlockId> {
        let offset = self.q.len();
        self.offsets.push((offset, obj.len()));
        self.q.extend_from_slice(obj);

        for (i, (&lo, &hi)) in lb.iter().zip(ub).enumerate() {
            let col = offset + i;
            if hi.is_finite() {
                self.push_row([(col, 1.0)], hi);
                self.push_cone(SupportedConeT::NonnegativeConeT(1));
            }
            if lo.is_finite() {
                self.push_row([(col, -1.0)], -lo);
                self.push_cone(SupportedConeT::NonnegativeConeT(1));
            }
        }
        Ok(self.offsets.len() - 1)
    }

    fn add_rows(
        &mut self,
        sense: RowSense,
        terms: &[BlockTerms<'_>],
        rhs: &[f64],
    ) -> SolveResult<()> {
        for (row, &b) in rhs.iter().enumerate() {
            let cone = match sense {
                RowSense::Equality => SupportedConeT::ZeroConeT(1),
                RowSense::Inequality if b == f64::INFINITY => continue,
                RowSense::Inequality => SupportedConeT::NonnegativeConeT(1),
            };
            let entries: Vec<(usize, f64)> = terms
                .iter()
                .flat_map(|term| term.row(row))
                .map(|(var, coef)| (self.column(var), coef))
                .collect();
            self.push_row(entries, b);
            self.push_cone(cone);
        }
        Ok(())
    }

    fn add_second_order_cone(&mut self, members: &[VarRef]) -> SolveResult<()> {
        let cols: Vec<usize> = members.iter().map(|&v| self.column(v)).collect();
        self.push_members(&cols);
        self.cones.push(SupportedConeT::SecondOrderConeT(cols.len()));
        Ok(())
    }

    fn add_exponential_cone(&mut self, members: [VarRef; 3]) -> SolveResult<()> {
        let cols = members.map(|v| self.column(v));
        self.push_members(&cols);
        self.cones.push(SupportedConeT::ExponentialConeT());
        Ok(())
    }

    fn configure(&mut self, params: &ParamMap) -> SolveResult<()> {
        ParamTable::new(self.backend, CLARABEL_PARAMS).apply(&mut self.settings, params)
    }

    fn finalize(&mut self) -> SolveResult<()> {
        let n = self.q.len();
        let p = CscMatrix::zeros((n, n));
        let a = self.constraint_matrix();
        let solver = DefaultSolver::new(
            &p,
            &self.q,
            &a,
            &self.b,
            &self.cones,
            self.settings.clone(),
        )
        .map_err(|e| SolveError::engine(self.backend, format!("{e:?}")))?;
        self.solver = Some(solver);
        Ok(())
    }

    fn optimize(&mut self) -> SolveResult<NativeResult> {
        let mut solver = self
            .solver
            .take()
            .ok_or_else(|| SolveError::engine(self.backend, "model not finalized"))?;
        solver.solve();

        let status = status::clarabel(&solver.solution.status);
        let objective = status.is_optimal().then_some(solver.solution.obj_val);
        if status.is_optimal() {
            self.x = Some(solver.solution.x.clone());
        }
        Ok(NativeResult { status, objective })
    }

    fn values(&self, block: BlockId) -> SolveResult<Vec<f64>> {
        let x = self
            .x
            .as_ref()
            .ok_or_else(|| SolveError::engine(self.backend, "no solution available"))?;
        let &(offset, len) = self
            .offsets
            .get(block)
            .ok_or_else(|| SolveError::engine(self.backend, format!("unknown block {block}")))?;
        Ok(x[offset..offset + len].to_vec())
    }
}
