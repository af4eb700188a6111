//! Backend adapters
//!
//! An adapter turns a [`ProblemIr`] into calls against one native engine.
//! The shared build/solve pipeline lives here ([`Model`]); each engine only
//! implements [`Session`], the thin seam over its own API:
//! - `minilp`: dense simplex, continuous LP only
//! - `microlp`: good_lp + microlp branch and bound, MILP
//! - `good_lp-clarabel`: good_lp + Clarabel interior point, continuous LP
//! - `clarabel-socp`: Clarabel, SOCP (exponential cones ignored)
//! - `clarabel`: Clarabel, SOCP + exponential cones

pub mod clarabel;
pub mod good_lp;
pub mod minilp;
pub mod params;
pub mod registry;

use std::time::Instant;

use sprs::CsMat;

use crate::error::{SolveError, SolveResult};
use crate::problem::{
    cones, ConeLayout, ConstraintSplit, NativeCone, ProblemIr, RowSense, VarType,
    VariablePartition,
};
use crate::solution::{ConstraintClass, Outcome, OutcomeKind, Solution, SolveStatus, SolveWarning};
use crate::SolveOptions;

pub use params::{Param, ParamMap, ParamTable, ParamValue, Setter};
pub use registry::BackendRegistry;

/// Handle of a homogeneous variable block inside a session.
pub type BlockId = usize;

/// One variable of a session: block and position inside the block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VarRef {
    pub block: BlockId,
    pub index: usize,
}

/// Coefficients multiplying one variable block, `rows x block_len`, CSR.
#[derive(Debug, Clone, Copy)]
pub struct BlockTerms<'a> {
    pub block: BlockId,
    pub coefs: &'a CsMat<f64>,
}

impl BlockTerms<'_> {
    /// Nonzeros of `row` as `(variable, coefficient)`.
    pub fn row(&self, row: usize) -> impl Iterator<Item = (VarRef, f64)> + '_ {
        let block = self.block;
        self.coefs
            .outer_view(row)
            .into_iter()
            .flat_map(move |view| {
                view.iter()
                    .map(move |(index, &v)| (VarRef { block, index }, v))
                    .collect::<Vec<_>>()
            })
    }
}

/// What the engine returned from its blocking solve.
#[derive(Debug, Clone)]
pub struct NativeResult {
    pub status: SolveStatus,
    /// Objective in the engine's own sense, when the engine reports one.
    pub objective: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectiveSense {
    Minimize,
    Maximize,
}

impl ObjectiveSense {
    fn sign(self) -> f64 {
        match self {
            ObjectiveSense::Minimize => 1.0,
            ObjectiveSense::Maximize => -1.0,
        }
    }
}

/// Static description of what an engine can express.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Capabilities {
    pub integers: bool,
    pub second_order_cones: bool,
    pub exponential_cones: bool,
    pub cones: ConeLayout,
    pub native_sense: ObjectiveSense,
    /// Finite stand-in for infinity, if the engine rejects `f64::INFINITY`.
    pub infinity: Option<f64>,
}

impl Capabilities {
    pub const LP: Capabilities = Capabilities {
        integers: false,
        second_order_cones: false,
        exponential_cones: false,
        cones: ConeLayout::CLARABEL,
        native_sense: ObjectiveSense::Minimize,
        infinity: None,
    };

    /// Classes requested by `ir` that this engine will drop.
    pub fn unsupported(&self, ir: &ProblemIr) -> Vec<ConstraintClass> {
        let mut classes = Vec::new();
        if !self.integers && ir.has_integers() {
            classes.push(ConstraintClass::Integrality);
        }
        if !self.second_order_cones && !ir.qmat().is_empty() {
            classes.push(ConstraintClass::SecondOrderCone);
        }
        if !self.exponential_cones && !ir.xmat().is_empty() {
            classes.push(ConstraintClass::ExponentialCone);
        }
        classes
    }

    fn clamp(&self, bound: f64) -> f64 {
        match self.infinity {
            Some(inf) => bound.clamp(-inf, inf),
            None => bound,
        }
    }
}

/// A private native model, created fresh for one solve call.
///
/// Calls arrive in order: variable blocks, constraint rows, cones,
/// `configure`, `finalize`, `optimize`, then `values` for each block.
/// Dropping the session releases every native resource.
pub trait Session {
    /// Add `lb.len()` variables of one type. Never called with an empty block.
    fn add_variables(
        &mut self,
        vtype: VarType,
        lb: &[f64],
        ub: &[f64],
        obj: &[f64],
    ) -> SolveResult<BlockId>;

    /// Add `rhs.len()` rows `sum_b terms_b * x_b (== | <=) rhs`.
    fn add_rows(&mut self, sense: RowSense, terms: &[BlockTerms<'_>], rhs: &[f64])
        -> SolveResult<()>;

    /// Members arrive in the engine's native order.
    fn add_second_order_cone(&mut self, _members: &[VarRef]) -> SolveResult<()> {
        Err(SolveError::engine("session", "second-order cones are not supported"))
    }

    /// Members arrive in the engine's native order.
    fn add_exponential_cone(&mut self, _members: [VarRef; 3]) -> SolveResult<()> {
        Err(SolveError::engine("session", "exponential cones are not supported"))
    }

    /// Validate and apply engine parameters. Nothing is applied on error.
    fn configure(&mut self, params: &ParamMap) -> SolveResult<()>;

    /// Turn everything added so far into a native model ready to run.
    /// Not part of the timed solve.
    fn finalize(&mut self) -> SolveResult<()> {
        Ok(())
    }

    /// Run the blocking native solve.
    fn optimize(&mut self) -> SolveResult<NativeResult>;

    /// Primal values of one block after a successful `optimize`.
    fn values(&self, block: BlockId) -> SolveResult<Vec<f64>>;
}

/// One engine capability class.
pub trait Backend: Send + Sync {
    /// Registry key.
    fn name(&self) -> &'static str;

    fn capabilities(&self) -> Capabilities;

    /// Open a fresh private session.
    fn open(&self) -> Box<dyn Session>;

    /// Build the native model for `ir`. `ir` must already be validated.
    fn build(&self, ir: &ProblemIr) -> SolveResult<Model> {
        Model::build(self.name(), self.capabilities(), self.open(), ir)
    }
}

/// A native model built from a problem and not yet solved.
///
/// [`Model::solve`] consumes the model, so a model is solved at most once
/// and its session is released whichever way the call ends.
pub struct Model {
    backend: &'static str,
    caps: Capabilities,
    session: Box<dyn Session>,
    partition: VariablePartition,
    blocks: Vec<(VarType, BlockId)>,
    obj: Vec<f64>,
    warnings: Vec<SolveWarning>,
    /// Set when the problem has no variables: whether every row holds at zero.
    trivial: Option<bool>,
}

impl Model {
    pub fn build(
        backend: &'static str,
        caps: Capabilities,
        mut session: Box<dyn Session>,
        ir: &ProblemIr,
    ) -> SolveResult<Self> {
        let mut warnings = Vec::new();
        let ignored = caps.unsupported(ir);
        if !ignored.is_empty() {
            let warning = SolveWarning::Ignored {
                backend: backend.to_string(),
                classes: ignored,
            };
            tracing::warn!(backend, "{warning}");
            warnings.push(warning);
        }

        let sign = caps.native_sense.sign();
        let partition = VariablePartition::of(ir);

        if partition.is_empty() {
            let feasible = ir.sense().iter().zip(ir.rhs()).all(|(sense, &rhs)| match sense {
                RowSense::Equality => rhs == 0.0,
                RowSense::Inequality => rhs >= 0.0,
            });
            return Ok(Self {
                backend,
                caps,
                session,
                partition,
                blocks: Vec::new(),
                obj: Vec::new(),
                warnings,
                trivial: Some(feasible),
            });
        }

        let mut blocks = Vec::new();
        for (vtype, cols) in partition.non_empty() {
            let native_type = if caps.integers {
                vtype
            } else {
                VarType::Continuous
            };
            let (lb, ub): (Vec<f64>, Vec<f64>) = cols
                .iter()
                .map(|&col| {
                    let (lo, hi) = ir.bounds(col);
                    (caps.clamp(lo), caps.clamp(hi))
                })
                .unzip();
            let obj: Vec<f64> = partition
                .slice(vtype, ir.obj())
                .into_iter()
                .map(|c| sign * c)
                .collect();
            let id = session.add_variables(native_type, &lb, &ub, &obj)?;
            blocks.push((vtype, id));
        }

        let block_of = |vtype: VarType| {
            blocks
                .iter()
                .find(|(t, _)| *t == vtype)
                .map(|(_, id)| *id)
        };

        let split = ConstraintSplit::new(ir);
        for rows in split.blocks() {
            let slices = rows.by_type(&partition);
            let terms: Vec<BlockTerms<'_>> = slices
                .iter()
                .filter_map(|(vtype, coefs)| {
                    block_of(*vtype).map(|block| BlockTerms { block, coefs })
                })
                .collect();
            let rhs: Vec<f64> = rows.rhs.iter().map(|&b| caps.clamp(b)).collect();
            session.add_rows(rows.sense, &terms, &rhs)?;
        }

        let var_ref = |col: usize| {
            let (vtype, index) = partition.locate(col);
            block_of(vtype).map(|block| VarRef { block, index })
        };
        for cone in cones::translate(
            ir,
            &caps.cones,
            caps.second_order_cones,
            caps.exponential_cones,
        ) {
            match cone {
                NativeCone::SecondOrder(members) => {
                    let members: Vec<VarRef> = members.iter().filter_map(|&c| var_ref(c)).collect();
                    session.add_second_order_cone(&members)?;
                }
                NativeCone::Exponential(members) => {
                    if let [Some(a), Some(b), Some(c)] = members.map(|c| var_ref(c)) {
                        session.add_exponential_cone([a, b, c])?;
                    }
                }
            }
        }

        tracing::debug!(
            backend,
            vars = ir.num_vars(),
            eq_rows = split.equality.len(),
            ineq_rows = split.inequality.len(),
            "native model built"
        );

        Ok(Self {
            backend,
            caps,
            session,
            partition,
            blocks,
            obj: ir.obj().to_vec(),
            warnings,
            trivial: None,
        })
    }

    pub fn backend(&self) -> &'static str {
        self.backend
    }

    pub fn warnings(&self) -> &[SolveWarning] {
        &self.warnings
    }

    /// Apply parameters, run the native solve and extract the result.
    ///
    /// `solve_time` covers the native `optimize` call only. A problem with
    /// no variables never reaches the engine.
    pub fn solve(mut self, options: &SolveOptions) -> SolveResult<Outcome> {
        self.session.configure(&options.params)?;

        if let Some(feasible) = self.trivial {
            tracing::debug!(backend = self.backend, feasible, "no variables, engine skipped");
            if !feasible {
                let status = SolveStatus::new(OutcomeKind::NoSolution, "Infeasible");
                return Ok(self.without_solution(status));
            }
            let status = SolveStatus::new(OutcomeKind::Optimal, "Optimal");
            return Ok(Outcome {
                backend: self.backend.to_string(),
                status: status.clone(),
                solution: Some(Solution {
                    objective: 0.0,
                    primal: Vec::new(),
                    status,
                    solve_time: 0.0,
                }),
                warnings: self.warnings,
            });
        }

        self.session.finalize()?;

        display(options.display, format_args!("Being solved by {}...", self.backend));
        let started = Instant::now();
        let native = self.session.optimize()?;
        let solve_time = started.elapsed().as_secs_f64();
        display(
            options.display,
            format_args!("Solution status: {}", native.status.raw.as_deref().unwrap_or("")),
        );
        display(options.display, format_args!("Running time: {solve_time:.4}s"));

        if !native.status.is_optimal() {
            return Ok(self.without_solution(native.status));
        }

        let mut primal = vec![0.0; self.partition.len()];
        for &(vtype, block) in &self.blocks {
            let local = self.session.values(block)?;
            self.partition.scatter(vtype, &local, &mut primal);
        }
        let objective = match native.objective {
            Some(v) => self.caps.native_sense.sign() * v,
            None => self.obj.iter().zip(&primal).map(|(c, x)| c * x).sum(),
        };

        if !objective.is_finite() || primal.iter().any(|x| !x.is_finite()) {
            let raw = native.status.raw.as_deref().unwrap_or("Optimal");
            let status =
                SolveStatus::new(OutcomeKind::NoSolution, format!("{raw} (non-finite point)"));
            return Ok(self.without_solution(status));
        }

        Ok(Outcome {
            backend: self.backend.to_string(),
            status: native.status.clone(),
            solution: Some(Solution {
                objective,
                primal,
                status: native.status,
                solve_time,
            }),
            warnings: self.warnings,
        })
    }

    fn without_solution(mut self, status: SolveStatus) -> Outcome {
        let warning = SolveWarning::NoSolution {
            backend: self.backend.to_string(),
            status: status.clone(),
        };
        tracing::warn!(backend = self.backend, "{warning}");
        self.warnings.push(warning);
        Outcome {
            backend: self.backend.to_string(),
            status,
            solution: None,
            warnings: self.warnings,
        }
    }
}

fn display(enabled: bool, line: std::fmt::Arguments<'_>) {
    if enabled {
        tracing::info!("{line}");
    } else {
        tracing::debug!("{line}");
    }
}
