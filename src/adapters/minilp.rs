//! minilp: dense-tableau simplex for continuous LPs.
//!
//! Accepts `f64` infinities directly for free or half-bounded variables.
//! The engine has no tunable parameters.

use minilp::{ComparisonOp, LinearExpr, OptimizationDirection, Problem, Variable};

use super::params::{reject_all, ParamMap};
use super::{Backend, BlockId, BlockTerms, Capabilities, NativeResult, Session};
use crate::error::{SolveError, SolveResult};
use crate::problem::{RowSense, VarType};
use crate::status;

pub struct MinilpBackend;

impl Backend for MinilpBackend {
    fn name(&self) -> &'static str {
        "minilp"
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::LP
    }

    fn open(&self) -> Box<dyn Session> {
        Box::new(MinilpSession::new())
    }
}

pub struct MinilpSession {
    problem: Problem,
    blocks: Vec<Vec<Variable>>,
    solution: Option<minilp::Solution>,
}

impl MinilpSession {
    pub fn new() -> Self {
        Self {
            problem: Problem::new(OptimizationDirection::Minimize),
            blocks: Vec::new(),
            solution: None,
        }
    }
}

impl Default for MinilpSession {
    fn default() -> Self {
        Self::new()
    }
}

impl Session for MinilpSession {
    fn add_variables(
        &mut self,
        _vtype: VarType,
        lb: &[f64],
        ub: &[f64],
        obj: &[f64],
    ) -> SolveResult<BlockId> {
        let vars = obj
            .iter()
            .zip(lb.iter().zip(ub))
            .map(|(&c, (&lo, &hi))| self.problem.add_var(c, (lo, hi)))
            .collect();
        self.blocks.push(vars);
        Ok(self.blocks.len() - 1)
    }

    fn add_rows(
        &mut self,
        sense: RowSense,
        terms: &[BlockTerms<'_>],
        rhs: &[f64],
    ) -> SolveResult<()> {
        let op = match sense {
            RowSense::Equality => ComparisonOp::Eq,
            RowSense::Inequality => ComparisonOp::Le,
        };
        for (row, &b) in rhs.iter().enumerate() {
            if sense == RowSense::Inequality && b == f64::INFINITY {
                continue;
            }
            let mut expr = LinearExpr::empty();
            for term in terms {
                for (var, coef) in term.row(row) {
                    expr.add(self.blocks[var.block][var.index], coef);
                }
            }
            self.problem.add_constraint(expr, op, b);
        }
        Ok(())
    }

    fn configure(&mut self, params: &ParamMap) -> SolveResult<()> {
        reject_all("minilp", params)
    }

    fn optimize(&mut self) -> SolveResult<NativeResult> {
        let result = self.problem.solve();
        let blocks = &self.blocks;
        let status = status::minilp(&result, |s| {
            s.objective().is_finite() && blocks.iter().flatten().all(|&v| s[v].is_finite())
        });
        let objective = result.as_ref().ok().map(|s| s.objective());
        self.solution = result.ok().filter(|_| status.is_optimal());
        Ok(NativeResult { status, objective })
    }

    fn values(&self, block: BlockId) -> SolveResult<Vec<f64>> {
        let solution = self
            .solution
            .as_ref()
            .ok_or_else(|| SolveError::engine("minilp", "no solution available"))?;
        Ok(self.blocks[block].iter().map(|&v| solution[v]).collect())
    }
}
