//! Engines driven through the good_lp modelling layer.
//!
//! good_lp builds the whole model in memory and hands it to the chosen
//! solver function in one go, so the session only collects variables,
//! objective terms and constraints until `finalize`. What happens after
//! that is engine specific and lives behind [`GoodLpEngine`].

use std::ops::Range;

use clarabel::solver::implementations::default::DefaultSettingsBuilder;
use clarabel::solver::{DefaultSettings, DefaultSolver, IPSolver};
use good_lp::solvers::clarabel::ClarabelProblem;
use good_lp::solvers::microlp::MicroLpProblem;
use good_lp::{
    constraint, variable, Constraint, Expression, ProblemVariables, Solution, Solver, SolverModel,
    Variable, WithMipGap, WithTimeLimit,
};

use super::clarabel::{default_settings, CLARABEL_PARAMS};
use super::params::{Param, ParamMap, ParamTable, Setter};
use super::{Backend, BlockId, BlockTerms, Capabilities, NativeResult, Session};
use crate::error::{SolveError, SolveResult};
use crate::problem::{RowSense, VarType};
use crate::status;

/// microlp branch and bound: continuous and integer variables.
pub struct MicrolpBackend;

impl Backend for MicrolpBackend {
    fn name(&self) -> &'static str {
        "microlp"
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities {
            integers: true,
            ..Capabilities::LP
        }
    }

    fn open(&self) -> Box<dyn Session> {
        Box::new(GoodLpSession::<Microlp>::new(self.name()))
    }
}

/// Clarabel behind good_lp: continuous LP only.
pub struct GoodLpClarabelBackend;

impl Backend for GoodLpClarabelBackend {
    fn name(&self) -> &'static str {
        "good_lp-clarabel"
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::LP
    }

    fn open(&self) -> Box<dyn Session> {
        Box::new(GoodLpSession::<GoodLpClarabel>::new(self.name()))
    }
}

/// Everything the session collected, ready to hand to a good_lp solver.
pub struct GoodLpProblem {
    vars: ProblemVariables,
    objective: Vec<(Variable, f64)>,
    constraints: Vec<Constraint>,
}

impl GoodLpProblem {
    fn new() -> Self {
        Self {
            vars: ProblemVariables::new(),
            objective: Vec::new(),
            constraints: Vec::new(),
        }
    }

    /// Minimise the collected objective with `solver` and attach every constraint.
    pub fn into_model<S: Solver>(self, solver: S) -> S::Model {
        let objective = self
            .objective
            .iter()
            .map(|&(var, coef)| coef * var)
            .sum::<Expression>();
        let mut model = self.vars.minimise(objective).using(solver);
        for c in self.constraints {
            model.add_constraint(c);
        }
        model
    }
}

/// The engine-specific half of a good_lp session.
pub trait GoodLpEngine: 'static {
    type Settings;
    /// Native model after `finalize`, ready to run.
    type Prepared;

    fn settings() -> Self::Settings;

    fn params() -> &'static [Param<Self::Settings>];

    fn prepare(
        backend: &str,
        problem: GoodLpProblem,
        settings: &Self::Settings,
    ) -> SolveResult<Self::Prepared>;

    /// Run the native solve. Values come back in column creation order.
    fn run(
        backend: &str,
        prepared: Self::Prepared,
        columns: &[Variable],
    ) -> SolveResult<(NativeResult, Option<Vec<f64>>)>;
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MicrolpSettings {
    pub time_limit: Option<f64>,
    pub mip_gap: Option<f64>,
}

static MICROLP_PARAMS: &[Param<MicrolpSettings>] = &[
    Param {
        name: "time_limit",
        setter: Setter::Float(|s, v| s.time_limit = Some(v)),
    },
    Param {
        name: "mip_gap",
        setter: Setter::Float(|s, v| s.mip_gap = Some(v)),
    },
];

pub struct Microlp;

impl GoodLpEngine for Microlp {
    type Settings = MicrolpSettings;
    type Prepared = MicroLpProblem;

    fn settings() -> MicrolpSettings {
        MicrolpSettings::default()
    }

    fn params() -> &'static [Param<MicrolpSettings>] {
        MICROLP_PARAMS
    }

    fn prepare(
        _backend: &str,
        problem: GoodLpProblem,
        settings: &MicrolpSettings,
    ) -> SolveResult<MicroLpProblem> {
        let mut model = problem.into_model(good_lp::microlp);
        if let Some(seconds) = settings.time_limit {
            model = model.with_time_limit(seconds);
        }
        if let Some(gap) = settings.mip_gap {
            model = model
                .with_mip_gap(gap as f32)
                .map_err(|_| SolveError::InvalidParameterValue {
                    name: "mip_gap".to_string(),
                    expected: "finite non-negative float",
                    found: "float",
                })?;
        }
        Ok(model)
    }

    fn run(
        backend: &str,
        model: MicroLpProblem,
        columns: &[Variable],
    ) -> SolveResult<(NativeResult, Option<Vec<f64>>)> {
        let result = model.solve();
        let raw = result.as_ref().map(|s| format!("{:?}", s.status()));
        let status = status::good_lp(backend, raw)?;
        let values = result
            .ok()
            .map(|solution| columns.iter().map(|&v| solution.value(v)).collect());
        // microlp does not report the objective; the caller recomputes it from the primal.
        Ok((
            NativeResult {
                status,
                objective: None,
            },
            values,
        ))
    }
}

pub struct GoodLpClarabel;

impl GoodLpEngine for GoodLpClarabel {
    type Settings = DefaultSettings<f64>;
    type Prepared = DefaultSolver<f64>;

    fn settings() -> DefaultSettings<f64> {
        default_settings()
    }

    fn params() -> &'static [Param<DefaultSettings<f64>>] {
        CLARABEL_PARAMS
    }

    fn prepare(
        backend: &str,
        problem: GoodLpProblem,
        settings: &DefaultSettings<f64>,
    ) -> SolveResult<DefaultSolver<f64>> {
        let mut model: ClarabelProblem = problem.into_model(good_lp::clarabel);
        load_builder(settings, model.settings());
        model
            .try_into_solver()
            .map_err(|e| SolveError::engine(backend, e))
    }

    fn run(
        _backend: &str,
        mut solver: DefaultSolver<f64>,
        _columns: &[Variable],
    ) -> SolveResult<(NativeResult, Option<Vec<f64>>)> {
        solver.solve();
        let status = status::clarabel(&solver.solution.status);
        let optimal = status.is_optimal();
        let objective = optimal.then_some(solver.solution.obj_val);
        let values = optimal.then(|| solver.solution.x.clone());
        Ok((NativeResult { status, objective }, values))
    }
}

/// Copy every tunable Clarabel setting into good_lp's settings builder.
fn load_builder(settings: &DefaultSettings<f64>, builder: &mut DefaultSettingsBuilder<f64>) {
    builder
        .max_iter(settings.max_iter)
        .time_limit(settings.time_limit)
        .verbose(settings.verbose)
        .max_step_fraction(settings.max_step_fraction)
        .tol_gap_abs(settings.tol_gap_abs)
        .tol_gap_rel(settings.tol_gap_rel)
        .tol_feas(settings.tol_feas)
        .tol_infeas_abs(settings.tol_infeas_abs)
        .tol_infeas_rel(settings.tol_infeas_rel)
        .tol_ktratio(settings.tol_ktratio)
        .equilibrate_enable(settings.equilibrate_enable)
        .equilibrate_max_iter(settings.equilibrate_max_iter)
        .presolve_enable(settings.presolve_enable)
        .static_regularization_enable(settings.static_regularization_enable)
        .direct_solve_method(settings.direct_solve_method.clone());
}

pub struct GoodLpSession<E: GoodLpEngine> {
    backend: &'static str,
    problem: Option<GoodLpProblem>,
    settings: E::Settings,
    prepared: Option<E::Prepared>,
    /// Every variable in creation order.
    columns: Vec<Variable>,
    blocks: Vec<Range<usize>>,
    values: Option<Vec<f64>>,
}

impl<E: GoodLpEngine> GoodLpSession<E> {
    pub fn new(backend: &'static str) -> Self {
        Self {
            backend,
            problem: Some(GoodLpProblem::new()),
            settings: E::settings(),
            prepared: None,
            columns: Vec::new(),
            blocks: Vec::new(),
            values: None,
        }
    }

    fn problem(&mut self) -> SolveResult<&mut GoodLpProblem> {
        self.problem
            .as_mut()
            .ok_or_else(|| SolveError::engine(self.backend, "model already finalized"))
    }
}

impl<E: GoodLpEngine> Session for GoodLpSession<E> {
    fn add_variables(
        &mut self,
        vtype: VarType,
        lb: &[f64],
        ub: &[f64],
        obj: &[f64],
    ) -> SolveResult<BlockId> {
        let start = self.columns.len();
        let problem = self.problem()?;
        let mut added = Vec::with_capacity(lb.len());
        for ((&lo, &hi), &c) in lb.iter().zip(ub).zip(obj) {
            let mut def = variable().min(lo).max(hi);
            if vtype != VarType::Continuous {
                def = def.integer();
            }
            let var = problem.vars.add(def);
            problem.objective.push((var, c));
            added.push(var);
        }
        self.columns.extend(added);
        self.blocks.push(start..self.columns.len());
        Ok(self.blocks.len() - 1)
    }

    fn add_rows(
        &mut self,
        sense: RowSense,
        terms: &[BlockTerms<'_>],
        rhs: &[f64],
    ) -> SolveResult<()> {
        let mut rows = Vec::with_capacity(rhs.len());
        for (row, &b) in rhs.iter().enumerate() {
            if sense == RowSense::Inequality && b == f64::INFINITY {
                continue;
            }
            let lhs = terms
                .iter()
                .flat_map(|term| term.row(row))
                .map(|(var, coef)| coef * self.columns[self.blocks[var.block].start + var.index])
                .sum::<Expression>();
            rows.push(match sense {
                RowSense::Equality => constraint!(lhs == b),
                RowSense::Inequality => constraint!(lhs <= b),
            });
        }
        self.problem()?.constraints.extend(rows);
        Ok(())
    }

    fn configure(&mut self, params: &ParamMap) -> SolveResult<()> {
        ParamTable::new(self.backend, E::params()).apply(&mut self.settings, params)
    }

    fn finalize(&mut self) -> SolveResult<()> {
        let problem = self
            .problem
            .take()
            .ok_or_else(|| SolveError::engine(self.backend, "model already finalized"))?;
        self.prepared = Some(E::prepare(self.backend, problem, &self.settings)?);
        Ok(())
    }

    fn optimize(&mut self) -> SolveResult<NativeResult> {
        let prepared = self
            .prepared
            .take()
            .ok_or_else(|| SolveError::engine(self.backend, "model not finalized or already solved"))?;
        let (native, values) = E::run(self.backend, prepared, &self.columns)?;
        self.values = values;
        Ok(native)
    }

    fn values(&self, block: BlockId) -> SolveResult<Vec<f64>> {
        let values = self
            .values
            .as_ref()
            .ok_or_else(|| SolveError::engine(self.backend, "no solution available"))?;
        self.blocks
            .get(block)
            .and_then(|range| values.get(range.clone()))
            .map(<[f64]>::to_vec)
            .ok_or_else(|| SolveError::engine(self.backend, format!("unknown block {block}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::ParamValue;
    use crate::problem::csr_from_rows;

    fn solved<E: GoodLpEngine>(session: &mut GoodLpSession<E>) -> NativeResult {
        session.configure(&ParamMap::new()).unwrap();
        session.finalize().unwrap();
        session.optimize().unwrap()
    }

    #[test]
    fn test_microlp_session_keeps_integrality() {
        // min -y  s.t.  2y <= 5, y integer >= 0
        let mut session = GoodLpSession::<Microlp>::new("microlp");
        let block = session
            .add_variables(VarType::Integer, &[0.0], &[f64::INFINITY], &[-1.0])
            .unwrap();
        let coefs = csr_from_rows(&[vec![2.0]], 1);
        session
            .add_rows(RowSense::Inequality, &[BlockTerms { block, coefs: &coefs }], &[5.0])
            .unwrap();

        let result = solved(&mut session);
        assert!(result.status.is_optimal());
        assert!(result.objective.is_none());
        assert!((session.values(block).unwrap()[0] - 2.0).abs() < 1e-6);
    }

    #[test]
    fn test_blocks_map_to_their_own_columns() {
        // min x + y  s.t.  x == 1, y == 2, with x and y in separate blocks
        let mut session = GoodLpSession::<Microlp>::new("microlp");
        let bx = session
            .add_variables(VarType::Continuous, &[0.0], &[5.0], &[1.0])
            .unwrap();
        let by = session
            .add_variables(VarType::Integer, &[0.0], &[5.0], &[1.0])
            .unwrap();
        let one = csr_from_rows(&[vec![1.0], vec![0.0]], 1);
        let two = csr_from_rows(&[vec![0.0], vec![1.0]], 1);
        session
            .add_rows(
                RowSense::Equality,
                &[
                    BlockTerms { block: bx, coefs: &one },
                    BlockTerms { block: by, coefs: &two },
                ],
                &[1.0, 2.0],
            )
            .unwrap();

        assert!(solved(&mut session).status.is_optimal());
        assert!((session.values(bx).unwrap()[0] - 1.0).abs() < 1e-6);
        assert!((session.values(by).unwrap()[0] - 2.0).abs() < 1e-6);
    }

    #[test]
    fn test_optimize_requires_finalize_and_runs_once() {
        let mut session = GoodLpSession::<Microlp>::new("microlp");
        session
            .add_variables(VarType::Continuous, &[0.0], &[1.0], &[1.0])
            .unwrap();
        assert!(matches!(session.optimize(), Err(SolveError::Engine { .. })));
        session.finalize().unwrap();
        session.optimize().unwrap();
        assert!(matches!(session.optimize(), Err(SolveError::Engine { .. })));
        assert!(matches!(session.finalize(), Err(SolveError::Engine { .. })));
    }

    #[test]
    fn test_microlp_params() {
        let mut session = GoodLpSession::<Microlp>::new("microlp");
        let mut params = ParamMap::new();
        params.insert("time_limit".into(), ParamValue::Int(30));
        params.insert("mip_gap".into(), ParamValue::Float(0.01));
        session.configure(&params).unwrap();
        assert_eq!(
            session.settings,
            MicrolpSettings {
                time_limit: Some(30.0),
                mip_gap: Some(0.01),
            }
        );

        params.insert("max_iter".into(), ParamValue::Int(10));
        let err = session.configure(&params).unwrap_err();
        assert!(
            matches!(err, SolveError::UnknownParameter { ref backend, .. } if backend == "microlp")
        );
    }

    #[test]
    fn test_negative_mip_gap_rejected_before_solve() {
        let mut session = GoodLpSession::<Microlp>::new("microlp");
        session
            .add_variables(VarType::Integer, &[0.0], &[3.0], &[1.0])
            .unwrap();
        let mut params = ParamMap::new();
        params.insert("mip_gap".into(), ParamValue::Float(-0.5));
        session.configure(&params).unwrap();
        let err = session.finalize().unwrap_err();
        assert!(matches!(err, SolveError::InvalidParameterValue { ref name, .. } if name == "mip_gap"));
    }

    #[test]
    fn test_clarabel_params_accepted() {
        let mut session = GoodLpSession::<GoodLpClarabel>::new("good_lp-clarabel");
        let mut params = ParamMap::new();
        params.insert("max_iter".into(), ParamValue::Int(10));
        params.insert("tol_feas".into(), ParamValue::Float(1e-7));
        session.configure(&params).unwrap();
        assert_eq!(session.settings.max_iter, 10);
        assert_eq!(session.settings.tol_feas, 1e-7);
        assert!(!session.settings.verbose);
    }

    #[test]
    fn test_clarabel_unbounded_is_not_optimal() {
        // min -x  s.t.  x >= 0
        let mut session = GoodLpSession::<GoodLpClarabel>::new("good_lp-clarabel");
        let block = session
            .add_variables(VarType::Continuous, &[0.0], &[f64::INFINITY], &[-1.0])
            .unwrap();
        let result = solved(&mut session);
        assert!(!result.status.is_optimal());
        assert!(session.values(block).is_err());
    }

    #[test]
    fn test_clarabel_iteration_limit_forwarded() {
        let mut session = GoodLpSession::<GoodLpClarabel>::new("good_lp-clarabel");
        session
            .add_variables(VarType::Continuous, &[1.0], &[5.0], &[1.0])
            .unwrap();
        let mut params = ParamMap::new();
        params.insert("max_iter".into(), ParamValue::Int(0));
        session.configure(&params).unwrap();
        session.finalize().unwrap();
        let result = session.optimize().unwrap();
        assert!(!result.status.is_optimal());
    }
}
