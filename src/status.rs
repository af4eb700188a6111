//! Maps each engine's native status vocabulary onto [`OutcomeKind`].
//!
//! Only statuses that come with a usable primal point count as optimal.
//! Everything else, including statuses this crate does not recognise,
//! becomes [`OutcomeKind::NoSolution`].

use clarabel::solver::SolverStatus;
use good_lp::ResolutionError;

use crate::error::{SolveError, SolveResult};
use crate::solution::{OutcomeKind, SolveStatus};

/// minilp reports infeasibility through its error type, but an unbounded
/// problem can come back as `Ok` with infinite values. `bounded` decides.
pub fn minilp<T>(result: &Result<T, minilp::Error>, bounded: impl FnOnce(&T) -> bool) -> SolveStatus {
    match result {
        Ok(solution) if bounded(solution) => SolveStatus::new(OutcomeKind::Optimal, "Optimal"),
        Ok(_) => SolveStatus::new(OutcomeKind::NoSolution, "Unbounded"),
        Err(e) => SolveStatus::new(OutcomeKind::NoSolution, format!("{e:?}")),
    }
}

/// good_lp hands back a solution only when the engine has an incumbent;
/// a time or gap limit with an incumbent is still usable.
///
/// `ResolutionError::Str` is good_lp's report of a model it could not
/// build, which is an engine failure rather than a solve outcome.
pub fn good_lp(backend: &str, result: Result<String, &ResolutionError>) -> SolveResult<SolveStatus> {
    match result {
        Ok(raw) => Ok(SolveStatus::new(OutcomeKind::Optimal, raw)),
        Err(ResolutionError::Str(message)) => Err(SolveError::engine(backend, message)),
        Err(e) => Ok(SolveStatus::new(OutcomeKind::NoSolution, format!("{e:?}"))),
    }
}

/// Clarabel's reduced-accuracy `AlmostSolved` still carries a usable point.
pub fn clarabel(status: &SolverStatus) -> SolveStatus {
    let kind = match status {
        SolverStatus::Solved | SolverStatus::AlmostSolved => OutcomeKind::Optimal,
        _ => OutcomeKind::NoSolution,
    };
    SolveStatus::new(kind, format!("{status:?}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minilp_statuses() {
        let ok: Result<f64, minilp::Error> = Ok(1.0);
        assert!(minilp(&ok, |v| v.is_finite()).is_optimal());
        let err: Result<f64, minilp::Error> = Err(minilp::Error::Infeasible);
        let status = minilp(&err, |v| v.is_finite());
        assert_eq!(status.kind, OutcomeKind::NoSolution);
        assert_eq!(status.raw.as_deref(), Some("Infeasible"));
    }

    #[test]
    fn test_minilp_infinite_point_is_unbounded() {
        let ok: Result<f64, minilp::Error> = Ok(f64::NEG_INFINITY);
        let status = minilp(&ok, |v| v.is_finite());
        assert_eq!(status.kind, OutcomeKind::NoSolution);
        assert_eq!(status.raw.as_deref(), Some("Unbounded"));
    }

    #[test]
    fn test_good_lp_statuses() {
        assert!(good_lp("microlp", Ok("Optimal".into())).unwrap().is_optimal());
        let status = good_lp("microlp", Err(&ResolutionError::Unbounded)).unwrap();
        assert_eq!(status.kind, OutcomeKind::NoSolution);
        assert_eq!(status.raw.as_deref(), Some("Unbounded"));
        let status = good_lp("microlp", Err(&ResolutionError::Other("Time limit reached"))).unwrap();
        assert_eq!(status.kind, OutcomeKind::NoSolution);
    }

    #[test]
    fn test_good_lp_build_failure_is_engine_error() {
        let error = ResolutionError::Str("bad bounds".into());
        let err = good_lp("microlp", Err(&error)).unwrap_err();
        assert!(matches!(err, SolveError::Engine { ref backend, .. } if backend == "microlp"));
        assert!(!err.is_caller_error());
    }

    #[test]
    fn test_clarabel_statuses() {
        assert!(clarabel(&SolverStatus::Solved).is_optimal());
        assert!(clarabel(&SolverStatus::AlmostSolved).is_optimal());
        for status in [
            SolverStatus::PrimalInfeasible,
            SolverStatus::DualInfeasible,
            SolverStatus::MaxIterations,
            SolverStatus::MaxTime,
            SolverStatus::NumericalError,
        ] {
            assert_eq!(clarabel(&status).kind, OutcomeKind::NoSolution);
        }
    }
}
