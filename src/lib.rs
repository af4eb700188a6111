//! Canonical (MI)LP / SOCP / exponential-cone problems and a dispatch layer
//! that solves them on interchangeable native engines.

pub mod adapters;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod problem;
pub mod solution;
pub mod status;
pub mod telemetry;

pub use adapters::{Backend, BackendRegistry, Capabilities, ParamMap, ParamValue};
pub use config::DispatchConfig;
pub use dispatcher::{Dispatcher, SolveOptions};
pub use error::{SolveError, SolveResult};
pub use problem::{ProblemIr, RowSense, VarType};
pub use solution::{ConstraintClass, Outcome, OutcomeKind, Solution, SolveStatus, SolveWarning};
