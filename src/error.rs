use thiserror::Error;

/// Errors that abort a solve call.
///
/// Degraded constraint classes and "no solution" outcomes are not errors;
/// they surface as [`crate::SolveWarning`] values on the returned outcome.
#[derive(Debug, Error)]
pub enum SolveError {
    /// The problem violates a shape or index invariant.
    #[error("Invalid problem: {0}")]
    InvalidProblem(String),

    #[error("Unknown backend: {0}")]
    UnknownBackend(String),

    #[error("Unknown parameter `{name}` for backend `{backend}`")]
    UnknownParameter { backend: String, name: String },

    #[error("Invalid value for parameter `{name}`: expected {expected}, found {found}")]
    InvalidParameterValue {
        name: String,
        expected: &'static str,
        found: &'static str,
    },

    /// Failure reported by the native engine outside the normal status vocabulary.
    #[error("Engine error in `{backend}`: {message}")]
    Engine { backend: String, message: String },
}

impl SolveError {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        SolveError::InvalidProblem(msg.into())
    }

    pub(crate) fn engine(backend: &str, message: impl ToString) -> Self {
        SolveError::Engine {
            backend: backend.to_string(),
            message: message.to_string(),
        }
    }

    /// Whether the error was raised before any engine work happened.
    pub fn is_caller_error(&self) -> bool {
        !matches!(self, SolveError::Engine { .. })
    }
}

pub type SolveResult<T> = Result<T, SolveError>;
