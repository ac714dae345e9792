//! Error types for configuration and planning.

use std::time::Duration;

use thiserror::Error;

/// Configuration error with field path and constraint description.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("config error: {field}: {message}")]
pub struct ConfigError {
    /// Dotted field path (e.g., `"horizon.steps"` or `"vehicles[1].initial_soc"`).
    pub field: String,
    /// Human-readable constraint description.
    pub message: String,
}

impl ConfigError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Reason a solve ended without an optimal plan, when it is neither
/// infeasibility nor an exhausted limit.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SolverFailure {
    #[error("problem is unbounded (dual infeasible)")]
    Unbounded,
    #[error("numerical error")]
    NumericalError,
    #[error("insufficient progress")]
    InsufficientProgress,
    #[error("solution only reached reduced accuracy")]
    ReducedAccuracy,
    #[error("invalid solver setup: {0}")]
    InvalidSetup(String),
    #[error("unexpected solver status {0}")]
    Unexpected(String),
}

/// Failure of a planning invocation.
///
/// A caller never receives an empty or partial trajectory: every outcome that
/// is not a globally optimal solve is one of these variants.
#[derive(Debug, Error)]
pub enum PlanError {
    /// Rejected before the solver was invoked.
    #[error("invalid configuration: {}", join_errors(.0))]
    Configuration(Vec<ConfigError>),

    /// Constraints admit no solution (e.g. caps too tight for a required final SOC).
    #[error("charging problem is infeasible (solver status {status})")]
    InfeasibleProblem { status: String },

    #[error("solver failed: {0}")]
    SolverFailure(#[from] SolverFailure),

    /// Iteration or wall-clock limit reached. Not retried.
    #[error("solver stopped after {iterations} iterations ({elapsed:?}) without converging")]
    SolverTimeout { iterations: u32, elapsed: Duration },
}

impl PlanError {
    /// Configuration errors carried by this failure, if any.
    pub fn config_errors(&self) -> &[ConfigError] {
        match self {
            PlanError::Configuration(errors) => errors,
            _ => &[],
        }
    }
}

impl From<ConfigError> for PlanError {
    fn from(e: ConfigError) -> Self {
        PlanError::Configuration(vec![e])
    }
}

fn join_errors(errors: &[ConfigError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
