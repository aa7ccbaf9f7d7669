// Domain service interface for native solver engines
// Defines the contract that any engine implementation must follow (Dependency Inversion Principle)

use super::models::{NativeModel, Solution, SolverConfig};
use super::value_objects::FileFormat;

/// Error types for the adapter and its engines
#[derive(Debug, thiserror::Error)]
pub enum SolverError {
    #[error("Variable '{0}' is already registered")]
    DuplicateVariable(String),

    #[error("Variable '{0}' not found")]
    VariableNotFound(String),

    #[error("Variable '{0}' belongs to a different solver instance")]
    ForeignVariable(String),

    #[error("Variable '{0}' refers to a decision of a replaced model")]
    StaleVariable(String),

    #[error("Variable '{0}' has no value in the current solution")]
    UnresolvedValue(String),

    #[error("Decision '{0}' already exists in the native model")]
    DuplicateDecision(String),

    #[error("Constraint '{0}' already exists in the native model")]
    DuplicateConstraint(String),

    #[error("Goal '{0}' is already registered")]
    DuplicateGoal(String),

    #[error("Goal '{0}' not found")]
    GoalNotFound(String),

    #[error("Models must be solved first")]
    NotSolved,

    #[error("Expression is not linear: {0}")]
    NonLinear(String),

    #[error("Division by zero in expression: {0}")]
    DivisionByZero(String),

    #[error("Name '{0}' cannot be written to a model file")]
    InvalidName(String),

    #[error("Model cannot be represented: {0}")]
    UnsupportedModel(String),

    #[error("Loading models in {0} format is not supported")]
    UnsupportedFormat(FileFormat),

    #[error("Model file parse error at line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("Solver data version {found} is not compatible with version {expected}")]
    IncompatibleSolverData { found: u32, expected: u32 },

    #[error("Invalid settings: {0}")]
    InvalidSettings(String),

    #[error("Solver not available: {0}")]
    SolverNotAvailable(String),

    #[error("Solver execution failed: {0}")]
    ExecutionFailed(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Settings(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, SolverError>;

/// Native optimization engine
///
/// The engine is a black box: it receives the native model and returns a
/// solution together with its quality. Implementations can be swapped without
/// touching the modeling layer.
pub trait SolverEngine: Send + Sync {
    /// Solve the native model
    fn solve(&self, model: &NativeModel, config: &SolverConfig) -> Result<Solution>;

    /// Validate a model without solving it
    fn validate(&self, model: &NativeModel) -> Result<()> {
        let errors: Vec<String> = model
            .decisions()
            .iter()
            .filter(|d| d.lower > d.upper)
            .map(|d| {
                format!(
                    "Decision '{}' has lower bound ({}) > upper bound ({})",
                    d.name, d.lower, d.upper
                )
            })
            .collect();

        if errors.is_empty() {
            Ok(())
        } else {
            Err(SolverError::UnsupportedModel(errors.join("; ")))
        }
    }

    /// Get the name of this engine
    fn name(&self) -> &str;

    /// Check if this engine supports mixed-integer programming
    fn supports_mip(&self) -> bool;
}
