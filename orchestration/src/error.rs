use thiserror::Error;

/// Errors that can occur in orchestration operations.
#[derive(Error, Debug)]
pub enum OrchestrationError {
    #[error("orchestration: no table named {0:?}")]
    TableNotFound(String),

    #[error("orchestration: no step named {0:?}")]
    StepNotFound(String),

    #[error("orchestration: column {column:?} has {actual} values, expected {expected}")]
    LengthMismatch {
        column: String,
        expected: usize,
        actual: usize,
    },

    #[error("orchestration: step {name:?} failed: {message}")]
    StepFailed { name: String, message: String },
}
