use thiserror::Error;

/// Errors that can occur while fitting or predicting.
#[derive(Error, Debug)]
pub enum EstimationError {
    #[error("estimation: no observations")]
    EmptyData,

    #[error("estimation: design matrix has {rows} rows but response has {response}")]
    RowMismatch { rows: usize, response: usize },

    #[error("estimation: expected {expected} columns, got {actual}")]
    ColumnMismatch { expected: usize, actual: usize },

    #[error("estimation: system is singular or ill-conditioned")]
    Singular,

    #[error("estimation: did not converge after {0} iterations")]
    NoConvergence(usize),

    #[error("estimation: response values must be 0 or 1 for logit")]
    NonBinaryResponse,
}
