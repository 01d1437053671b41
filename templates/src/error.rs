use thiserror::Error;

use modelmanager_estimation::EstimationError;
use modelmanager_orchestration::OrchestrationError;
use modelmanager_registry::RegistryError;

#[derive(Error, Debug)]
pub enum TemplateError {
    #[error("template: model expression {0:?} is malformed")]
    Expression(String),

    #[error("template: {0} must be set before fitting")]
    MissingParameter(&'static str),

    #[error("template: step has not been fitted")]
    NotFitted,

    #[error("template: table {table:?} has no column {column:?}")]
    MissingColumn { table: String, column: String },

    #[error("template: estimation error: {0}")]
    Estimation(#[from] EstimationError),

    #[error("template: orchestration error: {0}")]
    Orchestration(#[from] OrchestrationError),

    #[error("template: registry error: {0}")]
    Registry(#[from] RegistryError),
}

// Step trait methods surface registry errors; template internals fold into
// the registry's step-failure variant.
impl From<TemplateError> for RegistryError {
    fn from(e: TemplateError) -> Self {
        match e {
            TemplateError::Registry(inner) => inner,
            other => RegistryError::Step(other.to_string()),
        }
    }
}
