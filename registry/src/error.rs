use thiserror::Error;

use modelmanager_orchestration::OrchestrationError;

#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("registry: no step named {0:?}")]
    StepNotFound(String),

    #[error("registry: {0}")]
    Validation(String),

    #[error("registry: template type {0:?} is not registered")]
    UnknownTemplate(String),

    #[error("registry: config template {found:?} does not match {expected:?}")]
    TemplateMismatch { expected: String, found: String },

    #[error("registry: {0:?} is a reserved name")]
    ReservedName(String),

    #[error("registry: bad version string {0:?}")]
    Version(String),

    #[error("registry: step execution failed: {0}")]
    Step(String),

    #[error("registry: io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("registry: yaml error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("registry: orchestration error: {0}")]
    Orchestration(#[from] OrchestrationError),
}
