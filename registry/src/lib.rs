//! Step registry: a process-wide catalog of named, runnable model steps.
//!
//! Each registered step is persisted as one YAML file in a configuration
//! directory and declared as a deferred runnable with the orchestration
//! collaborator. Steps are reconstructed lazily from disk through a table of
//! registered template builders.

pub mod config;
pub mod error;
pub mod manager;
pub mod step;
pub mod store;
pub mod template;
pub mod version;

pub use config::{StepConfig, StepDescriptor, SupplementalObject};
pub use error::RegistryError;
pub use manager::{ModelManager, TemplateMode, DEFAULT_DIR};
pub use step::Step;
pub use template::{TemplateBuilder, TemplateSet};
pub use version::{parse_version, version_greater_or_equal};

/// Version string embedded in every persisted step configuration.
pub const MODELMANAGER_VERSION: &str = env!("CARGO_PKG_VERSION");
