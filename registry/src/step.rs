use modelmanager_orchestration::Orchestrator;

use crate::config::StepConfig;
use crate::error::RegistryError;

/// Contract every registrable model step satisfies.
///
/// A step serializes itself to a [StepConfig] (routing non-textual state
/// through supplemental objects), and executes its effect against the
/// orchestration collaborator when run. Reconstruction from a config goes
/// through the builder registered in a [crate::TemplateSet].
pub trait Step: Send {
    fn name(&self) -> &str;

    fn set_name(&mut self, name: &str);

    fn tags(&self) -> &[String];

    fn set_tags(&mut self, tags: Vec<String>);

    /// Template type name; must match the builder registration.
    fn template(&self) -> &'static str;

    /// Serialize the current state. Must be a pure function of state: the
    /// same state always produces the same config.
    fn to_config(&self) -> Result<StepConfig, RegistryError>;

    /// Execute the step's effect against the orchestration collaborator.
    fn run(&self, orchestrator: &dyn Orchestrator) -> Result<(), RegistryError>;

    fn clone_box(&self) -> Box<dyn Step>;
}

impl Clone for Box<dyn Step> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

impl std::fmt::Debug for dyn Step {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Step {{ name: {:?}, template: {:?} }}", self.name(), self.template())
    }
}
