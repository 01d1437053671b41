use std::collections::HashMap;

use tracing::warn;

use crate::config::StepConfig;
use crate::error::RegistryError;
use crate::step::Step;

/// Builds a step instance back from its serialized config. Must reject
/// configs whose `template` field names a different type.
pub type TemplateBuilder = fn(&StepConfig) -> Result<Box<dyn Step>, RegistryError>;

/// Process-wide lookup table from template type name to builder.
///
/// Populated explicitly at startup (no import-time side effects): each
/// template crate exposes a registration function that lists its builders.
#[derive(Default)]
pub struct TemplateSet {
    builders: HashMap<String, TemplateBuilder>,
}

impl TemplateSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a builder under a template type name.
    ///
    /// Re-registering the same builder is a no-op, so registration tables
    /// can be applied more than once. Registering a *different* builder
    /// under an existing name keeps the first and warns.
    pub fn add(&mut self, template: &str, builder: TemplateBuilder) {
        if let Some(existing) = self.builders.get(template) {
            if !std::ptr::fn_addr_eq(*existing, builder) {
                warn!(template, "conflicting template registration ignored");
            }
            return;
        }
        self.builders.insert(template.to_string(), builder);
    }

    pub fn contains(&self, template: &str) -> bool {
        self.builders.contains_key(template)
    }

    /// Rebuild a step instance from its config via the registered builder.
    pub fn build(&self, config: &StepConfig) -> Result<Box<dyn Step>, RegistryError> {
        let builder = self
            .builders
            .get(&config.template)
            .ok_or_else(|| RegistryError::UnknownTemplate(config.template.clone()))?;
        builder(config)
    }

    /// Registered template type names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.builders.keys().cloned().collect();
        names.sort();
        names
    }
}
