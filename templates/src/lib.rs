//! Model step templates: thin parameter-holding wrappers that delegate
//! estimation to `modelmanager-estimation` and register with the step
//! registry.
//!
//! Expected usage mirrors the registry's lifecycle: create a template
//! instance, set parameters, `fit()` against the orchestrator's tables,
//! then hand it to `ModelManager::register` to persist it and make it
//! runnable by name.

pub mod binary_logit;
pub mod data;
pub mod error;
pub mod expression;
pub mod naming;
pub mod regression;
pub mod validate;

pub use binary_logit::BinaryLogitStep;
pub use error::TemplateError;
pub use expression::ModelExpression;
pub use naming::update_name;
pub use regression::{OLSRegressionStep, OutTransform};
pub use validate::validate_template;

use modelmanager_registry::TemplateSet;

/// Static registration table: every template type this crate provides.
/// Apply it to the set handed to `ModelManager::initialize`.
pub fn register_templates(set: &mut TemplateSet) {
    set.add(OLSRegressionStep::TEMPLATE, regression::build);
    set.add(BinaryLogitStep::TEMPLATE, binary_logit::build);
}

#[cfg(test)]
mod tests;
