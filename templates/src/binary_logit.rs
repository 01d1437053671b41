//! Binary logit choice template.

use rand::Rng;
use serde::{Deserialize, Serialize};

use modelmanager_estimation::{FittedLogit, LogitModel};
use modelmanager_orchestration::Orchestrator;
use modelmanager_registry::{RegistryError, Step, StepConfig, SupplementalObject};

use crate::data::{design_matrix, design_names, response};
use crate::error::TemplateError;
use crate::expression::ModelExpression;
use crate::naming::update_name;
use crate::regression::{FITTED_MODEL, MODEL_CONTENT_TYPE};

/// Template-specific fields, flattened into the step config.
///
/// `out_value_true` and `out_value_false` are the values written for
/// simulated positive and negative choices. `None` means "leave the existing
/// column value unchanged" for rows with that outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct LogitSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    table: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    model_expression: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    out_table: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    out_column: Option<String>,

    #[serde(default = "default_out_true")]
    out_value_true: Option<f64>,

    #[serde(default = "default_out_false")]
    out_value_false: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    fitted_parameters: Option<Vec<f64>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    summary_table: Option<String>,
}

fn default_out_true() -> Option<f64> {
    Some(1.0)
}

fn default_out_false() -> Option<f64> {
    Some(0.0)
}

/// A registrable binary logit step.
///
/// `fit()` estimates choice probabilities from a 0/1 response column;
/// `run()` simulates one Monte Carlo draw per row against the fitted
/// probabilities and writes the outcomes back.
#[derive(Debug, Clone)]
pub struct BinaryLogitStep {
    name: String,
    tags: Vec<String>,
    pub notes: Option<String>,
    pub autorun: bool,

    pub table: Option<String>,
    pub model_expression: Option<String>,
    pub out_table: Option<String>,
    pub out_column: Option<String>,

    /// Value written for positive outcomes; `None` leaves the row unchanged.
    pub out_value_true: Option<f64>,

    /// Value written for negative outcomes; `None` leaves the row unchanged.
    pub out_value_false: Option<f64>,

    summary_table: Option<String>,
    fitted: Option<FittedLogit>,
}

impl Default for BinaryLogitStep {
    fn default() -> Self {
        Self {
            name: String::new(),
            tags: Vec::new(),
            notes: None,
            autorun: false,
            table: None,
            model_expression: None,
            out_table: None,
            out_column: None,
            out_value_true: default_out_true(),
            out_value_false: default_out_false(),
            summary_table: None,
            fitted: None,
        }
    }
}

impl BinaryLogitStep {
    pub const TEMPLATE: &'static str = "BinaryLogitStep";

    pub fn new() -> Self {
        Self::default()
    }

    fn expression(&self) -> Result<ModelExpression, TemplateError> {
        let text = self
            .model_expression
            .as_deref()
            .ok_or(TemplateError::MissingParameter("model_expression"))?;
        ModelExpression::parse(text)
    }

    fn table_name(&self) -> Result<&str, TemplateError> {
        self.table
            .as_deref()
            .ok_or(TemplateError::MissingParameter("table"))
    }

    pub fn fitted(&self) -> Option<&FittedLogit> {
        self.fitted.as_ref()
    }

    pub fn summary(&self) -> Option<&str> {
        self.summary_table.as_deref()
    }

    /// Estimate the model against the orchestrator's tables and return the
    /// fit report. Generates a timestamped step name unless a custom one was
    /// set.
    pub fn fit(&mut self, orchestrator: &dyn Orchestrator) -> Result<String, TemplateError> {
        let expr = self.expression()?;
        let table_name = self.table_name()?.to_string();
        let table = orchestrator.get_table(&table_name)?;

        let x = design_matrix(&table_name, &table, expr.rhs())?;
        let y = response(&table_name, &table, expr.lhs())?;
        let fitted = LogitModel::fit(x.view(), y.view(), &design_names(expr.rhs()))?;

        let summary = fitted.summary();
        self.fitted = Some(fitted);
        self.summary_table = Some(summary.clone());
        self.name = update_name(Self::TEMPLATE, &self.name);
        Ok(summary)
    }

    fn run_inner(&self, orchestrator: &dyn Orchestrator) -> Result<(), TemplateError> {
        let fitted = self.fitted.as_ref().ok_or(TemplateError::NotFitted)?;
        let expr = self.expression()?;
        let out_table = self.out_table.as_deref().unwrap_or(self.table_name()?);
        let table = orchestrator.get_table(out_table)?;

        let x = design_matrix(out_table, &table, expr.rhs())?;
        let probabilities = fitted.probabilities(x.view())?;

        let out_column = self.out_column.as_deref().unwrap_or(expr.lhs());
        // Start from the current column so `None` outcome values can leave
        // rows untouched.
        let mut values = match table.column(out_column) {
            Some(existing) => existing.to_vec(),
            None => vec![0.0; table.rows()],
        };

        let mut rng = rand::thread_rng();
        for (value, &p) in values.iter_mut().zip(probabilities.iter()) {
            let outcome = if rng.gen_range(0.0..1.0) < p {
                self.out_value_true
            } else {
                self.out_value_false
            };
            if let Some(v) = outcome {
                *value = v;
            }
        }

        orchestrator.update_column(out_table, out_column, values)?;
        Ok(())
    }

    pub fn from_config(config: &StepConfig) -> Result<Self, RegistryError> {
        config.validate()?;
        if config.template != Self::TEMPLATE {
            return Err(RegistryError::TemplateMismatch {
                expected: Self::TEMPLATE.to_string(),
                found: config.template.clone(),
            });
        }
        let settings: LogitSettings = config.payload_as()?;
        let fitted = decode_fitted(config)?;
        Ok(Self {
            name: config.name.clone(),
            tags: config.tags.clone(),
            notes: config.notes.clone(),
            autorun: config.autorun,
            table: settings.table,
            model_expression: settings.model_expression,
            out_table: settings.out_table,
            out_column: settings.out_column,
            out_value_true: settings.out_value_true,
            out_value_false: settings.out_value_false,
            summary_table: settings.summary_table,
            fitted,
        })
    }
}

fn decode_fitted(config: &StepConfig) -> Result<Option<FittedLogit>, RegistryError> {
    let Some(object) = config.supplemental_named(FITTED_MODEL) else {
        return Ok(None);
    };
    let bytes = object.content.as_ref().ok_or_else(|| {
        RegistryError::Step(format!(
            "supplemental object {FITTED_MODEL:?} of step {:?} has no content loaded",
            config.name
        ))
    })?;
    let fitted = rmp_serde::from_slice(bytes)
        .map_err(|e| RegistryError::Step(format!("cannot decode fitted model: {e}")))?;
    Ok(Some(fitted))
}

impl Step for BinaryLogitStep {
    fn name(&self) -> &str {
        &self.name
    }

    fn set_name(&mut self, name: &str) {
        self.name = name.to_string();
    }

    fn tags(&self) -> &[String] {
        &self.tags
    }

    fn set_tags(&mut self, tags: Vec<String>) {
        self.tags = tags;
    }

    fn template(&self) -> &'static str {
        Self::TEMPLATE
    }

    fn to_config(&self) -> Result<StepConfig, RegistryError> {
        let mut config = StepConfig::new(&self.name, Self::TEMPLATE);
        config.tags = self.tags.clone();
        config.notes = self.notes.clone();
        config.autorun = self.autorun;
        config.set_payload(&LogitSettings {
            table: self.table.clone(),
            model_expression: self.model_expression.clone(),
            out_table: self.out_table.clone(),
            out_column: self.out_column.clone(),
            out_value_true: self.out_value_true,
            out_value_false: self.out_value_false,
            fitted_parameters: self.fitted.as_ref().map(|f| f.coefficients.clone()),
            summary_table: self.summary_table.clone(),
        })?;
        if let Some(fitted) = &self.fitted {
            let bytes = rmp_serde::to_vec(fitted)
                .map_err(|e| RegistryError::Step(format!("cannot encode fitted model: {e}")))?;
            config.supplemental.push(SupplementalObject::new(
                FITTED_MODEL,
                MODEL_CONTENT_TYPE,
                bytes,
            ));
        }
        Ok(config)
    }

    fn run(&self, orchestrator: &dyn Orchestrator) -> Result<(), RegistryError> {
        self.run_inner(orchestrator).map_err(RegistryError::from)
    }

    fn clone_box(&self) -> Box<dyn Step> {
        Box::new(self.clone())
    }
}

/// Builder for [crate::register_templates].
pub fn build(config: &StepConfig) -> Result<Box<dyn Step>, RegistryError> {
    Ok(Box::new(BinaryLogitStep::from_config(config)?))
}
