//! Ordinary least squares regression template.

use serde::{Deserialize, Serialize};

use modelmanager_estimation::{FittedLinear, LinearModel};
use modelmanager_orchestration::Orchestrator;
use modelmanager_registry::{RegistryError, Step, StepConfig, SupplementalObject};

use crate::data::{design_matrix, design_names, response};
use crate::error::TemplateError;
use crate::expression::ModelExpression;
use crate::naming::update_name;

/// Name of the supplemental object holding the fitted model.
pub const FITTED_MODEL: &str = "fitted-model";
pub(crate) const MODEL_CONTENT_TYPE: &str = "rmp";

/// Transformation applied to predicted values before they are written back.
/// `exp` supports models fitted on a log-transformed response.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutTransform {
    #[default]
    None,
    Exp,
}

/// Template-specific fields, flattened into the step config.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
struct OLSSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    table: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    model_expression: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    out_table: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    out_column: Option<String>,

    #[serde(default)]
    out_transform: OutTransform,

    /// Coefficient copy kept in the YAML for human inspection; the
    /// authoritative fitted state lives in the supplemental object.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    fitted_parameters: Option<Vec<f64>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    summary_table: Option<String>,
}

/// A registrable OLS regression step.
///
/// Configure the data bindings, `fit()` against the orchestrator's tables,
/// then register with a `ModelManager`. `run()` predicts over the output
/// table and writes the predictions back as a column.
#[derive(Debug, Clone, Default)]
pub struct OLSRegressionStep {
    name: String,
    tags: Vec<String>,
    pub notes: Option<String>,
    pub autorun: bool,

    /// Table the model is fitted against.
    pub table: Option<String>,

    /// `"response ~ predictor + predictor"` over columns of `table`.
    pub model_expression: Option<String>,

    /// Table predictions are written to; defaults to `table`.
    pub out_table: Option<String>,

    /// Column predictions are written to; defaults to the response column.
    pub out_column: Option<String>,

    pub out_transform: OutTransform,

    summary_table: Option<String>,
    fitted: Option<FittedLinear>,
}

impl OLSRegressionStep {
    pub const TEMPLATE: &'static str = "OLSRegressionStep";

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

    pub fn fitted(&self) -> Option<&FittedLinear> {
        self.fitted.as_ref()
    }

    /// Latest fit report, if any.
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
        let fitted = LinearModel::fit(x.view(), y.view(), &design_names(expr.rhs()))?;

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
        let mut values = fitted.predict(x.view())?;
        if self.out_transform == OutTransform::Exp {
            values.mapv_inplace(f64::exp);
        }

        let out_column = self.out_column.as_deref().unwrap_or(expr.lhs());
        orchestrator.update_column(out_table, out_column, values.to_vec())?;
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
        let settings: OLSSettings = config.payload_as()?;
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
            out_transform: settings.out_transform,
            summary_table: settings.summary_table,
            fitted,
        })
    }
}

fn decode_fitted(config: &StepConfig) -> Result<Option<FittedLinear>, RegistryError> {
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

impl Step for OLSRegressionStep {
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
        config.set_payload(&OLSSettings {
            table: self.table.clone(),
            model_expression: self.model_expression.clone(),
            out_table: self.out_table.clone(),
            out_column: self.out_column.clone(),
            out_transform: self.out_transform,
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
    Ok(Box::new(OLSRegressionStep::from_config(config)?))
}
