use serde::{Deserialize, Serialize};

use crate::error::TemplateError;

/// A model expression of the form `"lhs ~ rhs1 + rhs2"`.
///
/// The left-hand side names the response column, the right-hand side the
/// predictor columns. Column references only; transformations belong in the
/// data layer, not here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelExpression {
    lhs: String,
    rhs: Vec<String>,
}

impl ModelExpression {
    pub fn parse(text: &str) -> Result<Self, TemplateError> {
        let bad = || TemplateError::Expression(text.to_string());

        let (lhs, rhs) = text.split_once('~').ok_or_else(bad)?;
        let lhs = lhs.trim();
        if lhs.is_empty() || lhs.contains(char::is_whitespace) {
            return Err(bad());
        }

        let rhs: Vec<String> = rhs
            .split('+')
            .map(|c| c.trim().to_string())
            .collect();
        if rhs.is_empty() || rhs.iter().any(|c| c.is_empty() || c.contains(char::is_whitespace)) {
            return Err(bad());
        }

        Ok(Self {
            lhs: lhs.to_string(),
            rhs,
        })
    }

    /// Response column name.
    pub fn lhs(&self) -> &str {
        &self.lhs
    }

    /// Predictor column names, in declaration order.
    pub fn rhs(&self) -> &[String] {
        &self.rhs
    }

    /// Canonical text form.
    pub fn text(&self) -> String {
        format!("{} ~ {}", self.lhs, self.rhs.join(" + "))
    }
}
