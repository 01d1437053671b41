use serde::{Deserialize, Serialize};

use crate::error::OrchestrationError;

/// A named-column table of numeric data.
///
/// Columns keep their insertion order and must all have the same length.
/// Tables are referred to by name inside the orchestrator; step bodies
/// receive them by value and never hold references across calls.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Table {
    columns: Vec<(String, Vec<f64>)>,
}

impl Table {
    pub fn new() -> Self {
        Self { columns: Vec::new() }
    }

    /// Number of rows (length of every column).
    pub fn rows(&self) -> usize {
        self.columns.first().map(|(_, v)| v.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Add or replace a column. The length must match the existing rows
    /// unless the table is still empty.
    pub fn insert(
        &mut self,
        name: &str,
        values: Vec<f64>,
    ) -> Result<(), OrchestrationError> {
        if !self.is_empty() && values.len() != self.rows() {
            return Err(OrchestrationError::LengthMismatch {
                column: name.to_string(),
                expected: self.rows(),
                actual: values.len(),
            });
        }
        if let Some(slot) = self.columns.iter_mut().find(|(n, _)| n == name) {
            slot.1 = values;
        } else {
            self.columns.push((name.to_string(), values));
        }
        Ok(())
    }

    /// Builder-style insert for test fixtures and demos.
    pub fn with(mut self, name: &str, values: Vec<f64>) -> Self {
        self.insert(name, values).expect("column length mismatch");
        self
    }

    pub fn column(&self, name: &str) -> Option<&[f64]> {
        self.columns
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_slice())
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|(n, _)| n == name)
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|(n, _)| n.as_str()).collect()
    }
}
