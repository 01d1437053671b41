use std::collections::HashMap;
use std::sync::Mutex;

use crate::engine::{Orchestrator, StepBody};
use crate::error::OrchestrationError;
use crate::table::Table;

/// In-memory Orchestrator backed by plain maps.
/// Intended for testing and single-process pipelines.
pub struct MemoryEngine {
    tables: Mutex<HashMap<String, Table>>,
    steps: Mutex<HashMap<String, StepBody>>,
}

impl MemoryEngine {
    pub fn new() -> Self {
        Self {
            tables: Mutex::new(HashMap::new()),
            steps: Mutex::new(HashMap::new()),
        }
    }
}

impl Default for MemoryEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl Orchestrator for MemoryEngine {
    fn get_table(&self, name: &str) -> Result<Table, OrchestrationError> {
        let tables = self.tables.lock().unwrap();
        tables
            .get(name)
            .cloned()
            .ok_or_else(|| OrchestrationError::TableNotFound(name.to_string()))
    }

    fn put_table(&self, name: &str, table: Table) -> Result<(), OrchestrationError> {
        let mut tables = self.tables.lock().unwrap();
        tables.insert(name.to_string(), table);
        Ok(())
    }

    fn update_column(
        &self,
        table: &str,
        column: &str,
        values: Vec<f64>,
    ) -> Result<(), OrchestrationError> {
        let mut tables = self.tables.lock().unwrap();
        let t = tables
            .get_mut(table)
            .ok_or_else(|| OrchestrationError::TableNotFound(table.to_string()))?;
        t.insert(column, values)
    }

    fn add_step(&self, name: &str, body: StepBody) -> Result<(), OrchestrationError> {
        let mut steps = self.steps.lock().unwrap();
        steps.insert(name.to_string(), body);
        Ok(())
    }

    fn remove_step(&self, name: &str) -> Result<(), OrchestrationError> {
        let mut steps = self.steps.lock().unwrap();
        steps.remove(name);
        Ok(())
    }

    fn run_steps(&self, names: &[&str]) -> Result<(), OrchestrationError> {
        for name in names {
            // Take the body out of the map while it runs, so a body that
            // declares or replaces steps does not deadlock on the lock.
            let body = {
                let mut steps = self.steps.lock().unwrap();
                steps
                    .remove(*name)
                    .ok_or_else(|| OrchestrationError::StepNotFound(name.to_string()))?
            };
            let result = body(self);
            {
                let mut steps = self.steps.lock().unwrap();
                // Keep a replacement declared by the body itself, if any.
                steps.entry(name.to_string()).or_insert(body);
            }
            result?;
        }
        Ok(())
    }

    fn step_names(&self) -> Vec<String> {
        let steps = self.steps.lock().unwrap();
        let mut names: Vec<String> = steps.keys().cloned().collect();
        names.sort();
        names
    }
}
