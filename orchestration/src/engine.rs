use crate::error::OrchestrationError;
use crate::table::Table;

/// A deferred step body: declared under a name now, executed later against
/// whatever orchestrator invokes it.
pub type StepBody =
    Box<dyn Fn(&dyn Orchestrator) -> Result<(), OrchestrationError> + Send + Sync>;

/// Orchestrator is the interface between registered model steps and the
/// system that stores tables and runs steps in sequence.
///
/// Tables and steps are always referred to by name, never passed by value
/// across the interface. All implementations must be safe for concurrent
/// use (Send + Sync); methods take `&self` and rely on interior mutability.
pub trait Orchestrator: Send + Sync {
    /// Fetch a snapshot of a named table.
    fn get_table(&self, name: &str) -> Result<Table, OrchestrationError>;

    /// Add or replace a named table.
    fn put_table(&self, name: &str, table: Table) -> Result<(), OrchestrationError>;

    /// Add or replace one column of an existing table.
    fn update_column(
        &self,
        table: &str,
        column: &str,
        values: Vec<f64>,
    ) -> Result<(), OrchestrationError>;

    /// Declare a runnable step under a name, replacing any prior step with
    /// the same name. The body is not executed here.
    fn add_step(&self, name: &str, body: StepBody) -> Result<(), OrchestrationError>;

    /// Remove a declared step. No error if the name is unknown.
    fn remove_step(&self, name: &str) -> Result<(), OrchestrationError>;

    /// Run declared steps in the given order.
    fn run_steps(&self, names: &[&str]) -> Result<(), OrchestrationError>;

    /// Names of all declared steps, sorted.
    fn step_names(&self) -> Vec<String>;
}
