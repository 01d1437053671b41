//! Assembly of estimation inputs from orchestrator tables.

use ndarray::{Array1, Array2};

use modelmanager_orchestration::Table;

use crate::error::TemplateError;

pub const INTERCEPT: &str = "Intercept";

fn column<'t>(
    table_name: &str,
    table: &'t Table,
    name: &str,
) -> Result<&'t [f64], TemplateError> {
    table.column(name).ok_or_else(|| TemplateError::MissingColumn {
        table: table_name.to_string(),
        column: name.to_string(),
    })
}

/// Build the design matrix for a set of predictor columns: a leading column
/// of ones for the intercept, then one column per predictor.
pub fn design_matrix(
    table_name: &str,
    table: &Table,
    rhs: &[String],
) -> Result<Array2<f64>, TemplateError> {
    let n = table.rows();
    let mut x = Array2::ones((n, rhs.len() + 1));
    for (j, name) in rhs.iter().enumerate() {
        let values = column(table_name, table, name)?;
        for (i, &v) in values.iter().enumerate() {
            x[[i, j + 1]] = v;
        }
    }
    Ok(x)
}

/// Column labels matching [design_matrix].
pub fn design_names(rhs: &[String]) -> Vec<String> {
    std::iter::once(INTERCEPT.to_string())
        .chain(rhs.iter().cloned())
        .collect()
}

/// The response column as an owned vector.
pub fn response(
    table_name: &str,
    table: &Table,
    lhs: &str,
) -> Result<Array1<f64>, TemplateError> {
    Ok(Array1::from_vec(column(table_name, table, lhs)?.to_vec()))
}
