use ndarray::{Array1, ArrayView1, ArrayView2};
use serde::{Deserialize, Serialize};

use crate::error::EstimationError;
use crate::solve::solve;

/// Ordinary least squares estimator.
pub struct LinearModel;

impl LinearModel {
    /// Fit `y ~ x` by solving the normal equations.
    ///
    /// `x` is the full design matrix; an intercept, if wanted, must be
    /// included as a column of ones. `names` labels the columns of `x` and
    /// must have one entry per column.
    pub fn fit(
        x: ArrayView2<f64>,
        y: ArrayView1<f64>,
        names: &[String],
    ) -> Result<FittedLinear, EstimationError> {
        let (n, k) = (x.nrows(), x.ncols());
        if n == 0 || k == 0 {
            return Err(EstimationError::EmptyData);
        }
        if y.len() != n {
            return Err(EstimationError::RowMismatch {
                rows: n,
                response: y.len(),
            });
        }
        if names.len() != k {
            return Err(EstimationError::ColumnMismatch {
                expected: k,
                actual: names.len(),
            });
        }

        let xtx = x.t().dot(&x);
        let xty = x.t().dot(&y);
        let beta = solve(xtx, xty)?;

        let residuals = &y.to_owned() - &x.dot(&beta);
        let ssr: f64 = residuals.iter().map(|r| r * r).sum();
        let mean = y.sum() / n as f64;
        let sst: f64 = y.iter().map(|v| (v - mean) * (v - mean)).sum();
        // A constant response fits exactly; avoid 0/0.
        let r_squared = if sst > f64::EPSILON { 1.0 - ssr / sst } else { 1.0 };
        let residual_std = if n > k {
            (ssr / (n - k) as f64).sqrt()
        } else {
            0.0
        };

        Ok(FittedLinear {
            column_names: names.to_vec(),
            coefficients: beta.to_vec(),
            r_squared,
            residual_std,
            n_obs: n,
        })
    }
}

/// Result of an OLS fit. Serializable so templates can persist it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FittedLinear {
    pub column_names: Vec<String>,
    pub coefficients: Vec<f64>,
    pub r_squared: f64,
    pub residual_std: f64,
    pub n_obs: usize,
}

impl FittedLinear {
    /// Predicted values for a design matrix with the same columns as the fit.
    pub fn predict(&self, x: ArrayView2<f64>) -> Result<Array1<f64>, EstimationError> {
        if x.ncols() != self.coefficients.len() {
            return Err(EstimationError::ColumnMismatch {
                expected: self.coefficients.len(),
                actual: x.ncols(),
            });
        }
        let beta = Array1::from_vec(self.coefficients.clone());
        Ok(x.dot(&beta))
    }

    /// Human-readable fit report, in the spirit of a statsmodels summary.
    pub fn summary(&self) -> String {
        let mut out = String::new();
        out.push_str("OLS regression results\n");
        out.push_str(&format!(
            "n = {}, R² = {:.4}, residual std = {:.4}\n",
            self.n_obs, self.r_squared, self.residual_std
        ));
        for (name, coef) in self.column_names.iter().zip(&self.coefficients) {
            out.push_str(&format!("{name:>20}  {coef:>12.6}\n"));
        }
        out
    }
}
