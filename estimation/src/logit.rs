use ndarray::{Array1, Array2, ArrayView1, ArrayView2};
use serde::{Deserialize, Serialize};

use crate::error::EstimationError;
use crate::solve::solve;

const MAX_ITER: usize = 50;
const GRAD_TOL: f64 = 1e-8;
const PROB_EPS: f64 = 1e-10;

/// Binary logit estimator (Newton-Raphson on the log-likelihood).
pub struct LogitModel;

impl LogitModel {
    /// Fit a binary logit of `y` (0/1) on the design matrix `x`.
    ///
    /// `x` is the full design matrix; an intercept, if wanted, must be
    /// included as a column of ones. `names` labels the columns of `x`.
    pub fn fit(
        x: ArrayView2<f64>,
        y: ArrayView1<f64>,
        names: &[String],
    ) -> Result<FittedLogit, EstimationError> {
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
        if y.iter().any(|&v| v != 0.0 && v != 1.0) {
            return Err(EstimationError::NonBinaryResponse);
        }

        let mut beta = Array1::<f64>::zeros(k);
        let mut ll = log_likelihood(&x, &y, &beta);

        for iter in 0..MAX_ITER {
            let p = probabilities_for(&x, &beta);
            let grad = x.t().dot(&(&y.to_owned() - &p));
            if grad.iter().all(|g| g.abs() < GRAD_TOL) {
                return Ok(FittedLogit {
                    column_names: names.to_vec(),
                    coefficients: beta.to_vec(),
                    log_likelihood: ll,
                    iterations: iter,
                    n_obs: n,
                });
            }

            // Hessian: X' W X with W = diag(p (1 - p)).
            let mut xw = Array2::<f64>::zeros((n, k));
            for i in 0..n {
                let w = p[i] * (1.0 - p[i]);
                for j in 0..k {
                    xw[[i, j]] = x[[i, j]] * w;
                }
            }
            let hessian = x.t().dot(&xw);
            let full_step = solve(hessian, grad)?;

            // Step-halving keeps the likelihood from decreasing on
            // badly-scaled data.
            let mut scale = 1.0;
            let mut accepted = false;
            for _ in 0..10 {
                let candidate = &beta + &(&full_step * scale);
                let candidate_ll = log_likelihood(&x, &y, &candidate);
                if candidate_ll >= ll {
                    beta = candidate;
                    ll = candidate_ll;
                    accepted = true;
                    break;
                }
                scale /= 2.0;
            }
            if !accepted {
                return Err(EstimationError::NoConvergence(iter + 1));
            }
        }

        Err(EstimationError::NoConvergence(MAX_ITER))
    }
}

fn sigmoid(v: f64) -> f64 {
    1.0 / (1.0 + (-v).exp())
}

fn probabilities_for(x: &ArrayView2<f64>, beta: &Array1<f64>) -> Array1<f64> {
    x.dot(beta).mapv(sigmoid)
}

fn log_likelihood(x: &ArrayView2<f64>, y: &ArrayView1<f64>, beta: &Array1<f64>) -> f64 {
    let p = probabilities_for(x, beta);
    y.iter()
        .zip(p.iter())
        .map(|(&yi, &pi)| {
            let pi = pi.clamp(PROB_EPS, 1.0 - PROB_EPS);
            yi * pi.ln() + (1.0 - yi) * (1.0 - pi).ln()
        })
        .sum()
}

/// Result of a logit fit. Serializable so templates can persist it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FittedLogit {
    pub column_names: Vec<String>,
    pub coefficients: Vec<f64>,
    pub log_likelihood: f64,
    pub iterations: usize,
    pub n_obs: usize,
}

impl FittedLogit {
    /// Predicted probabilities for a design matrix with the same columns as
    /// the fit.
    pub fn probabilities(&self, x: ArrayView2<f64>) -> Result<Array1<f64>, EstimationError> {
        if x.ncols() != self.coefficients.len() {
            return Err(EstimationError::ColumnMismatch {
                expected: self.coefficients.len(),
                actual: x.ncols(),
            });
        }
        let beta = Array1::from_vec(self.coefficients.clone());
        Ok(x.dot(&beta).mapv(sigmoid))
    }

    /// Human-readable fit report.
    pub fn summary(&self) -> String {
        let mut out = String::new();
        out.push_str("Binary logit results\n");
        out.push_str(&format!(
            "n = {}, log-likelihood = {:.4}, iterations = {}\n",
            self.n_obs, self.log_likelihood, self.iterations
        ));
        for (name, coef) in self.column_names.iter().zip(&self.coefficients) {
            out.push_str(&format!("{name:>20}  {coef:>12.6}\n"));
        }
        out
    }
}
