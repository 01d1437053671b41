use ndarray::{Array1, Array2};

use crate::error::EstimationError;

const PIVOT_EPS: f64 = 1e-12;

/// Solve the dense linear system `a * x = b` by Gaussian elimination with
/// partial pivoting. `a` must be square with side `b.len()`.
pub(crate) fn solve(
    mut a: Array2<f64>,
    mut b: Array1<f64>,
) -> Result<Array1<f64>, EstimationError> {
    let n = b.len();
    debug_assert_eq!(a.nrows(), n);
    debug_assert_eq!(a.ncols(), n);

    for col in 0..n {
        // Pivot: largest absolute value in this column at or below the diagonal.
        let mut pivot = col;
        for row in (col + 1)..n {
            if a[[row, col]].abs() > a[[pivot, col]].abs() {
                pivot = row;
            }
        }
        if a[[pivot, col]].abs() < PIVOT_EPS {
            return Err(EstimationError::Singular);
        }
        if pivot != col {
            for k in 0..n {
                a.swap([pivot, k], [col, k]);
            }
            b.swap(pivot, col);
        }

        for row in (col + 1)..n {
            let factor = a[[row, col]] / a[[col, col]];
            if factor == 0.0 {
                continue;
            }
            for k in col..n {
                a[[row, k]] -= factor * a[[col, k]];
            }
            b[row] -= factor * b[col];
        }
    }

    // Back substitution.
    let mut x = Array1::zeros(n);
    for row in (0..n).rev() {
        let mut sum = b[row];
        for k in (row + 1)..n {
            sum -= a[[row, k]] * x[k];
        }
        x[row] = sum / a[[row, row]];
    }
    Ok(x)
}
