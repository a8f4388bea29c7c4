//! Ordinary least squares

use super::{check_width, check_xy, Regressor};
use crate::error::{LoanError, Result};
use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};

/// Solve a symmetric positive-definite system with a Cholesky factorization
fn cholesky_solve(a: &Array2<f64>, b: &Array1<f64>) -> Option<Array1<f64>> {
    let n = a.nrows();
    if n != a.ncols() || n != b.len() {
        return None;
    }

    // A = L * L^T
    let mut l = Array2::<f64>::zeros((n, n));
    for i in 0..n {
        for j in 0..=i {
            let mut sum = 0.0;
            for k in 0..j {
                sum += l[[i, k]] * l[[j, k]];
            }
            if i == j {
                let diag = a[[i, i]] - sum;
                if diag <= 0.0 {
                    return None;
                }
                l[[i, j]] = diag.sqrt();
            } else {
                l[[i, j]] = (a[[i, j]] - sum) / l[[j, j]];
            }
        }
    }

    // L * z = b
    let mut z = Array1::<f64>::zeros(n);
    for i in 0..n {
        let mut sum = 0.0;
        for j in 0..i {
            sum += l[[i, j]] * z[j];
        }
        z[i] = (b[i] - sum) / l[[i, i]];
    }

    // L^T * w = z
    let mut w = Array1::<f64>::zeros(n);
    for i in (0..n).rev() {
        let mut sum = 0.0;
        for j in (i + 1)..n {
            sum += l[[j, i]] * w[j];
        }
        w[i] = (z[i] - sum) / l[[i, i]];
    }

    Some(w)
}

/// Gaussian elimination with partial pivoting; near-zero pivots zero the
/// corresponding coefficient
fn gauss_solve(a: &Array2<f64>, b: &Array1<f64>) -> Array1<f64> {
    let n = a.nrows();
    let mut aug = Array2::<f64>::zeros((n, n + 1));
    for i in 0..n {
        for j in 0..n {
            aug[[i, j]] = a[[i, j]];
        }
        aug[[i, n]] = b[i];
    }

    let mut pivots = vec![None; n];
    let mut row = 0;
    for col in 0..n {
        if row >= n {
            break;
        }
        let mut max_row = row;
        for r in row + 1..n {
            if aug[[r, col]].abs() > aug[[max_row, col]].abs() {
                max_row = r;
            }
        }
        if aug[[max_row, col]].abs() < 1e-10 {
            continue;
        }
        if max_row != row {
            for j in 0..=n {
                aug.swap([row, j], [max_row, j]);
            }
        }

        let pivot = aug[[row, col]];
        for j in 0..=n {
            aug[[row, j]] /= pivot;
        }
        for r in 0..n {
            if r != row {
                let factor = aug[[r, col]];
                if factor != 0.0 {
                    for j in 0..=n {
                        aug[[r, j]] -= factor * aug[[row, j]];
                    }
                }
            }
        }
        pivots[col] = Some(row);
        row += 1;
    }

    Array1::from_iter(pivots.into_iter().map(|p| p.map_or(0.0, |r| aug[[r, n]])))
}

/// Linear regression with intercept, fit via the normal equations.
///
/// A vanishing ridge term keeps collinear indicator columns solvable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinearRegression {
    /// Fitted coefficients (weights)
    pub coefficients: Option<Array1<f64>>,
    /// Fitted intercept (bias)
    pub intercept: f64,
    pub fit_intercept: bool,
    is_fitted: bool,
}

impl Default for LinearRegression {
    fn default() -> Self {
        Self::new()
    }
}

impl LinearRegression {
    pub fn new() -> Self {
        Self {
            coefficients: None,
            intercept: 0.0,
            fit_intercept: true,
            is_fitted: false,
        }
    }

    pub fn with_fit_intercept(mut self, fit_intercept: bool) -> Self {
        self.fit_intercept = fit_intercept;
        self
    }
}

impl Regressor for LinearRegression {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        check_xy(x, y)?;
        let n_features = x.ncols();

        let (x_centered, y_centered, x_mean, y_mean) = if self.fit_intercept {
            let x_mean = x
                .mean_axis(Axis(0))
                .ok_or_else(|| LoanError::TrainingError("empty feature matrix".to_string()))?;
            let y_mean = y.mean().unwrap_or(0.0);
            (x - &x_mean.view().insert_axis(Axis(0)), y - y_mean, x_mean, y_mean)
        } else {
            (x.clone(), y.clone(), Array1::zeros(n_features), 0.0)
        };

        let mut xtx = x_centered.t().dot(&x_centered);
        let xty = x_centered.t().dot(&y_centered);

        let ridge = 1e-10 * (xtx.diag().sum() / n_features as f64).max(1.0);
        for i in 0..n_features {
            xtx[[i, i]] += ridge;
        }

        let coefficients = cholesky_solve(&xtx, &xty).unwrap_or_else(|| gauss_solve(&xtx, &xty));
        if coefficients.iter().any(|c| !c.is_finite()) {
            return Err(LoanError::TrainingError(
                "least squares produced non-finite coefficients".to_string(),
            ));
        }

        self.intercept = y_mean - coefficients.dot(&x_mean);
        self.coefficients = Some(coefficients);
        self.is_fitted = true;
        Ok(())
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let coefficients = match (&self.coefficients, self.is_fitted) {
            (Some(c), true) => c,
            _ => return Err(LoanError::ModelNotFitted),
        };
        check_width(x, coefficients.len())?;
        Ok(x.dot(coefficients) + self.intercept)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_recovers_plane() {
        let x = array![[1.0, 0.0], [2.0, 1.0], [3.0, 5.0], [4.0, 2.0], [5.0, 3.0]];
        let y = x.column(0).mapv(|v| 3.0 * v) + x.column(1).mapv(|v| -2.0 * v) + 1.0;

        let mut model = LinearRegression::new();
        model.fit(&x, &y).unwrap();

        let coef = model.coefficients.as_ref().unwrap();
        assert!((coef[0] - 3.0).abs() < 1e-6);
        assert!((coef[1] + 2.0).abs() < 1e-6);
        assert!((model.intercept - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_collinear_columns_still_fit() {
        // second column duplicates the first
        let x = array![[1.0, 1.0], [2.0, 2.0], [3.0, 3.0], [4.0, 4.0]];
        let y = array![2.0, 4.0, 6.0, 8.0];

        let mut model = LinearRegression::new();
        model.fit(&x, &y).unwrap();
        let pred = model.predict(&x).unwrap();
        for (p, t) in pred.iter().zip(y.iter()) {
            assert!((p - t).abs() < 1e-4);
        }
    }

    #[test]
    fn test_predict_before_fit() {
        let model = LinearRegression::new();
        assert!(matches!(
            model.predict(&array![[1.0]]),
            Err(LoanError::ModelNotFitted)
        ));
    }

    #[test]
    fn test_width_mismatch() {
        let mut model = LinearRegression::new();
        model.fit(&array![[1.0], [2.0]], &array![1.0, 2.0]).unwrap();
        assert!(matches!(
            model.predict(&array![[1.0, 2.0]]),
            Err(LoanError::ShapeError { .. })
        ));
    }
}
