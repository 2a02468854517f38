//! Linear regression baseline via normal equations

use crate::error::{NephroError, Result};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

/// Ordinary least squares regression with intercept.
/// Solves (X^T X) w = X^T y by Gauss-Jordan elimination; the biomarker
/// feature count is small enough that an explicit solve is fine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinearRegression {
    coefficients: Option<Array1<f64>>,
    intercept: f64,
}

impl LinearRegression {
    /// Create an unfitted model
    pub fn new() -> Self {
        Self {
            coefficients: None,
            intercept: 0.0,
        }
    }

    /// Fit on training data
    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        let n = x.nrows();
        let d = x.ncols();

        if n != y.len() {
            return Err(NephroError::ShapeError {
                expected: format!("y length = {}", n),
                actual: format!("y length = {}", y.len()),
            });
        }
        if n <= d {
            return Err(NephroError::TrainingError(format!(
                "need more samples ({}) than features ({}) for least squares",
                n, d
            )));
        }

        // Augment with a bias column
        let mut xb = Array2::ones((n, d + 1));
        for i in 0..n {
            for j in 0..d {
                xb[[i, j]] = x[[i, j]];
            }
        }

        let xtx = xb.t().dot(&xb);
        let xty = xb.t().dot(y);

        let solution = solve_linear_system(&xtx, &xty).ok_or_else(|| {
            NephroError::TrainingError("normal equations are singular".to_string())
        })?;

        self.intercept = solution[d];
        self.coefficients = Some(solution.slice(ndarray::s![..d]).to_owned());
        Ok(())
    }

    /// Predict targets for new data
    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let coeffs = self
            .coefficients
            .as_ref()
            .ok_or(NephroError::ModelNotFitted)?;

        if x.ncols() != coeffs.len() {
            return Err(NephroError::ShapeError {
                expected: format!("{} columns", coeffs.len()),
                actual: format!("{} columns", x.ncols()),
            });
        }

        Ok(x.dot(coeffs) + self.intercept)
    }

    /// Fitted coefficients, if any
    pub fn coefficients(&self) -> Option<&Array1<f64>> {
        self.coefficients.as_ref()
    }
}

impl Default for LinearRegression {
    fn default() -> Self {
        Self::new()
    }
}

/// Solve a square linear system by Gauss-Jordan elimination with partial pivoting
fn solve_linear_system(a: &Array2<f64>, b: &Array1<f64>) -> Option<Array1<f64>> {
    let n = a.nrows();
    if n != a.ncols() || n != b.len() {
        return None;
    }

    let mut aug = Array2::zeros((n, n + 1));
    for i in 0..n {
        for j in 0..n {
            aug[[i, j]] = a[[i, j]];
        }
        aug[[i, n]] = b[i];
    }

    for col in 0..n {
        let mut max_row = col;
        for row in col + 1..n {
            if aug[[row, col]].abs() > aug[[max_row, col]].abs() {
                max_row = row;
            }
        }

        if max_row != col {
            for j in 0..=n {
                let tmp = aug[[col, j]];
                aug[[col, j]] = aug[[max_row, j]];
                aug[[max_row, j]] = tmp;
            }
        }

        if aug[[col, col]].abs() < 1e-12 {
            return None;
        }

        let pivot = aug[[col, col]];
        for j in 0..=n {
            aug[[col, j]] /= pivot;
        }

        for row in 0..n {
            if row != col {
                let factor = aug[[row, col]];
                for j in 0..=n {
                    aug[[row, j]] -= factor * aug[[col, j]];
                }
            }
        }
    }

    Some(Array1::from_shape_fn(n, |i| aug[[i, n]]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_fits_exact_linear_relation() {
        // y = 2*x0 + 3*x1 + 1
        let x = array![
            [1.0, 1.0],
            [2.0, 1.0],
            [3.0, 2.0],
            [4.0, 3.0],
            [5.0, 5.0]
        ];
        let y = array![6.0, 8.0, 13.0, 18.0, 26.0];

        let mut lr = LinearRegression::new();
        lr.fit(&x, &y).unwrap();

        let coeffs = lr.coefficients().unwrap();
        assert!((coeffs[0] - 2.0).abs() < 1e-8);
        assert!((coeffs[1] - 3.0).abs() < 1e-8);

        let pred = lr.predict(&x).unwrap();
        for (p, t) in pred.iter().zip(y.iter()) {
            assert!((p - t).abs() < 1e-8);
        }
    }

    #[test]
    fn test_predict_requires_fit() {
        let lr = LinearRegression::new();
        assert!(matches!(
            lr.predict(&array![[1.0]]),
            Err(NephroError::ModelNotFitted)
        ));
    }

    #[test]
    fn test_underdetermined_rejected() {
        let x = array![[1.0, 2.0]];
        let y = array![1.0];
        let mut lr = LinearRegression::new();
        assert!(lr.fit(&x, &y).is_err());
    }
}
