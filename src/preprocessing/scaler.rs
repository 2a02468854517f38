//! Standard (z-score) feature scaling over ndarray matrices

use crate::error::{NephroError, Result};
use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};

/// Standard scaler: (x - mean) / std per feature column.
/// Zero-variance columns scale by 1.0 so constant features pass through.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StandardScaler {
    mean: Option<Array1<f64>>,
    std: Option<Array1<f64>>,
}

impl StandardScaler {
    /// Create an unfitted scaler
    pub fn new() -> Self {
        Self {
            mean: None,
            std: None,
        }
    }

    /// Fit the scaler to the data
    pub fn fit(&mut self, x: &Array2<f64>) -> Result<&mut Self> {
        if x.nrows() == 0 {
            return Err(NephroError::PreprocessingError(
                "cannot fit scaler on an empty matrix".to_string(),
            ));
        }

        let mean = x.mean_axis(Axis(0)).ok_or_else(|| {
            NephroError::PreprocessingError("failed to compute column means".to_string())
        })?;
        let std = x
            .std_axis(Axis(0), 1.0)
            .mapv(|s| if s == 0.0 || !s.is_finite() { 1.0 } else { s });

        self.mean = Some(mean);
        self.std = Some(std);
        Ok(self)
    }

    /// Transform data with the fitted parameters
    pub fn transform(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        let (mean, std) = match (&self.mean, &self.std) {
            (Some(m), Some(s)) => (m, s),
            _ => return Err(NephroError::ModelNotFitted),
        };

        if x.ncols() != mean.len() {
            return Err(NephroError::ShapeError {
                expected: format!("{} columns", mean.len()),
                actual: format!("{} columns", x.ncols()),
            });
        }

        let mut out = x.clone();
        for mut row in out.rows_mut() {
            for j in 0..row.len() {
                row[j] = (row[j] - mean[j]) / std[j];
            }
        }
        Ok(out)
    }

    /// Fit and transform in one step
    pub fn fit_transform(&mut self, x: &Array2<f64>) -> Result<Array2<f64>> {
        self.fit(x)?;
        self.transform(x)
    }
}

impl Default for StandardScaler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_fit_transform_centers_and_scales() {
        let x = array![[1.0, 10.0], [2.0, 20.0], [3.0, 30.0]];
        let mut scaler = StandardScaler::new();
        let scaled = scaler.fit_transform(&x).unwrap();

        let mean = scaled.mean_axis(Axis(0)).unwrap();
        assert!(mean.iter().all(|&m| m.abs() < 1e-10));

        let std = scaled.std_axis(Axis(0), 1.0);
        assert!(std.iter().all(|&s| (s - 1.0).abs() < 1e-10));
    }

    #[test]
    fn test_transform_requires_fit() {
        let scaler = StandardScaler::new();
        let x = array![[1.0], [2.0]];
        assert!(matches!(
            scaler.transform(&x),
            Err(NephroError::ModelNotFitted)
        ));
    }

    #[test]
    fn test_constant_column_passes_through() {
        let x = array![[5.0, 1.0], [5.0, 2.0], [5.0, 3.0]];
        let mut scaler = StandardScaler::new();
        let scaled = scaler.fit_transform(&x).unwrap();
        assert!(scaled.column(0).iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_shape_mismatch_rejected() {
        let mut scaler = StandardScaler::new();
        scaler.fit(&array![[1.0, 2.0], [3.0, 4.0]]).unwrap();
        assert!(scaler.transform(&array![[1.0], [2.0]]).is_err());
    }
}
