//! Data loading and synthetic cohort generation

mod loader;
mod synthetic;

pub use loader::{
    cohort_from_frame, cohort_to_frame, encode_sex, load_csv, to_feature_matrix, write_csv,
};
pub use synthetic::{generate_cohort, SyntheticConfig};

use crate::error::{NephroError, Result};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

/// Standard biomarker feature columns, in model order
pub const FEATURE_COLUMNS: [&str; 10] = [
    "Age",
    "Sex_encoded",
    "BMI",
    "SCr",
    "SCysC",
    "HbA1c",
    "CRP",
    "Alb",
    "SBP",
    "DBP",
];

/// An in-memory patient cohort: a named feature matrix, one row per patient
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cohort {
    pub feature_names: Vec<String>,
    pub features: Array2<f64>,
}

impl Cohort {
    /// Number of patients
    pub fn len(&self) -> usize {
        self.features.nrows()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.features.nrows() == 0
    }

    /// Extract a named column
    pub fn column(&self, name: &str) -> Result<Array1<f64>> {
        let idx = self
            .feature_names
            .iter()
            .position(|n| n == name)
            .ok_or_else(|| NephroError::DataError(format!("column not found: {}", name)))?;
        Ok(self.features.column(idx).to_owned())
    }
}
