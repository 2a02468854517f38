//! Bounded continuous search space for hyperparameter optimization

use crate::error::{NephroError, Result};
use serde::{Deserialize, Serialize};

/// A continuous box-bounded search space. Immutable once built; every
/// candidate the optimizer produces stays inside these bounds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchSpace {
    lower: Vec<f64>,
    upper: Vec<f64>,
}

impl SearchSpace {
    /// Create a search space from per-dimension bounds.
    /// Rejects empty spaces, mismatched lengths, non-finite bounds, and
    /// any dimension where lower > upper.
    pub fn new(lower: Vec<f64>, upper: Vec<f64>) -> Result<Self> {
        if lower.is_empty() {
            return Err(NephroError::InvalidSearchSpace(
                "dimensionality must be positive".to_string(),
            ));
        }
        if lower.len() != upper.len() {
            return Err(NephroError::InvalidSearchSpace(format!(
                "bound lengths differ: {} lower vs {} upper",
                lower.len(),
                upper.len()
            )));
        }
        for (i, (lo, hi)) in lower.iter().zip(upper.iter()).enumerate() {
            if !lo.is_finite() || !hi.is_finite() {
                return Err(NephroError::InvalidSearchSpace(format!(
                    "non-finite bound in dimension {}",
                    i
                )));
            }
            if lo > hi {
                return Err(NephroError::InvalidSearchSpace(format!(
                    "lower[{}] = {} exceeds upper[{}] = {}",
                    i, lo, i, hi
                )));
            }
        }
        Ok(Self { lower, upper })
    }

    /// The standard SVR space: C ∈ [0.1, 100], epsilon ∈ [0.01, 1],
    /// gamma ∈ [0.001, 1]
    pub fn svr_default() -> Self {
        Self {
            lower: vec![0.1, 0.01, 0.001],
            upper: vec![100.0, 1.0, 1.0],
        }
    }

    /// Number of dimensions
    pub fn dim(&self) -> usize {
        self.lower.len()
    }

    /// Lower bounds
    pub fn lower(&self) -> &[f64] {
        &self.lower
    }

    /// Upper bounds
    pub fn upper(&self) -> &[f64] {
        &self.upper
    }

    /// Clamp a coordinate into its dimension's bounds
    pub fn clamp(&self, dim: usize, value: f64) -> f64 {
        value.clamp(self.lower[dim], self.upper[dim])
    }

    /// Check a full position against the bounds
    pub fn contains(&self, position: &[f64]) -> bool {
        position.len() == self.dim()
            && position
                .iter()
                .enumerate()
                .all(|(i, &v)| v >= self.lower[i] && v <= self.upper[i])
    }
}
