//! Objective adapter: SVR validation RMSE
//!
//! Bridges the optimizer's raw parameter vectors to estimator training.
//! A candidate that fails to build, fit, or predict scores
//! `f64::INFINITY` instead of aborting the search.

use crate::training::metrics::rmse;
use crate::training::svm::{SvrParams, SvrRegressor};
use ndarray::{Array1, Array2};
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::trace;

/// Scores SVR hyperparameter candidates by RMSE on a held-out
/// validation split. Parameter vectors are positional:
/// `[C, epsilon, gamma]`.
pub struct SvrObjective {
    x_train: Array2<f64>,
    y_train: Array1<f64>,
    x_val: Array2<f64>,
    y_val: Array1<f64>,
    evaluations: AtomicUsize,
}

impl SvrObjective {
    /// Create an objective closed over the given splits
    pub fn new(
        x_train: Array2<f64>,
        y_train: Array1<f64>,
        x_val: Array2<f64>,
        y_val: Array1<f64>,
    ) -> Self {
        Self {
            x_train,
            y_train,
            x_val,
            y_val,
            evaluations: AtomicUsize::new(0),
        }
    }

    /// Evaluate one candidate. Returns a finite non-negative RMSE, or
    /// `f64::INFINITY` for any failing or non-finite candidate.
    pub fn evaluate(&self, params: &[f64]) -> f64 {
        self.evaluations.fetch_add(1, Ordering::Relaxed);

        let score = self.try_evaluate(params).unwrap_or(f64::INFINITY);
        if score.is_finite() {
            score
        } else {
            f64::INFINITY
        }
    }

    fn try_evaluate(&self, params: &[f64]) -> crate::Result<f64> {
        let svr_params = SvrParams::from_vector(params)?;
        let mut svr = SvrRegressor::new(svr_params)?;
        svr.fit(&self.x_train, &self.y_train)?;
        let predictions = svr.predict(&self.x_val)?;
        let score = rmse(&self.y_val, &predictions);
        trace!(?svr_params, score, "candidate evaluated");
        Ok(score)
    }

    /// How many candidates have been evaluated
    pub fn call_count(&self) -> usize {
        self.evaluations.load(Ordering::Relaxed)
    }
}
