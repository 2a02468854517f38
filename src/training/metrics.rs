//! Evaluation metrics for regression and classification

use ndarray::Array1;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Regression metrics for eGFR prediction
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegressionReport {
    pub rmse: f64,
    pub mae: f64,
    /// Mean absolute percentage error; samples with a zero target are skipped
    pub mape: f64,
    pub r2: f64,
}

impl RegressionReport {
    /// Compute regression metrics from true and predicted targets
    pub fn compute(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> Self {
        let n = y_true.len() as f64;
        let errors: Vec<f64> = y_true
            .iter()
            .zip(y_pred.iter())
            .map(|(t, p)| t - p)
            .collect();

        let mse: f64 = errors.iter().map(|e| e * e).sum::<f64>() / n;
        let mae: f64 = errors.iter().map(|e| e.abs()).sum::<f64>() / n;

        let nonzero: Vec<(f64, f64)> = y_true
            .iter()
            .zip(y_pred.iter())
            .filter(|(t, _)| **t != 0.0)
            .map(|(t, p)| (*t, *p))
            .collect();
        let mape = if nonzero.is_empty() {
            0.0
        } else {
            nonzero
                .iter()
                .map(|(t, p)| ((t - p) / t).abs())
                .sum::<f64>()
                / nonzero.len() as f64
                * 100.0
        };

        let y_mean: f64 = y_true.iter().sum::<f64>() / n;
        let ss_tot: f64 = y_true.iter().map(|y| (y - y_mean).powi(2)).sum();
        let ss_res: f64 = errors.iter().map(|e| e.powi(2)).sum();
        let r2 = if ss_tot > 0.0 {
            1.0 - ss_res / ss_tot
        } else {
            0.0
        };

        Self {
            rmse: mse.sqrt(),
            mae,
            mape,
            r2,
        }
    }
}

/// Root-mean-squared error between true and predicted targets
pub fn rmse(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> f64 {
    let n = y_true.len() as f64;
    let mse = y_true
        .iter()
        .zip(y_pred.iter())
        .map(|(t, p)| (t - p).powi(2))
        .sum::<f64>()
        / n;
    mse.sqrt()
}

/// Multi-class classification metrics, weighted-averaged across classes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassificationReport {
    pub accuracy: f64,
    pub precision: f64,
    pub recall: f64,
    pub f1_score: f64,
    /// Class labels, sorted, indexing the confusion matrix
    pub classes: Vec<i64>,
    /// Row = true class, column = predicted class
    pub confusion_matrix: Vec<Vec<usize>>,
    /// Cross-validation weighted-F1 mean, when CV was run
    pub cv_mean: Option<f64>,
    /// Cross-validation weighted-F1 standard deviation
    pub cv_std: Option<f64>,
}

impl ClassificationReport {
    /// Compute weighted precision/recall/F1 and the confusion matrix
    pub fn compute(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> Self {
        let n = y_true.len();

        let mut class_set: BTreeMap<i64, usize> = BTreeMap::new();
        for &v in y_true.iter().chain(y_pred.iter()) {
            class_set.entry(v.round() as i64).or_insert(0);
        }
        let classes: Vec<i64> = class_set.keys().copied().collect();
        for (idx, (_, slot)) in class_set.iter_mut().enumerate() {
            *slot = idx;
        }

        let k = classes.len();
        let mut cm = vec![vec![0usize; k]; k];
        let mut correct = 0usize;

        for (t, p) in y_true.iter().zip(y_pred.iter()) {
            let ti = class_set[&(t.round() as i64)];
            let pi = class_set[&(p.round() as i64)];
            cm[ti][pi] += 1;
            if ti == pi {
                correct += 1;
            }
        }

        // Weighted average: each class's score weighted by its support
        let mut precision = 0.0;
        let mut recall = 0.0;
        let mut f1 = 0.0;
        for ci in 0..k {
            let support: usize = cm[ci].iter().sum();
            if support == 0 {
                continue;
            }
            let tp = cm[ci][ci] as f64;
            let predicted: usize = (0..k).map(|r| cm[r][ci]).sum();

            let p = if predicted > 0 {
                tp / predicted as f64
            } else {
                0.0
            };
            let r = tp / support as f64;
            let f = if p + r > 0.0 {
                2.0 * p * r / (p + r)
            } else {
                0.0
            };

            let weight = support as f64 / n as f64;
            precision += weight * p;
            recall += weight * r;
            f1 += weight * f;
        }

        Self {
            accuracy: correct as f64 / n as f64,
            precision,
            recall,
            f1_score: f1,
            classes,
            confusion_matrix: cm,
            cv_mean: None,
            cv_std: None,
        }
    }

    /// Attach cross-validation F1 statistics
    pub fn with_cv_scores(mut self, scores: &[f64]) -> Self {
        if scores.is_empty() {
            return self;
        }
        let mean = scores.iter().sum::<f64>() / scores.len() as f64;
        let var =
            scores.iter().map(|s| (s - mean).powi(2)).sum::<f64>() / scores.len() as f64;
        self.cv_mean = Some(mean);
        self.cv_std = Some(var.sqrt());
        self
    }
}
