//! Support vector models
//!
//! `SvrRegressor` is the estimator the Grey Wolf Optimizer tunes: an
//! epsilon-insensitive support vector regressor trained by coordinate
//! updates over a precomputed kernel matrix. `SvmClassifier` is the
//! polynomial-kernel one-vs-rest classifier used for CKD staging,
//! trained with SMO.

use crate::error::{NephroError, Result};
use ndarray::{Array1, Array2};
use rand::prelude::*;
use rand_xoshiro::Xoshiro256PlusPlus;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Kernel matrices above this sample count would risk OOM; training is
/// rejected instead.
const MAX_KERNEL_MATRIX_SAMPLES: usize = 10_000;

/// Kernel function type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum KernelType {
    /// Linear kernel: K(x, y) = x · y
    Linear,
    /// Radial basis function: K(x, y) = exp(-γ * ||x - y||²)
    Rbf { gamma: f64 },
    /// Polynomial kernel: K(x, y) = (γ * x · y + r)^d
    Polynomial { degree: u32, gamma: f64, coef0: f64 },
}

impl KernelType {
    fn compute(&self, a: &Array1<f64>, b: &Array1<f64>) -> f64 {
        match self {
            KernelType::Linear => a.dot(b),
            KernelType::Rbf { gamma } => {
                let diff = a - b;
                (-gamma * diff.dot(&diff)).exp()
            }
            KernelType::Polynomial {
                degree,
                gamma,
                coef0,
            } => (gamma * a.dot(b) + coef0).powi(*degree as i32),
        }
    }
}

/// Compute the symmetric kernel matrix, parallelizing rows for larger sets
fn kernel_matrix(kernel: &KernelType, x: &Array2<f64>) -> Array2<f64> {
    let n = x.nrows();
    let rows: Vec<Array1<f64>> = (0..n).map(|i| x.row(i).to_owned()).collect();

    let mut k = Array2::zeros((n, n));

    if n < 100 {
        for i in 0..n {
            for j in i..n {
                let val = kernel.compute(&rows[i], &rows[j]);
                k[[i, j]] = val;
                k[[j, i]] = val;
            }
        }
        return k;
    }

    let upper: Vec<Vec<(usize, f64)>> = (0..n)
        .into_par_iter()
        .map(|i| {
            (i..n)
                .map(|j| (j, kernel.compute(&rows[i], &rows[j])))
                .collect()
        })
        .collect();

    for (i, row_vals) in upper.into_iter().enumerate() {
        for (j, val) in row_vals {
            k[[i, j]] = val;
            k[[j, i]] = val;
        }
    }
    k
}

/// SVR hyperparameters, in the order the optimizer searches them
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SvrParams {
    /// Regularization strength (C)
    pub c: f64,
    /// Epsilon-tube width (margin tolerance)
    pub epsilon: f64,
    /// RBF kernel bandwidth
    pub gamma: f64,
}

impl SvrParams {
    /// Interpret a positional parameter vector: [C, epsilon, gamma]
    pub fn from_vector(params: &[f64]) -> Result<Self> {
        if params.len() != 3 {
            return Err(NephroError::InvalidParameter {
                name: "params".to_string(),
                value: format!("{} values", params.len()),
                reason: "expected [C, epsilon, gamma]".to_string(),
            });
        }
        let p = Self {
            c: params[0],
            epsilon: params[1],
            gamma: params[2],
        };
        p.validate()?;
        Ok(p)
    }

    /// Reject non-finite or non-positive hyperparameters
    pub fn validate(&self) -> Result<()> {
        let checks = [
            ("c", self.c, self.c > 0.0),
            ("epsilon", self.epsilon, self.epsilon >= 0.0),
            ("gamma", self.gamma, self.gamma > 0.0),
        ];
        for (name, value, ok) in checks {
            if !ok || !value.is_finite() {
                return Err(NephroError::InvalidParameter {
                    name: name.to_string(),
                    value: value.to_string(),
                    reason: "must be a positive finite real".to_string(),
                });
            }
        }
        Ok(())
    }
}

impl Default for SvrParams {
    fn default() -> Self {
        Self {
            c: 10.0,
            epsilon: 0.1,
            gamma: 0.1,
        }
    }
}

/// Epsilon-insensitive support vector regressor with an RBF kernel
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SvrRegressor {
    params: SvrParams,
    max_iter: usize,
    tol: f64,
    support_vectors: Option<Array2<f64>>,
    /// Combined coefficients (alpha - alpha*), one per support vector
    alphas: Option<Array1<f64>>,
    bias: f64,
    is_fitted: bool,
}

impl SvrRegressor {
    /// Create a regressor with the given hyperparameters
    pub fn new(params: SvrParams) -> Result<Self> {
        params.validate()?;
        Ok(Self {
            params,
            max_iter: 500,
            tol: 1e-3,
            support_vectors: None,
            alphas: None,
            bias: 0.0,
            is_fitted: false,
        })
    }

    /// Builder method to set the iteration cap
    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    /// Hyperparameters this model was built with
    pub fn params(&self) -> SvrParams {
        self.params
    }

    fn kernel(&self) -> KernelType {
        KernelType::Rbf {
            gamma: self.params.gamma,
        }
    }

    /// Fit by gradient updates on the epsilon-insensitive loss
    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        let n = x.nrows();
        if n == 0 {
            return Err(NephroError::TrainingError(
                "cannot fit SVR on empty data".to_string(),
            ));
        }
        if n != y.len() {
            return Err(NephroError::ShapeError {
                expected: format!("y length = {}", n),
                actual: format!("y length = {}", y.len()),
            });
        }
        if n > MAX_KERNEL_MATRIX_SAMPLES {
            return Err(NephroError::TrainingError(format!(
                "dataset has {} samples, exceeding the kernel matrix cap of {}",
                n, MAX_KERNEL_MATRIX_SAMPLES
            )));
        }

        let k = kernel_matrix(&self.kernel(), x);

        let mut alphas: Array1<f64> = Array1::zeros(n);
        let mut alphas_star: Array1<f64> = Array1::zeros(n);
        let mut bias = 0.0;
        let learning_rate = 0.01;

        for _ in 0..self.max_iter {
            let mut max_change: f64 = 0.0;

            for i in 0..n {
                let mut pred = bias;
                for j in 0..n {
                    pred += (alphas[j] - alphas_star[j]) * k[[j, i]];
                }
                let error = pred - y[i];

                if error > self.params.epsilon {
                    let new_val = (alphas_star[i] + learning_rate).min(self.params.c);
                    max_change = max_change.max((new_val - alphas_star[i]).abs());
                    alphas_star[i] = new_val;
                } else if error < -self.params.epsilon {
                    let new_val = (alphas[i] + learning_rate).min(self.params.c);
                    max_change = max_change.max((new_val - alphas[i]).abs());
                    alphas[i] = new_val;
                }

                let bias_update = learning_rate * 0.1 * error;
                max_change = max_change.max(bias_update.abs());
                bias -= bias_update;
            }

            if max_change < self.tol {
                break;
            }
        }

        let combined = &alphas - &alphas_star;
        let support_indices: Vec<usize> = combined
            .iter()
            .enumerate()
            .filter(|(_, a)| a.abs() > 1e-8)
            .map(|(i, _)| i)
            .collect();

        if support_indices.is_empty() {
            // Degenerate fit: keep all points so predict still works
            self.support_vectors = Some(x.clone());
            self.alphas = Some(combined);
        } else {
            let mut sv = Array2::zeros((support_indices.len(), x.ncols()));
            let mut sv_alphas = Array1::zeros(support_indices.len());
            for (i, &idx) in support_indices.iter().enumerate() {
                sv.row_mut(i).assign(&x.row(idx));
                sv_alphas[i] = combined[idx];
            }
            self.support_vectors = Some(sv);
            self.alphas = Some(sv_alphas);
        }

        self.bias = bias;
        self.is_fitted = true;
        Ok(())
    }

    /// Predict target values
    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        if !self.is_fitted {
            return Err(NephroError::ModelNotFitted);
        }
        let sv = self
            .support_vectors
            .as_ref()
            .ok_or(NephroError::ModelNotFitted)?;
        let alphas = self.alphas.as_ref().ok_or(NephroError::ModelNotFitted)?;

        let kernel = self.kernel();
        let n = x.nrows();
        let mut predictions = Array1::zeros(n);

        for i in 0..n {
            let sample = x.row(i).to_owned();
            let mut sum = self.bias;
            for j in 0..sv.nrows() {
                sum += alphas[j] * kernel.compute(&sample, &sv.row(j).to_owned());
            }
            predictions[i] = sum;
        }

        Ok(predictions)
    }

    /// Number of support vectors retained by the fit
    pub fn n_support_vectors(&self) -> usize {
        self.support_vectors
            .as_ref()
            .map(|sv| sv.nrows())
            .unwrap_or(0)
    }
}

/// Configuration for the staging classifier
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SvmClassifierConfig {
    /// Regularization parameter (C)
    pub c: f64,
    /// Polynomial degree
    pub degree: u32,
    /// Kernel bandwidth; None uses the scale heuristic 1 / (d * var(x))
    pub gamma: Option<f64>,
    /// Kernel offset
    pub coef0: f64,
    /// KKT tolerance for SMO
    pub tol: f64,
    /// SMO pass cap
    pub max_iter: usize,
    /// Random seed for working-pair selection
    pub seed: u64,
}

impl Default for SvmClassifierConfig {
    fn default() -> Self {
        Self {
            c: 1.0,
            degree: 3,
            gamma: None,
            coef0: 0.0,
            tol: 1e-3,
            max_iter: 1000,
            seed: 42,
        }
    }
}

/// One binary SVM, trained one class against the rest
#[derive(Debug, Clone, Serialize, Deserialize)]
struct BinarySvm {
    support_vectors: Array2<f64>,
    alphas: Array1<f64>,
    support_labels: Array1<f64>,
    bias: f64,
}

impl BinarySvm {
    fn score(&self, kernel: &KernelType, sample: &Array1<f64>) -> f64 {
        let mut sum = self.bias;
        for j in 0..self.support_vectors.nrows() {
            let k_val = kernel.compute(sample, &self.support_vectors.row(j).to_owned());
            sum += self.alphas[j] * self.support_labels[j] * k_val;
        }
        sum
    }
}

/// Polynomial-kernel support vector classifier, one-vs-rest for multi-class
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SvmClassifier {
    config: SvmClassifierConfig,
    kernel: Option<KernelType>,
    classes: Vec<i64>,
    ovr: Vec<BinarySvm>,
    is_fitted: bool,
}

impl SvmClassifier {
    /// Create a classifier with the given configuration
    pub fn new(config: SvmClassifierConfig) -> Self {
        Self {
            config,
            kernel: None,
            classes: Vec::new(),
            ovr: Vec::new(),
            is_fitted: false,
        }
    }

    fn resolve_kernel(&self, x: &Array2<f64>) -> KernelType {
        let gamma = self.config.gamma.unwrap_or_else(|| {
            // sklearn's "scale": 1 / (n_features * var(X))
            let n = (x.nrows() * x.ncols()) as f64;
            let mean = x.iter().sum::<f64>() / n;
            let var = x.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
            if var > 0.0 {
                1.0 / (x.ncols() as f64 * var)
            } else {
                1.0 / x.ncols() as f64
            }
        });
        KernelType::Polynomial {
            degree: self.config.degree,
            gamma,
            coef0: self.config.coef0,
        }
    }

    /// Fit one binary SVM per class (one-vs-rest)
    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        for (i, &v) in y.iter().enumerate() {
            if (v - v.round()).abs() > 1e-9 {
                return Err(NephroError::TrainingError(format!(
                    "classifier requires integer labels, sample {} has label {}",
                    i, v
                )));
            }
        }

        let n = x.nrows();
        if n > MAX_KERNEL_MATRIX_SAMPLES {
            return Err(NephroError::TrainingError(format!(
                "dataset has {} samples, exceeding the kernel matrix cap of {}",
                n, MAX_KERNEL_MATRIX_SAMPLES
            )));
        }

        let mut classes: Vec<i64> = y.iter().map(|&v| v.round() as i64).collect();
        classes.sort_unstable();
        classes.dedup();
        if classes.len() < 2 {
            return Err(NephroError::TrainingError(
                "need at least 2 distinct classes".to_string(),
            ));
        }

        let kernel = self.resolve_kernel(x);
        let k = kernel_matrix(&kernel, x);

        self.ovr.clear();
        for &cls in &classes {
            let y_binary: Array1<f64> =
                y.mapv(|v| if v.round() as i64 == cls { 1.0 } else { -1.0 });
            let (alphas, bias) = self.smo_train(&k, &y_binary, n)?;

            let support_indices: Vec<usize> = alphas
                .iter()
                .enumerate()
                .filter(|(_, &a)| a > 1e-8)
                .map(|(i, _)| i)
                .collect();

            let mut sv = Array2::zeros((support_indices.len(), x.ncols()));
            let mut sv_labels = Array1::zeros(support_indices.len());
            let mut sv_alphas = Array1::zeros(support_indices.len());
            for (i, &idx) in support_indices.iter().enumerate() {
                sv.row_mut(i).assign(&x.row(idx));
                sv_labels[i] = y_binary[idx];
                sv_alphas[i] = alphas[idx];
            }

            self.ovr.push(BinarySvm {
                support_vectors: sv,
                alphas: sv_alphas,
                support_labels: sv_labels,
                bias,
            });
        }

        self.kernel = Some(kernel);
        self.classes = classes;
        self.is_fitted = true;
        Ok(())
    }

    /// Simplified SMO over a precomputed kernel matrix
    fn smo_train(&self, k: &Array2<f64>, y: &Array1<f64>, n: usize) -> Result<(Array1<f64>, f64)> {
        let mut alphas: Array1<f64> = Array1::zeros(n);
        let mut bias = 0.0;
        let c = self.config.c;

        let mut rng = Xoshiro256PlusPlus::seed_from_u64(self.config.seed);

        let decision = |alphas: &Array1<f64>, bias: f64, idx: usize| -> f64 {
            let mut sum = 0.0;
            for i in 0..n {
                sum += alphas[i] * y[i] * k[[i, idx]];
            }
            sum + bias
        };

        let mut passes = 0;
        let max_passes = 5;
        let mut total_iter = 0;

        while passes < max_passes && total_iter < self.config.max_iter {
            let mut num_changed = 0;

            if n <= 1 {
                break;
            }

            for i in 0..n {
                let e_i = decision(&alphas, bias, i) - y[i];

                if (y[i] * e_i < -self.config.tol && alphas[i] < c)
                    || (y[i] * e_i > self.config.tol && alphas[i] > 0.0)
                {
                    let j = loop {
                        let j = rng.gen_range(0..n);
                        if j != i {
                            break j;
                        }
                    };

                    let e_j = decision(&alphas, bias, j) - y[j];

                    let alpha_i_old = alphas[i];
                    let alpha_j_old = alphas[j];

                    let (l, h) = if y[i] != y[j] {
                        (
                            (alphas[j] - alphas[i]).max(0.0),
                            (c + alphas[j] - alphas[i]).min(c),
                        )
                    } else {
                        (
                            (alphas[i] + alphas[j] - c).max(0.0),
                            (alphas[i] + alphas[j]).min(c),
                        )
                    };

                    if (l - h).abs() < 1e-10 {
                        continue;
                    }

                    let eta = 2.0 * k[[i, j]] - k[[i, i]] - k[[j, j]];
                    if eta >= 0.0 {
                        continue;
                    }

                    alphas[j] = (alphas[j] - y[j] * (e_i - e_j) / eta).max(l).min(h);
                    if (alphas[j] - alpha_j_old).abs() < 1e-5 {
                        continue;
                    }

                    alphas[i] += y[i] * y[j] * (alpha_j_old - alphas[j]);

                    let b1 = bias
                        - e_i
                        - y[i] * (alphas[i] - alpha_i_old) * k[[i, i]]
                        - y[j] * (alphas[j] - alpha_j_old) * k[[i, j]];
                    let b2 = bias
                        - e_j
                        - y[i] * (alphas[i] - alpha_i_old) * k[[i, j]]
                        - y[j] * (alphas[j] - alpha_j_old) * k[[j, j]];

                    bias = if alphas[i] > 0.0 && alphas[i] < c {
                        b1
                    } else if alphas[j] > 0.0 && alphas[j] < c {
                        b2
                    } else {
                        (b1 + b2) / 2.0
                    };

                    num_changed += 1;
                }
            }

            total_iter += 1;
            if num_changed == 0 {
                passes += 1;
            } else {
                passes = 0;
            }
        }

        Ok((alphas, bias))
    }

    /// Predict class labels by the highest one-vs-rest score
    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        if !self.is_fitted {
            return Err(NephroError::ModelNotFitted);
        }
        let kernel = self.kernel.as_ref().ok_or(NephroError::ModelNotFitted)?;

        let n = x.nrows();
        let mut predictions = Array1::zeros(n);

        for i in 0..n {
            let sample = x.row(i).to_owned();
            let mut best_score = f64::NEG_INFINITY;
            let mut best_class = self.classes[0];

            for (ci, clf) in self.ovr.iter().enumerate() {
                let score = clf.score(kernel, &sample);
                if score > best_score {
                    best_score = score;
                    best_class = self.classes[ci];
                }
            }
            predictions[i] = best_class as f64;
        }

        Ok(predictions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn two_cluster_data() -> (Array2<f64>, Array1<f64>) {
        let x = array![
            [1.0, 1.0],
            [1.5, 1.2],
            [2.0, 2.0],
            [1.2, 1.8],
            [0.8, 1.5],
            [5.0, 5.0],
            [5.5, 5.2],
            [6.0, 6.0],
            [5.2, 5.8],
            [4.8, 5.5],
        ];
        let y = array![1.0, 1.0, 1.0, 1.0, 1.0, 2.0, 2.0, 2.0, 2.0, 2.0];
        (x, y)
    }

    #[test]
    fn test_svr_params_positional() {
        let p = SvrParams::from_vector(&[10.0, 0.1, 0.05]).unwrap();
        assert_eq!(p.c, 10.0);
        assert_eq!(p.epsilon, 0.1);
        assert_eq!(p.gamma, 0.05);

        assert!(SvrParams::from_vector(&[10.0, 0.1]).is_err());
        assert!(SvrParams::from_vector(&[-1.0, 0.1, 0.05]).is_err());
        assert!(SvrParams::from_vector(&[10.0, 0.1, 0.0]).is_err());
        assert!(SvrParams::from_vector(&[f64::NAN, 0.1, 0.05]).is_err());
    }

    #[test]
    fn test_svr_fits_smooth_function() {
        let n = 30;
        let x = Array2::from_shape_fn((n, 1), |(i, _)| i as f64 / n as f64);
        let y = Array1::from_shape_fn(n, |i| 2.0 * (i as f64 / n as f64));

        let mut svr = SvrRegressor::new(SvrParams {
            c: 10.0,
            epsilon: 0.05,
            gamma: 1.0,
        })
        .unwrap();
        svr.fit(&x, &y).unwrap();

        let pred = svr.predict(&x).unwrap();
        let rmse = crate::training::metrics::rmse(&y, &pred);
        assert!(rmse < 0.5, "rmse {} too high", rmse);
        assert!(svr.n_support_vectors() > 0);
    }

    #[test]
    fn test_svr_predict_requires_fit() {
        let svr = SvrRegressor::new(SvrParams::default()).unwrap();
        assert!(matches!(
            svr.predict(&array![[0.0]]),
            Err(NephroError::ModelNotFitted)
        ));
    }

    #[test]
    fn test_svr_rejects_invalid_params() {
        assert!(SvrRegressor::new(SvrParams {
            c: -5.0,
            epsilon: 0.1,
            gamma: 0.1,
        })
        .is_err());
    }

    #[test]
    fn test_classifier_separates_clusters() {
        let (x, y) = two_cluster_data();
        let mut svm = SvmClassifier::new(SvmClassifierConfig::default());
        svm.fit(&x, &y).unwrap();

        let pred = svm.predict(&x).unwrap();
        let correct = y
            .iter()
            .zip(pred.iter())
            .filter(|(a, b)| (*a - *b).abs() < 0.5)
            .count();
        assert!(correct >= 8, "only {} / 10 correct", correct);
    }

    #[test]
    fn test_classifier_multiclass_labels_valid() {
        let x = array![
            [1.0, 1.0],
            [1.2, 1.1],
            [1.1, 0.9],
            [5.0, 5.0],
            [5.2, 5.1],
            [5.1, 4.9],
            [1.0, 5.0],
            [1.2, 5.1],
            [0.9, 4.9],
        ];
        let y = array![1.0, 1.0, 1.0, 2.0, 2.0, 2.0, 3.0, 3.0, 3.0];

        let mut svm = SvmClassifier::new(SvmClassifierConfig {
            c: 10.0,
            ..Default::default()
        });
        svm.fit(&x, &y).unwrap();

        let pred = svm.predict(&x).unwrap();
        for &p in pred.iter() {
            assert!((1.0..=3.0).contains(&p));
        }
    }

    #[test]
    fn test_classifier_rejects_single_class() {
        let x = array![[1.0], [2.0]];
        let y = array![1.0, 1.0];
        let mut svm = SvmClassifier::new(SvmClassifierConfig::default());
        assert!(svm.fit(&x, &y).is_err());
    }

    #[test]
    fn test_classifier_rejects_fractional_labels() {
        let x = array![[1.0], [2.0]];
        let y = array![1.5, 2.0];
        let mut svm = SvmClassifier::new(SvmClassifierConfig::default());
        assert!(svm.fit(&x, &y).is_err());
    }
}
