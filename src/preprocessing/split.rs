//! Seeded train/test splitting with optional stratification

use crate::error::{NephroError, Result};
use ndarray::{Array1, Array2, Axis};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::collections::HashMap;

/// Options for a train/test split
#[derive(Debug, Clone)]
pub struct SplitOptions {
    /// Fraction of samples held out for testing
    pub test_size: f64,
    /// Random seed for the shuffle
    pub seed: u64,
    /// Keep class proportions equal across the split (targets treated as labels)
    pub stratify: bool,
}

impl Default for SplitOptions {
    fn default() -> Self {
        Self {
            test_size: 0.3,
            seed: 42,
            stratify: false,
        }
    }
}

/// A materialized train/test split
#[derive(Debug, Clone)]
pub struct Split {
    pub x_train: Array2<f64>,
    pub x_test: Array2<f64>,
    pub y_train: Array1<f64>,
    pub y_test: Array1<f64>,
}

/// Split features and targets into train and test partitions.
/// With `stratify`, each class contributes proportionally to the test set.
pub fn train_test_split(
    x: &Array2<f64>,
    y: &Array1<f64>,
    options: &SplitOptions,
) -> Result<Split> {
    let n = x.nrows();
    if n != y.len() {
        return Err(NephroError::ShapeError {
            expected: format!("y length = {}", n),
            actual: format!("y length = {}", y.len()),
        });
    }
    if !(0.0..1.0).contains(&options.test_size) || options.test_size == 0.0 {
        return Err(NephroError::InvalidParameter {
            name: "test_size".to_string(),
            value: options.test_size.to_string(),
            reason: "must be in (0, 1)".to_string(),
        });
    }

    let mut rng = ChaCha8Rng::seed_from_u64(options.seed);

    let test_indices: Vec<usize> = if options.stratify {
        // Shuffle within each class, then take the tail fraction of each
        let mut by_class: HashMap<i64, Vec<usize>> = HashMap::new();
        for (i, &label) in y.iter().enumerate() {
            by_class.entry(label.round() as i64).or_default().push(i);
        }

        // Iterate classes in sorted order so the shuffle sequence is stable
        let mut grouped: Vec<(i64, Vec<usize>)> = by_class.into_iter().collect();
        grouped.sort_unstable_by_key(|(class, _)| *class);

        let mut test = Vec::new();
        for (_, indices) in grouped.iter_mut() {
            indices.shuffle(&mut rng);
            let n_test = ((indices.len() as f64) * options.test_size).round() as usize;
            let n_test = n_test.min(indices.len().saturating_sub(1)).max(1);
            test.extend_from_slice(&indices[..n_test]);
        }
        test
    } else {
        let mut indices: Vec<usize> = (0..n).collect();
        indices.shuffle(&mut rng);
        let n_test = ((n as f64) * options.test_size).round() as usize;
        let n_test = n_test.min(n.saturating_sub(1)).max(1);
        indices[..n_test].to_vec()
    };

    let mut is_test = vec![false; n];
    for &i in &test_indices {
        is_test[i] = true;
    }
    let train_indices: Vec<usize> = (0..n).filter(|&i| !is_test[i]).collect();

    if train_indices.is_empty() {
        return Err(NephroError::PreprocessingError(
            "split produced an empty training set".to_string(),
        ));
    }

    Ok(Split {
        x_train: x.select(Axis(0), &train_indices),
        x_test: x.select(Axis(0), &test_indices),
        y_train: y.select(Axis(0), &train_indices),
        y_test: y.select(Axis(0), &test_indices),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;

    fn toy_data(n: usize) -> (Array2<f64>, Array1<f64>) {
        let x = Array2::from_shape_fn((n, 2), |(i, j)| (i * 2 + j) as f64);
        let y = Array1::from_shape_fn(n, |i| (i % 3) as f64);
        (x, y)
    }

    #[test]
    fn test_split_sizes() {
        let (x, y) = toy_data(100);
        let split = train_test_split(&x, &y, &SplitOptions::default()).unwrap();
        assert_eq!(split.x_train.nrows() + split.x_test.nrows(), 100);
        assert_eq!(split.x_test.nrows(), 30);
        assert_eq!(split.y_train.len(), split.x_train.nrows());
    }

    #[test]
    fn test_split_deterministic() {
        let (x, y) = toy_data(60);
        let a = train_test_split(&x, &y, &SplitOptions::default()).unwrap();
        let b = train_test_split(&x, &y, &SplitOptions::default()).unwrap();
        assert_eq!(a.x_train, b.x_train);
        assert_eq!(a.y_test, b.y_test);
    }

    #[test]
    fn test_stratified_split_preserves_proportions() {
        let (x, y) = toy_data(90); // classes 0,1,2 with 30 each
        let options = SplitOptions {
            stratify: true,
            ..Default::default()
        };
        let split = train_test_split(&x, &y, &options).unwrap();

        for class in 0..3 {
            let count = split
                .y_test
                .iter()
                .filter(|&&v| v as usize == class)
                .count();
            assert_eq!(count, 9, "class {} should contribute 30% of 30", class);
        }
    }

    #[test]
    fn test_invalid_test_size_rejected() {
        let (x, y) = toy_data(10);
        let options = SplitOptions {
            test_size: 1.5,
            ..Default::default()
        };
        assert!(train_test_split(&x, &y, &options).is_err());
    }

    #[test]
    fn test_mismatched_lengths_rejected() {
        let (x, _) = toy_data(10);
        let y = Array1::zeros(5);
        assert!(train_test_split(&x, &y, &SplitOptions::default()).is_err());
    }
}
