//! Stratified k-fold cross-validation

use crate::error::{NephroError, Result};
use ndarray::Array1;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::collections::HashMap;

/// A single train/validation fold
#[derive(Debug, Clone)]
pub struct CvFold {
    pub train_indices: Vec<usize>,
    pub val_indices: Vec<usize>,
}

/// Generate stratified k-fold splits: each fold's validation set keeps
/// the class proportions of the whole training set.
pub fn stratified_k_fold(y: &Array1<f64>, n_splits: usize, seed: u64) -> Result<Vec<CvFold>> {
    if n_splits < 2 {
        return Err(NephroError::InvalidParameter {
            name: "n_splits".to_string(),
            value: n_splits.to_string(),
            reason: "must be at least 2".to_string(),
        });
    }

    let n = y.len();
    if n < n_splits {
        return Err(NephroError::InvalidParameter {
            name: "n_splits".to_string(),
            value: n_splits.to_string(),
            reason: format!("exceeds sample count {}", n),
        });
    }

    let mut rng = ChaCha8Rng::seed_from_u64(seed);

    let mut by_class: HashMap<i64, Vec<usize>> = HashMap::new();
    for (i, &label) in y.iter().enumerate() {
        by_class.entry(label.round() as i64).or_default().push(i);
    }
    let mut grouped: Vec<(i64, Vec<usize>)> = by_class.into_iter().collect();
    grouped.sort_unstable_by_key(|(class, _)| *class);

    // Deal each class's shuffled indices round-robin across folds
    let mut fold_members: Vec<Vec<usize>> = vec![Vec::new(); n_splits];
    for (_, indices) in grouped.iter_mut() {
        indices.shuffle(&mut rng);
        for (pos, &idx) in indices.iter().enumerate() {
            fold_members[pos % n_splits].push(idx);
        }
    }

    let folds = (0..n_splits)
        .map(|f| {
            let val_indices = fold_members[f].clone();
            let train_indices: Vec<usize> = (0..n_splits)
                .filter(|&g| g != f)
                .flat_map(|g| fold_members[g].iter().copied())
                .collect();
            CvFold {
                train_indices,
                val_indices,
            }
        })
        .collect();

    Ok(folds)
}
