//! SMOTE oversampling for the imbalanced CKD stage distribution

use crate::error::{NephroError, Result};
use ndarray::{Array1, Array2};
use rand::prelude::*;
use rand_xoshiro::Xoshiro256PlusPlus;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// SMOTE (Synthetic Minority Over-sampling Technique).
/// Minority classes are filled up to the majority count by interpolating
/// between a sample and one of its k nearest same-class neighbors.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Smote {
    k_neighbors: usize,
    seed: u64,
}

impl Smote {
    /// Create a sampler with k neighbors
    pub fn new(k_neighbors: usize) -> Self {
        Self {
            k_neighbors: k_neighbors.max(1),
            seed: 42,
        }
    }

    /// Pick k from the label distribution: min(3, minority_count - 1)
    pub fn for_labels(y: &Array1<f64>) -> Self {
        let counts = class_counts(y);
        let min_count = counts.values().copied().min().unwrap_or(1);
        Self::new(3.min(min_count.saturating_sub(1)).max(1))
    }

    /// Builder method to set the seed
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Oversample every minority class up to the majority class count.
    /// Returns the augmented features and labels; original rows come first.
    pub fn resample(&self, x: &Array2<f64>, y: &Array1<f64>) -> Result<(Array2<f64>, Array1<f64>)> {
        let counts = class_counts(y);
        if counts.len() < 2 {
            return Err(NephroError::PreprocessingError(
                "need at least 2 classes for SMOTE".to_string(),
            ));
        }

        let max_count = counts.values().copied().max().unwrap_or(0);
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(self.seed);

        let mut by_class: Vec<(i64, Vec<usize>)> = {
            let mut map: HashMap<i64, Vec<usize>> = HashMap::new();
            for (i, &label) in y.iter().enumerate() {
                map.entry(label.round() as i64).or_default().push(i);
            }
            map.into_iter().collect()
        };
        by_class.sort_unstable_by_key(|(class, _)| *class);

        let mut synthetic_rows: Vec<Vec<f64>> = Vec::new();
        let mut synthetic_labels: Vec<f64> = Vec::new();

        for (class, indices) in &by_class {
            let deficit = max_count - indices.len();
            if deficit == 0 || indices.len() < 2 {
                continue;
            }

            let members: Vec<Vec<f64>> =
                indices.iter().map(|&i| x.row(i).to_vec()).collect();

            for s in 0..deficit {
                let base = s % members.len();
                let neighbors = nearest_neighbors(&members, base, self.k_neighbors);
                let neighbor = neighbors[rng.gen_range(0..neighbors.len())];

                let gap: f64 = rng.gen();
                let row: Vec<f64> = members[base]
                    .iter()
                    .zip(members[neighbor].iter())
                    .map(|(&p, &q)| p + gap * (q - p))
                    .collect();

                synthetic_rows.push(row);
                synthetic_labels.push(*class as f64);
            }
        }

        let n_out = x.nrows() + synthetic_rows.len();
        let mut x_out = Array2::zeros((n_out, x.ncols()));
        let mut y_out = Array1::zeros(n_out);

        for i in 0..x.nrows() {
            x_out.row_mut(i).assign(&x.row(i));
            y_out[i] = y[i];
        }
        for (s, row) in synthetic_rows.iter().enumerate() {
            for (j, &v) in row.iter().enumerate() {
                x_out[[x.nrows() + s, j]] = v;
            }
            y_out[x.nrows() + s] = synthetic_labels[s];
        }

        Ok((x_out, y_out))
    }
}

fn class_counts(y: &Array1<f64>) -> HashMap<i64, usize> {
    let mut counts = HashMap::new();
    for &label in y.iter() {
        *counts.entry(label.round() as i64).or_insert(0) += 1;
    }
    counts
}

/// Indices of the k nearest same-class members to `base` (excluding itself)
fn nearest_neighbors(members: &[Vec<f64>], base: usize, k: usize) -> Vec<usize> {
    let mut dists: Vec<(f64, usize)> = members
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != base)
        .map(|(i, m)| {
            let d: f64 = members[base]
                .iter()
                .zip(m.iter())
                .map(|(a, b)| (a - b).powi(2))
                .sum();
            (d, i)
        })
        .collect();
    dists.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));
    dists.into_iter().take(k.max(1)).map(|(_, i)| i).collect()
}
