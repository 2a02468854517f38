//! Random forest classifier: bagged entropy trees with feature subsampling

use crate::error::{NephroError, Result};
use crate::training::decision_tree::DecisionTree;
use ndarray::{Array1, Array2, Axis};
use rand::prelude::*;
use rand_xoshiro::Xoshiro256PlusPlus;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Random forest classifier over entropy decision trees
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RandomForest {
    trees: Vec<DecisionTree>,
    pub n_estimators: usize,
    pub max_depth: usize,
    pub min_samples_split: usize,
    pub seed: u64,
}

impl RandomForest {
    /// Create a forest with the staging defaults
    pub fn new() -> Self {
        Self {
            trees: Vec::new(),
            n_estimators: 200,
            max_depth: 20,
            min_samples_split: 5,
            seed: 42,
        }
    }

    /// Builder method to set the number of trees
    pub fn with_n_estimators(mut self, n: usize) -> Self {
        self.n_estimators = n;
        self
    }

    /// Builder method to set max depth
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    /// Builder method to set the random seed
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Fit the forest: bootstrap rows and shuffle features per tree,
    /// fitting trees in parallel
    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        let n = x.nrows();
        let d = x.ncols();
        if n != y.len() {
            return Err(NephroError::ShapeError {
                expected: format!("y length = {}", n),
                actual: format!("y length = {}", y.len()),
            });
        }
        if n == 0 {
            return Err(NephroError::TrainingError(
                "cannot fit forest on empty data".to_string(),
            ));
        }

        // sqrt(d) features per split, the usual forest heuristic
        let max_features = (d as f64).sqrt().ceil() as usize;

        // Draw each tree's bootstrap sample and feature order up front so
        // the parallel fit stays deterministic for a given seed
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(self.seed);
        let draws: Vec<(Vec<usize>, Vec<usize>)> = (0..self.n_estimators)
            .map(|_| {
                let rows: Vec<usize> = (0..n).map(|_| rng.gen_range(0..n)).collect();
                let mut features: Vec<usize> = (0..d).collect();
                features.shuffle(&mut rng);
                (rows, features)
            })
            .collect();

        let max_depth = self.max_depth;
        let min_samples_split = self.min_samples_split;

        let trees: Vec<Result<DecisionTree>> = draws
            .into_par_iter()
            .map(|(rows, features)| {
                let x_boot = x.select(Axis(0), &rows);
                let y_boot = y.select(Axis(0), &rows);

                let mut tree = DecisionTree::new()
                    .with_max_depth(max_depth)
                    .with_min_samples_split(min_samples_split)
                    .with_min_samples_leaf(1)
                    .with_max_features(max_features);
                tree.fit_with_features(&x_boot, &y_boot, Some(&features))?;
                Ok(tree)
            })
            .collect();

        self.trees = trees.into_iter().collect::<Result<Vec<_>>>()?;
        Ok(())
    }

    /// Predict by majority vote across trees
    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        if self.trees.is_empty() {
            return Err(NephroError::ModelNotFitted);
        }

        let votes: Vec<Array1<f64>> = self
            .trees
            .par_iter()
            .map(|tree| tree.predict(x))
            .collect::<Result<Vec<_>>>()?;

        let n = x.nrows();
        let predictions = Array1::from_shape_fn(n, |i| {
            let mut counts: HashMap<i64, usize> = HashMap::new();
            for tree_votes in &votes {
                *counts.entry(tree_votes[i].round() as i64).or_insert(0) += 1;
            }
            counts
                .into_iter()
                .max_by_key(|(class, count)| (*count, -*class))
                .map(|(class, _)| class as f64)
                .unwrap_or(0.0)
        });

        Ok(predictions)
    }
}

impl Default for RandomForest {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cluster_data() -> (Array2<f64>, Array1<f64>) {
        let mut rows = Vec::new();
        let mut labels = Vec::new();
        for i in 0..15 {
            let offset = (i % 5) as f64 * 0.1;
            rows.push([1.0 + offset, 1.0 - offset]);
            labels.push(1.0);
            rows.push([6.0 + offset, 6.0 - offset]);
            labels.push(2.0);
        }
        let x = Array2::from_shape_fn((rows.len(), 2), |(i, j)| rows[i][j]);
        (x, Array1::from_vec(labels))
    }

    #[test]
    fn test_forest_fits_and_predicts() {
        let (x, y) = cluster_data();
        let mut forest = RandomForest::new().with_n_estimators(20);
        forest.fit(&x, &y).unwrap();

        let pred = forest.predict(&x).unwrap();
        let correct = y
            .iter()
            .zip(pred.iter())
            .filter(|(a, b)| (*a - *b).abs() < 0.5)
            .count();
        assert!(correct as f64 / y.len() as f64 > 0.9);
    }

    #[test]
    fn test_forest_deterministic_for_seed() {
        let (x, y) = cluster_data();

        let mut a = RandomForest::new().with_n_estimators(10).with_seed(3);
        a.fit(&x, &y).unwrap();
        let mut b = RandomForest::new().with_n_estimators(10).with_seed(3);
        b.fit(&x, &y).unwrap();

        assert_eq!(a.predict(&x).unwrap(), b.predict(&x).unwrap());
    }

    #[test]
    fn test_forest_predict_requires_fit() {
        let forest = RandomForest::new();
        let x = Array2::zeros((2, 2));
        assert!(matches!(
            forest.predict(&x),
            Err(NephroError::ModelNotFitted)
        ));
    }
}
