//! Entropy decision tree classifier for CKD staging

use crate::error::{NephroError, Result};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Decision tree node
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum TreeNode {
    /// Leaf node with the majority class
    Leaf { class: f64, n_samples: usize },
    /// Internal node with a threshold split
    Split {
        feature_idx: usize,
        threshold: f64,
        left: Box<TreeNode>,
        right: Box<TreeNode>,
        n_samples: usize,
    },
}

/// Entropy-criterion decision tree classifier
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionTree {
    root: Option<TreeNode>,
    pub max_depth: usize,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    /// Restrict each split to this many randomly chosen features (forests)
    pub max_features: Option<usize>,
    n_features: usize,
}

impl DecisionTree {
    /// Create a tree with the staging defaults
    pub fn new() -> Self {
        Self {
            root: None,
            max_depth: 20,
            min_samples_split: 5,
            min_samples_leaf: 4,
            max_features: None,
            n_features: 0,
        }
    }

    /// Builder method to set max depth
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    /// Builder method to set the minimum samples for a split
    pub fn with_min_samples_split(mut self, n: usize) -> Self {
        self.min_samples_split = n;
        self
    }

    /// Builder method to set the minimum leaf size
    pub fn with_min_samples_leaf(mut self, n: usize) -> Self {
        self.min_samples_leaf = n;
        self
    }

    /// Builder method to restrict feature sampling per split
    pub fn with_max_features(mut self, n: usize) -> Self {
        self.max_features = Some(n);
        self
    }

    /// Fit the tree. `feature_order` lets a forest pass a per-tree shuffled
    /// feature ordering for split sampling; plain fits pass None.
    pub fn fit_with_features(
        &mut self,
        x: &Array2<f64>,
        y: &Array1<f64>,
        feature_order: Option<&[usize]>,
    ) -> Result<()> {
        let n = x.nrows();
        if n != y.len() {
            return Err(NephroError::ShapeError {
                expected: format!("y length = {}", n),
                actual: format!("y length = {}", y.len()),
            });
        }
        if n == 0 {
            return Err(NephroError::TrainingError(
                "cannot fit tree on empty data".to_string(),
            ));
        }

        self.n_features = x.ncols();
        let default_order: Vec<usize> = (0..x.ncols()).collect();
        let order = feature_order.unwrap_or(&default_order);

        let indices: Vec<usize> = (0..n).collect();
        self.root = Some(self.build(x, y, &indices, 0, order));
        Ok(())
    }

    /// Fit the tree on training data
    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        self.fit_with_features(x, y, None)
    }

    fn build(
        &self,
        x: &Array2<f64>,
        y: &Array1<f64>,
        indices: &[usize],
        depth: usize,
        feature_order: &[usize],
    ) -> TreeNode {
        let n_samples = indices.len();
        let labels: Vec<f64> = indices.iter().map(|&i| y[i]).collect();

        let should_stop = n_samples < self.min_samples_split
            || depth >= self.max_depth
            || is_pure(&labels);

        if should_stop {
            return TreeNode::Leaf {
                class: majority_class(&labels),
                n_samples,
            };
        }

        let n_candidates = self.max_features.unwrap_or(feature_order.len());
        let candidates = &feature_order[..n_candidates.min(feature_order.len())];

        match self.best_split(x, y, indices, candidates) {
            Some((feature_idx, threshold)) => {
                let (left_idx, right_idx): (Vec<usize>, Vec<usize>) = indices
                    .iter()
                    .partition(|&&i| x[[i, feature_idx]] <= threshold);

                if left_idx.len() < self.min_samples_leaf
                    || right_idx.len() < self.min_samples_leaf
                {
                    return TreeNode::Leaf {
                        class: majority_class(&labels),
                        n_samples,
                    };
                }

                TreeNode::Split {
                    feature_idx,
                    threshold,
                    left: Box::new(self.build(x, y, &left_idx, depth + 1, feature_order)),
                    right: Box::new(self.build(x, y, &right_idx, depth + 1, feature_order)),
                    n_samples,
                }
            }
            None => TreeNode::Leaf {
                class: majority_class(&labels),
                n_samples,
            },
        }
    }

    /// Find the split with the highest entropy gain over candidate features
    fn best_split(
        &self,
        x: &Array2<f64>,
        y: &Array1<f64>,
        indices: &[usize],
        candidates: &[usize],
    ) -> Option<(usize, f64)> {
        let labels: Vec<f64> = indices.iter().map(|&i| y[i]).collect();
        let parent_entropy = entropy(&labels);
        let n = indices.len() as f64;

        let mut best: Option<(usize, f64, f64)> = None;

        for &feature in candidates {
            let mut values: Vec<(f64, f64)> = indices
                .iter()
                .map(|&i| (x[[i, feature]], y[i]))
                .collect();
            values.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));

            for w in 1..values.len() {
                if values[w].0 == values[w - 1].0 {
                    continue;
                }
                let threshold = (values[w].0 + values[w - 1].0) / 2.0;

                let left: Vec<f64> = values[..w].iter().map(|(_, l)| *l).collect();
                let right: Vec<f64> = values[w..].iter().map(|(_, l)| *l).collect();

                let child_entropy = (left.len() as f64 / n) * entropy(&left)
                    + (right.len() as f64 / n) * entropy(&right);
                let gain = parent_entropy - child_entropy;

                if best.map_or(gain > 1e-12, |(_, _, g)| gain > g) {
                    best = Some((feature, threshold, gain));
                }
            }
        }

        best.map(|(f, t, _)| (f, t))
    }

    /// Predict class labels
    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let root = self.root.as_ref().ok_or(NephroError::ModelNotFitted)?;

        let predictions = Array1::from_shape_fn(x.nrows(), |i| {
            let mut node = root;
            loop {
                match node {
                    TreeNode::Leaf { class, .. } => return *class,
                    TreeNode::Split {
                        feature_idx,
                        threshold,
                        left,
                        right,
                        ..
                    } => {
                        node = if x[[i, *feature_idx]] <= *threshold {
                            left
                        } else {
                            right
                        };
                    }
                }
            }
        });
        Ok(predictions)
    }
}

impl Default for DecisionTree {
    fn default() -> Self {
        Self::new()
    }
}

fn is_pure(labels: &[f64]) -> bool {
    labels.windows(2).all(|w| w[0] == w[1])
}

fn majority_class(labels: &[f64]) -> f64 {
    let mut counts: HashMap<i64, usize> = HashMap::new();
    for &l in labels {
        *counts.entry(l.round() as i64).or_insert(0) += 1;
    }
    counts
        .into_iter()
        .max_by_key(|(class, count)| (*count, -*class))
        .map(|(class, _)| class as f64)
        .unwrap_or(0.0)
}

fn entropy(labels: &[f64]) -> f64 {
    let mut counts: HashMap<i64, usize> = HashMap::new();
    for &l in labels {
        *counts.entry(l.round() as i64).or_insert(0) += 1;
    }
    let n = labels.len() as f64;
    counts
        .values()
        .map(|&c| {
            let p = c as f64 / n;
            -p * p.log2()
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_entropy_values() {
        assert!(entropy(&[1.0, 1.0, 1.0]).abs() < 1e-12);
        assert!((entropy(&[1.0, 2.0]) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_tree_fits_separable_data() {
        let x = array![
            [1.0],
            [1.2],
            [1.4],
            [1.6],
            [1.8],
            [5.0],
            [5.2],
            [5.4],
            [5.6],
            [5.8]
        ];
        let y = array![1.0, 1.0, 1.0, 1.0, 1.0, 2.0, 2.0, 2.0, 2.0, 2.0];

        let mut tree = DecisionTree::new().with_min_samples_split(2).with_min_samples_leaf(1);
        tree.fit(&x, &y).unwrap();

        let pred = tree.predict(&x).unwrap();
        assert_eq!(pred, y);
    }

    #[test]
    fn test_tree_predict_requires_fit() {
        let tree = DecisionTree::new();
        assert!(matches!(
            tree.predict(&array![[1.0]]),
            Err(NephroError::ModelNotFitted)
        ));
    }

    #[test]
    fn test_majority_class_prefers_most_frequent() {
        assert_eq!(majority_class(&[2.0, 2.0, 3.0]), 2.0);
    }

    #[test]
    fn test_depth_limit_produces_leaf() {
        let x = array![[1.0], [2.0], [3.0], [4.0]];
        let y = array![1.0, 2.0, 1.0, 2.0];

        let mut tree = DecisionTree::new()
            .with_max_depth(0)
            .with_min_samples_split(2)
            .with_min_samples_leaf(1);
        tree.fit(&x, &y).unwrap();

        let pred = tree.predict(&x).unwrap();
        // A depth-0 tree is a single leaf: one class for everything
        assert!(pred.iter().all(|&p| p == pred[0]));
    }
}
