//! Grey Wolf Optimizer
//!
//! Derivative-free population search over a bounded continuous space,
//! after Mirjalili et al. (2014). A pack of candidate positions follows
//! its three best members (alpha, beta, delta); an exploration radius
//! decays linearly across the iteration budget, shifting the pack from
//! exploration to exploitation.

use crate::error::{NephroError, Result};
use rand::prelude::*;
use rand_xoshiro::Xoshiro256PlusPlus;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::search_space::SearchSpace;

/// Configuration for a GWO run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GwoConfig {
    /// Pack size; at least 3 so the leader hierarchy is meaningful
    pub n_wolves: usize,
    /// Fixed iteration budget
    pub max_iter: usize,
    /// Random seed; None draws from entropy
    pub seed: Option<u64>,
}

impl Default for GwoConfig {
    fn default() -> Self {
        Self {
            n_wolves: 20,
            max_iter: 15,
            seed: Some(42),
        }
    }
}

impl GwoConfig {
    /// Create a config with the given pack size and iteration budget
    pub fn new(n_wolves: usize, max_iter: usize) -> Self {
        Self {
            n_wolves,
            max_iter,
            ..Default::default()
        }
    }

    /// Builder method to set the seed
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    fn validate(&self) -> Result<()> {
        if self.n_wolves < 3 {
            return Err(NephroError::InvalidParameter {
                name: "n_wolves".to_string(),
                value: self.n_wolves.to_string(),
                reason: "need at least 3 wolves for the alpha/beta/delta hierarchy".to_string(),
            });
        }
        if self.max_iter == 0 {
            return Err(NephroError::InvalidParameter {
                name: "max_iter".to_string(),
                value: "0".to_string(),
                reason: "iteration budget must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}

/// One ranked leader: a position and its fitness
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Leader {
    pub position: Vec<f64>,
    pub score: f64,
}

impl Leader {
    fn unset(dim: usize) -> Self {
        Self {
            position: vec![0.0; dim],
            score: f64::INFINITY,
        }
    }
}

/// The three best-ranked wolves. Alpha's score never worsens across a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Hierarchy {
    pub alpha: Leader,
    pub beta: Leader,
    pub delta: Leader,
}

impl Hierarchy {
    fn new(dim: usize) -> Self {
        Self {
            alpha: Leader::unset(dim),
            beta: Leader::unset(dim),
            delta: Leader::unset(dim),
        }
    }

    /// Rank a freshly evaluated wolf into the hierarchy. Strict `<` keeps
    /// the earlier-found leader on ties.
    pub fn observe(&mut self, position: &[f64], score: f64) {
        if score < self.alpha.score {
            self.delta = self.beta.clone();
            self.beta = self.alpha.clone();
            self.alpha = Leader {
                position: position.to_vec(),
                score,
            };
        } else if score < self.beta.score {
            self.delta = self.beta.clone();
            self.beta = Leader {
                position: position.to_vec(),
                score,
            };
        } else if score < self.delta.score {
            self.delta = Leader {
                position: position.to_vec(),
                score,
            };
        }
    }
}

/// Result of a GWO run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GwoOutcome {
    /// Best position found
    pub best_position: Vec<f64>,
    /// Best objective value (alpha's final score)
    pub best_score: f64,
    /// Alpha's best-so-far score, one entry per iteration
    pub convergence: Vec<f64>,
    /// Total objective evaluations performed
    pub n_evaluations: usize,
}

/// Grey Wolf Optimizer over a bounded continuous space
pub struct GreyWolfOptimizer {
    config: GwoConfig,
    space: SearchSpace,
}

impl GreyWolfOptimizer {
    /// Create an optimizer for the given space
    pub fn new(config: GwoConfig, space: SearchSpace) -> Self {
        Self { config, space }
    }

    /// Minimize a black-box objective. The objective may return
    /// `f64::INFINITY` for failing candidates; such values never win the
    /// hierarchy and never abort the run. With a fixed seed the outcome
    /// is bit-identical across runs.
    pub fn optimize<F>(&self, mut objective: F) -> Result<GwoOutcome>
    where
        F: FnMut(&[f64]) -> f64,
    {
        self.config.validate()?;

        let dim = self.space.dim();
        let n = self.config.n_wolves;
        let t_max = self.config.max_iter;

        let mut rng = match self.config.seed {
            Some(seed) => Xoshiro256PlusPlus::seed_from_u64(seed),
            None => Xoshiro256PlusPlus::from_entropy(),
        };

        // Uniform initialization inside the bounds
        let mut positions: Vec<Vec<f64>> = (0..n)
            .map(|_| {
                (0..dim)
                    .map(|j| {
                        let (lo, hi) = (self.space.lower()[j], self.space.upper()[j]);
                        rng.gen::<f64>() * (hi - lo) + lo
                    })
                    .collect()
            })
            .collect();

        let mut hierarchy = Hierarchy::new(dim);
        let mut convergence = Vec::with_capacity(t_max);
        let mut n_evaluations = 0usize;

        for t in 0..t_max {
            // Evaluate the pack and re-rank the leaders
            for wolf in &positions {
                let fitness = objective(wolf);
                n_evaluations += 1;
                hierarchy.observe(wolf, fitness);
            }

            // Exploration radius decays linearly over the budget
            let a = 2.0 - t as f64 * (2.0 / t_max as f64);

            for wolf in positions.iter_mut() {
                for j in 0..dim {
                    let pull = |leader: &Leader, rng: &mut Xoshiro256PlusPlus| {
                        let r1: f64 = rng.gen();
                        let r2: f64 = rng.gen();
                        let a_coeff = 2.0 * a * r1 - a;
                        let c_coeff = 2.0 * r2;
                        let distance = (c_coeff * leader.position[j] - wolf[j]).abs();
                        leader.position[j] - a_coeff * distance
                    };

                    let x1 = pull(&hierarchy.alpha, &mut rng);
                    let x2 = pull(&hierarchy.beta, &mut rng);
                    let x3 = pull(&hierarchy.delta, &mut rng);

                    // Out-of-bounds coordinates never persist between iterations
                    wolf[j] = self.space.clamp(j, (x1 + x2 + x3) / 3.0);
                }
            }

            convergence.push(hierarchy.alpha.score);
            debug!(
                iteration = t + 1,
                best_score = hierarchy.alpha.score,
                radius = a,
                "gwo iteration complete"
            );
        }

        Ok(GwoOutcome {
            best_position: hierarchy.alpha.position,
            best_score: hierarchy.alpha.score,
            convergence,
            n_evaluations,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quadratic_space() -> SearchSpace {
        SearchSpace::new(vec![0.1, 0.01, 0.001], vec![100.0, 1.0, 1.0]).unwrap()
    }

    fn quadratic(target: &[f64]) -> impl Fn(&[f64]) -> f64 + '_ {
        move |x: &[f64]| {
            x.iter()
                .zip(target.iter())
                .map(|(xi, ti)| (xi - ti).powi(2))
                .sum()
        }
    }

    #[test]
    fn test_rejects_small_pack() {
        let gwo = GreyWolfOptimizer::new(GwoConfig::new(2, 10), quadratic_space());
        assert!(gwo.optimize(|_| 0.0).is_err());
    }

    #[test]
    fn test_rejects_zero_iterations() {
        let gwo = GreyWolfOptimizer::new(GwoConfig::new(5, 0), quadratic_space());
        assert!(gwo.optimize(|_| 0.0).is_err());
    }

    #[test]
    fn test_hierarchy_ranking_scenario() {
        // Fitness list [5, 2, 8, 1, 9] must end with alpha = wolf 3,
        // beta = wolf 1, delta = wolf 0
        let mut hierarchy = Hierarchy::new(1);
        let scores = [5.0, 2.0, 8.0, 1.0, 9.0];
        for (i, &s) in scores.iter().enumerate() {
            hierarchy.observe(&[i as f64], s);
        }

        assert_eq!(hierarchy.alpha.score, 1.0);
        assert_eq!(hierarchy.alpha.position, vec![3.0]);
        assert_eq!(hierarchy.beta.score, 2.0);
        assert_eq!(hierarchy.beta.position, vec![1.0]);
        assert_eq!(hierarchy.delta.score, 5.0);
        assert_eq!(hierarchy.delta.position, vec![0.0]);
    }

    #[test]
    fn test_hierarchy_tie_keeps_earlier_leader() {
        let mut hierarchy = Hierarchy::new(1);
        hierarchy.observe(&[1.0], 3.0);
        hierarchy.observe(&[2.0], 3.0);
        // Equal score must not displace the earlier-found alpha
        assert_eq!(hierarchy.alpha.position, vec![1.0]);
        assert_eq!(hierarchy.beta.position, vec![2.0]);
    }

    #[test]
    fn test_bounds_containment() {
        let space = quadratic_space();
        let gwo = GreyWolfOptimizer::new(GwoConfig::new(10, 20), space.clone());

        // The objective sees every candidate; assert each one is in bounds
        let outcome = gwo
            .optimize(|x| {
                assert!(space.contains(x), "candidate {:?} escaped the bounds", x);
                x.iter().sum()
            })
            .unwrap();

        assert!(space.contains(&outcome.best_position));
    }

    #[test]
    fn test_convergence_curve_monotone() {
        let target = [10.0, 0.5, 0.5];
        let gwo = GreyWolfOptimizer::new(GwoConfig::new(20, 15), quadratic_space());
        let outcome = gwo.optimize(quadratic(&target)).unwrap();

        assert_eq!(outcome.convergence.len(), 15);
        for w in outcome.convergence.windows(2) {
            assert!(w[1] <= w[0], "alpha score worsened: {:?}", w);
        }
    }

    #[test]
    fn test_deterministic_for_seed() {
        let target = [10.0, 0.5, 0.5];
        let config = GwoConfig::new(20, 15).with_seed(1234);

        let a = GreyWolfOptimizer::new(config.clone(), quadratic_space())
            .optimize(quadratic(&target))
            .unwrap();
        let b = GreyWolfOptimizer::new(config, quadratic_space())
            .optimize(quadratic(&target))
            .unwrap();

        assert_eq!(a.convergence, b.convergence);
        assert_eq!(a.best_position, b.best_position);
        assert_eq!(a.best_score, b.best_score);
    }

    #[test]
    fn test_all_infinite_objective_terminates() {
        let gwo = GreyWolfOptimizer::new(GwoConfig::new(5, 10), quadratic_space());
        let outcome = gwo.optimize(|_| f64::INFINITY).unwrap();

        assert_eq!(outcome.best_score, f64::INFINITY);
        assert_eq!(outcome.convergence.len(), 10);
        assert_eq!(outcome.n_evaluations, 50);
    }

    #[test]
    fn test_quadratic_convergence_scenario() {
        // The concrete scenario: 20 wolves, 15 iterations on a convex
        // quadratic must cut the best score by at least 90%
        let target = [10.0, 0.5, 0.5];
        let gwo = GreyWolfOptimizer::new(GwoConfig::new(20, 15), quadratic_space());
        let outcome = gwo.optimize(quadratic(&target)).unwrap();

        let first = outcome.convergence[0];
        let last = outcome.convergence[14];
        assert!(
            last <= first * 0.1,
            "expected ≥90% reduction, got {} -> {}",
            first,
            last
        );
        assert_eq!(outcome.best_score, last);
    }

    #[test]
    fn test_evaluation_count() {
        let gwo = GreyWolfOptimizer::new(GwoConfig::new(7, 4), quadratic_space());
        let outcome = gwo.optimize(|x| x[0]).unwrap();
        assert_eq!(outcome.n_evaluations, 28);
    }
}
