//! Synthetic CKD cohort generator
//!
//! Produces a realistic synthetic patient cohort by drawing a CKD stage
//! per patient from real-world prevalence, picking an eGFR inside that
//! stage's range, and inverting the CKD-EPI equations to recover the
//! serum markers that would have produced it. Vitals and labs are drawn
//! from stage-conditioned distributions.

use crate::error::Result;
use ndarray::Array2;
use rand::distributions::WeightedIndex;
use rand::prelude::*;
use rand_distr::{Exp, Normal};
use rand_xoshiro::Xoshiro256PlusPlus;

use super::{Cohort, FEATURE_COLUMNS};

/// Configuration for the synthetic cohort generator
#[derive(Debug, Clone)]
pub struct SyntheticConfig {
    /// Number of patients to generate
    pub n_samples: usize,
    /// Random seed
    pub seed: u64,
}

impl Default for SyntheticConfig {
    fn default() -> Self {
        Self {
            n_samples: 5000,
            seed: 42,
        }
    }
}

impl SyntheticConfig {
    /// Create a config for a cohort of the given size
    pub fn new(n_samples: usize) -> Self {
        Self {
            n_samples,
            ..Default::default()
        }
    }

    /// Builder method to set the seed
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}

/// Per-stage eGFR ranges (KDIGO)
const EGFR_RANGES: [(f64, f64); 5] = [
    (90.0, 140.0),
    (60.0, 89.0),
    (30.0, 59.0),
    (15.0, 29.0),
    (3.0, 14.0),
];

/// Real-world stage prevalence
const STAGE_PREVALENCE: [f64; 5] = [0.30, 0.30, 0.25, 0.10, 0.05];

fn normal_clipped(rng: &mut impl Rng, mean: f64, std: f64, lo: f64, hi: f64) -> f64 {
    // All call sites pass fixed positive standard deviations
    let dist = Normal::new(mean, std).expect("standard deviation is a fixed positive constant");
    dist.sample(rng).clamp(lo, hi)
}

/// Generate a synthetic cohort with the standard feature columns
pub fn generate_cohort(config: &SyntheticConfig) -> Result<Cohort> {
    let n = config.n_samples;
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(config.seed);

    let stage_dist = WeightedIndex::new(STAGE_PREVALENCE)
        .expect("stage prevalence weights are fixed and valid");

    let mut features = Array2::zeros((n, FEATURE_COLUMNS.len()));

    for i in 0..n {
        let stage = stage_dist.sample(&mut rng) + 1; // 1..=5
        let (egfr_lo, egfr_hi) = EGFR_RANGES[stage - 1];
        let egfr = rng.gen::<f64>() * (egfr_hi - egfr_lo) + egfr_lo;

        // Older patients dominate the later stages
        let age = if stage >= 3 {
            normal_clipped(&mut rng, 65.0 + 2.0 * stage as f64, 10.0, 30.0, 95.0).round()
        } else {
            normal_clipped(&mut rng, 58.0, 15.0, 18.0, 95.0).round()
        };

        let is_female = rng.gen_bool(0.48);
        let sex_encoded = if is_female { 1.0 } else { 0.0 };

        // Invert the creatinine equation to recover SCr from the drawn eGFR
        let kappa = if is_female { 0.7 } else { 0.9 };
        let sex_coeff_scr = if is_female { 1.012 } else { 1.0 };
        let base_scr = egfr / (142.0 * sex_coeff_scr * 0.9938_f64.powf(age));
        let scr_noise = Normal::new(0.0, 0.05).unwrap().sample(&mut rng);
        let scr = (kappa * (1.0 / base_scr).powf(1.0 / 1.200) + scr_noise).max(0.3);

        // Same for cystatin C
        let sex_coeff_cysc = if is_female { 0.932 } else { 1.0 };
        let base_cysc = egfr / (133.0 * sex_coeff_cysc * 0.996_f64.powf(age));
        let cysc_noise = Normal::new(0.0, 0.03).unwrap().sample(&mut rng);
        let cysc = (0.8 * (1.0 / base_cysc).powf(1.0 / 1.328) + cysc_noise).max(0.3);

        let bmi = if stage >= 4 {
            normal_clipped(&mut rng, 25.0, 6.0, 16.0, 50.0)
        } else {
            normal_clipped(&mut rng, 27.0, 5.0, 16.0, 50.0)
        };

        let sbp_base = [120.0, 128.0, 138.0, 148.0, 155.0][stage - 1];
        let dbp_base = [78.0, 82.0, 85.0, 88.0, 90.0][stage - 1];
        let sbp = normal_clipped(&mut rng, sbp_base, 12.0, 90.0, 200.0);
        let dbp = normal_clipped(&mut rng, dbp_base, 8.0, 50.0, 120.0);

        let hba1c_base = [5.4, 5.7, 6.2, 6.8, 7.2][stage - 1];
        let hba1c = normal_clipped(&mut rng, hba1c_base, 0.8, 4.0, 12.0);

        let alb_base = [4.2, 4.0, 3.7, 3.3, 2.8][stage - 1];
        let alb = normal_clipped(&mut rng, alb_base, 0.4, 1.5, 5.5);

        let crp_mean = [1.5, 2.5, 4.0, 7.0, 12.0][stage - 1];
        let crp: f64 = Exp::<f64>::new(1.0 / crp_mean)
            .expect("CRP rate is fixed and positive")
            .sample(&mut rng)
            .clamp(0.1, 50.0);

        // Order must match FEATURE_COLUMNS
        let row = [
            age, sex_encoded, bmi, scr, cysc, hba1c, crp, alb, sbp, dbp,
        ];
        for (j, v) in row.iter().enumerate() {
            features[[i, j]] = *v;
        }
    }

    Ok(Cohort {
        feature_names: FEATURE_COLUMNS.iter().map(|s| s.to_string()).collect(),
        features,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clinical::compute_targets;

    #[test]
    fn test_generate_cohort_shape() {
        let cohort = generate_cohort(&SyntheticConfig::new(200)).unwrap();
        assert_eq!(cohort.len(), 200);
        assert_eq!(cohort.feature_names.len(), FEATURE_COLUMNS.len());
    }

    #[test]
    fn test_generate_cohort_deterministic() {
        let a = generate_cohort(&SyntheticConfig::new(50).with_seed(7)).unwrap();
        let b = generate_cohort(&SyntheticConfig::new(50).with_seed(7)).unwrap();
        assert_eq!(a.features, b.features);
    }

    #[test]
    fn test_generated_markers_are_physiologic() {
        let cohort = generate_cohort(&SyntheticConfig::new(500)).unwrap();
        let scr = cohort.column("SCr").unwrap();
        let age = cohort.column("Age").unwrap();
        assert!(scr.iter().all(|&v| v >= 0.3 && v < 30.0));
        assert!(age.iter().all(|&v| (18.0..=95.0).contains(&v)));
    }

    #[test]
    fn test_cohort_spans_all_stages() {
        let cohort = generate_cohort(&SyntheticConfig::new(2000)).unwrap();
        let targets = compute_targets(
            &cohort.column("SCr").unwrap(),
            &cohort.column("SCysC").unwrap(),
            &cohort.column("Age").unwrap(),
            &cohort.column("Sex_encoded").unwrap(),
        );

        let mut seen = [false; 5];
        for &s in targets.stage.iter() {
            seen[s as usize - 1] = true;
        }
        assert!(seen.iter().all(|&s| s), "expected all 5 stages, got {:?}", seen);
    }
}
