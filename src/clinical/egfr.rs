//! CKD-EPI 2021 eGFR equations
//!
//! Three closed-form estimates of glomerular filtration rate (creatinine,
//! cystatin C, combined), each with sex-dependent coefficients, plus the
//! KDIGO stage assignment on fixed eGFR cut points {90, 60, 30, 15}.
//! Values are rounded to two decimals to match published reference tables.

use ndarray::Array1;
use serde::{Deserialize, Serialize};

/// Patient sex, as used by the CKD-EPI coefficient tables
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Sex {
    Male,
    Female,
}

impl Sex {
    /// Decode the 0/1 encoding used in the dataset (female = 1)
    pub fn from_encoded(code: f64) -> Self {
        if code >= 0.5 {
            Sex::Female
        } else {
            Sex::Male
        }
    }
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

/// CKD-EPI 2021 creatinine equation (serum creatinine in mg/dL)
pub fn egfr_creatinine(scr: f64, age: f64, sex: Sex) -> f64 {
    let (kappa, alpha, sex_coeff) = match sex {
        Sex::Female => (0.7, -0.241, 1.012),
        Sex::Male => (0.9, -0.302, 1.0),
    };
    let scr_k = scr / kappa;
    let min_part = scr_k.min(1.0).powf(alpha);
    let max_part = scr_k.max(1.0).powf(-1.200);
    round2(142.0 * min_part * max_part * 0.9938_f64.powf(age) * sex_coeff)
}

/// CKD-EPI 2021 cystatin C equation (serum cystatin C in mg/L)
pub fn egfr_cystatin_c(cysc: f64, age: f64, sex: Sex) -> f64 {
    let sex_coeff = match sex {
        Sex::Female => 0.932,
        Sex::Male => 1.0,
    };
    let cysc_08 = cysc / 0.8;
    let min_part = cysc_08.min(1.0).powf(-0.499);
    let max_part = cysc_08.max(1.0).powf(-1.328);
    round2(133.0 * min_part * max_part * 0.996_f64.powf(age) * sex_coeff)
}

/// CKD-EPI 2021 combined creatinine-cystatin C equation
pub fn egfr_combined(scr: f64, cysc: f64, age: f64, sex: Sex) -> f64 {
    let (kappa, beta, sex_coeff) = match sex {
        Sex::Female => (0.7, -0.219, 0.963),
        Sex::Male => (0.9, -0.144, 1.0),
    };
    let scr_k = scr / kappa;
    let min_scr = scr_k.min(1.0).powf(beta);
    let max_scr = scr_k.max(1.0).powf(-0.544);
    let cysc_08 = cysc / 0.8;
    let min_cysc = cysc_08.min(1.0).powf(-0.323);
    let max_cysc = cysc_08.max(1.0).powf(-0.778);
    round2(135.0 * min_scr * max_scr * min_cysc * max_cysc * 0.9961_f64.powf(age) * sex_coeff)
}

/// KDIGO CKD stage from eGFR: cut points {90, 60, 30, 15} map to stages 1..5
pub fn ckd_stage(egfr: f64) -> u8 {
    if egfr >= 90.0 {
        1
    } else if egfr >= 60.0 {
        2
    } else if egfr >= 30.0 {
        3
    } else if egfr >= 15.0 {
        4
    } else {
        5
    }
}

/// Vectorized stage assignment
pub fn assign_stages(egfr: &Array1<f64>) -> Array1<f64> {
    egfr.mapv(|v| ckd_stage(v) as f64)
}

/// Derived targets for a cohort: the three eGFR variants plus the stage
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CohortTargets {
    pub egfr_creatinine: Array1<f64>,
    pub egfr_cystatin_c: Array1<f64>,
    pub egfr_combined: Array1<f64>,
    pub stage: Array1<f64>,
}

/// Compute all three eGFR variants and the CKD stage for a cohort.
/// The combined equation is the regression target; its staging is the
/// classification target.
pub fn compute_targets(
    scr: &Array1<f64>,
    cysc: &Array1<f64>,
    age: &Array1<f64>,
    sex_encoded: &Array1<f64>,
) -> CohortTargets {
    let n = scr.len();
    let mut e_scr = Array1::zeros(n);
    let mut e_cysc = Array1::zeros(n);
    let mut e_comb = Array1::zeros(n);

    for i in 0..n {
        let sex = Sex::from_encoded(sex_encoded[i]);
        e_scr[i] = egfr_creatinine(scr[i], age[i], sex);
        e_cysc[i] = egfr_cystatin_c(cysc[i], age[i], sex);
        e_comb[i] = egfr_combined(scr[i], cysc[i], age[i], sex);
    }

    let stage = assign_stages(&e_comb);

    CohortTargets {
        egfr_creatinine: e_scr,
        egfr_cystatin_c: e_cysc,
        egfr_combined: e_comb,
        stage,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_creatinine_known_values() {
        // scr at kappa gives min_part = max_part = 1
        assert!((egfr_creatinine(0.9, 40.0, Sex::Male) - 110.73).abs() < 0.01);
        assert!((egfr_creatinine(0.7, 40.0, Sex::Female) - 112.05).abs() < 0.01);
        assert!((egfr_creatinine(1.8, 65.0, Sex::Male) - 41.26).abs() < 0.01);
    }

    #[test]
    fn test_cystatin_c_known_values() {
        assert!((egfr_cystatin_c(0.8, 40.0, Sex::Male) - 113.30).abs() < 0.01);
        assert!((egfr_cystatin_c(1.5, 70.0, Sex::Female) - 40.63).abs() < 0.01);
    }

    #[test]
    fn test_combined_known_values() {
        assert!((egfr_combined(0.9, 0.8, 40.0, Sex::Male) - 115.47).abs() < 0.01);
        assert!((egfr_combined(1.4, 1.6, 72.0, Sex::Female) - 39.25).abs() < 0.01);
    }

    #[test]
    fn test_egfr_decreases_with_creatinine() {
        let lo = egfr_creatinine(0.8, 50.0, Sex::Male);
        let hi = egfr_creatinine(3.0, 50.0, Sex::Male);
        assert!(hi < lo);
    }

    #[test]
    fn test_stage_cut_points() {
        assert_eq!(ckd_stage(120.0), 1);
        assert_eq!(ckd_stage(90.0), 1);
        assert_eq!(ckd_stage(89.99), 2);
        assert_eq!(ckd_stage(60.0), 2);
        assert_eq!(ckd_stage(59.99), 3);
        assert_eq!(ckd_stage(30.0), 3);
        assert_eq!(ckd_stage(15.0), 4);
        assert_eq!(ckd_stage(14.99), 5);
        assert_eq!(ckd_stage(3.0), 5);
    }

    #[test]
    fn test_compute_targets_shapes() {
        let scr = array![0.9, 1.8, 3.5];
        let cysc = array![0.8, 1.4, 2.9];
        let age = array![40.0, 65.0, 72.0];
        let sex = array![0.0, 1.0, 0.0];

        let targets = compute_targets(&scr, &cysc, &age, &sex);
        assert_eq!(targets.egfr_combined.len(), 3);
        assert_eq!(targets.stage.len(), 3);
        // Stages are ordered with declining kidney function
        assert!(targets.stage[0] < targets.stage[2]);
    }
}
