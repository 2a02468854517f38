//! Clinical ground-truth computations
//!
//! CKD-EPI 2021 eGFR equations and KDIGO stage assignment. These supply
//! the numeric targets the regression models train against; the rest of
//! the crate only consumes their outputs.

mod egfr;

pub use egfr::{
    assign_stages, ckd_stage, egfr_combined, egfr_creatinine, egfr_cystatin_c, CohortTargets,
    compute_targets, Sex,
};
