//! nephroml - eGFR regression and CKD staging pipeline
//!
//! This crate trains a support vector regressor to predict estimated
//! glomerular filtration rate (eGFR) from clinical biomarkers, tunes its
//! hyperparameters with a Grey Wolf Optimizer, and stages chronic kidney
//! disease with a panel of classifiers. The whole thing runs as a
//! resumable batch pipeline that checkpoints after expensive phases.
//!
//! # Modules
//!
//! ## Core
//! - [`optimizer`] - Grey Wolf Optimizer and the SVR objective adapter
//! - [`pipeline`] - Phase orchestration, checkpointing, resume
//!
//! ## Models & data
//! - [`training`] - Regression and classification models, metrics, CV, SMOTE
//! - [`preprocessing`] - Scaling and train/test splitting
//! - [`data`] - CSV loading and the synthetic cohort generator
//! - [`clinical`] - CKD-EPI 2021 eGFR equations and KDIGO staging

pub mod error;

pub mod clinical;
pub mod data;
pub mod preprocessing;
pub mod training;
pub mod optimizer;
pub mod pipeline;

pub use error::{NephroError, Result};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::error::{NephroError, Result};

    pub use crate::clinical::{ckd_stage, egfr_combined, egfr_creatinine, egfr_cystatin_c, Sex};

    pub use crate::data::{Cohort, SyntheticConfig};

    pub use crate::preprocessing::{train_test_split, StandardScaler};

    pub use crate::training::{
        ClassificationReport, DecisionTree, LinearRegression, RandomForest, RegressionReport,
        SvmClassifier, SvrParams, SvrRegressor,
    };

    pub use crate::optimizer::{
        GreyWolfOptimizer, GwoConfig, GwoOutcome, SearchSpace, SvrObjective,
    };

    pub use crate::pipeline::{
        CheckpointStore, Pipeline, PipelineConfig, PipelineOutcome, ResumeState,
    };
}
