//! Pipeline configuration

use std::path::{Path, PathBuf};

/// Configuration for a pipeline run. Constructed once at process start
/// and passed by reference into the controller.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Raw cohort CSV; generated synthetically if absent
    pub data_path: PathBuf,
    /// Root directory for metrics, models, figures and checkpoints
    pub output_dir: PathBuf,
    /// Cohort size when the raw CSV has to be generated
    pub synthetic_samples: usize,
    /// GWO pack size
    pub n_wolves: usize,
    /// GWO iteration budget
    pub max_iter: usize,
    /// Seed for every stochastic step in the run
    pub seed: u64,
    /// Held-out fraction for the outer train/test split
    pub test_size: f64,
    /// Held-out fraction of the training split used to score optimizer candidates
    pub optimizer_val_size: f64,
    /// Stratified CV folds for classifier evaluation
    pub cv_folds: usize,
    /// Forest size for the staging classifier
    pub forest_estimators: usize,
}

impl PipelineConfig {
    /// Create a config rooted at the given output directory
    pub fn new(data_path: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_path: data_path.into(),
            output_dir: output_dir.into(),
            synthetic_samples: 5000,
            n_wolves: 20,
            max_iter: 15,
            seed: 42,
            test_size: 0.3,
            optimizer_val_size: 0.2,
            cv_folds: 5,
            forest_estimators: 200,
        }
    }

    /// Builder method to set the GWO budget
    pub fn with_gwo_budget(mut self, n_wolves: usize, max_iter: usize) -> Self {
        self.n_wolves = n_wolves;
        self.max_iter = max_iter;
        self
    }

    /// Builder method to set the seed
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Builder method to set the synthetic cohort size
    pub fn with_synthetic_samples(mut self, n: usize) -> Self {
        self.synthetic_samples = n;
        self
    }

    /// Builder method to set the forest size
    pub fn with_forest_estimators(mut self, n: usize) -> Self {
        self.forest_estimators = n;
        self
    }

    /// Directory for checkpoint files
    pub fn checkpoint_dir(&self) -> PathBuf {
        self.output_dir.join("checkpoints")
    }

    /// Directory for metric JSON artifacts
    pub fn metrics_dir(&self) -> PathBuf {
        self.output_dir.join("metrics")
    }

    /// Directory for figure data series
    pub fn figures_dir(&self) -> PathBuf {
        self.output_dir.join("figures")
    }

    /// Path of the markdown run report
    pub fn report_path(&self) -> PathBuf {
        self.output_dir.join("run_report.md")
    }

    /// Raw data path as a borrowed Path
    pub fn data_path(&self) -> &Path {
        &self.data_path
    }
}
