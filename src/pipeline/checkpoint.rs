//! Tiered pipeline checkpoints
//!
//! Two durable snapshot tiers: `GwoCheckpoint` after the optimizer work
//! is done, and `FullCheckpoint` after classification. The full tier
//! embeds the regression tier whole, so a newer checkpoint always
//! carries everything an older one does. Writes are atomic (temp file +
//! rename); a checkpoint that fails to load is treated as absent, never
//! as a crash.

use crate::error::{NephroError, Result};
use crate::preprocessing::StandardScaler;
use crate::training::metrics::{ClassificationReport, RegressionReport};
use crate::training::svm::{SvrParams, SvrRegressor};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Bumped whenever a checkpoint's layout changes; older files load as absent
pub const CHECKPOINT_SCHEMA_VERSION: u32 = 1;

/// Snapshot written after the optimizer work completes: derived splits,
/// baseline results, the tuned hyperparameters and the final regressor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GwoCheckpoint {
    pub schema_version: u32,
    /// RFC 3339 creation time
    pub created_at: String,
    pub seed: u64,
    pub feature_names: Vec<String>,

    pub x_train_reg: Array2<f64>,
    pub x_test_reg: Array2<f64>,
    pub y_train_egfr: Array1<f64>,
    pub y_test_egfr: Array1<f64>,
    pub scaler_reg: StandardScaler,

    pub x_train_cls: Array2<f64>,
    pub x_test_cls: Array2<f64>,
    pub y_train_stage: Array1<f64>,
    pub y_test_stage: Array1<f64>,
    pub scaler_cls: StandardScaler,

    /// Baseline and tuned regression metrics, keyed by model name
    pub regression_reports: BTreeMap<String, RegressionReport>,
    pub best_params: SvrParams,
    pub best_score: f64,
    pub convergence: Vec<f64>,
    pub n_evaluations: usize,
    pub svr_model: SvrRegressor,
}

/// Snapshot written after classification: the regression tier plus the
/// classifier evaluations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FullCheckpoint {
    pub schema_version: u32,
    pub completed_at: String,
    pub regression: GwoCheckpoint,
    /// Classifier evaluations keyed by model name
    pub classification_reports: BTreeMap<String, ClassificationReport>,
}

/// What the on-disk checkpoints allow the controller to skip
#[derive(Debug)]
pub enum ResumeState {
    /// Everything through classification is done
    Full(Box<FullCheckpoint>),
    /// Optimizer work is done; classification still pending
    Gwo(Box<GwoCheckpoint>),
    /// No usable checkpoint; run every phase
    Fresh,
}

/// Durable storage for checkpoint files
#[derive(Debug, Clone)]
pub struct CheckpointStore {
    dir: PathBuf,
}

impl CheckpointStore {
    /// Create a store rooted at the given directory
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Path of the regression-tier checkpoint
    pub fn gwo_path(&self) -> PathBuf {
        self.dir.join("gwo_checkpoint.json")
    }

    /// Path of the full-tier checkpoint
    pub fn full_path(&self) -> PathBuf {
        self.dir.join("full_checkpoint.json")
    }

    /// Persist the regression tier. A write failure is fatal for the run:
    /// the phase's output cannot be trusted as durable.
    pub fn save_gwo(&self, checkpoint: &GwoCheckpoint) -> Result<()> {
        self.write_atomic(&self.gwo_path(), checkpoint)
    }

    /// Persist the full tier
    pub fn save_full(&self, checkpoint: &FullCheckpoint) -> Result<()> {
        self.write_atomic(&self.full_path(), checkpoint)
    }

    /// Load the regression tier; missing or corrupt files read as absent
    pub fn load_gwo(&self) -> Option<GwoCheckpoint> {
        self.load_tier::<GwoCheckpoint>(&self.gwo_path())
            .filter(|cp| self.version_ok(cp.schema_version, "gwo"))
    }

    /// Load the full tier; missing or corrupt files read as absent
    pub fn load_full(&self) -> Option<FullCheckpoint> {
        self.load_tier::<FullCheckpoint>(&self.full_path())
            .filter(|cp| self.version_ok(cp.schema_version, "full"))
    }

    /// Decide where the run can resume: full tier first, then the
    /// regression tier, else fresh. Ordered attempts, no error-driven
    /// control flow.
    pub fn resolve_resume(&self) -> ResumeState {
        if let Some(full) = self.load_full() {
            info!(path = %self.full_path().display(), "resuming from full checkpoint");
            return ResumeState::Full(Box::new(full));
        }
        if let Some(gwo) = self.load_gwo() {
            info!(path = %self.gwo_path().display(), "resuming from optimizer checkpoint");
            return ResumeState::Gwo(Box::new(gwo));
        }
        ResumeState::Fresh
    }

    fn version_ok(&self, version: u32, tier: &str) -> bool {
        if version == CHECKPOINT_SCHEMA_VERSION {
            true
        } else {
            warn!(
                tier,
                found = version,
                expected = CHECKPOINT_SCHEMA_VERSION,
                "checkpoint schema version mismatch, treating as absent"
            );
            false
        }
    }

    fn load_tier<T: for<'de> Deserialize<'de>>(&self, path: &Path) -> Option<T> {
        let bytes = match fs::read(path) {
            Ok(b) => b,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "checkpoint unreadable, treating as absent");
                return None;
            }
        };

        match serde_json::from_slice(&bytes) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "checkpoint corrupt, treating as absent");
                None
            }
        }
    }

    /// Serialize to a temp sibling, then rename into place so a crash
    /// mid-write never leaves a half-written checkpoint behind.
    fn write_atomic<T: Serialize>(&self, path: &Path, value: &T) -> Result<()> {
        fs::create_dir_all(&self.dir).map_err(|e| NephroError::CheckpointWrite {
            path: self.dir.display().to_string(),
            source: e,
        })?;

        let bytes = serde_json::to_vec(value)?;

        let tmp_path = path.with_extension("json.tmp");
        fs::write(&tmp_path, &bytes).map_err(|e| NephroError::CheckpointWrite {
            path: tmp_path.display().to_string(),
            source: e,
        })?;
        fs::rename(&tmp_path, path).map_err(|e| NephroError::CheckpointWrite {
            path: path.display().to_string(),
            source: e,
        })?;

        info!(path = %path.display(), bytes = bytes.len(), "checkpoint saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn sample_gwo_checkpoint() -> GwoCheckpoint {
        let mut scaler = StandardScaler::new();
        let x = array![[1.0, 2.0], [3.0, 4.0], [5.0, 6.0]];
        scaler.fit(&x).unwrap();

        let params = SvrParams {
            c: 12.5,
            epsilon: 0.05,
            gamma: 0.2,
        };
        let mut svr = SvrRegressor::new(params).unwrap();
        svr.fit(&x, &array![1.0, 2.0, 3.0]).unwrap();

        let mut reports = BTreeMap::new();
        reports.insert(
            "Linear Regression".to_string(),
            RegressionReport {
                rmse: 4.2,
                mae: 3.1,
                mape: 7.0,
                r2: 0.91,
            },
        );

        GwoCheckpoint {
            schema_version: CHECKPOINT_SCHEMA_VERSION,
            created_at: "2026-01-01T00:00:00Z".to_string(),
            seed: 42,
            feature_names: vec!["a".to_string(), "b".to_string()],
            x_train_reg: x.clone(),
            x_test_reg: x.clone(),
            y_train_egfr: array![1.0, 2.0, 3.0],
            y_test_egfr: array![1.0, 2.0, 3.0],
            scaler_reg: scaler.clone(),
            x_train_cls: x.clone(),
            x_test_cls: x,
            y_train_stage: array![1.0, 2.0, 3.0],
            y_test_stage: array![1.0, 2.0, 3.0],
            scaler_cls: scaler,
            regression_reports: reports,
            best_params: params,
            best_score: 3.7,
            convergence: vec![9.0, 5.0, 3.7],
            n_evaluations: 300,
            svr_model: svr,
        }
    }

    #[test]
    fn test_round_trip_preserves_fields() {
        let dir = tempfile::tempdir().unwrap();
        let store = CheckpointStore::new(dir.path());

        let checkpoint = sample_gwo_checkpoint();
        store.save_gwo(&checkpoint).unwrap();

        let loaded = store.load_gwo().expect("checkpoint should load");
        assert_eq!(loaded.seed, checkpoint.seed);
        assert_eq!(loaded.best_params, checkpoint.best_params);
        assert_eq!(loaded.best_score, checkpoint.best_score);
        assert_eq!(loaded.convergence, checkpoint.convergence);
        assert_eq!(loaded.x_train_reg, checkpoint.x_train_reg);
        assert_eq!(loaded.feature_names, checkpoint.feature_names);
        assert_eq!(
            loaded.regression_reports["Linear Regression"].rmse,
            checkpoint.regression_reports["Linear Regression"].rmse
        );
    }

    #[test]
    fn test_missing_checkpoint_reads_as_absent() {
        let dir = tempfile::tempdir().unwrap();
        let store = CheckpointStore::new(dir.path());
        assert!(store.load_gwo().is_none());
        assert!(store.load_full().is_none());
        assert!(matches!(store.resolve_resume(), ResumeState::Fresh));
    }

    #[test]
    fn test_corrupt_checkpoint_reads_as_absent() {
        let dir = tempfile::tempdir().unwrap();
        let store = CheckpointStore::new(dir.path());

        fs::create_dir_all(dir.path()).unwrap();
        fs::write(store.gwo_path(), b"{ not json").unwrap();
        assert!(store.load_gwo().is_none());

        // A truncated valid prefix is also corrupt
        let checkpoint = sample_gwo_checkpoint();
        store.save_gwo(&checkpoint).unwrap();
        let full_bytes = fs::read(store.gwo_path()).unwrap();
        fs::write(store.gwo_path(), &full_bytes[..full_bytes.len() / 2]).unwrap();
        assert!(store.load_gwo().is_none());
    }

    #[test]
    fn test_schema_version_mismatch_reads_as_absent() {
        let dir = tempfile::tempdir().unwrap();
        let store = CheckpointStore::new(dir.path());

        let mut checkpoint = sample_gwo_checkpoint();
        checkpoint.schema_version = CHECKPOINT_SCHEMA_VERSION + 1;
        store.save_gwo(&checkpoint).unwrap();
        assert!(store.load_gwo().is_none());
    }

    #[test]
    fn test_no_temp_file_left_behind() {
        let dir = tempfile::tempdir().unwrap();
        let store = CheckpointStore::new(dir.path());
        store.save_gwo(&sample_gwo_checkpoint()).unwrap();

        let leftovers: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.path().extension().map_or(false, |ext| ext == "tmp"))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[test]
    fn test_full_tier_supersedes_gwo_tier() {
        let dir = tempfile::tempdir().unwrap();
        let store = CheckpointStore::new(dir.path());

        let gwo = sample_gwo_checkpoint();
        store.save_gwo(&gwo).unwrap();
        assert!(matches!(store.resolve_resume(), ResumeState::Gwo(_)));

        let full = FullCheckpoint {
            schema_version: CHECKPOINT_SCHEMA_VERSION,
            completed_at: "2026-01-01T01:00:00Z".to_string(),
            regression: gwo,
            classification_reports: BTreeMap::new(),
        };
        store.save_full(&full).unwrap();
        assert!(matches!(store.resolve_resume(), ResumeState::Full(_)));
    }

    #[test]
    fn test_corrupt_full_falls_back_to_gwo() {
        let dir = tempfile::tempdir().unwrap();
        let store = CheckpointStore::new(dir.path());

        store.save_gwo(&sample_gwo_checkpoint()).unwrap();
        fs::write(store.full_path(), b"garbage").unwrap();

        assert!(matches!(store.resolve_resume(), ResumeState::Gwo(_)));
    }
}
