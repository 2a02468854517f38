//! Pipeline controller
//!
//! Runs the phase sequence Preprocess → ComputeTargets →
//! FitBaselineRegressors → OptimizeHyperparameters → FitFinalRegressor →
//! ExportRegressionArtifacts → FitClassifiers →
//! ExportClassificationArtifacts → GenerateFigures → GenerateReport.
//!
//! On start-up the controller inspects the checkpoint store and resumes
//! at the first phase whose results are not already durable: a full
//! checkpoint skips straight to figures and reporting, a regression-tier
//! checkpoint skips everything through the optimizer. Figure and report
//! failures are logged and never invalidate saved model checkpoints.

use crate::clinical;
use crate::data::{self, Cohort, SyntheticConfig, FEATURE_COLUMNS};
use crate::error::Result;
use crate::optimizer::{GreyWolfOptimizer, GwoConfig, SearchSpace, SvrObjective};
use crate::preprocessing::{train_test_split, SplitOptions, StandardScaler};
use crate::training::cross_validation::stratified_k_fold;
use crate::training::metrics::{ClassificationReport, RegressionReport};
use crate::training::smote::Smote;
use crate::training::svm::{SvmClassifier, SvmClassifierConfig, SvrParams, SvrRegressor};
use crate::training::{DecisionTree, LinearRegression, RandomForest};
use chrono::Utc;
use ndarray::{Array1, Array2, Axis};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{info, warn};

use super::artifacts;
use super::checkpoint::{
    CheckpointStore, FullCheckpoint, GwoCheckpoint, ResumeState, CHECKPOINT_SCHEMA_VERSION,
};
use super::config::PipelineConfig;

/// Which checkpoint tier the run resumed from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ResumeTier {
    /// No checkpoint; every phase ran
    Fresh,
    /// Optimizer work was loaded; classification onward ran
    Gwo,
    /// Everything was loaded; only figures and reporting ran
    Full,
}

/// Result of a pipeline run
#[derive(Debug, Clone)]
pub struct PipelineOutcome {
    pub resumed_from: ResumeTier,
    pub best_params: SvrParams,
    pub best_score: f64,
    pub convergence: Vec<f64>,
    pub regression_reports: BTreeMap<String, RegressionReport>,
    pub classification_reports: BTreeMap<String, ClassificationReport>,
}

/// The pipeline controller. Constructed once with its config and passed
/// around by reference; owns no global state.
pub struct Pipeline {
    config: PipelineConfig,
    store: CheckpointStore,
}

impl Pipeline {
    /// Create a controller for the given configuration
    pub fn new(config: PipelineConfig) -> Self {
        let store = CheckpointStore::new(config.checkpoint_dir());
        Self { config, store }
    }

    /// The controller's checkpoint store
    pub fn store(&self) -> &CheckpointStore {
        &self.store
    }

    /// Run the pipeline, resuming from the most advanced usable checkpoint
    pub fn run(&self) -> Result<PipelineOutcome> {
        match self.store.resolve_resume() {
            ResumeState::Full(full) => {
                info!("full checkpoint found, skipping all training phases");
                self.finish(*full, ResumeTier::Full)
            }
            ResumeState::Gwo(gwo) => {
                info!("optimizer checkpoint found, resuming at classification");
                let full = self.run_classification(*gwo)?;
                self.finish(full, ResumeTier::Gwo)
            }
            ResumeState::Fresh => {
                info!("no checkpoint found, running every phase");
                let gwo = self.run_regression_phases()?;
                let full = self.run_classification(gwo)?;
                self.finish(full, ResumeTier::Fresh)
            }
        }
    }

    /// Preprocess through ExportRegressionArtifacts
    fn run_regression_phases(&self) -> Result<GwoCheckpoint> {
        // Preprocess
        let cohort = self.load_or_generate_cohort()?;
        info!(patients = cohort.len(), "cohort ready");

        // ComputeTargets
        let targets = clinical::compute_targets(
            &cohort.column("SCr")?,
            &cohort.column("SCysC")?,
            &cohort.column("Age")?,
            &cohort.column("Sex_encoded")?,
        );

        // Feature preparation: one split per task, scaled independently
        let reg_split = train_test_split(
            &cohort.features,
            &targets.egfr_combined,
            &SplitOptions {
                test_size: self.config.test_size,
                seed: self.config.seed,
                stratify: false,
            },
        )?;
        let mut scaler_reg = StandardScaler::new();
        let x_train_reg = scaler_reg.fit_transform(&reg_split.x_train)?;
        let x_test_reg = scaler_reg.transform(&reg_split.x_test)?;

        let cls_split = train_test_split(
            &cohort.features,
            &targets.stage,
            &SplitOptions {
                test_size: self.config.test_size,
                seed: self.config.seed,
                stratify: true,
            },
        )?;
        let mut scaler_cls = StandardScaler::new();
        let x_train_cls = scaler_cls.fit_transform(&cls_split.x_train)?;
        let x_test_cls = scaler_cls.transform(&cls_split.x_test)?;

        // FitBaselineRegressors
        let mut regression_reports = BTreeMap::new();

        let mut linear = LinearRegression::new();
        linear.fit(&x_train_reg, &reg_split.y_train)?;
        let linear_pred = linear.predict(&x_test_reg)?;
        let linear_report = RegressionReport::compute(&reg_split.y_test, &linear_pred);
        info!(rmse = linear_report.rmse, r2 = linear_report.r2, "linear regression baseline");
        regression_reports.insert("Linear Regression".to_string(), linear_report);

        let mut svr_base = SvrRegressor::new(SvrParams::default())?;
        svr_base.fit(&x_train_reg, &reg_split.y_train)?;
        let svr_pred = svr_base.predict(&x_test_reg)?;
        let svr_report = RegressionReport::compute(&reg_split.y_test, &svr_pred);
        info!(rmse = svr_report.rmse, r2 = svr_report.r2, "default SVR baseline");
        regression_reports.insert("SVR".to_string(), svr_report);

        // OptimizeHyperparameters
        let inner = train_test_split(
            &x_train_reg,
            &reg_split.y_train,
            &SplitOptions {
                test_size: self.config.optimizer_val_size,
                seed: self.config.seed,
                stratify: false,
            },
        )?;
        let objective = SvrObjective::new(
            inner.x_train,
            inner.y_train,
            inner.x_test,
            inner.y_test,
        );

        let gwo = GreyWolfOptimizer::new(
            GwoConfig {
                n_wolves: self.config.n_wolves,
                max_iter: self.config.max_iter,
                seed: Some(self.config.seed),
            },
            SearchSpace::svr_default(),
        );
        info!(
            n_wolves = self.config.n_wolves,
            max_iter = self.config.max_iter,
            "starting hyperparameter search"
        );
        let outcome = gwo.optimize(|params| objective.evaluate(params))?;
        info!(
            best_score = outcome.best_score,
            evaluations = outcome.n_evaluations,
            "hyperparameter search complete"
        );

        // FitFinalRegressor: retrain with the tuned parameters on the
        // whole training split
        let best_params = SvrParams::from_vector(&outcome.best_position)?;
        let mut svr_tuned = SvrRegressor::new(best_params)?;
        svr_tuned.fit(&x_train_reg, &reg_split.y_train)?;
        let tuned_pred = svr_tuned.predict(&x_test_reg)?;
        let tuned_report = RegressionReport::compute(&reg_split.y_test, &tuned_pred);
        info!(rmse = tuned_report.rmse, r2 = tuned_report.r2, "tuned SVR fitted");
        regression_reports.insert("SVR-GWO".to_string(), tuned_report);

        let checkpoint = GwoCheckpoint {
            schema_version: CHECKPOINT_SCHEMA_VERSION,
            created_at: Utc::now().to_rfc3339(),
            seed: self.config.seed,
            feature_names: cohort.feature_names.clone(),
            x_train_reg,
            x_test_reg,
            y_train_egfr: reg_split.y_train,
            y_test_egfr: reg_split.y_test,
            scaler_reg,
            x_train_cls,
            x_test_cls,
            y_train_stage: cls_split.y_train,
            y_test_stage: cls_split.y_test,
            scaler_cls,
            regression_reports,
            best_params,
            best_score: outcome.best_score,
            convergence: outcome.convergence,
            n_evaluations: outcome.n_evaluations,
            svr_model: svr_tuned,
        };

        // ExportRegressionArtifacts: metric exports and the durable
        // checkpoint; failures here are fatal for the run
        artifacts::export_gwo_params(&self.config.metrics_dir(), &checkpoint)?;
        artifacts::export_regression_metrics(
            &self.config.metrics_dir(),
            &checkpoint.regression_reports,
        )?;
        self.store.save_gwo(&checkpoint)?;

        Ok(checkpoint)
    }

    /// FitClassifiers through ExportClassificationArtifacts
    fn run_classification(&self, regression: GwoCheckpoint) -> Result<FullCheckpoint> {
        let x_train = &regression.x_train_cls;
        let y_train = &regression.y_train_stage;
        let x_test = &regression.x_test_cls;
        let y_test = &regression.y_test_stage;

        let mut classification_reports = BTreeMap::new();

        for name in ["SVM", "Decision Tree", "Random Forest"] {
            info!(model = name, "training classifier");

            // Stratified CV on the training split, resampling inside
            // each fold so validation rows never leak into SMOTE
            let folds = stratified_k_fold(y_train, self.config.cv_folds, self.config.seed)?;
            let mut cv_scores = Vec::with_capacity(folds.len());
            for fold in &folds {
                let x_tr = x_train.select(Axis(0), &fold.train_indices);
                let y_tr = y_train.select(Axis(0), &fold.train_indices);
                let x_val = x_train.select(Axis(0), &fold.val_indices);
                let y_val = y_train.select(Axis(0), &fold.val_indices);

                match self.fit_and_predict(name, &x_tr, &y_tr, &x_val) {
                    Ok(pred) => {
                        let fold_report = ClassificationReport::compute(&y_val, &pred);
                        cv_scores.push(fold_report.f1_score);
                    }
                    Err(e) => {
                        warn!(model = name, error = %e, "cross-validation fold failed");
                        cv_scores.push(0.0);
                    }
                }
            }

            // Final fit on the whole training split, evaluated on test
            let pred = match self.fit_and_predict(name, x_train, y_train, x_test) {
                Ok(pred) => pred,
                Err(e) => {
                    warn!(model = name, error = %e, "classifier training failed, skipping");
                    continue;
                }
            };

            let report = ClassificationReport::compute(y_test, &pred).with_cv_scores(&cv_scores);
            info!(
                model = name,
                accuracy = report.accuracy,
                f1 = report.f1_score,
                "classifier evaluated"
            );
            classification_reports.insert(name.to_string(), report);
        }

        let full = FullCheckpoint {
            schema_version: CHECKPOINT_SCHEMA_VERSION,
            completed_at: Utc::now().to_rfc3339(),
            regression,
            classification_reports,
        };

        // ExportClassificationArtifacts
        artifacts::export_classification_metrics(
            &self.config.metrics_dir(),
            &full.classification_reports,
        )?;
        self.store.save_full(&full)?;

        Ok(full)
    }

    /// SMOTE-resample the training rows, fit the named classifier, and
    /// predict the given evaluation rows
    fn fit_and_predict(
        &self,
        name: &str,
        x_train: &Array2<f64>,
        y_train: &Array1<f64>,
        x_eval: &Array2<f64>,
    ) -> Result<Array1<f64>> {
        let smote = Smote::for_labels(y_train).with_seed(self.config.seed);
        let (x_bal, y_bal) = smote.resample(x_train, y_train)?;

        match name {
            "SVM" => {
                let mut model = SvmClassifier::new(SvmClassifierConfig {
                    seed: self.config.seed,
                    ..Default::default()
                });
                model.fit(&x_bal, &y_bal)?;
                model.predict(x_eval)
            }
            "Decision Tree" => {
                let mut model = DecisionTree::new();
                model.fit(&x_bal, &y_bal)?;
                model.predict(x_eval)
            }
            _ => {
                let mut model = RandomForest::new()
                    .with_n_estimators(self.config.forest_estimators)
                    .with_seed(self.config.seed);
                model.fit(&x_bal, &y_bal)?;
                model.predict(x_eval)
            }
        }
    }

    /// GenerateFigures and GenerateReport, both best-effort: a failure is
    /// logged and the already-saved model checkpoints stay untouched
    fn finish(&self, full: FullCheckpoint, resumed_from: ResumeTier) -> Result<PipelineOutcome> {
        artifacts::export_run_summary(&self.config.metrics_dir(), &full)?;

        if let Err(e) = artifacts::write_figure_data(&self.config.figures_dir(), &full) {
            warn!(error = %e, "figure data generation failed; model artifacts remain valid");
        }
        if let Err(e) = artifacts::write_report(&self.config.report_path(), &full) {
            warn!(error = %e, "report generation failed; model artifacts remain valid");
        }

        let regression = full.regression;
        Ok(PipelineOutcome {
            resumed_from,
            best_params: regression.best_params,
            best_score: regression.best_score,
            convergence: regression.convergence,
            regression_reports: regression.regression_reports,
            classification_reports: full.classification_reports,
        })
    }

    /// Load the raw cohort CSV, or generate and persist a synthetic one
    fn load_or_generate_cohort(&self) -> Result<Cohort> {
        let feature_names: Vec<String> = FEATURE_COLUMNS.iter().map(|s| s.to_string()).collect();
        let path = self.config.data_path();

        if path.exists() {
            info!(path = %path.display(), "loading raw cohort");
            let mut df = data::load_csv(path)?;
            data::encode_sex(&mut df)?;
            return data::cohort_from_frame(&df, &feature_names);
        }

        info!(
            path = %path.display(),
            n_samples = self.config.synthetic_samples,
            "raw cohort absent, generating synthetic data"
        );
        let cohort = data::generate_cohort(&SyntheticConfig {
            n_samples: self.config.synthetic_samples,
            seed: self.config.seed,
        })?;
        let mut df = data::cohort_to_frame(&cohort)?;
        data::write_csv(&mut df, path)?;
        Ok(cohort)
    }
}
