//! Integration tests: full pipeline runs, checkpointing and resume

use nephroml::pipeline::{Pipeline, PipelineConfig, ResumeTier};
use std::fs;

fn test_config(dir: &std::path::Path) -> PipelineConfig {
    PipelineConfig::new(dir.join("cohort.csv"), dir.join("out"))
        .with_synthetic_samples(160)
        .with_gwo_budget(5, 3)
        .with_forest_estimators(10)
}

#[test]
fn fresh_run_writes_every_artifact() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path());
    let pipeline = Pipeline::new(config.clone());

    let outcome = pipeline.run().unwrap();
    assert_eq!(outcome.resumed_from, ResumeTier::Fresh);

    // The synthetic cohort was persisted for later runs
    assert!(config.data_path.exists());

    // Checkpoints for both tiers
    assert!(pipeline.store().gwo_path().exists());
    assert!(pipeline.store().full_path().exists());

    // Metric artifacts
    for name in [
        "gwo_best_params.json",
        "regression_metrics.json",
        "classification_metrics.json",
        "run_summary.json",
    ] {
        assert!(config.metrics_dir().join(name).exists(), "{} missing", name);
    }

    // Figure data and the report
    assert!(config.figures_dir().join("gwo_convergence.json").exists());
    assert!(config.report_path().exists());

    // Regression roster: both baselines plus the tuned model
    assert!(outcome.regression_reports.contains_key("Linear Regression"));
    assert!(outcome.regression_reports.contains_key("SVR"));
    assert!(outcome.regression_reports.contains_key("SVR-GWO"));
}

#[test]
fn rerun_against_full_checkpoint_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path());

    let first = Pipeline::new(config.clone()).run().unwrap();

    let summary_before = fs::read(config.metrics_dir().join("run_summary.json")).unwrap();
    let gwo_bytes_before = fs::read(Pipeline::new(config.clone()).store().gwo_path()).unwrap();

    let second = Pipeline::new(config.clone()).run().unwrap();

    assert_eq!(second.resumed_from, ResumeTier::Full);
    assert_eq!(second.best_params, first.best_params);
    assert_eq!(second.best_score, first.best_score);
    assert_eq!(second.convergence, first.convergence);

    // Checkpoints were not rewritten and downstream artifacts are identical
    let gwo_bytes_after = fs::read(Pipeline::new(config.clone()).store().gwo_path()).unwrap();
    assert_eq!(gwo_bytes_before, gwo_bytes_after);
    let summary_after = fs::read(config.metrics_dir().join("run_summary.json")).unwrap();
    assert_eq!(summary_before, summary_after);
}

#[test]
fn gwo_tier_resume_skips_straight_to_classification() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path());
    let pipeline = Pipeline::new(config.clone());

    let first = pipeline.run().unwrap();

    // Simulate a crash after the optimizer tier: the full checkpoint is gone
    fs::remove_file(pipeline.store().full_path()).unwrap();

    let second = pipeline.run().unwrap();
    assert_eq!(second.resumed_from, ResumeTier::Gwo);

    // Optimizer results flow through from the checkpoint untouched
    assert_eq!(second.best_params, first.best_params);
    assert_eq!(second.convergence, first.convergence);

    // Classification was redone and the full tier restored
    assert!(pipeline.store().full_path().exists());
    assert!(!second.classification_reports.is_empty());
}

#[test]
fn corrupt_checkpoints_fall_back_to_a_fresh_run() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path());
    let pipeline = Pipeline::new(config.clone());

    pipeline.run().unwrap();

    // Truncate both checkpoints; the next run must start over, not crash
    for path in [pipeline.store().gwo_path(), pipeline.store().full_path()] {
        let bytes = fs::read(&path).unwrap();
        fs::write(&path, &bytes[..bytes.len() / 3]).unwrap();
    }

    let outcome = pipeline.run().unwrap();
    assert_eq!(outcome.resumed_from, ResumeTier::Fresh);
    assert!(pipeline.store().load_full().is_some());
}
