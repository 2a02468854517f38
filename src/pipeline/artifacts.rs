//! Metric, figure-data and report exports
//!
//! JSON artifacts for downstream consumers: tuned hyperparameters,
//! model metrics, plot-ready data series and a markdown run report.
//! Metric exports are essential (errors propagate); figure data and the
//! report are best-effort and the controller logs-and-continues on
//! failure.

use crate::error::Result;
use crate::training::metrics::{ClassificationReport, RegressionReport};
use serde::Serialize;
use serde_json::json;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::info;

use super::checkpoint::{FullCheckpoint, GwoCheckpoint};

fn write_json<T: Serialize>(dir: &Path, name: &str, value: &T) -> Result<()> {
    fs::create_dir_all(dir)?;
    let path = dir.join(name);
    fs::write(&path, serde_json::to_vec_pretty(value)?)?;
    info!(path = %path.display(), "artifact written");
    Ok(())
}

/// Export the tuned SVR hyperparameters and their validation score
pub fn export_gwo_params(metrics_dir: &Path, checkpoint: &GwoCheckpoint) -> Result<()> {
    let payload = json!({
        "C": checkpoint.best_params.c,
        "epsilon": checkpoint.best_params.epsilon,
        "gamma": checkpoint.best_params.gamma,
        "RMSE": checkpoint.best_score,
        "evaluations": checkpoint.n_evaluations,
    });
    write_json(metrics_dir, "gwo_best_params.json", &payload)
}

/// Export regression metrics keyed by model name
pub fn export_regression_metrics(
    metrics_dir: &Path,
    reports: &BTreeMap<String, RegressionReport>,
) -> Result<()> {
    write_json(metrics_dir, "regression_metrics.json", reports)
}

/// Export classification metrics keyed by model name
pub fn export_classification_metrics(
    metrics_dir: &Path,
    reports: &BTreeMap<String, ClassificationReport>,
) -> Result<()> {
    write_json(metrics_dir, "classification_metrics.json", reports)
}

/// Export the whole-run summary
pub fn export_run_summary(metrics_dir: &Path, checkpoint: &FullCheckpoint) -> Result<()> {
    let regression = &checkpoint.regression;
    let payload = json!({
        "completed_at": checkpoint.completed_at,
        "seed": regression.seed,
        "n_train_samples": regression.x_train_reg.nrows(),
        "n_test_samples": regression.x_test_reg.nrows(),
        "regression": regression.regression_reports,
        "classification": checkpoint.classification_reports,
        "gwo": {
            "C": regression.best_params.c,
            "epsilon": regression.best_params.epsilon,
            "gamma": regression.best_params.gamma,
            "RMSE": regression.best_score,
        },
    });
    write_json(metrics_dir, "run_summary.json", &payload)
}

/// Write plot-ready data series: the convergence curve, predicted vs
/// actual eGFR on the test split, and per-classifier confusion matrices.
pub fn write_figure_data(figures_dir: &Path, checkpoint: &FullCheckpoint) -> Result<()> {
    let regression = &checkpoint.regression;

    let convergence = json!({
        "iterations": (1..=regression.convergence.len()).collect::<Vec<_>>(),
        "best_rmse": regression.convergence,
    });
    write_json(figures_dir, "gwo_convergence.json", &convergence)?;

    let predictions = regression.svr_model.predict(&regression.x_test_reg)?;
    let scatter = json!({
        "actual": regression.y_test_egfr.to_vec(),
        "predicted": predictions.to_vec(),
    });
    write_json(figures_dir, "egfr_predicted_vs_actual.json", &scatter)?;

    let matrices: BTreeMap<&String, serde_json::Value> = checkpoint
        .classification_reports
        .iter()
        .map(|(name, report)| {
            (
                name,
                json!({
                    "classes": report.classes,
                    "matrix": report.confusion_matrix,
                }),
            )
        })
        .collect();
    write_json(figures_dir, "confusion_matrices.json", &matrices)?;

    Ok(())
}

/// Render the markdown run report
pub fn write_report(report_path: &Path, checkpoint: &FullCheckpoint) -> Result<()> {
    let regression = &checkpoint.regression;
    let mut out = String::new();

    out.push_str("# CKD Pipeline Run Report\n\n");
    out.push_str(&format!("Completed: {}\n\n", checkpoint.completed_at));

    out.push_str("## Regression (eGFR prediction)\n\n");
    out.push_str("| Model | RMSE | MAE | MAPE % | R² |\n");
    out.push_str("|---|---|---|---|---|\n");
    for (name, r) in &regression.regression_reports {
        out.push_str(&format!(
            "| {} | {:.4} | {:.4} | {:.2} | {:.4} |\n",
            name, r.rmse, r.mae, r.mape, r.r2
        ));
    }

    out.push_str("\n## Tuned SVR hyperparameters\n\n");
    out.push_str(&format!(
        "- C = {:.4}\n- epsilon = {:.4}\n- gamma = {:.4}\n- validation RMSE = {:.4}\n- objective evaluations = {}\n",
        regression.best_params.c,
        regression.best_params.epsilon,
        regression.best_params.gamma,
        regression.best_score,
        regression.n_evaluations,
    ));

    out.push_str("\n## Classification (CKD staging)\n\n");
    out.push_str("| Model | Accuracy | Precision | Recall | F1 | CV F1 |\n");
    out.push_str("|---|---|---|---|---|---|\n");
    for (name, r) in &checkpoint.classification_reports {
        let cv = match (r.cv_mean, r.cv_std) {
            (Some(m), Some(s)) => format!("{:.4} ± {:.4}", m, s),
            _ => "-".to_string(),
        };
        out.push_str(&format!(
            "| {} | {:.4} | {:.4} | {:.4} | {:.4} | {} |\n",
            name, r.accuracy, r.precision, r.recall, r.f1_score, cv
        ));
    }

    if let Some(parent) = report_path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(report_path, out)?;
    info!(path = %report_path.display(), "run report written");
    Ok(())
}
