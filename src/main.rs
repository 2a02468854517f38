//! nephroml - Main entry point
//!
//! Runs the resumable eGFR regression + CKD staging pipeline from the
//! command line.

use clap::{Parser, Subcommand};
use nephroml::pipeline::{Pipeline, PipelineConfig};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "nephroml")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "eGFR regression and CKD staging pipeline with GWO-tuned SVR")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the training pipeline, resuming from checkpoints if present
    Run {
        /// Raw cohort CSV; a synthetic cohort is generated here if absent
        #[arg(short, long, default_value = "data/cohort.csv")]
        data: PathBuf,

        /// Output directory for checkpoints, metrics, figures and the report
        #[arg(short, long, default_value = "results")]
        output: PathBuf,

        /// GWO pack size
        #[arg(long, default_value = "20")]
        wolves: usize,

        /// GWO iteration budget
        #[arg(long, default_value = "15")]
        iterations: usize,

        /// Random seed for the whole run
        #[arg(long, default_value = "42")]
        seed: u64,

        /// Synthetic cohort size when the raw CSV is absent
        #[arg(long, default_value = "5000")]
        synthetic_samples: usize,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "nephroml=info".into()),
        )
        .init();

    let cli = Cli::parse();

    let (data, output, wolves, iterations, seed, synthetic_samples) = match cli.command {
        Some(Commands::Run {
            data,
            output,
            wolves,
            iterations,
            seed,
            synthetic_samples,
        }) => (data, output, wolves, iterations, seed, synthetic_samples),
        None => (
            PathBuf::from("data/cohort.csv"),
            PathBuf::from("results"),
            20,
            15,
            42,
            5000,
        ),
    };

    let config = PipelineConfig::new(data, output)
        .with_gwo_budget(wolves, iterations)
        .with_seed(seed)
        .with_synthetic_samples(synthetic_samples);

    let outcome = Pipeline::new(config).run()?;

    println!("resumed from: {:?}", outcome.resumed_from);
    println!(
        "tuned SVR: C={:.4} epsilon={:.4} gamma={:.4} (validation RMSE {:.4})",
        outcome.best_params.c,
        outcome.best_params.epsilon,
        outcome.best_params.gamma,
        outcome.best_score
    );
    for (name, report) in &outcome.regression_reports {
        println!("{:20} RMSE={:<8.4} R2={:<8.4}", name, report.rmse, report.r2);
    }
    for (name, report) in &outcome.classification_reports {
        println!(
            "{:20} Acc={:.4}  F1={:.4}",
            name, report.accuracy, report.f1_score
        );
    }

    Ok(())
}
