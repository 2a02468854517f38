//! Resumable training pipeline
//!
//! Orchestrates the full offline run: preprocessing, target computation,
//! baseline regressors, GWO hyperparameter search, final SVR fit,
//! stage classifiers, artifact export and reporting. Durable checkpoints
//! are written after the expensive phases so a restart skips completed
//! work instead of redoing it.

mod artifacts;
mod checkpoint;
mod config;
mod controller;

pub use checkpoint::{
    CheckpointStore, FullCheckpoint, GwoCheckpoint, ResumeState, CHECKPOINT_SCHEMA_VERSION,
};
pub use config::PipelineConfig;
pub use controller::{Pipeline, PipelineOutcome, ResumeTier};
