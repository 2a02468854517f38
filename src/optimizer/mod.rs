//! Hyperparameter optimization
//!
//! A Grey Wolf Optimizer over a bounded continuous search space, plus the
//! objective adapter that scores SVR hyperparameter candidates by
//! validation RMSE.

mod gwo;
mod objective;
mod search_space;

pub use gwo::{GreyWolfOptimizer, GwoConfig, GwoOutcome, Hierarchy, Leader};
pub use objective::SvrObjective;
pub use search_space::SearchSpace;
