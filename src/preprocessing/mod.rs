//! Feature scaling and dataset splitting

mod scaler;
mod split;

pub use scaler::StandardScaler;
pub use split::{train_test_split, Split, SplitOptions};
