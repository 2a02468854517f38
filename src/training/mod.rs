//! Model training module
//!
//! Regression models for eGFR prediction (linear baseline, SVR) and
//! classifiers for CKD staging (polynomial SVM, entropy decision tree,
//! random forest), plus evaluation metrics, stratified cross-validation
//! and SMOTE oversampling for the imbalanced stage distribution.

pub mod cross_validation;
pub mod decision_tree;
pub mod linear;
pub mod metrics;
pub mod random_forest;
pub mod smote;
pub mod svm;

pub use cross_validation::{stratified_k_fold, CvFold};
pub use decision_tree::{DecisionTree, TreeNode};
pub use linear::LinearRegression;
pub use metrics::{ClassificationReport, RegressionReport};
pub use random_forest::RandomForest;
pub use smote::Smote;
pub use svm::{KernelType, SvmClassifier, SvmClassifierConfig, SvrParams, SvrRegressor};
