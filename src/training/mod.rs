//! Model training
//!
//! A fixed roster of regressors fitted on the balanced, transformed
//! training split and ranked by held-out R²:
//! - Random Forest, Decision Tree, Gradient Boosting
//! - Linear Regression (least squares)
//! - K-Nearest Neighbors
//! - AdaBoost.R2

pub mod adaboost;
pub mod decision_tree;
pub mod gradient_boosting;
pub mod knn;
pub mod linear_models;
mod metrics;
mod model;
pub mod random_forest;
mod selector;

pub use adaboost::AdaBoostRegressor;
pub use decision_tree::{DecisionTree, TreeNode};
pub use gradient_boosting::{GradientBoostingConfig, GradientBoostingRegressor};
pub use knn::KNNRegressor;
pub use linear_models::LinearRegression;
pub use metrics::{r2_score, ModelMetrics};
pub use model::{LoanModel, DEFAULT_DECISION_THRESHOLD};
pub use random_forest::RandomForest;
pub use selector::{default_roster, Candidate, CandidateScore, ModelSelector, Selection};

use crate::error::{LoanError, Result};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

/// The capability every roster entry shares
pub trait Regressor: Send + Sync {
    /// Fit to a feature matrix and continuous target
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()>;

    /// Predict one value per row
    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>>;
}

/// Any fitted roster estimator, as persisted in the model artifact
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", content = "params")]
pub enum Estimator {
    RandomForest(RandomForest),
    DecisionTree(DecisionTree),
    GradientBoosting(GradientBoostingRegressor),
    LinearRegression(LinearRegression),
    KNearestNeighbors(KNNRegressor),
    AdaBoost(AdaBoostRegressor),
}

impl Estimator {
    fn inner(&self) -> &dyn Regressor {
        match self {
            Estimator::RandomForest(m) => m,
            Estimator::DecisionTree(m) => m,
            Estimator::GradientBoosting(m) => m,
            Estimator::LinearRegression(m) => m,
            Estimator::KNearestNeighbors(m) => m,
            Estimator::AdaBoost(m) => m,
        }
    }

    fn inner_mut(&mut self) -> &mut dyn Regressor {
        match self {
            Estimator::RandomForest(m) => m,
            Estimator::DecisionTree(m) => m,
            Estimator::GradientBoosting(m) => m,
            Estimator::LinearRegression(m) => m,
            Estimator::KNearestNeighbors(m) => m,
            Estimator::AdaBoost(m) => m,
        }
    }

    /// Short algorithm identifier
    pub fn kind(&self) -> &'static str {
        match self {
            Estimator::RandomForest(_) => "random_forest",
            Estimator::DecisionTree(_) => "decision_tree",
            Estimator::GradientBoosting(_) => "gradient_boosting",
            Estimator::LinearRegression(_) => "linear_regression",
            Estimator::KNearestNeighbors(_) => "knn",
            Estimator::AdaBoost(_) => "adaboost",
        }
    }
}

impl Regressor for Estimator {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        self.inner_mut().fit(x, y)
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        self.inner().predict(x)
    }
}

/// Reject empty or misaligned training data
pub(crate) fn check_xy(x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
    if x.nrows() != y.len() {
        return Err(LoanError::ShapeError {
            expected: format!("y length = {}", x.nrows()),
            actual: format!("y length = {}", y.len()),
        });
    }
    if x.nrows() == 0 || x.ncols() == 0 {
        return Err(LoanError::TrainingError(format!(
            "cannot fit on a {}x{} matrix",
            x.nrows(),
            x.ncols()
        )));
    }
    Ok(())
}

/// Reject a prediction matrix with the wrong width
pub(crate) fn check_width(x: &Array2<f64>, n_features: usize) -> Result<()> {
    if x.ncols() != n_features {
        return Err(LoanError::ShapeError {
            expected: format!("{} features", n_features),
            actual: format!("{} features", x.ncols()),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_estimator_dispatch() {
        let x = array![[1.0], [2.0], [3.0], [4.0]];
        let y = array![2.0, 4.0, 6.0, 8.0];

        let mut est = Estimator::LinearRegression(LinearRegression::new());
        est.fit(&x, &y).unwrap();
        let pred = est.predict(&array![[5.0]]).unwrap();
        assert!((pred[0] - 10.0).abs() < 1e-6);
        assert_eq!(est.kind(), "linear_regression");
    }

    #[test]
    fn test_estimator_serde_tag() {
        let est = Estimator::DecisionTree(DecisionTree::new());
        let json = serde_json::to_string(&est).unwrap();
        assert!(json.contains("\"kind\":\"DecisionTree\""));
        let back: Estimator = serde_json::from_str(&json).unwrap();
        assert_eq!(back.kind(), "decision_tree");
    }

    #[test]
    fn test_check_xy() {
        let x = Array2::<f64>::zeros((3, 2));
        assert!(matches!(
            check_xy(&x, &Array1::zeros(2)),
            Err(LoanError::ShapeError { .. })
        ));
        assert!(check_xy(&x, &Array1::zeros(3)).is_ok());
    }
}
