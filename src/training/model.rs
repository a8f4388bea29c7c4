//! Persisted decision model

use super::{check_width, Estimator, Regressor, Selection};
use crate::error::{LoanError, Result};
use chrono::{DateTime, Utc};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

/// Approval threshold applied to regression scores
pub const DEFAULT_DECISION_THRESHOLD: f64 = 0.5;

/// The selected regressor plus everything needed to turn its output into a
/// loan decision.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoanModel {
    /// Roster name of the winning candidate
    pub name: String,
    /// Held-out R² at selection time
    pub score: f64,
    /// Scores at or above this are approved
    pub threshold: f64,
    /// Ordered pipeline output columns the estimator was fitted on
    pub feature_names: Vec<String>,
    pub trained_at: DateTime<Utc>,
    estimator: Estimator,
}

impl LoanModel {
    pub fn new(
        name: impl Into<String>,
        score: f64,
        estimator: Estimator,
        feature_names: Vec<String>,
    ) -> Self {
        Self {
            name: name.into(),
            score,
            threshold: DEFAULT_DECISION_THRESHOLD,
            feature_names,
            trained_at: Utc::now(),
            estimator,
        }
    }

    /// Wrap a selection result for the given feature layout
    pub fn from_selection(selection: Selection, feature_names: Vec<String>) -> Self {
        Self::new(selection.name, selection.score, selection.estimator, feature_names)
    }

    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn estimator(&self) -> &Estimator {
        &self.estimator
    }

    pub fn n_features(&self) -> usize {
        self.feature_names.len()
    }

    /// Raw regression output, one per row
    pub fn predict_scores(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        check_width(x, self.n_features())?;
        let scores = self.estimator.predict(x)?;
        if scores.iter().any(|s| !s.is_finite()) {
            return Err(LoanError::DataIntegrity(
                "model produced a non-finite score".to_string(),
            ));
        }
        Ok(scores)
    }

    /// 1 (approved) or 0 (rejected) per row
    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<u8>> {
        Ok(self.predict_scores(x)?.mapv(|s| self.decide(s)))
    }

    pub fn decide(&self, score: f64) -> u8 {
        u8::from(score >= self.threshold)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::training::LinearRegression;
    use ndarray::array;

    fn fitted() -> LoanModel {
        let x = array![[0.0], [1.0], [2.0], [3.0]];
        let y = array![0.0, 0.0, 1.0, 1.0];
        let mut est = Estimator::LinearRegression(LinearRegression::new());
        est.fit(&x, &y).unwrap();
        LoanModel::new("Linear Regression", 0.8, est, vec!["CreditScore".to_string()])
    }

    #[test]
    fn test_threshold_is_inclusive() {
        let model = fitted();
        assert_eq!(model.decide(0.5), 1);
        assert_eq!(model.decide(0.4999), 0);
        assert_eq!(model.threshold, DEFAULT_DECISION_THRESHOLD);
    }

    #[test]
    fn test_predict_decisions() {
        let model = fitted();
        let decisions = model.predict(&array![[-1.0], [4.0]]).unwrap();
        assert_eq!(decisions, array![0u8, 1u8]);
    }

    #[test]
    fn test_width_checked() {
        let model = fitted();
        assert!(matches!(
            model.predict_scores(&array![[1.0, 2.0]]),
            Err(LoanError::ShapeError { .. })
        ));
    }

    #[test]
    fn test_serde_keeps_estimator() {
        let model = fitted();
        let json = serde_json::to_string(&model).unwrap();
        let back: LoanModel = serde_json::from_str(&json).unwrap();
        let x = array![[1.5], [2.5]];
        assert_eq!(model.predict_scores(&x).unwrap(), back.predict_scores(&x).unwrap());
        assert_eq!(back.feature_names, vec!["CreditScore".to_string()]);
    }
}
