//! Fixed-roster model selection by held-out R²

use super::{
    r2_score, AdaBoostRegressor, DecisionTree, Estimator, GradientBoostingConfig,
    GradientBoostingRegressor, KNNRegressor, LinearRegression, RandomForest, Regressor,
};
use crate::error::{LoanError, Result};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{info, warn};

/// A named, untrained roster entry
#[derive(Debug, Clone)]
pub struct Candidate {
    pub name: String,
    pub estimator: Estimator,
}

impl Candidate {
    pub fn new(name: impl Into<String>, estimator: Estimator) -> Self {
        Self {
            name: name.into(),
            estimator,
        }
    }
}

/// Held-out score of one roster entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateScore {
    pub name: String,
    pub score: f64,
    pub fit_secs: f64,
}

/// Winner of a selection run
#[derive(Debug, Clone)]
pub struct Selection {
    pub name: String,
    pub score: f64,
    pub estimator: Estimator,
    /// Every candidate, in roster order
    pub scores: Vec<CandidateScore>,
}

/// The standard roster, in ranking order
pub fn default_roster(seed: u64) -> Vec<Candidate> {
    vec![
        Candidate::new(
            "Random Forest",
            Estimator::RandomForest(RandomForest::new(100).with_random_state(seed)),
        ),
        Candidate::new("Decision Tree", Estimator::DecisionTree(DecisionTree::new())),
        Candidate::new(
            "Gradient Boosting",
            Estimator::GradientBoosting(GradientBoostingRegressor::new(GradientBoostingConfig {
                random_state: seed,
                ..Default::default()
            })),
        ),
        Candidate::new("Linear Regression", Estimator::LinearRegression(LinearRegression::new())),
        Candidate::new("K-Nearest Neighbors", Estimator::KNearestNeighbors(KNNRegressor::with_k(5))),
        Candidate::new(
            "AdaBoost",
            Estimator::AdaBoost(AdaBoostRegressor::new(50, 1.0).with_random_state(seed)),
        ),
    ]
}

/// Fits every candidate and keeps the strictly best held-out score.
///
/// Ties go to the earlier roster entry. NaN scores never win. A winner
/// below `min_score` is rejected.
#[derive(Debug, Clone)]
pub struct ModelSelector {
    roster: Vec<Candidate>,
    min_score: f64,
}

impl ModelSelector {
    pub fn new(roster: Vec<Candidate>, min_score: f64) -> Self {
        Self { roster, min_score }
    }

    /// Standard roster seeded with `seed`
    pub fn with_default_roster(seed: u64, min_score: f64) -> Self {
        Self::new(default_roster(seed), min_score)
    }

    pub fn min_score(&self) -> f64 {
        self.min_score
    }

    pub fn candidate_names(&self) -> Vec<&str> {
        self.roster.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn select(
        self,
        x_train: &Array2<f64>,
        y_train: &Array1<f64>,
        x_test: &Array2<f64>,
        y_test: &Array1<f64>,
    ) -> Result<Selection> {
        if self.roster.is_empty() {
            return Err(LoanError::TrainingError("model roster is empty".to_string()));
        }
        if x_train.ncols() != x_test.ncols() {
            return Err(LoanError::ShapeError {
                expected: format!("{} test features", x_train.ncols()),
                actual: format!("{} test features", x_test.ncols()),
            });
        }
        if x_test.nrows() != y_test.len() {
            return Err(LoanError::ShapeError {
                expected: format!("y_test length = {}", x_test.nrows()),
                actual: format!("y_test length = {}", y_test.len()),
            });
        }

        let mut scores = Vec::with_capacity(self.roster.len());
        let mut best: Option<(String, f64, Estimator)> = None;

        for Candidate { name, mut estimator } in self.roster {
            let start = Instant::now();
            estimator.fit(x_train, y_train).map_err(|e| {
                LoanError::TrainingError(format!("candidate '{}' failed to fit: {}", name, e))
            })?;
            let fit_secs = start.elapsed().as_secs_f64();

            let predictions = estimator.predict(x_test).map_err(|e| {
                LoanError::TrainingError(format!("candidate '{}' failed to predict: {}", name, e))
            })?;
            let score = r2_score(y_test, &predictions);

            if score.is_nan() {
                warn!(model = %name, "Candidate produced a NaN score and is excluded");
            } else {
                info!(model = %name, r2 = score, fit_secs, "Candidate scored");
            }
            scores.push(CandidateScore {
                name: name.clone(),
                score,
                fit_secs,
            });

            let improves = !score.is_nan() && best.as_ref().map_or(true, |(_, s, _)| score > *s);
            if improves {
                best = Some((name, score, estimator));
            }
        }

        let Some((name, score, estimator)) = best else {
            return Err(LoanError::NoAcceptableModel {
                model: "none".to_string(),
                score: f64::NAN,
                threshold: self.min_score,
            });
        };

        if score < self.min_score {
            return Err(LoanError::NoAcceptableModel {
                model: name,
                score,
                threshold: self.min_score,
            });
        }

        info!(model = %name, r2 = score, "Best model selected");
        Ok(Selection {
            name,
            score,
            estimator,
            scores,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn linear_data() -> (Array2<f64>, Array1<f64>, Array2<f64>, Array1<f64>) {
        let x_train = Array2::from_shape_fn((40, 1), |(i, _)| i as f64);
        let y_train = x_train.column(0).mapv(|v| 2.0 * v + 1.0);
        let x_test = array![[40.5], [41.5], [42.5]];
        let y_test = x_test.column(0).mapv(|v| 2.0 * v + 1.0);
        (x_train, y_train, x_test, y_test)
    }

    #[test]
    fn test_extrapolation_prefers_linear() {
        let (xt, yt, xv, yv) = linear_data();
        let selector = ModelSelector::new(
            vec![
                Candidate::new("Decision Tree", Estimator::DecisionTree(DecisionTree::new())),
                Candidate::new("Linear Regression", Estimator::LinearRegression(LinearRegression::new())),
            ],
            0.6,
        );
        let selection = selector.select(&xt, &yt, &xv, &yv).unwrap();

        assert_eq!(selection.name, "Linear Regression");
        assert!(selection.score > 0.99);
        assert_eq!(selection.scores.len(), 2);
        assert_eq!(selection.scores[0].name, "Decision Tree");
    }

    #[test]
    fn test_ties_go_to_first_entry() {
        let (xt, yt, xv, yv) = linear_data();
        let selector = ModelSelector::new(
            vec![
                Candidate::new("first", Estimator::LinearRegression(LinearRegression::new())),
                Candidate::new("second", Estimator::LinearRegression(LinearRegression::new())),
            ],
            0.6,
        );
        assert_eq!(selector.select(&xt, &yt, &xv, &yv).unwrap().name, "first");
    }

    #[test]
    fn test_below_threshold_is_rejected() {
        let (xt, yt, xv, yv) = linear_data();
        let selector = ModelSelector::new(
            vec![Candidate::new("Decision Tree", Estimator::DecisionTree(DecisionTree::new()))],
            0.6,
        );
        match selector.select(&xt, &yt, &xv, &yv) {
            Err(LoanError::NoAcceptableModel { model, score, threshold }) => {
                assert_eq!(model, "Decision Tree");
                assert!(score < 0.6);
                assert_eq!(threshold, 0.6);
            }
            other => panic!("expected NoAcceptableModel, got {:?}", other.map(|s| s.name)),
        }
    }

    #[test]
    fn test_fit_failure_names_candidate() {
        let (xt, yt, xv, yv) = linear_data();
        let selector = ModelSelector::new(
            vec![Candidate::new("broken", Estimator::KNearestNeighbors(KNNRegressor::with_k(0)))],
            0.6,
        );
        match selector.select(&xt, &yt, &xv, &yv) {
            Err(LoanError::TrainingError(msg)) => assert!(msg.contains("broken")),
            other => panic!("expected TrainingError, got {:?}", other.map(|s| s.name)),
        }
    }

    #[test]
    fn test_default_roster_order() {
        let selector = ModelSelector::with_default_roster(42, 0.6);
        assert_eq!(
            selector.candidate_names(),
            vec![
                "Random Forest",
                "Decision Tree",
                "Gradient Boosting",
                "Linear Regression",
                "K-Nearest Neighbors",
                "AdaBoost"
            ]
        );
    }
}
