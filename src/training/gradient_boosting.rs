//! Gradient boosted regression trees (least squares loss)

use super::decision_tree::DecisionTree;
use super::{check_width, check_xy, Regressor};
use crate::error::{LoanError, Result};
use ndarray::{Array1, Array2};
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// Gradient Boosting configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GradientBoostingConfig {
    /// Number of boosting rounds (trees)
    pub n_estimators: usize,
    /// Learning rate (shrinkage)
    pub learning_rate: f64,
    /// Maximum tree depth
    pub max_depth: usize,
    /// Minimum samples per leaf
    pub min_samples_leaf: usize,
    /// Row fraction drawn without replacement per round
    pub subsample: f64,
    pub random_state: u64,
}

impl Default for GradientBoostingConfig {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            learning_rate: 0.1,
            max_depth: 3,
            min_samples_leaf: 1,
            subsample: 1.0,
            random_state: 42,
        }
    }
}

/// Gradient Boosting Regressor
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GradientBoostingRegressor {
    config: GradientBoostingConfig,
    trees: Vec<DecisionTree>,
    initial_prediction: f64,
    n_features: usize,
    feature_importances: Vec<f64>,
}

impl Default for GradientBoostingRegressor {
    fn default() -> Self {
        Self::new(GradientBoostingConfig::default())
    }
}

impl GradientBoostingRegressor {
    pub fn new(config: GradientBoostingConfig) -> Self {
        Self {
            config,
            trees: Vec::new(),
            initial_prediction: 0.0,
            n_features: 0,
            feature_importances: Vec::new(),
        }
    }

    pub fn config(&self) -> &GradientBoostingConfig {
        &self.config
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    /// Get feature importances
    pub fn feature_importances(&self) -> &[f64] {
        &self.feature_importances
    }

    fn subsample_indices(&self, n: usize, rng: &mut ChaCha8Rng) -> Vec<usize> {
        if self.config.subsample >= 1.0 {
            return (0..n).collect();
        }
        let k = ((n as f64 * self.config.subsample).round() as usize).clamp(1, n);
        let mut indices = rand::seq::index::sample(rng, n, k).into_vec();
        indices.sort_unstable();
        indices
    }
}

impl Regressor for GradientBoostingRegressor {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        check_xy(x, y)?;
        if !(self.config.learning_rate > 0.0) {
            return Err(LoanError::TrainingError(format!(
                "learning_rate must be positive, got {}",
                self.config.learning_rate
            )));
        }

        let n_samples = x.nrows();
        self.n_features = x.ncols();
        self.initial_prediction = y.mean().unwrap_or(0.0);
        self.trees.clear();
        self.feature_importances = vec![0.0; self.n_features];

        let mut predictions = Array1::from_elem(n_samples, self.initial_prediction);
        let mut rng = ChaCha8Rng::seed_from_u64(self.config.random_state);

        for _ in 0..self.config.n_estimators {
            // negative gradient of squared error
            let residuals = y - &predictions;
            let rows = self.subsample_indices(n_samples, &mut rng);

            let mut tree = DecisionTree::new()
                .with_max_depth(self.config.max_depth)
                .with_min_samples_leaf(self.config.min_samples_leaf);
            tree.fit_rows(x, &residuals, &rows)?;

            for (pred, row) in predictions.iter_mut().zip(x.rows()) {
                *pred += self.config.learning_rate * tree.predict_row(row);
            }
            if let Some(importance) = tree.feature_importances() {
                for (acc, v) in self.feature_importances.iter_mut().zip(importance.iter()) {
                    *acc += v;
                }
            }
            self.trees.push(tree);
        }

        let total: f64 = self.feature_importances.iter().sum();
        if total > 0.0 {
            for imp in &mut self.feature_importances {
                *imp /= total;
            }
        }

        Ok(())
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        if self.trees.is_empty() && self.config.n_estimators > 0 {
            return Err(LoanError::ModelNotFitted);
        }
        check_width(x, self.n_features)?;

        let lr = self.config.learning_rate;
        Ok(x.rows()
            .into_iter()
            .map(|row| {
                self.initial_prediction
                    + self.trees.iter().map(|t| lr * t.predict_row(row)).sum::<f64>()
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::training::r2_score;

    fn quadratic(n: usize) -> (Array2<f64>, Array1<f64>) {
        let x = Array2::from_shape_fn((n, 1), |(i, _)| i as f64 / n as f64 * 4.0 - 2.0);
        let y = x.column(0).mapv(|v| v * v);
        (x, y)
    }

    #[test]
    fn test_boosting_reduces_error() {
        let (x, y) = quadratic(100);
        let mut few = GradientBoostingRegressor::new(GradientBoostingConfig {
            n_estimators: 5,
            ..Default::default()
        });
        let mut many = GradientBoostingRegressor::default();
        few.fit(&x, &y).unwrap();
        many.fit(&x, &y).unwrap();

        let r2_few = r2_score(&y, &few.predict(&x).unwrap());
        let r2_many = r2_score(&y, &many.predict(&x).unwrap());
        assert!(r2_many > r2_few);
        assert!(r2_many > 0.95);
        assert_eq!(many.n_trees(), 100);
    }

    #[test]
    fn test_subsample_is_seeded() {
        let (x, y) = quadratic(60);
        let config = GradientBoostingConfig {
            n_estimators: 10,
            subsample: 0.5,
            random_state: 11,
            ..Default::default()
        };
        let mut a = GradientBoostingRegressor::new(config.clone());
        let mut b = GradientBoostingRegressor::new(config);
        a.fit(&x, &y).unwrap();
        b.fit(&x, &y).unwrap();
        assert_eq!(a.predict(&x).unwrap(), b.predict(&x).unwrap());
    }

    #[test]
    fn test_invalid_learning_rate() {
        let (x, y) = quadratic(10);
        let mut model = GradientBoostingRegressor::new(GradientBoostingConfig {
            learning_rate: 0.0,
            ..Default::default()
        });
        assert!(matches!(model.fit(&x, &y), Err(LoanError::TrainingError(_))));
    }
}
