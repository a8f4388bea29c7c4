//! AdaBoost.R2 regressor
//!
//! Each round fits a shallow tree on a weighted bootstrap of the training
//! rows, then up-weights rows with large relative error. Predictions are the
//! weighted median of the per-tree outputs.

use super::decision_tree::DecisionTree;
use super::{check_width, check_xy, Regressor};
use crate::error::{LoanError, Result};
use ndarray::{Array1, Array2, ArrayView1};
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdaBoostRegressor {
    pub n_estimators: usize,
    pub learning_rate: f64,
    /// Depth of every base tree
    pub max_depth: usize,
    pub random_state: u64,
    trees: Vec<DecisionTree>,
    weights: Vec<f64>,
    n_features: usize,
}

impl Default for AdaBoostRegressor {
    fn default() -> Self {
        Self::new(50, 1.0)
    }
}

impl AdaBoostRegressor {
    pub fn new(n_estimators: usize, learning_rate: f64) -> Self {
        Self {
            n_estimators,
            learning_rate,
            max_depth: 3,
            random_state: 42,
            trees: Vec::new(),
            weights: Vec::new(),
            n_features: 0,
        }
    }

    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.random_state = seed;
        self
    }

    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    /// Draw `n` row indices with probability proportional to `weights`
    fn weighted_bootstrap(weights: &[f64], rng: &mut ChaCha8Rng) -> Vec<usize> {
        let mut cumulative = Vec::with_capacity(weights.len());
        let mut acc = 0.0;
        for w in weights {
            acc += w;
            cumulative.push(acc);
        }
        let last = weights.len() - 1;
        (0..weights.len())
            .map(|_| {
                let u = rng.gen::<f64>() * acc;
                cumulative.partition_point(|&c| c <= u).min(last)
            })
            .collect()
    }

    fn weighted_median(&self, row: ArrayView1<f64>) -> f64 {
        let mut outputs: Vec<(f64, f64)> = self
            .trees
            .iter()
            .zip(self.weights.iter())
            .map(|(tree, &w)| (tree.predict_row(row), w))
            .collect();
        outputs.sort_by(|a, b| a.0.total_cmp(&b.0));

        let half = outputs.iter().map(|(_, w)| w).sum::<f64>() / 2.0;
        let mut acc = 0.0;
        for (value, w) in &outputs {
            acc += w;
            if acc >= half {
                return *value;
            }
        }
        outputs.last().map_or(f64::NAN, |(v, _)| *v)
    }
}

impl Regressor for AdaBoostRegressor {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        check_xy(x, y)?;
        if self.n_estimators == 0 {
            return Err(LoanError::TrainingError("n_estimators must be positive".to_string()));
        }

        let n_samples = x.nrows();
        self.n_features = x.ncols();
        self.trees.clear();
        self.weights.clear();

        let mut sample_weight = vec![1.0 / n_samples as f64; n_samples];
        let mut rng = ChaCha8Rng::seed_from_u64(self.random_state);

        for round in 0..self.n_estimators {
            let rows = Self::weighted_bootstrap(&sample_weight, &mut rng);
            let mut tree = DecisionTree::new().with_max_depth(self.max_depth);
            tree.fit_rows(x, y, &rows)?;

            let errors: Vec<f64> = x
                .rows()
                .into_iter()
                .zip(y.iter())
                .map(|(row, t)| (tree.predict_row(row) - t).abs())
                .collect();
            let max_error = errors.iter().cloned().fold(0.0, f64::max);

            // linear loss
            let loss: Vec<f64> = if max_error > 0.0 {
                errors.iter().map(|e| e / max_error).collect()
            } else {
                errors
            };
            let estimator_error: f64 = loss.iter().zip(&sample_weight).map(|(l, w)| l * w).sum();

            if estimator_error <= 0.0 {
                // perfect fit ends boosting
                self.trees.push(tree);
                self.weights.push(1.0);
                break;
            }
            if estimator_error >= 0.5 {
                if self.trees.is_empty() {
                    self.trees.push(tree);
                    self.weights.push(1.0);
                }
                debug!(round, estimator_error, "AdaBoost stopped: weak learner no better than chance");
                break;
            }

            let beta = estimator_error / (1.0 - estimator_error);
            self.trees.push(tree);
            self.weights.push(self.learning_rate * (1.0 / beta).ln());

            for (w, l) in sample_weight.iter_mut().zip(&loss) {
                *w *= beta.powf((1.0 - l) * self.learning_rate);
            }
            let total: f64 = sample_weight.iter().sum();
            if !(total > 0.0) {
                break;
            }
            for w in &mut sample_weight {
                *w /= total;
            }
        }

        Ok(())
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        if self.trees.is_empty() {
            return Err(LoanError::ModelNotFitted);
        }
        check_width(x, self.n_features)?;
        Ok(x.rows().into_iter().map(|row| self.weighted_median(row)).collect())
    }
}
