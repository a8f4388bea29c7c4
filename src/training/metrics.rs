//! Evaluation metrics

use ndarray::Array1;
use serde::{Deserialize, Serialize};

/// Coefficient of determination.
///
/// A constant target scores 1.0 when predicted exactly and 0.0 otherwise.
pub fn r2_score(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> f64 {
    let n = y_true.len();
    if n == 0 || n != y_pred.len() {
        return f64::NAN;
    }

    let y_mean = y_true.sum() / n as f64;
    let ss_res: f64 = y_true
        .iter()
        .zip(y_pred.iter())
        .map(|(t, p)| (t - p).powi(2))
        .sum();
    let ss_tot: f64 = y_true.iter().map(|t| (t - y_mean).powi(2)).sum();

    if ss_tot == 0.0 {
        return if ss_res == 0.0 { 1.0 } else { 0.0 };
    }
    1.0 - ss_res / ss_tot
}

/// Held-out metrics of the selected model
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelMetrics {
    /// R-squared of the raw regression output
    pub r2: f64,
    /// Mean Squared Error
    pub mse: f64,
    /// Root Mean Squared Error
    pub rmse: f64,
    /// Mean Absolute Error
    pub mae: f64,
    /// Accuracy of the thresholded decisions
    pub accuracy: f64,
    pub precision: f64,
    pub recall: f64,
    pub f1_score: f64,
    pub n_samples: usize,
}

impl ModelMetrics {
    /// Regression metrics on `scores`, classification metrics on the
    /// decisions `scores >= threshold`
    pub fn evaluate(y_true: &Array1<f64>, scores: &Array1<f64>, threshold: f64) -> Self {
        let mut metrics = Self {
            n_samples: y_true.len(),
            ..Default::default()
        };
        if y_true.is_empty() {
            return metrics;
        }

        let n = y_true.len() as f64;
        let errors: Vec<f64> = y_true.iter().zip(scores.iter()).map(|(t, p)| t - p).collect();

        metrics.mse = errors.iter().map(|e| e * e).sum::<f64>() / n;
        metrics.rmse = metrics.mse.sqrt();
        metrics.mae = errors.iter().map(|e| e.abs()).sum::<f64>() / n;
        metrics.r2 = r2_score(y_true, scores);

        let (tp, fp, tn, fn_) = Self::confusion_counts(y_true, scores, threshold);
        metrics.accuracy = (tp + tn) as f64 / n;
        metrics.precision = if tp + fp > 0 {
            tp as f64 / (tp + fp) as f64
        } else {
            0.0
        };
        metrics.recall = if tp + fn_ > 0 {
            tp as f64 / (tp + fn_) as f64
        } else {
            0.0
        };
        let (p, r) = (metrics.precision, metrics.recall);
        metrics.f1_score = if p + r > 0.0 { 2.0 * p * r / (p + r) } else { 0.0 };

        metrics
    }

    fn confusion_counts(
        y_true: &Array1<f64>,
        scores: &Array1<f64>,
        threshold: f64,
    ) -> (usize, usize, usize, usize) {
        let mut tp = 0;
        let mut fp = 0;
        let mut tn = 0;
        let mut fn_ = 0;

        for (t, p) in y_true.iter().zip(scores.iter()) {
            match (*t > 0.5, *p >= threshold) {
                (true, true) => tp += 1,
                (false, true) => fp += 1,
                (false, false) => tn += 1,
                (true, false) => fn_ += 1,
            }
        }

        (tp, fp, tn, fn_)
    }
}
