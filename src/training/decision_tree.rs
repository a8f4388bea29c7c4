//! Regression tree (CART, squared error)

use super::{check_width, check_xy, Regressor};
use crate::error::{LoanError, Result};
use ndarray::{Array1, Array2, ArrayView1};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Decision tree node
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum TreeNode {
    /// Leaf node with prediction value
    Leaf { value: f64, n_samples: usize },
    /// Internal node; rows with `x[feature_idx] <= threshold` go left
    Split {
        feature_idx: usize,
        threshold: f64,
        left: Box<TreeNode>,
        right: Box<TreeNode>,
        n_samples: usize,
    },
}

/// Best split found for one node
struct SplitCandidate {
    feature_idx: usize,
    threshold: f64,
    gain: f64,
}

/// Regression tree
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionTree {
    root: Option<TreeNode>,
    /// Maximum depth; unlimited when `None`
    pub max_depth: Option<usize>,
    /// Minimum samples to split
    pub min_samples_split: usize,
    /// Minimum samples in leaf
    pub min_samples_leaf: usize,
    n_features: usize,
    feature_importances: Option<Array1<f64>>,
}

impl Default for DecisionTree {
    fn default() -> Self {
        Self::new()
    }
}

impl DecisionTree {
    pub fn new() -> Self {
        Self {
            root: None,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            n_features: 0,
            feature_importances: None,
        }
    }

    /// Set maximum depth
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }

    /// Set minimum samples to split
    pub fn with_min_samples_split(mut self, min_samples: usize) -> Self {
        self.min_samples_split = min_samples.max(2);
        self
    }

    /// Set minimum samples in leaf
    pub fn with_min_samples_leaf(mut self, min_samples: usize) -> Self {
        self.min_samples_leaf = min_samples.max(1);
        self
    }

    /// Fit on the rows listed in `indices`; repeated rows count repeatedly
    pub(crate) fn fit_rows(&mut self, x: &Array2<f64>, y: &Array1<f64>, indices: &[usize]) -> Result<()> {
        check_xy(x, y)?;
        if indices.is_empty() {
            return Err(LoanError::TrainingError("cannot fit a tree on zero rows".to_string()));
        }

        self.n_features = x.ncols();
        let mut importances = vec![0.0; self.n_features];
        let mut rows = indices.to_vec();
        self.root = Some(self.build_tree(x, y, &mut rows, 0, &mut importances));

        let total: f64 = importances.iter().sum();
        if total > 0.0 {
            for imp in &mut importances {
                *imp /= total;
            }
        }
        self.feature_importances = Some(Array1::from_vec(importances));
        Ok(())
    }

    fn build_tree(
        &self,
        x: &Array2<f64>,
        y: &Array1<f64>,
        rows: &mut [usize],
        depth: usize,
        importances: &mut [f64],
    ) -> TreeNode {
        let n_samples = rows.len();
        let mean = rows.iter().map(|&i| y[i]).sum::<f64>() / n_samples as f64;
        let sse: f64 = rows.iter().map(|&i| (y[i] - mean).powi(2)).sum();

        let should_stop = n_samples < self.min_samples_split
            || n_samples < 2 * self.min_samples_leaf
            || self.max_depth.is_some_and(|d| depth >= d)
            || sse <= 1e-12;
        if should_stop {
            return TreeNode::Leaf { value: mean, n_samples };
        }

        let Some(best) = self.find_best_split(x, y, rows) else {
            return TreeNode::Leaf { value: mean, n_samples };
        };

        // in-place partition, left block first
        let mut n_left = 0;
        for k in 0..n_samples {
            if x[[rows[k], best.feature_idx]] <= best.threshold {
                rows.swap(k, n_left);
                n_left += 1;
            }
        }
        if n_left == 0 || n_left == n_samples {
            return TreeNode::Leaf { value: mean, n_samples };
        }

        importances[best.feature_idx] += best.gain;

        let (left_rows, right_rows) = rows.split_at_mut(n_left);
        let left = Box::new(self.build_tree(x, y, left_rows, depth + 1, importances));
        let right = Box::new(self.build_tree(x, y, right_rows, depth + 1, importances));

        TreeNode::Split {
            feature_idx: best.feature_idx,
            threshold: best.threshold,
            left,
            right,
            n_samples,
        }
    }

    /// Exhaustive search over every feature, sorting the node's rows per
    /// feature and sweeping prefix sums
    fn find_best_split(&self, x: &Array2<f64>, y: &Array1<f64>, rows: &[usize]) -> Option<SplitCandidate> {
        let n = rows.len();
        let total_sum: f64 = rows.iter().map(|&i| y[i]).sum();
        let parent_score = total_sum * total_sum / n as f64;
        let min_leaf = self.min_samples_leaf;

        let per_feature: Vec<Option<SplitCandidate>> = (0..x.ncols())
            .into_par_iter()
            .map(|feature_idx| {
                let mut sorted = rows.to_vec();
                sorted.sort_by(|&a, &b| x[[a, feature_idx]].total_cmp(&x[[b, feature_idx]]));

                let mut best: Option<SplitCandidate> = None;
                let mut left_sum = 0.0;
                for k in 1..n {
                    left_sum += y[sorted[k - 1]];
                    if k < min_leaf || n - k < min_leaf {
                        continue;
                    }
                    let lo = x[[sorted[k - 1], feature_idx]];
                    let hi = x[[sorted[k], feature_idx]];
                    if lo >= hi {
                        continue;
                    }

                    let right_sum = total_sum - left_sum;
                    // SSE reduction = left_sum²/n_l + right_sum²/n_r - total²/n
                    let gain = left_sum * left_sum / k as f64
                        + right_sum * right_sum / (n - k) as f64
                        - parent_score;
                    if gain > best.as_ref().map_or(1e-12, |b| b.gain) {
                        let mid = lo + (hi - lo) / 2.0;
                        best = Some(SplitCandidate {
                            feature_idx,
                            threshold: if mid < hi { mid } else { lo },
                            gain,
                        });
                    }
                }
                best
            })
            .collect();

        per_feature.into_iter().flatten().fold(None, |acc, cand| match acc {
            Some(b) if b.gain >= cand.gain => Some(b),
            _ => Some(cand),
        })
    }

    pub(crate) fn predict_row(&self, row: ArrayView1<f64>) -> f64 {
        let mut node = match &self.root {
            Some(root) => root,
            None => return f64::NAN,
        };
        loop {
            match node {
                TreeNode::Leaf { value, .. } => return *value,
                TreeNode::Split {
                    feature_idx,
                    threshold,
                    left,
                    right,
                    ..
                } => {
                    node = if row[*feature_idx] <= *threshold { left } else { right };
                }
            }
        }
    }

    pub fn is_fitted(&self) -> bool {
        self.root.is_some()
    }

    /// Normalized total SSE reduction per feature
    pub fn feature_importances(&self) -> Option<&Array1<f64>> {
        self.feature_importances.as_ref()
    }

    /// Get tree depth
    pub fn get_depth(&self) -> usize {
        fn depth(node: &TreeNode) -> usize {
            match node {
                TreeNode::Leaf { .. } => 1,
                TreeNode::Split { left, right, .. } => 1 + depth(left).max(depth(right)),
            }
        }
        self.root.as_ref().map_or(0, depth)
    }

    /// Get number of leaves
    pub fn get_n_leaves(&self) -> usize {
        fn leaves(node: &TreeNode) -> usize {
            match node {
                TreeNode::Leaf { .. } => 1,
                TreeNode::Split { left, right, .. } => leaves(left) + leaves(right),
            }
        }
        self.root.as_ref().map_or(0, leaves)
    }
}

impl Regressor for DecisionTree {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        let indices: Vec<usize> = (0..x.nrows()).collect();
        self.fit_rows(x, y, &indices)
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        if self.root.is_none() {
            return Err(LoanError::ModelNotFitted);
        }
        check_width(x, self.n_features)?;
        Ok(x.rows().into_iter().map(|row| self.predict_row(row)).collect())
    }
}
