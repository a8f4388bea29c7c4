//! K-Nearest Neighbors regressor

use super::{check_width, check_xy, Regressor};
use crate::error::{LoanError, Result};
use ndarray::{Array1, Array2, ArrayView1};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BinaryHeap;

/// Uniformly weighted, Euclidean k-NN regression over the stored training set
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KNNRegressor {
    /// Number of neighbors
    pub n_neighbors: usize,
    x_train: Option<Array2<f64>>,
    y_train: Option<Array1<f64>>,
}

impl Default for KNNRegressor {
    fn default() -> Self {
        Self::with_k(5)
    }
}

impl KNNRegressor {
    pub fn with_k(k: usize) -> Self {
        Self {
            n_neighbors: k,
            x_train: None,
            y_train: None,
        }
    }
}

/// Max-heap entry; ties on distance break on the lower training row
#[derive(PartialEq)]
struct Neighbor {
    dist: f64,
    idx: usize,
}

impl Eq for Neighbor {}

impl PartialOrd for Neighbor {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Neighbor {
    fn cmp(&self, other: &Self) -> Ordering {
        self.dist
            .total_cmp(&other.dist)
            .then_with(|| self.idx.cmp(&other.idx))
    }
}

fn squared_distance(a: ArrayView1<f64>, b: ArrayView1<f64>) -> f64 {
    a.iter().zip(b.iter()).map(|(u, v)| (u - v) * (u - v)).sum()
}

/// k smallest distances in O(n log k)
fn k_nearest(point: ArrayView1<f64>, x_train: &Array2<f64>, k: usize) -> Vec<usize> {
    let mut heap = BinaryHeap::with_capacity(k + 1);
    for (idx, row) in x_train.rows().into_iter().enumerate() {
        let candidate = Neighbor {
            dist: squared_distance(point, row),
            idx,
        };
        if heap.len() < k {
            heap.push(candidate);
        } else if heap.peek().is_some_and(|top| candidate < *top) {
            heap.pop();
            heap.push(candidate);
        }
    }
    heap.into_sorted_vec().into_iter().map(|n| n.idx).collect()
}

impl Regressor for KNNRegressor {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        check_xy(x, y)?;
        if self.n_neighbors == 0 {
            return Err(LoanError::TrainingError("n_neighbors must be positive".to_string()));
        }
        self.x_train = Some(x.clone());
        self.y_train = Some(y.clone());
        Ok(())
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let (x_train, y_train) = match (&self.x_train, &self.y_train) {
            (Some(xt), Some(yt)) => (xt, yt),
            _ => return Err(LoanError::ModelNotFitted),
        };
        check_width(x, x_train.ncols())?;
        let k = self.n_neighbors.min(x_train.nrows());

        let predictions: Vec<f64> = (0..x.nrows())
            .into_par_iter()
            .map(|i| {
                let neighbors = k_nearest(x.row(i), x_train, k);
                neighbors.iter().map(|&j| y_train[j]).sum::<f64>() / neighbors.len() as f64
            })
            .collect();

        Ok(Array1::from_vec(predictions))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_mean_of_nearest() {
        let x = array![[0.0], [1.0], [2.0], [10.0], [11.0]];
        let y = array![0.0, 1.0, 2.0, 10.0, 11.0];

        let mut knn = KNNRegressor::with_k(2);
        knn.fit(&x, &y).unwrap();
        let pred = knn.predict(&array![[0.4], [10.6]]).unwrap();
        assert!((pred[0] - 0.5).abs() < 1e-12);
        assert!((pred[1] - 10.5).abs() < 1e-12);
    }

    #[test]
    fn test_k_larger_than_training_set() {
        let x = array![[0.0], [2.0]];
        let y = array![1.0, 3.0];
        let mut knn = KNNRegressor::default();
        knn.fit(&x, &y).unwrap();
        assert_eq!(knn.predict(&array![[5.0]]).unwrap()[0], 2.0);
    }

    #[test]
    fn test_distance_ties_prefer_earlier_rows() {
        let x = array![[1.0], [-1.0], [1.0]];
        let y = array![1.0, 5.0, 9.0];
        let mut knn = KNNRegressor::with_k(1);
        knn.fit(&x, &y).unwrap();
        assert_eq!(knn.predict(&array![[0.0]]).unwrap()[0], 1.0);
    }

    #[test]
    fn test_predict_before_fit() {
        let knn = KNNRegressor::default();
        assert!(matches!(knn.predict(&array![[1.0]]), Err(LoanError::ModelNotFitted)));
    }
}
