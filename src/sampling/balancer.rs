//! Minority upsampling

use super::class_indices;
use crate::error::{LoanError, Result};
use polars::prelude::*;
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Balanced training frame and the class counts it was built from
#[derive(Debug, Clone)]
pub struct BalanceOutcome {
    pub data: DataFrame,
    pub majority_class: i64,
    pub minority_class: i64,
    pub n_majority: usize,
    pub n_minority: usize,
}

impl BalanceOutcome {
    /// Rows added by resampling
    pub fn n_added(&self) -> usize {
        self.data.height().saturating_sub(self.n_majority + self.n_minority)
    }
}

/// Random over-sampler for a binary target.
///
/// Majority and minority are decided by row count, not label value. The
/// output holds every majority row in its original order followed by
/// `n_majority` minority rows drawn with replacement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassBalancer {
    target_column: String,
    seed: u64,
}

impl ClassBalancer {
    pub fn new(target_column: impl Into<String>, seed: u64) -> Self {
        Self {
            target_column: target_column.into(),
            seed,
        }
    }

    pub fn target_column(&self) -> &str {
        &self.target_column
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn balance(&self, df: &DataFrame) -> Result<BalanceOutcome> {
        let indices = class_indices(df, &self.target_column)?;

        if indices.len() > 2 {
            return Err(LoanError::DataIntegrity(format!(
                "target column '{}' has {} labels, expected a binary outcome",
                self.target_column,
                indices.len()
            )));
        }
        if indices.len() < 2 {
            return Err(LoanError::DataIntegrity(format!(
                "target column '{}' has an empty class; nothing to resample from",
                self.target_column
            )));
        }

        // BTreeMap order makes ties resolve to the lower label as majority
        let mut classes: Vec<(i64, Vec<IdxSize>)> = indices.into_iter().collect();
        classes.sort_by(|a, b| b.1.len().cmp(&a.1.len()));
        let (minority_class, minority) = classes.pop().unwrap_or_default();
        let (majority_class, majority) = classes.pop().unwrap_or_default();

        let n_majority = majority.len();
        let n_minority = minority.len();

        if n_majority == n_minority {
            info!(rows = df.height(), "Classes already balanced");
            return Ok(BalanceOutcome {
                data: df.clone(),
                majority_class,
                minority_class,
                n_majority,
                n_minority,
            });
        }

        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        let mut rows = majority;
        rows.reserve(n_majority);
        for _ in 0..n_majority {
            rows.push(minority[rng.gen_range(0..n_minority)]);
        }

        let idx = IdxCa::from_vec("idx".into(), rows);
        let data = df.take(&idx)?;

        info!(
            majority_class,
            minority_class,
            n_majority,
            n_minority,
            rows = data.height(),
            "Minority class upsampled"
        );

        Ok(BalanceOutcome {
            data,
            majority_class,
            minority_class,
            n_majority,
            n_minority,
        })
    }
}
