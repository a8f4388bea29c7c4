//! Class balancing for the training split
//!
//! Random over-sampling of the minority outcome so both classes carry the
//! same number of rows before the feature pipeline is fitted.

mod balancer;

pub use balancer::{BalanceOutcome, ClassBalancer};

use crate::error::{LoanError, Result};
use polars::prelude::*;
use std::collections::BTreeMap;

/// Row indices of each label in a binary target column
pub fn class_indices(df: &DataFrame, target: &str) -> Result<BTreeMap<i64, Vec<IdxSize>>> {
    let column = df
        .column(target)
        .map_err(|_| LoanError::SchemaMismatch(format!("target column '{}' not found", target)))?;
    let labels = column.as_materialized_series().cast(&DataType::Int64)?;
    let ca = labels.i64()?;

    let mut indices: BTreeMap<i64, Vec<IdxSize>> = BTreeMap::new();
    for (i, label) in ca.into_iter().enumerate() {
        let label = label.ok_or_else(|| {
            LoanError::DataIntegrity(format!("target column '{}' has a null at row {}", target, i))
        })?;
        indices.entry(label).or_default().push(i as IdxSize);
    }
    Ok(indices)
}

/// Number of rows per label
pub fn class_counts(df: &DataFrame, target: &str) -> Result<BTreeMap<i64, usize>> {
    Ok(class_indices(df, target)?
        .into_iter()
        .map(|(label, rows)| (label, rows.len()))
        .collect())
}
