//! Standard scaling

use super::FeatureStage;
use crate::error::{LoanError, Result};
use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// Fit-time statistics of one column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnStats {
    pub name: String,
    pub mean: f64,
    /// Population standard deviation
    pub std: f64,
}

impl ColumnStats {
    /// Identical values up to floating point noise
    pub fn is_constant(&self) -> bool {
        self.std <= 1e-12 * self.mean.abs().max(1.0)
    }

    fn scale(&self, v: f64) -> f64 {
        if self.is_constant() {
            0.0
        } else {
            (v - self.mean) / self.std
        }
    }
}

/// Z-score scaler over every column of the fit frame.
///
/// Nulls are ignored when fitting and preserved when transforming.
/// Zero-variance columns transform to a constant 0.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StandardScaler {
    stats: Vec<ColumnStats>,
    is_fitted: bool,
}

impl StandardScaler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stats(&self) -> &[ColumnStats] {
        &self.stats
    }

    pub fn columns(&self) -> Vec<String> {
        self.stats.iter().map(|s| s.name.clone()).collect()
    }

    fn numeric_values(column: &Column) -> Result<Float64Chunked> {
        let series = column.as_materialized_series();
        if !series.dtype().is_primitive_numeric() && !series.dtype().is_null() {
            return Err(LoanError::DataIntegrity(format!(
                "column '{}' is not numeric ({}) and cannot be scaled",
                series.name(),
                series.dtype()
            )));
        }
        let casted = series.cast(&DataType::Float64)?;
        Ok(casted.f64()?.clone())
    }

    fn compute_stats(column: &Column) -> Result<ColumnStats> {
        let name = column.name().to_string();
        let ca = Self::numeric_values(column)?;
        let values: Vec<f64> = ca.into_iter().flatten().collect();

        if values.is_empty() {
            return Err(LoanError::DataIntegrity(format!(
                "column '{}' has no values to scale",
                name
            )));
        }

        let n = values.len() as f64;
        let mean = values.iter().sum::<f64>() / n;
        let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
        let std = var.sqrt();

        if !mean.is_finite() || !std.is_finite() {
            return Err(LoanError::DataIntegrity(format!(
                "column '{}' has non-finite statistics (mean {}, std {})",
                name, mean, std
            )));
        }

        Ok(ColumnStats { name, mean, std })
    }
}

impl FeatureStage for StandardScaler {
    fn fit(&mut self, df: &DataFrame) -> Result<()> {
        self.stats = df
            .get_columns()
            .iter()
            .map(Self::compute_stats)
            .collect::<Result<Vec<_>>>()?;
        self.is_fitted = true;
        Ok(())
    }

    fn transform(&self, df: &DataFrame) -> Result<DataFrame> {
        if !self.is_fitted {
            return Err(LoanError::ModelNotFitted);
        }

        let scaled = self
            .stats
            .iter()
            .map(|stats| {
                let column = df.column(&stats.name).map_err(|_| {
                    LoanError::SchemaMismatch(format!("column '{}' not found", stats.name))
                })?;
                let ca = Self::numeric_values(column)?;
                let out: Float64Chunked = ca.into_iter().map(|v| v.map(|x| stats.scale(x))).collect();
                Ok(out.with_name(stats.name.as_str().into()).into_column())
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(DataFrame::new(scaled)?)
    }
}
