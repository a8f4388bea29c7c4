//! Feature preprocessing
//!
//! Turns raw applicant frames into the fixed-width numeric matrix every
//! estimator is trained and queried on:
//! - Category mapping (binary insurance flags, ordinal education level)
//! - One-hot encoding of nominal fields with a dropped reference level
//! - Standard scaling fit on the balanced training split

mod config;
mod encoder;
mod mapper;
mod pipeline;
mod scaler;

pub use config::PipelineConfig;
pub use encoder::{EncodedField, OneHotEncoder};
pub use mapper::CategoryMapper;
pub use pipeline::FeaturePipeline;
pub use scaler::{ColumnStats, StandardScaler};

use crate::error::Result;
use ndarray::Array2;
use polars::prelude::*;

/// A fit/transform unit of the feature pipeline
pub trait FeatureStage {
    /// Learn parameters from a training frame
    fn fit(&mut self, df: &DataFrame) -> Result<()>;

    /// Apply learned parameters; never mutates the stage
    fn transform(&self, df: &DataFrame) -> Result<DataFrame>;

    fn fit_transform(&mut self, df: &DataFrame) -> Result<DataFrame> {
        self.fit(df)?;
        self.transform(df)
    }
}

/// Convert numeric columns into a row-major matrix, nulls as 0.0
pub fn columns_to_array2(df: &DataFrame, columns: &[String]) -> Result<Array2<f64>> {
    let n_rows = df.height();
    let values = columns
        .iter()
        .map(|name| {
            let series = df.column(name)?.as_materialized_series().cast(&DataType::Float64)?;
            let ca = series.f64()?;
            Ok(ca.into_iter().map(|v| v.unwrap_or(0.0)).collect::<Vec<f64>>())
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(Array2::from_shape_fn((n_rows, columns.len()), |(i, j)| values[j][i]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_columns_to_array2_orders_and_fills_nulls() {
        let df = df!(
            "a" => &[Some(1.0), None, Some(3.0)],
            "b" => &[10_i64, 20, 30]
        )
        .unwrap();

        let arr = columns_to_array2(&df, &["b".to_string(), "a".to_string()]).unwrap();
        assert_eq!(arr.shape(), &[3, 2]);
        assert_eq!(arr[[0, 0]], 10.0);
        assert_eq!(arr[[0, 1]], 1.0);
        assert_eq!(arr[[1, 1]], 0.0);
        assert_eq!(arr[[2, 0]], 30.0);
    }
}
