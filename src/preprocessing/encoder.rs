//! One-hot encoding of nominal fields

use super::FeatureStage;
use crate::error::{LoanError, Result};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::warn;

/// Vocabulary learned for one nominal field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncodedField {
    pub column: String,
    /// Dropped reference level (first category in sorted order)
    pub reference: String,
    /// Categories that get an indicator column
    pub categories: Vec<String>,
}

impl EncodedField {
    pub fn indicator_names(&self) -> impl Iterator<Item = String> + '_ {
        self.categories
            .iter()
            .map(move |category| format!("{}_{}", self.column, category))
    }

    fn is_known(&self, value: &str) -> bool {
        value == self.reference || self.categories.iter().any(|c| c == value)
    }
}

/// One-hot encoder with a dropped reference level per field.
///
/// Categories unseen at fit time encode as an all-zero indicator vector.
/// Every non-nominal column passes through in its fit-time order, after
/// the indicators.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OneHotEncoder {
    columns: Vec<String>,
    fields: Vec<EncodedField>,
    passthrough: Vec<String>,
    is_fitted: bool,
}

impl OneHotEncoder {
    /// Create an encoder for the given nominal columns
    pub fn new<S: AsRef<str>>(columns: &[S]) -> Self {
        Self {
            columns: columns.iter().map(|s| s.as_ref().to_string()).collect(),
            ..Default::default()
        }
    }

    pub fn fields(&self) -> &[EncodedField] {
        &self.fields
    }

    pub fn passthrough(&self) -> &[String] {
        &self.passthrough
    }

    /// Output column names: indicators first, then passthrough columns
    pub fn output_columns(&self) -> Vec<String> {
        self.fields
            .iter()
            .flat_map(EncodedField::indicator_names)
            .chain(self.passthrough.iter().cloned())
            .collect()
    }

    fn learn_field(df: &DataFrame, name: &str) -> Result<EncodedField> {
        let series = text_series(df, name)?;
        let ca = series.str()?;

        let vocabulary: BTreeSet<&str> = ca.into_iter().flatten().collect();
        let mut vocabulary = vocabulary.into_iter().map(str::to_string);
        let reference = vocabulary.next().ok_or_else(|| {
            LoanError::DataIntegrity(format!("column '{}' has no categories to encode", name))
        })?;

        Ok(EncodedField {
            column: name.to_string(),
            reference,
            categories: vocabulary.collect(),
        })
    }

    fn encode_field(df: &DataFrame, field: &EncodedField) -> Result<Vec<Column>> {
        let series = text_series(df, &field.column)?;
        let ca = series.str()?;

        let unseen = ca
            .into_iter()
            .flatten()
            .filter(|v| !field.is_known(v))
            .collect::<BTreeSet<_>>();
        for category in &unseen {
            let rows = ca.into_iter().filter(|v| v == &Some(*category)).count();
            warn!(
                column = %field.column,
                category = %category,
                rows,
                "Unknown category encoded as all-zero indicators"
            );
        }

        let indicators = field
            .categories
            .iter()
            .zip(field.indicator_names())
            .map(|(category, name)| {
                let values: Vec<f64> = ca
                    .into_iter()
                    .map(|v| if v == Some(category.as_str()) { 1.0 } else { 0.0 })
                    .collect();
                Column::new(name.into(), values)
            })
            .collect();

        Ok(indicators)
    }
}

fn text_series(df: &DataFrame, name: &str) -> Result<Series> {
    let column = df
        .column(name)
        .map_err(|_| LoanError::SchemaMismatch(format!("nominal column '{}' not found", name)))?;
    Ok(column.as_materialized_series().cast(&DataType::String)?)
}

impl FeatureStage for OneHotEncoder {
    fn fit(&mut self, df: &DataFrame) -> Result<()> {
        self.fields = self
            .columns
            .iter()
            .map(|name| Self::learn_field(df, name))
            .collect::<Result<Vec<_>>>()?;

        self.passthrough = df
            .get_column_names()
            .into_iter()
            .map(|s| s.to_string())
            .filter(|name| !self.columns.contains(name))
            .collect();

        self.is_fitted = true;
        Ok(())
    }

    fn transform(&self, df: &DataFrame) -> Result<DataFrame> {
        if !self.is_fitted {
            return Err(LoanError::ModelNotFitted);
        }

        let mut output = Vec::new();
        for field in &self.fields {
            output.extend(Self::encode_field(df, field)?);
        }
        for name in &self.passthrough {
            let column = df.column(name).map_err(|_| {
                LoanError::SchemaMismatch(format!("column '{}' not found", name))
            })?;
            output.push(column.clone());
        }

        Ok(DataFrame::new(output)?)
    }
}
