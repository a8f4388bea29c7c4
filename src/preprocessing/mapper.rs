//! Fixed re-coding of known categorical fields

use super::FeatureStage;
use crate::error::Result;
use crate::schema::{BINARY_FIELDS, EDUCATION_LEVELS, INSURANCE_LEVELS, ORDINAL_FIELD};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Stateless mapper for the insurance flags and education level.
///
/// Columns that are absent are skipped. Values outside a field's table
/// become null; callers are expected to supply clean categories.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CategoryMapper;

impl CategoryMapper {
    pub fn new() -> Self {
        Self
    }

    /// Lookup table for a mapped field, if it is one
    pub fn table(column: &str) -> Option<&'static [(&'static str, f64)]> {
        if column == ORDINAL_FIELD {
            Some(&EDUCATION_LEVELS)
        } else if BINARY_FIELDS.contains(&column) {
            Some(&INSURANCE_LEVELS)
        } else {
            None
        }
    }

    /// Every field this mapper re-codes
    pub fn mapped_columns() -> impl Iterator<Item = &'static str> {
        BINARY_FIELDS.into_iter().chain(std::iter::once(ORDINAL_FIELD))
    }

    /// Re-code the present mapped columns into Float64
    pub fn map(&self, df: &DataFrame) -> Result<DataFrame> {
        let mut result = df.clone();

        for name in Self::mapped_columns() {
            let Ok(column) = df.column(name) else {
                continue;
            };
            let Some(table) = Self::table(name) else {
                continue;
            };

            let as_text = column.as_materialized_series().cast(&DataType::String)?;
            let ca = as_text.str()?;

            let mut unknown = 0usize;
            let mapped: Float64Chunked = ca
                .into_iter()
                .map(|v| {
                    let v = v?;
                    let code = table.iter().find(|(label, _)| *label == v).map(|(_, code)| *code);
                    if code.is_none() {
                        unknown += 1;
                    }
                    code
                })
                .collect();

            if unknown > 0 {
                warn!(column = name, rows = unknown, "Unmapped category values set to null");
            }

            result.with_column(mapped.with_name(name.into()).into_series())?;
        }

        Ok(result)
    }
}

impl FeatureStage for CategoryMapper {
    fn fit(&mut self, _df: &DataFrame) -> Result<()> {
        Ok(())
    }

    fn transform(&self, df: &DataFrame) -> Result<DataFrame> {
        self.map(df)
    }
}
