//! Feature pipeline: mapper → encoder → scaler

use super::{
    columns_to_array2, config::PipelineConfig, encoder::OneHotEncoder, mapper::CategoryMapper,
    scaler::StandardScaler, FeatureStage,
};
use crate::error::{LoanError, Result};
use chrono::{DateTime, Utc};
use ndarray::Array2;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::time::Instant;
use tracing::{debug, info};

/// The single source of truth for the model's feature space.
///
/// Fit once on the balanced training split; every later transform, down to
/// a single inference row, yields the same columns in the same order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeaturePipeline {
    config: PipelineConfig,
    /// Raw columns seen at fit time, in order
    input_columns: Vec<String>,
    /// Raw columns that held text at fit time
    #[serde(default)]
    text_columns: Vec<String>,
    mapper: CategoryMapper,
    encoder: OneHotEncoder,
    scaler: StandardScaler,
    is_fitted: bool,
    /// Training run this pipeline was persisted with
    #[serde(default)]
    trained_at: Option<DateTime<Utc>>,
}

impl Default for FeaturePipeline {
    fn default() -> Self {
        Self::new(PipelineConfig::default())
    }
}

impl FeaturePipeline {
    pub fn new(config: PipelineConfig) -> Self {
        let encoder = OneHotEncoder::new(&config.nominal_columns);
        Self {
            config,
            input_columns: Vec::new(),
            text_columns: Vec::new(),
            mapper: CategoryMapper::new(),
            encoder,
            scaler: StandardScaler::new(),
            is_fitted: false,
            trained_at: None,
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn is_fitted(&self) -> bool {
        self.is_fitted
    }

    /// Raw input schema learned at fit time
    pub fn input_columns(&self) -> &[String] {
        &self.input_columns
    }

    /// True if `column` was a text column at fit time
    pub fn is_text_input(&self, column: &str) -> bool {
        self.text_columns.iter().any(|c| c == column)
    }

    pub fn trained_at(&self) -> Option<DateTime<Utc>> {
        self.trained_at
    }

    /// Tie the pipeline to the model trained on its output
    pub fn set_trained_at(&mut self, trained_at: DateTime<Utc>) {
        self.trained_at = Some(trained_at);
    }

    /// Ordered output feature names
    pub fn feature_names(&self) -> Vec<String> {
        self.scaler.columns()
    }

    pub fn n_features(&self) -> usize {
        self.scaler.stats().len()
    }

    pub fn encoder(&self) -> &OneHotEncoder {
        &self.encoder
    }

    pub fn scaler(&self) -> &StandardScaler {
        &self.scaler
    }

    /// Fit every stage on `df` and return the transformed matrix
    pub fn fit_transform(&mut self, df: &DataFrame) -> Result<Array2<f64>> {
        let start = Instant::now();

        if df.height() == 0 {
            return Err(LoanError::DataIntegrity(
                "cannot fit the feature pipeline on an empty frame".to_string(),
            ));
        }
        if df.column(&self.config.target_column).is_ok() {
            return Err(LoanError::SchemaMismatch(format!(
                "target column '{}' must not be passed to the feature pipeline",
                self.config.target_column
            )));
        }

        self.is_fitted = false;
        self.trained_at = None;
        self.input_columns = df
            .get_column_names()
            .into_iter()
            .map(|s| s.to_string())
            .collect();
        self.text_columns = df
            .get_columns()
            .iter()
            .filter(|c| c.dtype() == &DataType::String)
            .map(|c| c.name().to_string())
            .collect();

        let mapped = self.mapper.fit_transform(df)?;
        let encoded = self.encoder.fit_transform(&mapped)?;
        let scaled = self.scaler.fit_transform(&encoded)?;
        self.is_fitted = true;

        info!(
            rows = df.height(),
            inputs = self.input_columns.len(),
            features = self.n_features(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Feature pipeline fitted"
        );

        columns_to_array2(&scaled, &self.feature_names())
    }

    /// Transform with fit-time parameters into a feature frame
    pub fn transform_frame(&self, df: &DataFrame) -> Result<DataFrame> {
        if !self.is_fitted {
            return Err(LoanError::ModelNotFitted);
        }
        self.validate_columns(df.get_column_names().into_iter().map(|s| s.as_str()))?;

        let ordered = df.select(self.input_columns.iter().map(String::as_str))?;
        let mapped = self.mapper.transform(&ordered)?;
        let encoded = self.encoder.transform(&mapped)?;
        let scaled = self.scaler.transform(&encoded)?;

        debug!(rows = df.height(), features = scaled.width(), "Feature pipeline transform");
        Ok(scaled)
    }

    /// Transform with fit-time parameters into the estimator matrix
    pub fn transform(&self, df: &DataFrame) -> Result<Array2<f64>> {
        let scaled = self.transform_frame(df)?;
        columns_to_array2(&scaled, &self.feature_names())
    }

    /// Check a set of raw column names against the fit-time schema
    pub fn validate_columns<'a>(&self, columns: impl IntoIterator<Item = &'a str>) -> Result<()> {
        let present: HashSet<&str> = columns.into_iter().collect();
        let expected: HashSet<&str> = self.input_columns.iter().map(String::as_str).collect();

        let mut missing: Vec<&str> = expected.difference(&present).copied().collect();
        let mut extra: Vec<&str> = present.difference(&expected).copied().collect();
        if missing.is_empty() && extra.is_empty() {
            return Ok(());
        }
        missing.sort_unstable();
        extra.sort_unstable();

        let mut parts = Vec::new();
        if !missing.is_empty() {
            parts.push(format!("missing fields [{}]", missing.join(", ")));
        }
        if !extra.is_empty() {
            parts.push(format!("unexpected fields [{}]", extra.join(", ")));
        }
        Err(LoanError::SchemaMismatch(parts.join("; ")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn training_frame() -> DataFrame {
        df!(
            "LoanPurpose" => &["Home", "Auto", "Home", "Education"],
            "HomeOwnershipStatus" => &["Own", "Rent", "Mortgage", "Own"],
            "EmploymentStatus" => &["Employed", "Employed", "Unemployed", "Self-Employed"],
            "MaritalStatus" => &["Single", "Married", "Married", "Divorced"],
            "EmployerType" => &["Private", "Government", "Private", "Self-Employed"],
            "EducationLevel" => &["Bachelor", "Master", "High School", "Doctorate"],
            "HealthInsuranceStatus" => &["Insured", "Uninsured", "Insured", "Insured"],
            "Age" => &[25_i64, 40, 33, 58],
            "InterestRate" => &[4.5, 6.1, 5.2, 3.9]
        )
        .unwrap()
    }

    #[test]
    fn test_feature_layout() {
        let mut pipeline = FeaturePipeline::default();
        let x = pipeline.fit_transform(&training_frame()).unwrap();

        let names = pipeline.feature_names();
        assert_eq!(x.ncols(), names.len());
        assert_eq!(x.nrows(), 4);
        assert_eq!(names[0], "LoanPurpose_Education");
        assert_eq!(names[1], "LoanPurpose_Home");
        assert!(names.contains(&"EducationLevel".to_string()));
        assert!(!names.iter().any(|n| n.starts_with("EducationLevel_")));
        assert_eq!(names.last().map(String::as_str), Some("InterestRate"));
    }

    #[test]
    fn test_single_row_matches_width() {
        let df = training_frame();
        let mut pipeline = FeaturePipeline::default();
        let x = pipeline.fit_transform(&df).unwrap();

        let row = df.slice(2, 1);
        let single = pipeline.transform(&row).unwrap();
        assert_eq!(single.ncols(), x.ncols());
        for j in 0..x.ncols() {
            assert!((single[[0, j]] - x[[2, j]]).abs() < 1e-12);
        }
    }

    #[test]
    fn test_transform_is_deterministic() {
        let df = training_frame();
        let mut pipeline = FeaturePipeline::default();
        pipeline.fit_transform(&df).unwrap();
        assert_eq!(pipeline.transform(&df).unwrap(), pipeline.transform(&df).unwrap());
    }

    #[test]
    fn test_reordered_columns_are_accepted() {
        let df = training_frame();
        let mut pipeline = FeaturePipeline::default();
        let x = pipeline.fit_transform(&df).unwrap();

        let mut reversed: Vec<String> = pipeline.input_columns().to_vec();
        reversed.reverse();
        let shuffled = df.select(reversed.iter().map(String::as_str)).unwrap();
        assert_eq!(pipeline.transform(&shuffled).unwrap(), x);
    }

    #[test]
    fn test_target_rejected() {
        let mut df = training_frame();
        df.with_column(Column::new("LoanApproved".into(), vec![1_i64, 0, 1, 0]))
            .unwrap();
        let err = FeaturePipeline::default().fit_transform(&df).unwrap_err();
        assert!(matches!(err, LoanError::SchemaMismatch(_)));
    }

    #[test]
    fn test_schema_mismatch_lists_fields() {
        let df = training_frame();
        let mut pipeline = FeaturePipeline::default();
        pipeline.fit_transform(&df).unwrap();

        let partial = df.drop("Age").unwrap();
        match pipeline.transform(&partial) {
            Err(LoanError::SchemaMismatch(msg)) => assert!(msg.contains("Age")),
            other => panic!("expected schema mismatch, got {:?}", other),
        }
    }

    #[test]
    fn test_text_inputs_recorded_at_fit() {
        let mut pipeline = FeaturePipeline::default();
        pipeline.fit_transform(&training_frame()).unwrap();

        assert!(pipeline.is_text_input("LoanPurpose"));
        assert!(pipeline.is_text_input("EducationLevel"));
        assert!(!pipeline.is_text_input("Age"));
        assert!(!pipeline.is_text_input("InterestRate"));
    }

    #[test]
    fn test_refit_clears_run_stamp() {
        let mut pipeline = FeaturePipeline::default();
        pipeline.fit_transform(&training_frame()).unwrap();
        pipeline.set_trained_at(Utc::now());
        assert!(pipeline.trained_at().is_some());

        pipeline.fit_transform(&training_frame()).unwrap();
        assert!(pipeline.trained_at().is_none());
    }

    #[test]
    fn test_transform_before_fit() {
        let pipeline = FeaturePipeline::default();
        assert!(matches!(
            pipeline.transform(&training_frame()),
            Err(LoanError::ModelNotFitted)
        ));
    }
}
