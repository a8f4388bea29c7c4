//! Feature pipeline configuration

use crate::config::DEFAULT_TARGET;
use crate::schema::NOMINAL_FIELDS;
use serde::{Deserialize, Serialize};

/// Configuration for the feature pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Column that must never reach the pipeline
    pub target_column: String,

    /// Fields expanded into indicator columns, in output order
    pub nominal_columns: Vec<String>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            target_column: DEFAULT_TARGET.to_string(),
            nominal_columns: NOMINAL_FIELDS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl PipelineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to set the target column
    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target_column = target.into();
        self
    }

    /// Builder method to set the nominal columns
    pub fn with_nominal_columns<S: AsRef<str>>(mut self, columns: &[S]) -> Self {
        self.nominal_columns = columns.iter().map(|s| s.as_ref().to_string()).collect();
        self
    }
}
