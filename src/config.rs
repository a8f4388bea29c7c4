//! Application configuration
//!
//! Every path and constant the pipeline depends on lives here and is passed
//! explicitly into the components that need it.

use crate::error::{LoanError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default target column of the training and test CSVs
pub const DEFAULT_TARGET: &str = "LoanApproved";

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub data: DataConfig,
    pub artifacts: ArtifactConfig,
    pub training: TrainingConfig,
    pub server: ServerConfig,
}

/// Locations of the raw, train and test CSVs
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    /// Raw dataset split by the ingestion step
    pub raw_data_path: PathBuf,
    /// Training split
    pub train_path: PathBuf,
    /// Held-out split
    pub test_path: PathBuf,
    /// Fraction of rows held out for testing
    pub test_size: f64,
}

/// Where fitted artifacts are persisted
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ArtifactConfig {
    pub dir: PathBuf,
    pub pipeline_file: String,
    pub model_file: String,
}

/// Training constants
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    pub target_column: String,
    /// Seed shared by ingestion shuffling, balancing and estimators
    pub random_seed: u64,
    /// Minimum held-out R² a selected model must reach
    pub min_score: f64,
    /// Regression output at or above this value means "approved"
    pub decision_threshold: f64,
}

/// HTTP server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for DataConfig {
    fn default() -> Self {
        let dir = default_artifacts_dir();
        Self {
            raw_data_path: dir.join("data.csv"),
            train_path: dir.join("train.csv"),
            test_path: dir.join("test.csv"),
            test_size: 0.2,
        }
    }
}

impl Default for ArtifactConfig {
    fn default() -> Self {
        Self {
            dir: default_artifacts_dir(),
            pipeline_file: "preprocessor.json".to_string(),
            model_file: "model.json".to_string(),
        }
    }
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            target_column: DEFAULT_TARGET.to_string(),
            random_seed: 42,
            min_score: 0.6,
            decision_threshold: 0.5,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: std::env::var("API_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: std::env::var("API_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8080),
        }
    }
}

fn default_artifacts_dir() -> PathBuf {
    std::env::var("ARTIFACTS_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("artifacts"))
}

impl ArtifactConfig {
    /// Rooted at `dir` with the default file names
    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            ..Default::default()
        }
    }

    pub fn pipeline_path(&self) -> PathBuf {
        self.dir.join(&self.pipeline_file)
    }

    pub fn model_path(&self) -> PathBuf {
        self.dir.join(&self.model_file)
    }
}

impl AppConfig {
    /// Load configuration from a JSON file; absent keys keep their defaults
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| {
            LoanError::ConfigError(format!("cannot read {}: {}", path.display(), e))
        })?;
        let config: Self = serde_json::from_str(&json)
            .map_err(|e| LoanError::ConfigError(format!("{}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Point every data and artifact path at one directory
    pub fn with_workdir(mut self, dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        self.data.raw_data_path = dir.join("data.csv");
        self.data.train_path = dir.join("train.csv");
        self.data.test_path = dir.join("test.csv");
        self.artifacts.dir = dir.to_path_buf();
        self
    }

    pub fn with_min_score(mut self, min_score: f64) -> Self {
        self.training.min_score = min_score;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.training.random_seed = seed;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.data.test_size > 0.0 && self.data.test_size < 1.0) {
            return Err(LoanError::ConfigError(format!(
                "test_size must be in (0, 1), got {}",
                self.data.test_size
            )));
        }
        if self.training.min_score > 1.0 {
            return Err(LoanError::ConfigError(format!(
                "min_score cannot exceed 1.0, got {}",
                self.training.min_score
            )));
        }
        if self.training.target_column.trim().is_empty() {
            return Err(LoanError::ConfigError("target_column is empty".to_string()));
        }
        Ok(())
    }
}
