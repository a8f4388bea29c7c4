//! Error types for the loan approval pipeline

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, LoanError>;

/// Pipeline stage an error originated from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Ingestion,
    Balancing,
    Transformation,
    ModelSelection,
    Persistence,
    Inference,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Ingestion => "ingestion",
            Stage::Balancing => "balancing",
            Stage::Transformation => "transformation",
            Stage::ModelSelection => "model selection",
            Stage::Persistence => "persistence",
            Stage::Inference => "inference",
        };
        f.write_str(name)
    }
}

/// Main error type
#[derive(Error, Debug)]
pub enum LoanError {
    #[error("Schema mismatch: {0}")]
    SchemaMismatch(String),

    #[error("Data integrity error: {0}")]
    DataIntegrity(String),

    #[error("No acceptable model: best candidate '{model}' scored {score:.4}, below the {threshold} threshold")]
    NoAcceptableModel {
        model: String,
        score: f64,
        threshold: f64,
    },

    #[error("Artifact not found: {}", .0.display())]
    ArtifactNotFound(PathBuf),

    #[error("Artifact corrupt: {}: {reason}", .path.display())]
    ArtifactCorrupt { path: PathBuf, reason: String },

    #[error("Data error: {0}")]
    DataError(String),

    #[error("Training error: {0}")]
    TrainingError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Invalid shape: expected {expected}, got {actual}")]
    ShapeError { expected: String, actual: String },

    #[error("Model not fitted")]
    ModelNotFitted,

    #[error("{stage} stage failed: {source}")]
    Stage {
        stage: Stage,
        #[source]
        source: Box<LoanError>,
    },
}

impl LoanError {
    /// Innermost error, with any stage wrapping removed
    pub fn root(&self) -> &LoanError {
        match self {
            LoanError::Stage { source, .. } => source.root(),
            other => other,
        }
    }

    /// Stage the error was attributed to, if any
    pub fn stage(&self) -> Option<Stage> {
        match self {
            LoanError::Stage { stage, .. } => Some(*stage),
            _ => None,
        }
    }
}

/// Attach the originating stage to an error
pub trait StageContext<T> {
    fn stage(self, stage: Stage) -> Result<T>;
}

impl<T> StageContext<T> for Result<T> {
    fn stage(self, stage: Stage) -> Result<T> {
        self.map_err(|err| match err {
            staged @ LoanError::Stage { .. } => staged,
            other => LoanError::Stage {
                stage,
                source: Box::new(other),
            },
        })
    }
}

impl From<polars::error::PolarsError> for LoanError {
    fn from(err: polars::error::PolarsError) -> Self {
        LoanError::DataError(err.to_string())
    }
}

impl From<serde_json::Error> for LoanError {
    fn from(err: serde_json::Error) -> Self {
        LoanError::SerializationError(err.to_string())
    }
}

impl From<ndarray::ShapeError> for LoanError {
    fn from(err: ndarray::ShapeError) -> Self {
        LoanError::ShapeError {
            expected: "valid shape".to_string(),
            actual: err.to_string(),
        }
    }
}
