//! Loan Approval - loan decision model training and serving
//!
//! This crate turns a tabular loan dataset into a persisted approval model:
//! - Category mapping, one-hot encoding and standard scaling in one fitted
//!   feature pipeline
//! - Minority-class oversampling of the training split
//! - Selection of the best regressor from a fixed roster by held-out R²
//! - Atomic JSON artifacts and single-record inference
//!
//! # Modules
//!
//! ## Core
//! - [`schema`] - Raw record and loan application types
//! - [`preprocessing`] - Category mapper, column encoder, feature scaler, feature pipeline
//! - [`sampling`] - Class balancer
//! - [`training`] - Estimator roster, model selector, decision model
//! - [`artifacts`] - Artifact store
//! - [`inference`] - Predictor and inference adapter
//!
//! ## Orchestration
//! - [`pipeline`] - Data ingestion and the end-to-end training run
//! - [`config`] - Application configuration
//!
//! ## Services
//! - [`server`] - HTTP server with REST API
//! - [`cli`] - Command-line interface

// Core error handling
pub mod error;
pub mod config;

// Core modules
pub mod schema;
pub mod preprocessing;
pub mod sampling;
pub mod training;
pub mod artifacts;
pub mod inference;

// Orchestration
pub mod pipeline;

// Services
pub mod server;
pub mod cli;

pub use error::{LoanError, Result, Stage};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::artifacts::ArtifactStore;
    pub use crate::config::{AppConfig, ArtifactConfig, TrainingConfig};
    pub use crate::error::{LoanError, Result, Stage, StageContext};
    pub use crate::inference::{InferenceAdapter, LoanPredictor, Prediction};
    pub use crate::pipeline::{DataIngestion, TrainingPipeline, TrainingReport};
    pub use crate::preprocessing::{
        CategoryMapper, FeaturePipeline, FeatureStage, OneHotEncoder, PipelineConfig,
        StandardScaler,
    };
    pub use crate::sampling::{BalanceOutcome, ClassBalancer};
    pub use crate::schema::{FieldValue, LoanApplication, RawRecord, LOAN_FIELDS};
    pub use crate::training::{
        default_roster, Candidate, Estimator, LoanModel, ModelSelector, Regressor, Selection,
    };
}
