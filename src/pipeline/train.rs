//! Training run: balance → transform → select → persist

use super::load_csv;
use crate::artifacts::ArtifactStore;
use crate::config::AppConfig;
use crate::error::{LoanError, Result, Stage, StageContext};
use crate::preprocessing::{FeaturePipeline, PipelineConfig};
use crate::sampling::{class_counts, ClassBalancer};
use crate::training::{CandidateScore, LoanModel, ModelMetrics, ModelSelector, Regressor};
use chrono::{DateTime, Utc};
use ndarray::{Array1, Array2};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Instant;
use tracing::info;

/// Summary of a successful training run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingReport {
    pub best_model: String,
    pub best_score: f64,
    pub candidates: Vec<CandidateScore>,
    pub n_train_rows: usize,
    pub n_balanced_rows: usize,
    pub n_test_rows: usize,
    pub n_features: usize,
    /// Selected model on the held-out split
    pub metrics: ModelMetrics,
    pub pipeline_path: PathBuf,
    pub model_path: PathBuf,
    pub duration_secs: f64,
    pub trained_at: DateTime<Utc>,
}

/// One-shot training run over the configured train/test CSVs
#[derive(Debug, Clone)]
pub struct TrainingPipeline {
    config: AppConfig,
    store: ArtifactStore,
    selector: ModelSelector,
}

impl TrainingPipeline {
    pub fn new(config: AppConfig) -> Self {
        let store = ArtifactStore::new(config.artifacts.clone());
        let selector = ModelSelector::with_default_roster(
            config.training.random_seed,
            config.training.min_score,
        );
        Self {
            config,
            store,
            selector,
        }
    }

    /// Replace the standard roster
    pub fn with_selector(mut self, selector: ModelSelector) -> Self {
        self.selector = selector;
        self
    }

    pub fn store(&self) -> &ArtifactStore {
        &self.store
    }

    /// Train from the configured CSV paths
    pub fn run(&self) -> Result<TrainingReport> {
        let train = load_csv(&self.config.data.train_path).stage(Stage::Ingestion)?;
        let test = load_csv(&self.config.data.test_path).stage(Stage::Ingestion)?;
        self.run_frames(&train, &test)
    }

    /// Train from in-memory splits. Artifacts are written only after a
    /// model passes selection.
    pub fn run_frames(&self, train: &DataFrame, test: &DataFrame) -> Result<TrainingReport> {
        let start = Instant::now();
        let target = self.config.training.target_column.as_str();
        info!(train_rows = train.height(), test_rows = test.height(), "Training run started");

        check_target(train, target, "train").stage(Stage::Ingestion)?;
        check_target(test, target, "test").stage(Stage::Ingestion)?;

        let balanced = ClassBalancer::new(target, self.config.training.random_seed)
            .balance(train)
            .stage(Stage::Balancing)?;

        let prepared = prepare_features(&balanced.data, test, target).stage(Stage::Transformation)?;
        let Prepared { x_train, y_train, x_test, y_test, mut pipeline } = prepared;

        let selection = self
            .selector
            .clone()
            .select(&x_train, &y_train, &x_test, &y_test)
            .stage(Stage::ModelSelection)?;

        let candidates = selection.scores.clone();
        let model = LoanModel::from_selection(selection, pipeline.feature_names())
            .with_threshold(self.config.training.decision_threshold);
        let test_scores = model.estimator().predict(&x_test).stage(Stage::ModelSelection)?;
        let metrics = ModelMetrics::evaluate(&y_test, &test_scores, model.threshold);

        pipeline.set_trained_at(model.trained_at);
        let (pipeline_path, model_path) = self
            .store
            .save_all(&pipeline, &model)
            .stage(Stage::Persistence)?;

        let report = TrainingReport {
            best_model: model.name.clone(),
            best_score: model.score,
            candidates,
            n_train_rows: train.height(),
            n_balanced_rows: balanced.data.height(),
            n_test_rows: test.height(),
            n_features: pipeline.n_features(),
            metrics,
            pipeline_path,
            model_path,
            duration_secs: start.elapsed().as_secs_f64(),
            trained_at: model.trained_at,
        };
        info!(
            model = %report.best_model,
            r2 = report.best_score,
            accuracy = report.metrics.accuracy,
            duration_secs = report.duration_secs,
            "Training run complete"
        );
        Ok(report)
    }
}

struct Prepared {
    x_train: Array2<f64>,
    y_train: Array1<f64>,
    x_test: Array2<f64>,
    y_test: Array1<f64>,
    pipeline: FeaturePipeline,
}

/// Fit the feature pipeline on the balanced split and apply it to the test split
fn prepare_features(train: &DataFrame, test: &DataFrame, target: &str) -> Result<Prepared> {
    let (train_features, y_train) = split_target(train, target)?;
    let (test_features, y_test) = split_target(test, target)?;

    let mut pipeline = FeaturePipeline::new(PipelineConfig::default().with_target(target));
    let x_train = pipeline.fit_transform(&train_features)?;
    let x_test = pipeline.transform(&test_features)?;
    Ok(Prepared {
        x_train,
        y_train,
        x_test,
        y_test,
        pipeline,
    })
}

/// Target must exist and hold only 0/1 labels
fn check_target(df: &DataFrame, target: &str, split: &str) -> Result<()> {
    if df.column(target).is_err() {
        return Err(LoanError::SchemaMismatch(format!(
            "target column '{}' missing from the {} split",
            target, split
        )));
    }
    let counts = class_counts(df, target)?;
    if let Some(label) = counts.keys().find(|&&label| label != 0 && label != 1) {
        return Err(LoanError::DataIntegrity(format!(
            "target column '{}' in the {} split holds label {}, expected 0 or 1",
            target, split, label
        )));
    }
    Ok(())
}

/// Features without the target, and the target as floats
fn split_target(df: &DataFrame, target: &str) -> Result<(DataFrame, Array1<f64>)> {
    let labels = df.column(target)?.as_materialized_series().cast(&DataType::Float64)?;
    let y: Array1<f64> = labels.f64()?.into_iter().map(|v| v.unwrap_or(0.0)).collect();
    Ok((df.drop(target)?, y))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_target_labels() {
        let ok = df!("LoanApproved" => &[0_i64, 1, 1]).unwrap();
        assert!(check_target(&ok, "LoanApproved", "train").is_ok());

        let bad = df!("LoanApproved" => &[0_i64, 2]).unwrap();
        assert!(matches!(
            check_target(&bad, "LoanApproved", "train"),
            Err(LoanError::DataIntegrity(_))
        ));

        let missing = df!("Other" => &[0_i64]).unwrap();
        assert!(matches!(
            check_target(&missing, "LoanApproved", "test"),
            Err(LoanError::SchemaMismatch(_))
        ));
    }

    #[test]
    fn test_split_target() {
        let df = df!("CreditScore" => &[700_i64, 600], "LoanApproved" => &[1_i64, 0]).unwrap();
        let (features, y) = split_target(&df, "LoanApproved").unwrap();
        assert_eq!(features.width(), 1);
        assert!(features.column("CreditScore").is_ok());
        assert_eq!(y.to_vec(), vec![1.0, 0.0]);
    }
}
