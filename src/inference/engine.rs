//! Loaded pipeline + model pair

use super::Prediction;
use crate::artifacts::ArtifactStore;
use crate::error::{LoanError, Result, Stage, StageContext};
use crate::preprocessing::FeaturePipeline;
use crate::schema::{FieldValue, LoanApplication, RawRecord};
use crate::training::LoanModel;
use polars::prelude::*;
use std::time::Instant;
use tracing::debug;

/// A fitted feature pipeline and the model trained on its output
#[derive(Debug, Clone)]
pub struct LoanPredictor {
    pipeline: FeaturePipeline,
    model: LoanModel,
}

impl LoanPredictor {
    /// Pair a pipeline with a model, checking they come from the same run
    pub fn new(pipeline: FeaturePipeline, model: LoanModel) -> Result<Self> {
        if !pipeline.is_fitted() {
            return Err(LoanError::ModelNotFitted);
        }
        let expected = pipeline.feature_names();
        if expected != model.feature_names {
            return Err(LoanError::DataIntegrity(format!(
                "model '{}' was trained on {} features, pipeline produces {}",
                model.name,
                model.feature_names.len(),
                expected.len()
            )));
        }
        if pipeline.trained_at() != Some(model.trained_at) {
            return Err(LoanError::DataIntegrity(format!(
                "model '{}' was trained at {}, pipeline belongs to run {}",
                model.name,
                model.trained_at.to_rfc3339(),
                pipeline
                    .trained_at()
                    .map(|t| t.to_rfc3339())
                    .unwrap_or_else(|| "<none>".to_string())
            )));
        }
        Ok(Self { pipeline, model })
    }

    /// Read both artifacts from the store. A pair that was not written by
    /// the same training run is reported as a corrupt model artifact.
    pub fn load(store: &ArtifactStore) -> Result<Self> {
        let pipeline = store.load_pipeline()?;
        let model = store.load_model()?;
        let predictor = Self::new(pipeline, model).map_err(|e| match e {
            LoanError::DataIntegrity(reason) => LoanError::ArtifactCorrupt {
                path: store.model_path(),
                reason,
            },
            other => other,
        })?;
        debug!(
            model = %predictor.model.name,
            n_features = predictor.model.n_features(),
            "Predictor loaded"
        );
        Ok(predictor)
    }

    pub fn pipeline(&self) -> &FeaturePipeline {
        &self.pipeline
    }

    pub fn model(&self) -> &LoanModel {
        &self.model
    }

    /// Fit-time raw input columns, in order
    pub fn input_columns(&self) -> &[String] {
        self.pipeline.input_columns()
    }

    /// Predict one raw record. Missing or extra fields fail before any
    /// transformation runs.
    pub fn predict_record(&self, record: &RawRecord) -> Result<Prediction> {
        let start = Instant::now();
        let prediction = self
            .pipeline
            .validate_columns(record.field_names())
            .and_then(|_| self.check_kinds(record))
            .and_then(|_| record.to_frame(self.pipeline.input_columns()))
            .and_then(|frame| self.predict_frame(&frame))
            .and_then(|mut rows| {
                rows.pop().ok_or_else(|| {
                    LoanError::DataIntegrity("no prediction produced".to_string())
                })
            })
            .stage(Stage::Inference)?;

        debug!(
            decision = prediction.decision,
            score = prediction.score,
            elapsed_us = start.elapsed().as_micros() as u64,
            "Record scored"
        );
        Ok(prediction)
    }

    /// Text goes to columns that held text at fit time, numbers to the rest
    fn check_kinds(&self, record: &RawRecord) -> Result<()> {
        for column in self.pipeline.input_columns() {
            let Some(value) = record.get(column) else {
                continue;
            };
            let wants_text = self.pipeline.is_text_input(column);
            match (wants_text, value) {
                (true, FieldValue::Text(_)) => {}
                (false, FieldValue::Int(_) | FieldValue::Float(_)) => {}
                (true, _) => {
                    return Err(LoanError::SchemaMismatch(format!(
                        "field '{}' must be text, got a number",
                        column
                    )))
                }
                (false, _) => {
                    return Err(LoanError::SchemaMismatch(format!(
                        "field '{}' must be numeric, got text",
                        column
                    )))
                }
            }
        }
        Ok(())
    }

    pub fn predict_application(&self, application: &LoanApplication) -> Result<Prediction> {
        let record = application.to_record().stage(Stage::Inference)?;
        self.predict_record(&record)
    }

    /// Predict every row of a frame holding the fit-time input columns
    pub fn predict_frame(&self, df: &DataFrame) -> Result<Vec<Prediction>> {
        self.score_frame(df).stage(Stage::Inference)
    }

    fn score_frame(&self, df: &DataFrame) -> Result<Vec<Prediction>> {
        let x = self.pipeline.transform(df)?;
        let scores = self.model.predict_scores(&x)?;
        Ok(scores
            .iter()
            .map(|&score| Prediction {
                decision: self.model.decide(score),
                score,
            })
            .collect())
    }
}
