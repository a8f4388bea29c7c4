//! Inference
//!
//! Turns raw loan applications into approval decisions using the persisted
//! feature pipeline and model:
//! - [`LoanPredictor`] holds both artifacts in memory and is safe to share
//!   across threads (nothing is mutated after load)
//! - [`InferenceAdapter`] reloads the artifacts on every call

mod engine;

pub use engine::LoanPredictor;

use crate::artifacts::ArtifactStore;
use crate::error::{Result, Stage, StageContext};
use crate::schema::RawRecord;
use serde::{Deserialize, Serialize};

/// Outcome for one application
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    /// 1 = approved, 0 = rejected
    pub decision: u8,
    /// Raw regression output the decision was thresholded from
    pub score: f64,
}

impl Prediction {
    pub fn is_approved(&self) -> bool {
        self.decision == 1
    }

    pub fn label(&self) -> &'static str {
        if self.is_approved() {
            "approved"
        } else {
            "rejected"
        }
    }
}

/// Load-per-call inference: every prediction reads both artifacts fresh,
/// so a retrained model is picked up without restarting anything.
pub struct InferenceAdapter;

impl InferenceAdapter {
    pub fn predict(store: &ArtifactStore, record: &RawRecord) -> Result<Prediction> {
        let predictor = LoanPredictor::load(store).stage(Stage::Inference)?;
        predictor.predict_record(record)
    }
}
