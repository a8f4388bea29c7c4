//! Application state management

use crate::artifacts::ArtifactStore;
use crate::error::Result as LoanResult;
use crate::inference::LoanPredictor;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{info, warn};

use super::error::{Result, ServerError};

/// Application state shared across handlers.
///
/// The predictor is read-only once loaded; a reload swaps in a new `Arc`
/// while in-flight requests keep the one they cloned.
pub struct AppState {
    pub store: ArtifactStore,
    pub predictor: RwLock<Option<Arc<LoanPredictor>>>,
    pub started_at: chrono::DateTime<chrono::Utc>,
}

impl AppState {
    /// State with nothing loaded yet
    pub fn new(store: ArtifactStore) -> Self {
        Self {
            store,
            predictor: RwLock::new(None),
            started_at: chrono::Utc::now(),
        }
    }

    /// Load artifacts if present. A failure leaves the state empty so the
    /// server can still start and accept a later reload.
    pub fn load(store: ArtifactStore) -> Self {
        let predictor = match LoanPredictor::load(&store) {
            Ok(predictor) => {
                info!(model = %predictor.model().name, "Artifacts loaded");
                Some(Arc::new(predictor))
            }
            Err(e) => {
                warn!(error = %e, "Artifacts unavailable, predictions disabled until reload");
                None
            }
        };
        Self {
            store,
            predictor: RwLock::new(predictor),
            started_at: chrono::Utc::now(),
        }
    }

    /// Currently loaded predictor, or 503
    pub async fn predictor(&self) -> Result<Arc<LoanPredictor>> {
        self.predictor
            .read()
            .await
            .clone()
            .ok_or_else(|| ServerError::Unavailable("no trained model is loaded".to_string()))
    }

    /// Re-read both artifacts off the async runtime and swap them in
    pub async fn reload(&self) -> Result<Arc<LoanPredictor>> {
        let store = self.store.clone();
        let loaded: LoanResult<LoanPredictor> =
            tokio::task::spawn_blocking(move || LoanPredictor::load(&store))
                .await
                .map_err(|e| ServerError::Internal(e.to_string()))?;
        let predictor = Arc::new(loaded?);

        *self.predictor.write().await = Some(Arc::clone(&predictor));
        info!(model = %predictor.model().name, "Artifacts reloaded");
        Ok(predictor)
    }
}
