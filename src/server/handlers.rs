//! HTTP request handlers

use std::sync::Arc;
use axum::{body::Bytes, extract::State, Json};
use serde_json::{json, Value};
use tracing::info;

use crate::schema::RawRecord;

use super::error::{Result, ServerError};
use super::state::AppState;

/// Liveness plus whether a model is loaded
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<Value> {
    let predictor = state.predictor.read().await.clone();
    let uptime = chrono::Utc::now().signed_duration_since(state.started_at);

    Json(json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
        "model_loaded": predictor.is_some(),
        "model": predictor.as_ref().map(|p| p.model().name.clone()),
        "uptime_secs": uptime.num_seconds(),
    }))
}

/// Fit-time raw input columns a prediction request must carry
pub async fn get_schema(State(state): State<Arc<AppState>>) -> Result<Json<Value>> {
    let predictor = state.predictor().await?;
    let pipeline = predictor.pipeline();

    Ok(Json(json!({
        "target": pipeline.config().target_column,
        "input_columns": pipeline.input_columns(),
        "feature_names": pipeline.feature_names(),
        "n_features": pipeline.n_features(),
    })))
}

/// Score one raw record
pub async fn predict(State(state): State<Arc<AppState>>, body: Bytes) -> Result<Json<Value>> {
    let record: RawRecord = serde_json::from_slice(&body)
        .map_err(|e| ServerError::BadRequest(format!("invalid JSON record: {}", e)))?;
    let predictor = state.predictor().await?;

    let worker = Arc::clone(&predictor);
    let prediction = tokio::task::spawn_blocking(move || worker.predict_record(&record))
        .await
        .map_err(|e| ServerError::Internal(e.to_string()))??;

    Ok(Json(json!({
        "decision": prediction.decision,
        "label": prediction.label(),
        "score": prediction.score,
        "model": predictor.model().name,
    })))
}

/// Re-read artifacts from disk
pub async fn reload(State(state): State<Arc<AppState>>) -> Result<Json<Value>> {
    let predictor = state.reload().await?;
    info!(model = %predictor.model().name, "Reload requested");

    Ok(Json(json!({
        "success": true,
        "model": predictor.model().name,
        "score": predictor.model().score,
        "trained_at": predictor.model().trained_at.to_rfc3339(),
    })))
}
