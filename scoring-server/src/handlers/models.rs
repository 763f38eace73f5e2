//! Model listing and scoring status handlers

use axum::{extract::State, Json};

use crate::models::{ModelsResponse, StatusResponse};
use crate::{AppResult, AppState};

/// Persisted model keys
pub async fn list(State(state): State<AppState>) -> AppResult<Json<ModelsResponse>> {
    let engine = state.engine.clone();
    let models = tokio::task::spawn_blocking(move || engine.list_models()).await??;

    Ok(Json(ModelsResponse {
        models: models.into_iter().collect(),
    }))
}

/// Scoring counters, model count and telemetry log size
pub async fn status(State(state): State<AppState>) -> AppResult<Json<StatusResponse>> {
    let engine = state.engine.clone();
    let (known_models, telemetry) = tokio::task::spawn_blocking(move || {
        Ok::<_, risk_core::RiskError>((engine.list_models()?.len(), engine.telemetry().stats()?))
    })
    .await??;

    let stats = state.engine.stats();
    Ok(Json(StatusResponse {
        predictions: stats.predictions,
        outliers: stats.outliers,
        cold_starts: stats.cold_starts,
        retrains: stats.retrains,
        known_models,
        telemetry,
    }))
}
