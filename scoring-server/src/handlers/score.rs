//! Scoring handler

use axum::{extract::State, Json};
use risk_core::model::ScoreResult;
use validator::Validate;

use crate::models::ScoreRequest;
use crate::{AppResult, AppState};

/// Record the raw telemetry, then score it
pub async fn score(
    State(state): State<AppState>,
    Json(req): Json<ScoreRequest>,
) -> AppResult<Json<ScoreResult>> {
    req.validate()?;
    let record = req.into_record();

    let engine = state.engine.clone();
    let result = tokio::task::spawn_blocking(move || engine.ingest(&record)).await??;

    tracing::debug!(
        "Scored {} ({}): risk={} reasons={:?}",
        result.device_id,
        result.device_type,
        result.risk_score,
        result.reasons
    );

    Ok(Json(result))
}
