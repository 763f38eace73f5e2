//! Retraining handler

use axum::{
    extract::{Query, State},
    Json,
};

use risk_core::RiskResult;

use crate::models::{RetrainQuery, RetrainResponse};
use crate::{AppResult, AppState};

/// Retrain one device type, or every type in the telemetry log
pub async fn retrain(
    State(state): State<AppState>,
    Query(query): Query<RetrainQuery>,
) -> AppResult<Json<RetrainResponse>> {
    let engine = state.engine.clone();

    let response = tokio::task::spawn_blocking(move || -> RiskResult<RetrainResponse> {
        let pool = engine.telemetry().load_pool()?;
        match query.device_type() {
            Some(device_type) => engine
                .train(device_type, &pool, query.contamination)
                .map(RetrainResponse::single),
            None => engine
                .retrain_all(&pool, query.contamination)
                .map(RetrainResponse::all),
        }
    })
    .await??;

    tracing::info!("Retrain complete: {:?}", response);
    Ok(Json(response))
}
