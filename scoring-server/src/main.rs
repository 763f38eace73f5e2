//! IoMT Risk Scoring Server
//!
//! HTTP front end over the scoring engine.
//!
//! # Routes
//!
//! ```text
//! GET  /health                                  liveness
//! POST /ml/score                                record + score one telemetry record
//! POST /ml/retrain?device_type=&contamination=  retrain from the telemetry log
//! GET  /ml/models                               persisted model keys
//! GET  /ml/status                               scoring counters
//! ```
//!
//! Scoring and training are blocking; handlers run them on the blocking pool.

mod config;
mod error;
mod handlers;
mod models;


use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use axum::{
    Router,
    routing::{get, post},
};
use risk_core::ScoringEngine;
use tower_http::{
    cors::{CorsLayer, Any},
    trace::TraceLayer,
    compression::CompressionLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

pub use error::{AppError, AppResult};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    dotenvy::dotenv().ok();
    let config = config::Config::from_env();

    // Initialize logging; core `log` records are bridged into tracing
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "scoring_server=debug,risk_core=info,tower_http=debug".into());
    let registry = tracing_subscriber::registry().with(filter);
    if config.is_production() {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }

    tracing::info!("IoMT scoring server starting ({})...", config.environment);
    tracing::info!("Models: {}", config.engine.model_dir.display());

    let engine = ScoringEngine::new(config.engine.clone())
        .context("failed to initialize scoring engine")?;

    // Build application state
    let state = AppState {
        engine: Arc::new(engine),
        config: config.clone(),
    };

    // Build router
    let app = create_router(state);

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    axum::serve(listener, app).await?;
    Ok(())
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<ScoringEngine>,
    pub config: config::Config,
}

/// Create the main router with all routes
fn create_router(state: AppState) -> Router {
    let ml_routes = Router::new()
        .route("/ml/score", post(handlers::score::score))
        .route("/ml/retrain", post(handlers::retrain::retrain))
        .route("/ml/models", get(handlers::models::list))
        .route("/ml/status", get(handlers::models::status));

    Router::new()
        .route("/health", get(handlers::health::check))
        .merge(ml_routes)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any)
        )
        .with_state(state)
}
