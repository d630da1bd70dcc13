//! Route definitions for the weather forecast API

use axum::{
    routing::{get, post},
    Router,
};

use crate::{handlers, AppState};

/// Create API routes
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(handlers::health_check))
        // Stored observations
        .route("/weather/:date", get(handlers::get_observation))
        // Model output
        .route("/forecast", get(handlers::get_forecast))
        .route("/dashboard", get(handlers::get_dashboard))
        .route("/pipeline/run", post(handlers::run_pipeline))
}
