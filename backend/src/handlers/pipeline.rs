//! Explicit pipeline trigger

use axum::{extract::State, Json};
use chrono::Local;
use shared::PipelineReport;

use crate::error::AppResult;
use crate::AppState;

/// `POST /pipeline/run`. Waits for any run already in progress.
pub async fn run_pipeline(State(state): State<AppState>) -> AppResult<Json<PipelineReport>> {
    let _guard = state.pipeline_lock.lock().await;
    let report = state.pipeline.run(Local::now().date_naive()).await?;
    Ok(Json(report))
}
