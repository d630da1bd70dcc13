//! Observation lookup by date

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use shared::{parse_date, MissingObservation};

use crate::error::{AppError, AppResult};
use crate::AppState;

/// `GET /weather/:date` with the date as `YYYY-MM-DD`.
///
/// Returns the stored row, or 404 with `{"error": "No data for this date"}`.
pub async fn get_observation(
    State(state): State<AppState>,
    Path(date): Path<String>,
) -> AppResult<Response> {
    let date = parse_date(&date).map_err(|e| AppError::Validation(e.to_string()))?;

    match state.pipeline.store().read_one(date).await? {
        Some(observation) => Ok(Json(observation).into_response()),
        None => Ok((StatusCode::NOT_FOUND, Json(MissingObservation::default())).into_response()),
    }
}
