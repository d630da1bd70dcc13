//! Forecast from the latest model

use axum::{
    extract::{Query, State},
    Json,
};
use shared::{Forecast, ForecastQuery};
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::services::{Forecaster, ObservationMatrix};
use crate::AppState;

/// `GET /forecast?horizon=N`, seeded with the latest complete observations.
///
/// Without `horizon` the dashboard horizon is used.
pub async fn get_forecast(
    State(state): State<AppState>,
    Query(query): Query<ForecastQuery>,
) -> AppResult<Json<Forecast>> {
    query
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;
    let horizon = query
        .horizon
        .map(|h| h as usize)
        .unwrap_or(state.config.dashboard.forecast_horizon);

    let forecaster = Forecaster::load(state.pipeline.registry())?;
    let observations = state.pipeline.store().read_all().await?;
    let matrix = ObservationMatrix::from_observations(&observations);

    let forecast = forecaster.forecast_from_matrix(&matrix, horizon)?;
    Ok(Json(forecast))
}
