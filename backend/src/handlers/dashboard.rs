//! Dashboard view

use axum::{extract::State, Json};
use chrono::Local;
use shared::DashboardView;

use crate::AppState;

/// Runs the pipeline and returns every dashboard section.
///
/// Always 200: section failures are reported inside the view.
pub async fn get_dashboard(State(state): State<AppState>) -> Json<DashboardView> {
    let today = Local::now().date_naive();
    Json(state.dashboard().build(today).await)
}
