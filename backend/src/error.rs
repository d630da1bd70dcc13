//! Error handling for the weather forecast pipeline
//!
//! Every failure that crosses a component boundary is an [`AppError`]. Model
//! estimation failures are the exception: the trainer reports them as "no model
//! produced" instead of an error.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    // Remote provider errors
    #[error("Weather provider error: {0}")]
    Provider(String),

    #[error("Unexpected data shape: {0}")]
    DataShape(String),

    // Model and forecast errors
    #[error("Model artifact error: {0}")]
    ModelArtifact(String),

    #[error(
        "Seed window must be {expected_rows}x{expected_columns}, got {actual_rows}x{actual_columns}"
    )]
    SeedShape {
        expected_rows: usize,
        actual_rows: usize,
        expected_columns: usize,
        actual_columns: usize,
    },

    #[error("No forecast produced: {0}")]
    NoForecast(String),

    // Request errors
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    // Database errors
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    // Internal errors
    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Internal server error")]
    InternalError(#[from] anyhow::Error),
}

/// Error response structure
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
}

impl AppError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::Provider(_) => (StatusCode::BAD_GATEWAY, "PROVIDER_ERROR"),
            AppError::DataShape(_) => (StatusCode::BAD_GATEWAY, "DATA_SHAPE_ERROR"),
            AppError::ModelArtifact(_) => (StatusCode::SERVICE_UNAVAILABLE, "MODEL_ARTIFACT_ERROR"),
            AppError::SeedShape { .. } => (StatusCode::UNPROCESSABLE_ENTITY, "SEED_SHAPE_ERROR"),
            AppError::NoForecast(_) => (StatusCode::SERVICE_UNAVAILABLE, "NO_FORECAST"),
            AppError::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            AppError::Configuration(_) => (StatusCode::INTERNAL_SERVER_ERROR, "CONFIGURATION_ERROR"),
            AppError::DatabaseError(_) => (StatusCode::INTERNAL_SERVER_ERROR, "DATABASE_ERROR"),
            AppError::Internal(_) | AppError::InternalError(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR")
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        // Storage and internal details stay in the log
        let message = match &self {
            AppError::DatabaseError(_) => "A database error occurred".to_string(),
            AppError::InternalError(_) => "An internal server error occurred".to_string(),
            other => other.to_string(),
        };

        tracing::error!("Error: {:?}", self);

        (
            status,
            Json(ErrorResponse {
                error: ErrorDetail {
                    code: code.to_string(),
                    message,
                },
            }),
        )
            .into_response()
    }
}

/// Result type alias for services and handlers
pub type AppResult<T> = Result<T, AppError>;
