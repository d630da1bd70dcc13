//! Forecasting from the latest persisted model

use chrono::{Duration, NaiveDate};
use ndarray::ArrayView2;
use shared::{Forecast, ForecastRow};

use crate::error::{AppError, AppResult};
use crate::services::registry::{ModelArtifact, ModelRegistry};
use crate::services::trainer::ObservationMatrix;
use crate::services::var_model::{OlsVarEstimator, VarEstimator};

/// A loaded model ready to forecast
#[derive(Debug, Clone)]
pub struct Forecaster<E = OlsVarEstimator> {
    artifact: ModelArtifact,
    estimator: E,
}

impl Forecaster<OlsVarEstimator> {
    /// Loads the latest artifact. Missing, unreadable and mismatched artifacts
    /// are all [`AppError::ModelArtifact`].
    pub fn load(registry: &ModelRegistry) -> AppResult<Self> {
        Self::from_artifact(registry.load()?, OlsVarEstimator)
    }
}

impl<E: VarEstimator> Forecaster<E> {
    pub fn from_artifact(artifact: ModelArtifact, estimator: E) -> AppResult<Self> {
        artifact
            .validate()
            .map_err(|e| AppError::ModelArtifact(format!("corrupt artifact: {}", e)))?;
        Ok(Self {
            artifact,
            estimator,
        })
    }

    pub fn artifact(&self) -> &ModelArtifact {
        &self.artifact
    }

    pub fn lag_order(&self) -> usize {
        self.artifact.lag_order
    }

    pub fn variables(&self) -> &[String] {
        &self.artifact.variables
    }

    /// Forecasts `horizon` days after `last_seed_date`.
    ///
    /// `seed` must hold exactly `lag_order` rows, oldest first, with one
    /// column per model variable.
    pub fn forecast(
        &self,
        seed: ArrayView2<'_, f64>,
        horizon: usize,
        last_seed_date: NaiveDate,
    ) -> AppResult<Forecast> {
        let expected_rows = self.lag_order();
        let expected_columns = self.variables().len();
        if seed.nrows() != expected_rows || seed.ncols() != expected_columns {
            return Err(AppError::SeedShape {
                expected_rows,
                actual_rows: seed.nrows(),
                expected_columns,
                actual_columns: seed.ncols(),
            });
        }
        if horizon == 0 {
            return Err(AppError::Validation(
                "Forecast horizon must be at least 1".to_string(),
            ));
        }

        let values = self
            .estimator
            .forecast(&self.artifact.coefficients, seed, horizon)
            .map_err(|e| AppError::NoForecast(e.to_string()))?;
        if values.iter().any(|v| !v.is_finite()) {
            return Err(AppError::NoForecast(
                "model produced non-finite values".to_string(),
            ));
        }

        let rows = values
            .rows()
            .into_iter()
            .enumerate()
            .map(|(step, row)| {
                let date = last_seed_date
                    .checked_add_signed(Duration::days(step as i64 + 1))
                    .ok_or_else(|| AppError::NoForecast("forecast date out of range".to_string()))?;
                Ok(ForecastRow {
                    date,
                    values: row.to_vec(),
                })
            })
            .collect::<AppResult<Vec<_>>>()?;

        Ok(Forecast {
            variables: self.artifact.variables.clone(),
            rows,
        })
    }

    /// Seeds the forecast with the matrix's latest `lag_order` rows
    pub fn forecast_from_matrix(
        &self,
        matrix: &ObservationMatrix,
        horizon: usize,
    ) -> AppResult<Forecast> {
        if matrix.variables() != self.artifact.variables {
            return Err(AppError::ModelArtifact(format!(
                "model variables {:?} do not match observations {:?}",
                self.artifact.variables,
                matrix.variables()
            )));
        }
        let last_date = matrix.last_date().ok_or_else(|| {
            AppError::NoForecast("no complete observations to seed the forecast".to_string())
        })?;

        self.forecast(matrix.tail(self.lag_order()), horizon, last_date)
    }
}
