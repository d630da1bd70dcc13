//! Dashboard view assembly
//!
//! Each section is built independently. A failure in one becomes that
//! section's `failed` or `unavailable` state and never stops the others.

use std::sync::Arc;

use chrono::NaiveDate;
use shared::{
    DashboardView, Forecast, Observation, PipelineReport, Section, TodaySnapshot, YesterdayTable,
};
use tokio::sync::Mutex;

use crate::error::AppError;
use crate::external::{CurrentConditions, LiveSource};
use crate::services::forecaster::Forecaster;
use crate::services::pipeline::Pipeline;
use crate::services::trainer::ObservationMatrix;

const NO_TODAY_DATA: &str = "No weather data available for today yet.";
const NO_MODEL: &str = "No forecast model available yet.";
const NO_TEMPERATURE_VARIABLES: &str = "Model has no temperature variables to forecast.";

#[derive(Clone)]
pub struct DashboardService {
    pipeline: Arc<Pipeline>,
    live: Arc<dyn LiveSource>,
    pipeline_lock: Arc<Mutex<()>>,
    location: String,
    forecast_horizon: usize,
}

impl DashboardService {
    pub fn new(
        pipeline: Arc<Pipeline>,
        live: Arc<dyn LiveSource>,
        pipeline_lock: Arc<Mutex<()>>,
        location: String,
        forecast_horizon: usize,
    ) -> Self {
        Self {
            pipeline,
            live,
            pipeline_lock,
            location,
            forecast_horizon,
        }
    }

    /// Runs the pipeline, then builds the live and forecast sections
    pub async fn build(&self, today: NaiveDate) -> DashboardView {
        let pipeline = self.pipeline_section(today).await;

        let (today_section, forecast, yesterday) = tokio::join!(
            self.today_section(),
            self.forecast_section(),
            self.yesterday_section(today),
        );

        DashboardView {
            location: self.location.clone(),
            pipeline,
            today: today_section,
            forecast,
            yesterday,
        }
    }

    async fn pipeline_section(&self, today: NaiveDate) -> Section<PipelineReport> {
        let _guard = self.pipeline_lock.lock().await;
        match self.pipeline.run(today).await {
            Ok(report) => Section::ready(report),
            Err(e) => {
                tracing::error!("Pipeline run failed: {}", e);
                Section::failed(e.to_string())
            }
        }
    }

    async fn today_section(&self) -> Section<TodaySnapshot> {
        match self.live.current_conditions().await {
            Ok(conditions) => match today_snapshot(&conditions) {
                Some(snapshot) => Section::ready(snapshot),
                None => Section::unavailable(NO_TODAY_DATA),
            },
            Err(e) => {
                tracing::warn!("Live conditions unavailable: {}", e);
                Section::failed(e.to_string())
            }
        }
    }

    async fn forecast_section(&self) -> Section<Forecast> {
        let forecaster = match Forecaster::load(self.pipeline.registry()) {
            Ok(forecaster) => forecaster,
            Err(AppError::ModelArtifact(reason)) => {
                tracing::warn!("Forecast skipped: model artifact {}", reason);
                return Section::unavailable(NO_MODEL);
            }
            Err(e) => return Section::failed(e.to_string()),
        };

        let observations = match self.pipeline.store().read_all().await {
            Ok(rows) => rows,
            Err(e) => return Section::failed(e.to_string()),
        };
        let matrix = ObservationMatrix::from_observations(&observations);

        match forecaster.forecast_from_matrix(&matrix, self.forecast_horizon) {
            Ok(forecast) => {
                let temperature = temperature_forecast(&forecast);
                if temperature.variables.is_empty() {
                    Section::unavailable(NO_TEMPERATURE_VARIABLES)
                } else {
                    Section::ready(temperature)
                }
            }
            Err(e) => {
                tracing::warn!("Forecast failed: {}", e);
                Section::failed(e.to_string())
            }
        }
    }

    async fn yesterday_section(&self, today: NaiveDate) -> Section<YesterdayTable> {
        let Some(yesterday) = today.pred_opt() else {
            return Section::unavailable("No previous day");
        };

        match self.live.hourly_for_date(yesterday).await {
            Ok(series) => {
                let hourly = &series.hourly;
                Section::ready(YesterdayTable::from_hourly(
                    yesterday,
                    &hourly.time,
                    &hourly.temperature_2m,
                    &hourly.windspeed_10m,
                    &hourly.winddirection_10m,
                ))
            }
            Err(e) => {
                tracing::warn!("Yesterday's conditions unavailable: {}", e);
                Section::failed(e.to_string())
            }
        }
    }
}

/// Snapshot from the live response, `None` without a current temperature.
///
/// Humidity and precipitation come from the first hourly slot.
pub fn today_snapshot(conditions: &CurrentConditions) -> Option<TodaySnapshot> {
    let current = conditions.current_weather.as_ref()?;
    let temperature = current.temperature?;

    let first = |series: Option<&Vec<Option<f64>>>| series.and_then(|s| s.first().copied().flatten());
    let hourly = conditions.hourly.as_ref();

    Some(TodaySnapshot {
        observed_at: current.time.clone(),
        temperature,
        windspeed: current.windspeed,
        winddirection: current.winddirection,
        precipitation: first(hourly.and_then(|h| h.precipitation.as_ref())),
        humidity: first(hourly.and_then(|h| h.relativehumidity_2m.as_ref())),
    })
}

/// Keeps only the temperature-related variables
pub fn temperature_forecast(forecast: &Forecast) -> Forecast {
    let names: Vec<&str> = Observation::FEATURES
        .iter()
        .copied()
        .filter(|name| name.starts_with("temp"))
        .collect();
    forecast.select(&names)
}
