//! Dashboard view models
//!
//! The dashboard is made of independent sections. Each section carries its own
//! outcome so that one failing data source never hides the others.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::types::DateInterval;
use crate::Forecast;

/// Outcome of one dashboard section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Section<T> {
    Ready { data: T },
    Unavailable { message: String },
    Failed { message: String },
}

impl<T> Section<T> {
    pub fn ready(data: T) -> Self {
        Section::Ready { data }
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Section::Unavailable { message: message.into() }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Section::Failed { message: message.into() }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, Section::Ready { .. })
    }

    pub fn data(&self) -> Option<&T> {
        match self {
            Section::Ready { data } => Some(data),
            _ => None,
        }
    }
}

/// Live conditions for today
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TodaySnapshot {
    /// Provider timestamp of the reading, e.g. `2024-05-01T14:00`
    pub observed_at: Option<String>,
    pub temperature: f64,
    pub windspeed: Option<f64>,
    pub winddirection: Option<f64>,
    pub precipitation: Option<f64>,
    pub humidity: Option<f64>,
}

/// One labelled row of the yesterday table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YesterdayRow {
    pub label: String,
    pub values: Vec<Option<f64>>,
}

/// Yesterday's conditions at fixed hours
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YesterdayTable {
    pub date: NaiveDate,
    pub hours: Vec<String>,
    pub rows: Vec<YesterdayRow>,
}

impl YesterdayTable {
    pub const HOURS: [&'static str; 4] = ["00:00", "06:00", "12:00", "18:00"];

    /// Picks the readings for [`YesterdayTable::HOURS`] out of parallel hourly series.
    ///
    /// `times` holds provider timestamps formatted as `YYYY-MM-DDTHH:MM`. A missing
    /// hour, or a series shorter than the matched index, yields `None` for that cell.
    pub fn from_hourly(
        date: NaiveDate,
        times: &[String],
        temperature: &[Option<f64>],
        windspeed: &[Option<f64>],
        winddirection: &[Option<f64>],
    ) -> Self {
        let day = date.format("%Y-%m-%d").to_string();
        let indexes: Vec<Option<usize>> = Self::HOURS
            .iter()
            .map(|h| {
                let stamp = format!("{}T{}", day, h);
                times.iter().position(|t| *t == stamp)
            })
            .collect();

        let pick = |series: &[Option<f64>]| -> Vec<Option<f64>> {
            indexes
                .iter()
                .map(|idx| idx.and_then(|i| series.get(i).copied().flatten()))
                .collect()
        };

        YesterdayTable {
            date,
            hours: Self::HOURS.iter().map(|h| h.to_string()).collect(),
            rows: vec![
                YesterdayRow { label: "Temperature (°C)".to_string(), values: pick(temperature) },
                YesterdayRow { label: "Windspeed (km/h)".to_string(), values: pick(windspeed) },
                YesterdayRow { label: "Wind Direction (°)".to_string(), values: pick(winddirection) },
            ],
        }
    }
}

/// Summary of the model produced by a pipeline run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelSummary {
    pub lag_order: usize,
    pub strategy: String,
    pub observations: usize,
    pub aic: Option<f64>,
}

/// Outcome of one fetch, load and retrain run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineReport {
    /// Interval fetched from the archive, `None` when the store was already current
    pub fetched: Option<DateInterval>,
    pub rows_loaded: usize,
    pub rows_stored: i64,
    pub training_rows: usize,
    pub dropped_rows: usize,
    /// `None` when training produced no model
    pub model: Option<ModelSummary>,
}

/// Everything the dashboard renders
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardView {
    pub location: String,
    pub pipeline: Section<PipelineReport>,
    pub today: Section<TodaySnapshot>,
    pub forecast: Section<Forecast>,
    pub yesterday: Section<YesterdayTable>,
}
