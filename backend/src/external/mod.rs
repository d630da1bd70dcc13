//! External API integrations
//!
//! The pipeline only talks to providers through [`ArchiveSource`] and
//! [`LiveSource`], so tests and alternative providers can stand in for the
//! Open-Meteo clients.

pub mod open_meteo;

use async_trait::async_trait;
use chrono::NaiveDate;
use shared::DateInterval;

use crate::error::AppResult;

pub use open_meteo::{
    ArchiveClient, CurrentConditions, CurrentWeather, DailyArchive, DailySeries, HourlySeries,
    HourlyValues, LiveClient, TodayHourly,
};

/// Historical daily observations, one request per date interval
#[async_trait]
pub trait ArchiveSource: Send + Sync {
    async fn fetch_daily(&self, interval: DateInterval) -> AppResult<DailyArchive>;
}

/// Near-real-time conditions, read directly without going through the store
#[async_trait]
pub trait LiveSource: Send + Sync {
    /// Current snapshot plus today's hourly series
    async fn current_conditions(&self) -> AppResult<CurrentConditions>;

    /// Hourly series for a single past day
    async fn hourly_for_date(&self, date: NaiveDate) -> AppResult<HourlySeries>;
}
