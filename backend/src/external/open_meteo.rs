//! Open-Meteo API clients
//!
//! The archive API serves the daily history the store is filled from. The
//! forecast API serves today's live snapshot and yesterday's hourly readings.

use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use shared::{DateInterval, GeoPoint, DATE_FORMAT};

use crate::error::{AppError, AppResult};
use crate::external::{ArchiveSource, LiveSource};

/// Daily fields requested from the archive, in [`shared::Observation::FEATURES`] order
pub const DAILY_FIELDS: [&str; 5] = [
    "temperature_2m_max",
    "temperature_2m_min",
    "precipitation_sum",
    "windspeed_10m_max",
    "winddirection_10m_dominant",
];

const TODAY_HOURLY_FIELDS: &str = "temperature_2m,relativehumidity_2m,precipitation";
const YESTERDAY_HOURLY_FIELDS: &str = "temperature_2m,windspeed_10m,winddirection_10m";

/// Archive response: parallel arrays sharing the `time` axis
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyArchive {
    pub daily: DailySeries,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailySeries {
    pub time: Vec<String>,
    pub temperature_2m_max: Vec<Option<f64>>,
    pub temperature_2m_min: Vec<Option<f64>>,
    pub precipitation_sum: Vec<Option<f64>>,
    pub windspeed_10m_max: Vec<Option<f64>>,
    pub winddirection_10m_dominant: Vec<Option<f64>>,
}

impl DailySeries {
    /// Field arrays paired with their provider names, in feature order
    pub fn fields(&self) -> [(&'static str, &[Option<f64>]); 5] {
        [
            (DAILY_FIELDS[0], self.temperature_2m_max.as_slice()),
            (DAILY_FIELDS[1], self.temperature_2m_min.as_slice()),
            (DAILY_FIELDS[2], self.precipitation_sum.as_slice()),
            (DAILY_FIELDS[3], self.windspeed_10m_max.as_slice()),
            (DAILY_FIELDS[4], self.winddirection_10m_dominant.as_slice()),
        ]
    }
}

/// Forecast API response for today's conditions
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CurrentConditions {
    #[serde(default)]
    pub current_weather: Option<CurrentWeather>,
    #[serde(default)]
    pub hourly: Option<TodayHourly>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CurrentWeather {
    #[serde(default)]
    pub time: Option<String>,
    #[serde(default)]
    pub temperature: Option<f64>,
    #[serde(default)]
    pub windspeed: Option<f64>,
    #[serde(default)]
    pub winddirection: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TodayHourly {
    #[serde(default)]
    pub time: Vec<String>,
    #[serde(default)]
    pub relativehumidity_2m: Option<Vec<Option<f64>>>,
    #[serde(default)]
    pub precipitation: Option<Vec<Option<f64>>>,
}

/// Forecast API hourly response for a past day
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HourlySeries {
    #[serde(default)]
    pub hourly: HourlyValues,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HourlyValues {
    #[serde(default)]
    pub time: Vec<String>,
    #[serde(default)]
    pub temperature_2m: Vec<Option<f64>>,
    #[serde(default)]
    pub windspeed_10m: Vec<Option<f64>>,
    #[serde(default)]
    pub winddirection_10m: Vec<Option<f64>>,
}

fn build_http_client(timeout_secs: u64) -> AppResult<Client> {
    Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| AppError::Configuration(format!("Failed to build HTTP client: {}", e)))
}

/// Sends a GET request and decodes the JSON body.
///
/// Transport failures and non-success statuses are provider errors. A body
/// that does not decode into `T` is a data-shape error.
async fn get_json<T: DeserializeOwned>(
    client: &Client,
    url: &str,
    query: &[(&str, String)],
) -> AppResult<T> {
    let response = client
        .get(url)
        .query(query)
        .send()
        .await
        .map_err(|e| AppError::Provider(format!("Weather API request failed: {}", e)))?;

    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        return Err(AppError::Provider(format!(
            "Weather API error: {} - {}",
            status, body
        )));
    }

    let body = response
        .text()
        .await
        .map_err(|e| AppError::Provider(format!("Failed to read weather response: {}", e)))?;

    serde_json::from_str(&body)
        .map_err(|e| AppError::DataShape(format!("Failed to parse weather response: {}", e)))
}

/// Client for the historical archive API
#[derive(Clone)]
pub struct ArchiveClient {
    client: Client,
    base_url: String,
    point: GeoPoint,
    timezone: String,
}

impl ArchiveClient {
    pub fn new(
        base_url: String,
        point: GeoPoint,
        timezone: String,
        timeout_secs: u64,
    ) -> AppResult<Self> {
        Ok(Self {
            client: build_http_client(timeout_secs)?,
            base_url,
            point,
            timezone,
        })
    }

    fn query(&self, interval: DateInterval) -> Vec<(&'static str, String)> {
        vec![
            ("latitude", self.point.latitude.to_string()),
            ("longitude", self.point.longitude.to_string()),
            ("start_date", interval.start.format(DATE_FORMAT).to_string()),
            ("end_date", interval.end.format(DATE_FORMAT).to_string()),
            ("daily", DAILY_FIELDS.join(",")),
            ("timezone", self.timezone.clone()),
        ]
    }
}

#[async_trait]
impl ArchiveSource for ArchiveClient {
    async fn fetch_daily(&self, interval: DateInterval) -> AppResult<DailyArchive> {
        tracing::debug!("Requesting archive {} for {}", interval, self.point);
        get_json(&self.client, &self.base_url, &self.query(interval)).await
    }
}

/// Client for the live forecast API
#[derive(Clone)]
pub struct LiveClient {
    client: Client,
    base_url: String,
    point: GeoPoint,
    timezone: String,
}

impl LiveClient {
    pub fn new(
        base_url: String,
        point: GeoPoint,
        timezone: String,
        timeout_secs: u64,
    ) -> AppResult<Self> {
        Ok(Self {
            client: build_http_client(timeout_secs)?,
            base_url,
            point,
            timezone,
        })
    }

    fn base_query(&self) -> Vec<(&'static str, String)> {
        vec![
            ("latitude", self.point.latitude.to_string()),
            ("longitude", self.point.longitude.to_string()),
            ("timezone", self.timezone.clone()),
        ]
    }
}

#[async_trait]
impl LiveSource for LiveClient {
    async fn current_conditions(&self) -> AppResult<CurrentConditions> {
        let mut query = self.base_query();
        query.push(("current_weather", "true".to_string()));
        query.push(("hourly", TODAY_HOURLY_FIELDS.to_string()));

        get_json(&self.client, &self.base_url, &query).await
    }

    async fn hourly_for_date(&self, date: NaiveDate) -> AppResult<HourlySeries> {
        let day = date.format(DATE_FORMAT).to_string();
        let mut query = self.base_query();
        query.push(("hourly", YESTERDAY_HOURLY_FIELDS.to_string()));
        query.push(("start_date", day.clone()));
        query.push(("end_date", day));

        get_json(&self.client, &self.base_url, &query).await
    }
}
