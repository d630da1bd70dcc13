//! Shared fixtures for integration tests
//!
//! In-memory SQLite with migrations applied, deterministic fake providers,
//! and a configuration pointing the model artifact into a temp directory.

#![allow(dead_code)]

use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{Datelike, NaiveDate};
use shared::{DateInterval, Observation};
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};

use weather_forecast_backend::config::{
    ArchiveConfig, Config, DashboardConfig, DatabaseConfig, LiveConfig, LocationConfig,
    ModelConfig, ServerConfig, StrategyKind,
};
use weather_forecast_backend::error::{AppError, AppResult};
use weather_forecast_backend::external::{
    ArchiveSource, CurrentConditions, CurrentWeather, DailyArchive, DailySeries, HourlySeries,
    HourlyValues, LiveSource, TodayHourly,
};
use weather_forecast_backend::AppState;

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Single-connection in-memory database, so every query sees the same data
pub async fn test_pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    sqlx::migrate!("./migrations").run(&pool).await.unwrap();
    pool
}

pub fn test_config(artifact_path: &Path, epoch_start: NaiveDate, lag_order: usize) -> Config {
    Config {
        environment: "test".to_string(),
        server: ServerConfig::default(),
        database: DatabaseConfig {
            url: "sqlite::memory:".to_string(),
            max_connections: 1,
        },
        location: LocationConfig {
            name: "Johannesburg".to_string(),
            latitude: -26.2,
            longitude: 28.0,
            timezone: "Africa/Johannesburg".to_string(),
        },
        archive: ArchiveConfig {
            base_url: "http://127.0.0.1:9/archive".to_string(),
            epoch_start,
            timeout_secs: 1,
        },
        live: LiveConfig {
            base_url: "http://127.0.0.1:9/forecast".to_string(),
            latitude: -26.1135,
            longitude: 28.0666,
            timezone: "auto".to_string(),
            timeout_secs: 1,
        },
        model: ModelConfig {
            artifact_path: artifact_path.to_string_lossy().into_owned(),
            strategy: StrategyKind::Fixed,
            lag_order,
            max_lag_order: 15,
        },
        dashboard: DashboardConfig { forecast_horizon: 7 },
    }
}

/// Uniform value in [0, 1) derived from a seed with the splitmix64 finalizer.
///
/// The xor-shifts matter: an affine generator over consecutive seeds gives
/// columns that are progressions mod 1, which makes short VAR designs singular.
fn unit(seed: u64) -> f64 {
    let mut z = seed.wrapping_add(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^= z >> 31;
    (z >> 11) as f64 / (1u64 << 53) as f64
}

/// Deterministic feature values for a day, independent across days and
/// columns
pub fn synthetic_values(day: NaiveDate) -> [f64; 5] {
    let base = day.num_days_from_ce() as u64 * 16;
    [
        22.0 + 8.0 * unit(base),
        10.0 + 6.0 * unit(base + 1),
        5.0 * unit(base + 2),
        8.0 + 12.0 * unit(base + 3),
        360.0 * unit(base + 4),
    ]
}

pub fn synthetic_observation(day: NaiveDate) -> Observation {
    let v = synthetic_values(day);
    Observation {
        date: day,
        temp_max: Some(v[0]),
        temp_min: Some(v[1]),
        precipitation: Some(v[2]),
        windspeed_max: Some(v[3]),
        winddirection_dominant: Some(v[4]),
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ArchiveMode {
    Healthy,
    /// Provider outage
    Unavailable,
    /// `windspeed_10m_max` one value short
    ShortField,
}

/// Archive serving synthetic data for any interval and recording each request
pub struct FakeArchive {
    mode: Mutex<ArchiveMode>,
    null_temp_max_on: Option<NaiveDate>,
    calls: Mutex<Vec<DateInterval>>,
}

impl FakeArchive {
    pub fn new(mode: ArchiveMode) -> Self {
        Self {
            mode: Mutex::new(mode),
            null_temp_max_on: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn healthy() -> Self {
        Self::new(ArchiveMode::Healthy)
    }

    /// Reports `null` for `temp_max` on the given day
    pub fn with_null_on(mut self, day: NaiveDate) -> Self {
        self.null_temp_max_on = Some(day);
        self
    }

    pub fn set_mode(&self, mode: ArchiveMode) {
        *self.mode.lock().unwrap() = mode;
    }

    pub fn calls(&self) -> Vec<DateInterval> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ArchiveSource for FakeArchive {
    async fn fetch_daily(&self, interval: DateInterval) -> AppResult<DailyArchive> {
        self.calls.lock().unwrap().push(interval);
        let mode = *self.mode.lock().unwrap();

        if mode == ArchiveMode::Unavailable {
            return Err(AppError::Provider(
                "Weather API error: 503 Service Unavailable".to_string(),
            ));
        }

        let mut daily = DailySeries {
            time: Vec::new(),
            temperature_2m_max: Vec::new(),
            temperature_2m_min: Vec::new(),
            precipitation_sum: Vec::new(),
            windspeed_10m_max: Vec::new(),
            winddirection_10m_dominant: Vec::new(),
        };
        for day in interval.iter_days() {
            let v = synthetic_values(day);
            daily.time.push(day.format("%Y-%m-%d").to_string());
            daily.temperature_2m_max.push(if Some(day) == self.null_temp_max_on {
                None
            } else {
                Some(v[0])
            });
            daily.temperature_2m_min.push(Some(v[1]));
            daily.precipitation_sum.push(Some(v[2]));
            daily.windspeed_10m_max.push(Some(v[3]));
            daily.winddirection_10m_dominant.push(Some(v[4]));
        }
        if mode == ArchiveMode::ShortField {
            daily.windspeed_10m_max.pop();
        }

        Ok(DailyArchive { daily })
    }
}

/// Live provider with canned responses; `None` fields fail as provider errors
#[derive(Default)]
pub struct FakeLive {
    pub current: Option<CurrentConditions>,
    pub hourly: Option<HourlySeries>,
}

impl FakeLive {
    pub fn down() -> Self {
        Self::default()
    }

    /// Current conditions and a full hourly day for `yesterday`
    pub fn up(yesterday: NaiveDate) -> Self {
        let day = yesterday.format("%Y-%m-%d").to_string();
        Self {
            current: Some(CurrentConditions {
                current_weather: Some(CurrentWeather {
                    time: Some("2024-05-01T14:00".to_string()),
                    temperature: Some(19.5),
                    windspeed: Some(11.2),
                    winddirection: Some(290.0),
                }),
                hourly: Some(TodayHourly {
                    time: vec![format!("{}T00:00", day)],
                    relativehumidity_2m: Some(vec![Some(58.0)]),
                    precipitation: Some(vec![Some(0.2)]),
                }),
            }),
            hourly: Some(HourlySeries {
                hourly: HourlyValues {
                    time: (0..24).map(|h| format!("{}T{:02}:00", day, h)).collect(),
                    temperature_2m: (0..24).map(|h| Some(10.0 + h as f64)).collect(),
                    windspeed_10m: (0..24).map(|h| Some(5.0 + h as f64 / 2.0)).collect(),
                    winddirection_10m: (0..24).map(|_| Some(180.0)).collect(),
                },
            }),
        }
    }
}

#[async_trait]
impl LiveSource for FakeLive {
    async fn current_conditions(&self) -> AppResult<CurrentConditions> {
        self.current
            .clone()
            .ok_or_else(|| AppError::Provider("live provider down".to_string()))
    }

    async fn hourly_for_date(&self, _date: NaiveDate) -> AppResult<HourlySeries> {
        self.hourly
            .clone()
            .ok_or_else(|| AppError::Provider("live provider down".to_string()))
    }
}

pub async fn test_state(
    config: Config,
    archive: Arc<FakeArchive>,
    live: FakeLive,
) -> AppState {
    let pool = test_pool().await;
    AppState::new(config, pool, archive, Arc::new(live))
}
