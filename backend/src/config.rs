//! Configuration management for the weather forecast pipeline
//!
//! Supports hierarchical configuration loading:
//! 1. Default values in code
//! 2. Configuration files (development.toml, production.toml)
//! 3. Environment variable overrides with WF_ prefix

use chrono::NaiveDate;
use config::{ConfigError, Environment, File};
use serde::Deserialize;
use shared::{validate_horizon, validate_latitude, validate_longitude, GeoPoint};

use crate::services::trainer::TrainingStrategy;

/// Main application configuration
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Current environment (development, production)
    pub environment: String,

    /// Server configuration
    pub server: ServerConfig,

    /// Database configuration
    pub database: DatabaseConfig,

    /// Location the archive is fetched for
    pub location: LocationConfig,

    /// Historical archive API configuration
    pub archive: ArchiveConfig,

    /// Live conditions API configuration
    pub live: LiveConfig,

    /// Model training configuration
    pub model: ModelConfig,

    /// Dashboard configuration
    pub dashboard: DashboardConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    /// Server port
    pub port: u16,

    /// Server host
    pub host: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    /// SQLite connection URL
    pub url: String,

    /// Maximum number of connections in the pool
    pub max_connections: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LocationConfig {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,

    /// IANA timezone the archive aggregates days in
    pub timezone: String,
}

impl LocationConfig {
    pub fn point(&self) -> GeoPoint {
        GeoPoint::new(self.latitude, self.longitude)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ArchiveConfig {
    /// Archive API endpoint
    pub base_url: String,

    /// First day fetched when the store is empty
    pub epoch_start: NaiveDate,

    /// Request timeout in seconds
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LiveConfig {
    /// Forecast API endpoint used for today's and yesterday's conditions
    pub base_url: String,
    pub latitude: f64,
    pub longitude: f64,
    pub timezone: String,

    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl LiveConfig {
    pub fn point(&self) -> GeoPoint {
        GeoPoint::new(self.latitude, self.longitude)
    }
}

/// How the lag order is chosen
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    Fixed,
    AutoAic,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ModelConfig {
    /// File holding the latest fitted model
    pub artifact_path: String,

    pub strategy: StrategyKind,

    /// Lag order used by the fixed strategy
    pub lag_order: usize,

    /// Highest lag order evaluated by the AIC strategy
    pub max_lag_order: usize,
}

impl ModelConfig {
    pub fn training_strategy(&self) -> TrainingStrategy {
        match self.strategy {
            StrategyKind::Fixed => TrainingStrategy::Fixed(self.lag_order),
            StrategyKind::AutoAic => TrainingStrategy::AutoAic {
                max_order: self.max_lag_order,
            },
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct DashboardConfig {
    /// Days forecast on the dashboard
    pub forecast_horizon: usize,
}

impl Config {
    /// Load configuration from files and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let environment = std::env::var("WF_ENVIRONMENT").unwrap_or_else(|_| "development".into());

        let config = config::Config::builder()
            // Start with default values
            .set_default("environment", environment.clone())?
            .set_default("server.port", 8000)?
            .set_default("server.host", "0.0.0.0")?
            .set_default("database.url", "sqlite://weather.db")?
            .set_default("database.max_connections", 5)?
            .set_default("location.name", "Johannesburg")?
            .set_default("location.latitude", -26.2)?
            .set_default("location.longitude", 28.0)?
            .set_default("location.timezone", "Africa/Johannesburg")?
            .set_default("archive.base_url", "https://archive-api.open-meteo.com/v1/archive")?
            .set_default("archive.epoch_start", "2005-01-01")?
            .set_default("archive.timeout_secs", 120)?
            .set_default("live.base_url", "https://api.open-meteo.com/v1/forecast")?
            .set_default("live.latitude", -26.1135)?
            .set_default("live.longitude", 28.0666)?
            .set_default("live.timezone", "auto")?
            .set_default("live.timeout_secs", 30)?
            .set_default("model.artifact_path", "var_model_latest.json")?
            .set_default("model.strategy", "fixed")?
            .set_default("model.lag_order", 5)?
            .set_default("model.max_lag_order", 15)?
            .set_default("dashboard.forecast_horizon", 7)?
            // Load environment-specific config file
            .add_source(File::with_name(&format!("config/{}", environment)).required(false))
            // Override with environment variables (WF_ prefix)
            .add_source(
                Environment::with_prefix("WF")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: Config = config.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the pipeline cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: &str| ConfigError::Message(msg.to_string());

        validate_latitude(self.location.latitude).map_err(invalid)?;
        validate_longitude(self.location.longitude).map_err(invalid)?;
        validate_latitude(self.live.latitude).map_err(invalid)?;
        validate_longitude(self.live.longitude).map_err(invalid)?;
        validate_horizon(self.dashboard.forecast_horizon).map_err(invalid)?;

        match self.model.strategy {
            StrategyKind::Fixed if self.model.lag_order == 0 => {
                Err(invalid("model.lag_order must be at least 1"))
            }
            StrategyKind::AutoAic if self.model.max_lag_order == 0 => {
                Err(invalid("model.max_lag_order must be at least 1"))
            }
            _ => Ok(()),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 8000,
            host: "0.0.0.0".to_string(),
        }
    }
}

#[cfg(test)]
pub(crate) fn test_config() -> Config {
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
            epoch_start: NaiveDate::from_ymd_opt(2005, 1, 1).unwrap(),
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
            artifact_path: "var_model_latest.json".to_string(),
            strategy: StrategyKind::Fixed,
            lag_order: 5,
            max_lag_order: 15,
        },
        dashboard: DashboardConfig { forecast_horizon: 7 },
    }
}
