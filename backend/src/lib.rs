//! Weather forecast pipeline backend
//!
//! Keeps a local SQLite history of daily observations for one location,
//! fills it incrementally from the Open-Meteo archive, retrains a VAR model
//! on every run and serves forecasts, lookups and a dashboard view over HTTP.

use std::{str::FromStr, sync::Arc, time::Duration};

use axum::{routing::get, Router};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use tokio::sync::Mutex;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

pub mod config;
pub mod error;
pub mod external;
pub mod handlers;
pub mod routes;
pub mod services;

pub use crate::config::Config;

use crate::config::DatabaseConfig;
use crate::error::AppResult;
use crate::external::{ArchiveClient, ArchiveSource, LiveClient, LiveSource};
use crate::services::{DashboardService, Pipeline};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub config: Arc<Config>,
    pub pipeline: Arc<Pipeline>,
    pub live: Arc<dyn LiveSource>,
    /// Held for the duration of a pipeline run
    pub pipeline_lock: Arc<Mutex<()>>,
}

impl AppState {
    pub fn new(
        config: Config,
        db: SqlitePool,
        archive: Arc<dyn ArchiveSource>,
        live: Arc<dyn LiveSource>,
    ) -> Self {
        let pipeline = Pipeline::from_config(&config, db.clone(), archive);
        Self {
            db,
            config: Arc::new(config),
            pipeline: Arc::new(pipeline),
            live,
            pipeline_lock: Arc::new(Mutex::new(())),
        }
    }

    /// State wired to the Open-Meteo clients
    pub fn with_open_meteo(config: Config, db: SqlitePool) -> AppResult<Self> {
        let archive = ArchiveClient::new(
            config.archive.base_url.clone(),
            config.location.point(),
            config.location.timezone.clone(),
            config.archive.timeout_secs,
        )?;
        let live = LiveClient::new(
            config.live.base_url.clone(),
            config.live.point(),
            config.live.timezone.clone(),
            config.live.timeout_secs,
        )?;

        Ok(Self::new(config, db, Arc::new(archive), Arc::new(live)))
    }

    pub fn dashboard(&self) -> DashboardService {
        DashboardService::new(
            self.pipeline.clone(),
            self.live.clone(),
            self.pipeline_lock.clone(),
            self.config.location.name.clone(),
            self.config.dashboard.forecast_horizon,
        )
    }
}

/// Opens the SQLite pool, creating the database file if needed, and applies
/// migrations
pub async fn connect_database(config: &DatabaseConfig) -> anyhow::Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str(&config.url)?.create_if_missing(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(Duration::from_secs(30))
        .connect_with(options)
        .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;
    Ok(pool)
}

/// Create the application router with all routes and middleware
pub fn create_app(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(root))
        .merge(routes::api_routes())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Root endpoint
async fn root() -> &'static str {
    "Weather Forecast Pipeline API v1.0"
}
