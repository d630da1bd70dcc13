//! Weather Forecast Pipeline - HTTP server
//!
//! Serves observation lookups, forecasts and the dashboard view. Loading the
//! dashboard runs the pipeline first, so the store and model stay current
//! without a separate scheduler.

use std::net::SocketAddr;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use weather_forecast_backend::{connect_database, create_app, AppState, Config};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "wf_server=debug,weather_forecast_backend=debug,tower_http=debug,sqlx=warn".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    dotenvy::dotenv().ok();
    let config = Config::load()?;

    tracing::info!("Starting Weather Forecast Server");
    tracing::info!("Environment: {}", config.environment);

    tracing::info!("Opening database {}", config.database.url);
    let db_pool = connect_database(&config.database).await?;
    tracing::info!("Database ready");

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    let state = AppState::with_open_meteo(config, db_pool)?;

    // Build application
    let app = create_app(state);

    tracing::info!("Listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
