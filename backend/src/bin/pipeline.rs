//! One-shot pipeline run for an external scheduler
//!
//! Fills the store up to yesterday, retrains the model and prints the run
//! report as JSON. Exits non-zero when the fetch or load fails.

use chrono::Local;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use weather_forecast_backend::{connect_database, AppState, Config};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "wf_pipeline=info,weather_forecast_backend=info,sqlx=warn".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    dotenvy::dotenv().ok();
    let config = Config::load()?;
    let db_pool = connect_database(&config.database).await?;
    let state = AppState::with_open_meteo(config, db_pool)?;

    let today = Local::now().date_naive();
    let report = match state.pipeline.run(today).await {
        Ok(report) => report,
        Err(e) => {
            tracing::error!("Pipeline run failed: {}", e);
            return Err(e.into());
        }
    };

    if report.model.is_none() {
        tracing::warn!("Run finished without a new model");
    }
    println!("{}", serde_json::to_string_pretty(&report)?);

    Ok(())
}
