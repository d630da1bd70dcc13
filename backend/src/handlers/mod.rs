//! HTTP handlers

pub mod dashboard;
pub mod forecast;
pub mod health;
pub mod pipeline;
pub mod weather;

pub use dashboard::get_dashboard;
pub use forecast::get_forecast;
pub use health::health_check;
pub use pipeline::run_pipeline;
pub use weather::get_observation;
