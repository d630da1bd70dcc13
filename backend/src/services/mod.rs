//! Pipeline services: storage, fetching, loading, training and forecasting

pub mod dashboard;
pub mod forecaster;
pub mod gap_fill;
pub mod loader;
pub mod pipeline;
pub mod registry;
pub mod store;
pub mod trainer;
pub mod var_model;

pub use dashboard::DashboardService;
pub use forecaster::Forecaster;
pub use gap_fill::GapFiller;
pub use pipeline::Pipeline;
pub use registry::{ModelArtifact, ModelRegistry};
pub use store::ObservationStore;
pub use trainer::{ModelTrainer, ObservationMatrix, TrainingStrategy};
pub use var_model::{OlsVarEstimator, VarEstimator};
