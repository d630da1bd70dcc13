//! The fetch, load and retrain run
//!
//! Nothing runs on construction. Each call to [`Pipeline::run`] fills the
//! store's gap up to yesterday, then retrains on the full history and
//! replaces the model artifact. Runs are idempotent: a second run on the
//! same day fetches nothing and refits on the same data.

use std::sync::Arc;

use chrono::NaiveDate;
use shared::PipelineReport;
use sqlx::SqlitePool;

use crate::config::Config;
use crate::error::AppResult;
use crate::external::ArchiveSource;
use crate::services::gap_fill::GapFiller;
use crate::services::loader;
use crate::services::registry::ModelRegistry;
use crate::services::store::ObservationStore;
use crate::services::trainer::{ModelTrainer, ObservationMatrix, TrainingStrategy};

#[derive(Clone)]
pub struct Pipeline {
    store: ObservationStore,
    archive: Arc<dyn ArchiveSource>,
    gap_filler: GapFiller,
    trainer: ModelTrainer,
    strategy: TrainingStrategy,
    registry: ModelRegistry,
}

impl Pipeline {
    pub fn new(
        store: ObservationStore,
        archive: Arc<dyn ArchiveSource>,
        gap_filler: GapFiller,
        strategy: TrainingStrategy,
        registry: ModelRegistry,
    ) -> Self {
        Self {
            store,
            archive,
            gap_filler,
            trainer: ModelTrainer::default(),
            strategy,
            registry,
        }
    }

    pub fn from_config(config: &Config, db: SqlitePool, archive: Arc<dyn ArchiveSource>) -> Self {
        Self::new(
            ObservationStore::new(db),
            archive,
            GapFiller::new(config.archive.epoch_start),
            config.model.training_strategy(),
            ModelRegistry::new(&config.model.artifact_path),
        )
    }

    pub fn store(&self) -> &ObservationStore {
        &self.store
    }

    pub fn registry(&self) -> &ModelRegistry {
        &self.registry
    }

    /// Runs one pass for `today`.
    ///
    /// Fetch and shape errors abort before retraining, leaving the previous
    /// artifact in place. A failed fit is not an error: the report carries
    /// `model: None` and the previous artifact stays.
    pub async fn run(&self, today: NaiveDate) -> AppResult<PipelineReport> {
        tracing::info!("Pipeline run for {}", today);

        let gap = self
            .gap_filler
            .fetch_missing(&self.store, self.archive.as_ref(), today)
            .await?;

        let (fetched, rows_loaded) = match gap {
            Some(gap) => {
                let loaded = loader::load(&self.store, &gap.archive).await?;
                (Some(gap.interval), loaded)
            }
            None => (None, 0),
        };

        let rows_stored = self.store.count().await?;
        let observations = self.store.read_all().await?;
        let matrix = ObservationMatrix::from_observations(&observations);
        tracing::info!(
            "Training on {} of {} stored rows ({} dropped)",
            matrix.rows(),
            rows_stored,
            matrix.dropped()
        );

        let model = self
            .trainer
            .train_and_persist(&matrix, self.strategy, &self.registry)
            .map(|artifact| artifact.summary());

        Ok(PipelineReport {
            fetched,
            rows_loaded,
            rows_stored,
            training_rows: matrix.rows(),
            dropped_rows: matrix.dropped(),
            model,
        })
    }
}
