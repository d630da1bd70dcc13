//! Model training over the accumulated observation history

use chrono::{NaiveDate, Utc};
use ndarray::{s, Array2, ArrayView2};
use shared::Observation;

use crate::services::registry::{ArtifactMetadata, ModelArtifact, ModelRegistry};
use crate::services::var_model::{select_order, OlsVarEstimator, VarError, VarEstimator, VarFit};

/// Complete observation rows as a T x K matrix in date order.
///
/// Rows with any missing or non-finite feature are dropped, not imputed.
#[derive(Debug, Clone, PartialEq)]
pub struct ObservationMatrix {
    dates: Vec<NaiveDate>,
    values: Array2<f64>,
    dropped: usize,
}

impl ObservationMatrix {
    pub fn from_observations(rows: &[Observation]) -> Self {
        let k = Observation::FEATURES.len();
        let mut dates = Vec::with_capacity(rows.len());
        let mut flat = Vec::with_capacity(rows.len() * k);

        let mut sorted: Vec<&Observation> = rows.iter().collect();
        sorted.sort_by_key(|r| r.date);

        for row in sorted {
            if let Some(values) = row.complete_values() {
                dates.push(row.date);
                flat.extend(values);
            }
        }

        let dropped = rows.len() - dates.len();
        if dropped > 0 {
            tracing::warn!(
                "Dropped {} incomplete observation rows; training on {}",
                dropped,
                dates.len()
            );
        }

        let values = Array2::from_shape_vec((dates.len(), k), flat)
            .unwrap_or_else(|_| Array2::zeros((0, k)));

        Self {
            dates,
            values,
            dropped,
        }
    }

    pub fn variables(&self) -> Vec<String> {
        Observation::FEATURES.iter().map(|v| v.to_string()).collect()
    }

    pub fn rows(&self) -> usize {
        self.values.nrows()
    }

    pub fn is_empty(&self) -> bool {
        self.rows() == 0
    }

    /// Incomplete rows excluded when the matrix was built
    pub fn dropped(&self) -> usize {
        self.dropped
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.dates.last().copied()
    }

    pub fn view(&self) -> ArrayView2<'_, f64> {
        self.values.view()
    }

    /// The last `n` rows, or every row when there are fewer
    pub fn tail(&self, n: usize) -> ArrayView2<'_, f64> {
        let start = self.rows().saturating_sub(n);
        self.values.slice(s![start.., ..])
    }
}

/// How the lag order is chosen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrainingStrategy {
    Fixed(usize),
    AutoAic { max_order: usize },
}

impl TrainingStrategy {
    pub fn label(&self) -> &'static str {
        match self {
            TrainingStrategy::Fixed(_) => "fixed",
            TrainingStrategy::AutoAic { .. } => "auto_aic",
        }
    }
}

/// Fits VAR models and turns them into artifacts
#[derive(Debug, Clone, Default)]
pub struct ModelTrainer<E = OlsVarEstimator> {
    estimator: E,
}

impl<E: VarEstimator> ModelTrainer<E> {
    pub fn new(estimator: E) -> Self {
        Self { estimator }
    }

    /// Fits a model, or returns `None` when estimation fails
    pub fn train(
        &self,
        matrix: &ObservationMatrix,
        strategy: TrainingStrategy,
    ) -> Option<ModelArtifact> {
        match self.fit(matrix, strategy) {
            Ok(fit) => {
                tracing::info!(
                    "Fitted VAR({}) on {} rows ({}), AIC {:?}",
                    fit.coefficients.order(),
                    matrix.rows(),
                    strategy.label(),
                    fit.aic
                );
                Some(ModelArtifact {
                    variables: matrix.variables(),
                    lag_order: fit.coefficients.order(),
                    coefficients: fit.coefficients,
                    metadata: ArtifactMetadata {
                        trained_at: Utc::now(),
                        observations: matrix.rows(),
                        last_date: matrix.last_date(),
                        aic: fit.aic,
                        strategy: strategy.label().to_string(),
                    },
                })
            }
            Err(e) => {
                tracing::warn!(
                    "No model produced from {} rows ({}): {}",
                    matrix.rows(),
                    strategy.label(),
                    e
                );
                None
            }
        }
    }

    /// Trains and replaces the registry's artifact. A failed save is logged
    /// and reported as no model.
    pub fn train_and_persist(
        &self,
        matrix: &ObservationMatrix,
        strategy: TrainingStrategy,
        registry: &ModelRegistry,
    ) -> Option<ModelArtifact> {
        let artifact = self.train(matrix, strategy)?;

        match registry.save(&artifact) {
            Ok(()) => Some(artifact),
            Err(e) => {
                tracing::error!("Failed to persist model: {}", e);
                None
            }
        }
    }

    fn fit(
        &self,
        matrix: &ObservationMatrix,
        strategy: TrainingStrategy,
    ) -> Result<VarFit, VarError> {
        match strategy {
            TrainingStrategy::Fixed(order) => self.estimator.fit(matrix.view(), order),
            TrainingStrategy::AutoAic { max_order } => {
                let selection = select_order(&self.estimator, matrix.view(), max_order)?;
                tracing::info!(
                    "AIC selected lag order {} out of {}",
                    selection.selected,
                    selection.table.len()
                );
                self.estimator.fit(matrix.view(), selection.selected)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn obs(day: u32, temp_max: Option<f64>) -> Observation {
        Observation {
            date: NaiveDate::from_ymd_opt(2024, 1, day).unwrap(),
            temp_max,
            temp_min: Some(12.0 + day as f64 * 0.1),
            precipitation: Some(0.0),
            windspeed_max: Some(10.0),
            winddirection_dominant: Some(90.0),
        }
    }

    #[test]
    fn test_incomplete_rows_are_dropped() {
        let rows = vec![
            obs(3, Some(25.0)),
            obs(1, Some(24.0)),
            obs(2, None),
            obs(4, Some(f64::NAN)),
        ];
        let matrix = ObservationMatrix::from_observations(&rows);

        assert_eq!(matrix.rows(), 2);
        assert_eq!(matrix.dropped(), 2);
        assert_eq!(
            matrix.dates(),
            &[
                NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
                NaiveDate::from_ymd_opt(2024, 1, 3).unwrap()
            ]
        );
        assert_eq!(matrix.view()[[0, 0]], 24.0);
    }

    #[test]
    fn test_tail_takes_latest_rows() {
        let rows: Vec<Observation> = (1..=6).map(|d| obs(d, Some(d as f64))).collect();
        let matrix = ObservationMatrix::from_observations(&rows);

        let tail = matrix.tail(2);
        assert_eq!(tail.nrows(), 2);
        assert_eq!(tail[[0, 0]], 5.0);
        assert_eq!(tail[[1, 0]], 6.0);
        assert_eq!(matrix.tail(10).nrows(), 6);
    }

    #[test]
    fn test_empty_matrix_gives_no_model() {
        let matrix = ObservationMatrix::from_observations(&[]);
        assert!(matrix.is_empty());
        assert!(ModelTrainer::<OlsVarEstimator>::default()
            .train(&matrix, TrainingStrategy::Fixed(5))
            .is_none());
    }

    #[test]
    fn test_strategy_labels() {
        assert_eq!(TrainingStrategy::Fixed(5).label(), "fixed");
        assert_eq!(TrainingStrategy::AutoAic { max_order: 15 }.label(), "auto_aic");
    }
}
