//! Fitted model artifact and its on-disk slot
//!
//! There is a single "latest" slot. Saving replaces the whole file through a
//! temp file in the same directory followed by a rename, so readers only ever
//! see a complete artifact.

use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use shared::{ModelSummary, Observation};
use tempfile::NamedTempFile;

use crate::error::{AppError, AppResult};
use crate::services::var_model::VarCoefficients;

/// Persisted VAR model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub variables: Vec<String>,
    pub lag_order: usize,
    pub coefficients: VarCoefficients,
    pub metadata: ArtifactMetadata,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactMetadata {
    pub trained_at: DateTime<Utc>,
    /// Complete rows the model was fitted on
    pub observations: usize,
    pub last_date: Option<NaiveDate>,
    pub aic: Option<f64>,
    pub strategy: String,
}

impl ModelArtifact {
    /// Checks the artifact is usable with the current feature set
    pub fn validate(&self) -> Result<(), String> {
        if self.variables.iter().map(String::as_str).ne(Observation::FEATURES.iter().copied()) {
            return Err(format!(
                "variables {:?} do not match {:?}",
                self.variables,
                Observation::FEATURES
            ));
        }
        if self.lag_order == 0 || self.coefficients.order() != self.lag_order {
            return Err(format!(
                "lag order {} does not match {} coefficient matrices",
                self.lag_order,
                self.coefficients.order()
            ));
        }
        if self.coefficients.dimension() != self.variables.len() {
            return Err(format!(
                "intercept has {} entries for {} variables",
                self.coefficients.dimension(),
                self.variables.len()
            ));
        }
        self.coefficients.check_shape().map_err(|e| e.to_string())
    }

    pub fn summary(&self) -> ModelSummary {
        ModelSummary {
            lag_order: self.lag_order,
            strategy: self.metadata.strategy.clone(),
            observations: self.metadata.observations,
            aic: self.metadata.aic,
        }
    }
}

/// Location of the latest model artifact
#[derive(Debug, Clone)]
pub struct ModelRegistry {
    path: PathBuf,
}

impl ModelRegistry {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Atomically replaces the stored artifact
    pub fn save(&self, artifact: &ModelArtifact) -> AppResult<()> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let write_error =
            |e: std::io::Error| AppError::ModelArtifact(format!("failed to write {}: {}", self.path.display(), e));

        let mut file = NamedTempFile::new_in(dir).map_err(write_error)?;
        serde_json::to_writer_pretty(&mut file, artifact)
            .map_err(|e| AppError::ModelArtifact(format!("failed to serialize model: {}", e)))?;
        file.flush().map_err(write_error)?;
        file.persist(&self.path).map_err(|e| write_error(e.error))?;

        tracing::info!("Saved model artifact to {}", self.path.display());
        Ok(())
    }

    /// Reads and validates the stored artifact
    pub fn load(&self) -> AppResult<ModelArtifact> {
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(AppError::ModelArtifact("not found".to_string()));
            }
            Err(e) => {
                return Err(AppError::ModelArtifact(format!(
                    "failed to read {}: {}",
                    self.path.display(),
                    e
                )));
            }
        };

        let artifact: ModelArtifact = serde_json::from_str(&contents)
            .map_err(|e| AppError::ModelArtifact(format!("corrupt artifact: {}", e)))?;
        artifact
            .validate()
            .map_err(|e| AppError::ModelArtifact(format!("corrupt artifact: {}", e)))?;

        Ok(artifact)
    }
}

#[cfg(test)]
pub(crate) fn sample_artifact(lag_order: usize) -> ModelArtifact {
    let k = Observation::FEATURES.len();
    let identity: Vec<Vec<f64>> = (0..k)
        .map(|i| (0..k).map(|j| if i == j { 0.5 } else { 0.0 }).collect())
        .collect();

    ModelArtifact {
        variables: Observation::FEATURES.iter().map(|v| v.to_string()).collect(),
        lag_order,
        coefficients: VarCoefficients {
            intercept: vec![1.0; k],
            lags: vec![identity; lag_order],
        },
        metadata: ArtifactMetadata {
            trained_at: Utc::now(),
            observations: 100,
            last_date: NaiveDate::from_ymd_opt(2024, 1, 31),
            aic: Some(12.5),
            strategy: "fixed".to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let registry = ModelRegistry::new(dir.path().join("var_model_latest.json"));
        let artifact = sample_artifact(2);

        registry.save(&artifact).unwrap();
        assert_eq!(registry.load().unwrap(), artifact);
    }

    #[test]
    fn test_save_replaces_previous() {
        let dir = tempfile::tempdir().unwrap();
        let registry = ModelRegistry::new(dir.path().join("model.json"));

        registry.save(&sample_artifact(2)).unwrap();
        registry.save(&sample_artifact(3)).unwrap();

        assert_eq!(registry.load().unwrap().lag_order, 3);
        // Only the artifact remains, no stray temp files
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_missing_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let registry = ModelRegistry::new(dir.path().join("absent.json"));
        match registry.load() {
            Err(AppError::ModelArtifact(msg)) => assert_eq!(msg, "not found"),
            other => panic!("expected missing artifact, got {:?}", other),
        }
    }

    #[test]
    fn test_corrupt_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.json");
        std::fs::write(&path, "{\"variables\": [").unwrap();

        let result = ModelRegistry::new(&path).load();
        assert!(matches!(result, Err(AppError::ModelArtifact(_))));
    }

    #[test]
    fn test_foreign_variables_are_corrupt() {
        let mut artifact = sample_artifact(1);
        artifact.variables[4] = "humidity".to_string();
        assert!(artifact.validate().is_err());

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.json");
        std::fs::write(&path, serde_json::to_string(&artifact).unwrap()).unwrap();
        assert!(matches!(
            ModelRegistry::new(&path).load(),
            Err(AppError::ModelArtifact(_))
        ));
    }

    #[test]
    fn test_lag_order_must_match_coefficients() {
        let mut artifact = sample_artifact(2);
        artifact.lag_order = 3;
        assert!(artifact.validate().is_err());
    }
}
