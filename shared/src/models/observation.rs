//! Daily weather observation models

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One day of weather features for the configured location.
///
/// Numeric fields are optional because the archive provider reports `null`
/// for days it has no measurement for. Such rows are kept in the store but
/// excluded from model training.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub date: NaiveDate,
    pub temp_max: Option<f64>,
    pub temp_min: Option<f64>,
    pub precipitation: Option<f64>,
    pub windspeed_max: Option<f64>,
    pub winddirection_dominant: Option<f64>,
}

impl Observation {
    /// Numeric feature columns, in the order every model and matrix uses
    pub const FEATURES: [&'static str; 5] = [
        "temp_max",
        "temp_min",
        "precipitation",
        "windspeed_max",
        "winddirection_dominant",
    ];

    /// Feature values in [`Observation::FEATURES`] order
    pub fn feature_values(&self) -> [Option<f64>; 5] {
        [
            self.temp_max,
            self.temp_min,
            self.precipitation,
            self.windspeed_max,
            self.winddirection_dominant,
        ]
    }

    /// Returns the feature vector when every field is present and finite
    pub fn complete_values(&self) -> Option<Vec<f64>> {
        self.feature_values()
            .iter()
            .map(|v| v.filter(|x| x.is_finite()))
            .collect()
    }

    /// True when the row can be used for model training
    pub fn is_complete(&self) -> bool {
        self.complete_values().is_some()
    }
}

/// Payload returned by the lookup endpoint when a date has no row
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MissingObservation {
    pub error: String,
}

impl Default for MissingObservation {
    fn default() -> Self {
        Self {
            error: "No data for this date".to_string(),
        }
    }
}
