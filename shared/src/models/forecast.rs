//! Forecast models

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// One forecast step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastRow {
    pub date: NaiveDate,
    /// Values in the order of [`Forecast::variables`]
    pub values: Vec<f64>,
}

/// A forward daily forecast produced by the VAR model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Forecast {
    pub variables: Vec<String>,
    pub rows: Vec<ForecastRow>,
}

impl Forecast {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Keeps only the named variables, preserving the forecast's own column order.
    /// Names that the forecast does not contain are ignored.
    pub fn select(&self, names: &[&str]) -> Forecast {
        let keep: Vec<usize> = self
            .variables
            .iter()
            .enumerate()
            .filter(|(_, v)| names.contains(&v.as_str()))
            .map(|(i, _)| i)
            .collect();

        Forecast {
            variables: keep.iter().map(|&i| self.variables[i].clone()).collect(),
            rows: self
                .rows
                .iter()
                .map(|r| ForecastRow {
                    date: r.date,
                    values: keep.iter().map(|&i| r.values[i]).collect(),
                })
                .collect(),
        }
    }
}

/// Query parameters for the forecast endpoint
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct ForecastQuery {
    #[validate(range(min = 1, max = 30))]
    pub horizon: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn forecast() -> Forecast {
        let d = NaiveDate::from_ymd_opt(2020, 1, 11).unwrap();
        Forecast {
            variables: vec!["temp_max".into(), "temp_min".into(), "precipitation".into()],
            rows: vec![
                ForecastRow { date: d, values: vec![25.0, 11.0, 0.4] },
                ForecastRow { date: d.succ_opt().unwrap(), values: vec![24.0, 10.5, 1.2] },
            ],
        }
    }

    #[test]
    fn test_select_keeps_requested_columns() {
        let temps = forecast().select(&["temp_min", "temp_max", "humidity"]);
        assert_eq!(temps.variables, vec!["temp_max", "temp_min"]);
        assert_eq!(temps.rows[1].values, vec![24.0, 10.5]);
        assert_eq!(temps.len(), 2);
    }

    #[test]
    fn test_forecast_query_range() {
        assert!(ForecastQuery { horizon: Some(7) }.validate().is_ok());
        assert!(ForecastQuery { horizon: None }.validate().is_ok());
        assert!(ForecastQuery { horizon: Some(0) }.validate().is_err());
        assert!(ForecastQuery { horizon: Some(31) }.validate().is_err());
    }
}
