//! Upsert loader
//!
//! Turns the archive's parallel arrays into observation rows and writes
//! them to the store.

use chrono::NaiveDate;
use shared::{Observation, DATE_FORMAT};

use crate::error::{AppError, AppResult};
use crate::external::DailyArchive;
use crate::services::store::ObservationStore;

/// Builds one row per `time` entry.
///
/// Every field array must be as long as `time` and every `time` entry must be
/// a `YYYY-MM-DD` date. Either violation fails the whole response.
pub fn rows_from_archive(archive: &DailyArchive) -> AppResult<Vec<Observation>> {
    let daily = &archive.daily;
    let expected = daily.time.len();

    for (name, values) in daily.fields() {
        if values.len() != expected {
            return Err(AppError::DataShape(format!(
                "daily.{} has {} values, daily.time has {}",
                name,
                values.len(),
                expected
            )));
        }
    }

    daily
        .time
        .iter()
        .enumerate()
        .map(|(i, day)| {
            let date = NaiveDate::parse_from_str(day, DATE_FORMAT).map_err(|_| {
                AppError::DataShape(format!("daily.time[{}] is not a date: {:?}", i, day))
            })?;

            Ok(Observation {
                date,
                temp_max: daily.temperature_2m_max[i],
                temp_min: daily.temperature_2m_min[i],
                precipitation: daily.precipitation_sum[i],
                windspeed_max: daily.windspeed_10m_max[i],
                winddirection_dominant: daily.winddirection_10m_dominant[i],
            })
        })
        .collect()
}

/// Validates the whole response, then upserts its rows.
///
/// A shape error writes nothing. Writes are not transactional: a storage
/// failure partway through leaves the earlier rows committed.
pub async fn load(store: &ObservationStore, archive: &DailyArchive) -> AppResult<usize> {
    let rows = rows_from_archive(archive)?;
    let written = store.upsert(&rows).await?;

    tracing::info!("Loaded {} observation rows", written);
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::external::open_meteo::DAILY_FIELDS;
    use crate::external::DailySeries;
    use proptest::prelude::*;

    fn archive(time: &[&str], temp_max: Vec<Option<f64>>) -> DailyArchive {
        let n = time.len();
        DailyArchive {
            daily: DailySeries {
                time: time.iter().map(|t| t.to_string()).collect(),
                temperature_2m_max: temp_max,
                temperature_2m_min: vec![Some(10.0); n],
                precipitation_sum: vec![Some(0.0); n],
                windspeed_10m_max: vec![Some(12.0); n],
                winddirection_10m_dominant: vec![Some(180.0); n],
            },
        }
    }

    #[test]
    fn test_rows_follow_time_axis() {
        let rows =
            rows_from_archive(&archive(&["2024-01-01", "2024-01-02"], vec![Some(25.0), None]))
                .unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].date, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        assert_eq!(rows[0].temp_max, Some(25.0));
        assert_eq!(rows[1].temp_max, None);
        assert_eq!(rows[1].winddirection_dominant, Some(180.0));
    }

    #[test]
    fn test_length_mismatch_is_shape_error() {
        let result = rows_from_archive(&archive(&["2024-01-01", "2024-01-02"], vec![Some(25.0)]));
        match result {
            Err(AppError::DataShape(msg)) => assert!(msg.contains("temperature_2m_max")),
            other => panic!("expected shape error, got {:?}", other),
        }
    }

    #[test]
    fn test_bad_date_is_shape_error() {
        let result = rows_from_archive(&archive(&["2024-01-01", "01/02/2024"], vec![None, None]));
        assert!(matches!(result, Err(AppError::DataShape(_))));
    }

    #[test]
    fn test_empty_archive_has_no_rows() {
        let rows = rows_from_archive(&archive(&[], vec![])).unwrap();
        assert!(rows.is_empty());
    }

    /// Archive with `n` days where one field has `len` values instead of `n`
    fn misaligned(n: usize, field: usize, len: usize) -> DailyArchive {
        let mut columns: Vec<Vec<Option<f64>>> = (0..DAILY_FIELDS.len())
            .map(|c| (0..n).map(|i| Some((c * 100 + i) as f64)).collect())
            .collect();
        columns[field] = (0..len).map(|i| Some(i as f64)).collect();

        let mut columns = columns.into_iter();
        let mut next = || columns.next().unwrap_or_default();
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        DailyArchive {
            daily: DailySeries {
                time: (0..n)
                    .map(|i| {
                        (start + chrono::Duration::days(i as i64))
                            .format(DATE_FORMAT)
                            .to_string()
                    })
                    .collect(),
                temperature_2m_max: next(),
                temperature_2m_min: next(),
                precipitation_sum: next(),
                windspeed_10m_max: next(),
                winddirection_10m_dominant: next(),
            },
        }
    }

    proptest! {
        #[test]
        fn prop_any_misaligned_field_yields_no_rows(
            n in 1usize..40,
            field in 0usize..5,
            delta in 1usize..6,
            shorter in any::<bool>(),
        ) {
            let len = if shorter { n - delta.min(n) } else { n + delta };
            let result = rows_from_archive(&misaligned(n, field, len));

            match result {
                Err(AppError::DataShape(msg)) => prop_assert!(msg.contains(DAILY_FIELDS[field])),
                Ok(rows) => prop_assert!(false, "expected shape error, got {} rows", rows.len()),
                Err(other) => prop_assert!(false, "expected shape error, got {:?}", other),
            }
        }

        #[test]
        fn prop_aligned_fields_yield_one_row_per_day(n in 0usize..40) {
            let rows = rows_from_archive(&misaligned(n, 0, n)).unwrap();
            prop_assert_eq!(rows.len(), n);
            for (i, row) in rows.iter().enumerate() {
                prop_assert_eq!(row.temp_min, Some((100 + i) as f64));
            }
        }
    }
}
