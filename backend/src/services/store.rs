//! Durable daily observation store
//!
//! One row per calendar date. Dates are stored as `YYYY-MM-DD` text, so
//! lexicographic order is chronological order.

use chrono::NaiveDate;
use shared::{Observation, DATE_FORMAT};
use sqlx::SqlitePool;

use crate::error::{AppError, AppResult};

/// Observation store backed by the `observations` table
#[derive(Clone)]
pub struct ObservationStore {
    db: SqlitePool,
}

/// Database row for an observation
#[derive(Debug, sqlx::FromRow)]
struct ObservationRow {
    date: NaiveDate,
    temp_max: Option<f64>,
    temp_min: Option<f64>,
    precipitation: Option<f64>,
    windspeed_max: Option<f64>,
    winddirection_dominant: Option<f64>,
}

impl From<ObservationRow> for Observation {
    fn from(row: ObservationRow) -> Self {
        Observation {
            date: row.date,
            temp_max: row.temp_max,
            temp_min: row.temp_min,
            precipitation: row.precipitation,
            windspeed_max: row.windspeed_max,
            winddirection_dominant: row.winddirection_dominant,
        }
    }
}

impl ObservationStore {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    /// Insert or fully replace each row by date.
    ///
    /// Rows are written one statement at a time outside a transaction. If a
    /// write fails partway, the rows before it stay committed and the error is
    /// returned.
    pub async fn upsert(&self, rows: &[Observation]) -> AppResult<usize> {
        for row in rows {
            sqlx::query(
                r#"
                INSERT INTO observations
                    (date, temp_max, temp_min, precipitation, windspeed_max, winddirection_dominant)
                VALUES ($1, $2, $3, $4, $5, $6)
                ON CONFLICT(date) DO UPDATE SET
                    temp_max = excluded.temp_max,
                    temp_min = excluded.temp_min,
                    precipitation = excluded.precipitation,
                    windspeed_max = excluded.windspeed_max,
                    winddirection_dominant = excluded.winddirection_dominant
                "#,
            )
            .bind(row.date)
            .bind(row.temp_max)
            .bind(row.temp_min)
            .bind(row.precipitation)
            .bind(row.windspeed_max)
            .bind(row.winddirection_dominant)
            .execute(&self.db)
            .await?;
        }

        Ok(rows.len())
    }

    /// All rows in ascending date order
    pub async fn read_all(&self) -> AppResult<Vec<Observation>> {
        let rows = sqlx::query_as::<_, ObservationRow>(
            r#"
            SELECT date, temp_max, temp_min, precipitation, windspeed_max, winddirection_dominant
            FROM observations
            ORDER BY date ASC
            "#,
        )
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(Observation::from).collect())
    }

    pub async fn read_one(&self, date: NaiveDate) -> AppResult<Option<Observation>> {
        let row = sqlx::query_as::<_, ObservationRow>(
            r#"
            SELECT date, temp_max, temp_min, precipitation, windspeed_max, winddirection_dominant
            FROM observations
            WHERE date = $1
            "#,
        )
        .bind(date)
        .fetch_optional(&self.db)
        .await?;

        Ok(row.map(Observation::from))
    }

    /// Latest stored date, `None` when the store is empty
    pub async fn max_date(&self) -> AppResult<Option<NaiveDate>> {
        let max: Option<String> = sqlx::query_scalar("SELECT MAX(date) FROM observations")
            .fetch_one(&self.db)
            .await?;

        max.map(|value| {
            NaiveDate::parse_from_str(&value, DATE_FORMAT).map_err(|e| {
                AppError::Internal(format!("Stored date {:?} is not a date: {}", value, e))
            })
        })
        .transpose()
    }

    pub async fn count(&self) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM observations")
            .fetch_one(&self.db)
            .await?;

        Ok(count)
    }
}
