//! Gap-filling fetcher
//!
//! Works out which days are missing between the store's latest date and
//! yesterday, and fetches exactly that range from the archive.

use chrono::NaiveDate;
use shared::DateInterval;

use crate::error::AppResult;
use crate::external::{ArchiveSource, DailyArchive};
use crate::services::store::ObservationStore;

/// Interval still missing from the store, or `None` when it is current.
///
/// An empty store starts at `epoch_start`. Otherwise the interval starts the
/// day after `max_date`. It always ends yesterday, since today's archive
/// values are not final.
pub fn fetch_interval(
    max_date: Option<NaiveDate>,
    epoch_start: NaiveDate,
    today: NaiveDate,
) -> Option<DateInterval> {
    let start = match max_date {
        Some(date) => date.succ_opt()?,
        None => epoch_start,
    };
    let end = today.pred_opt()?;

    DateInterval::new(start, end)
}

/// Archive data fetched for one missing interval
#[derive(Debug, Clone)]
pub struct FetchedGap {
    pub interval: DateInterval,
    pub archive: DailyArchive,
}

/// Fetches the store's missing interval from an archive source
#[derive(Debug, Clone, Copy)]
pub struct GapFiller {
    epoch_start: NaiveDate,
}

impl GapFiller {
    pub fn new(epoch_start: NaiveDate) -> Self {
        Self { epoch_start }
    }

    /// Issues at most one archive request. Provider failures propagate
    /// unchanged and nothing is written.
    pub async fn fetch_missing(
        &self,
        store: &ObservationStore,
        source: &dyn ArchiveSource,
        today: NaiveDate,
    ) -> AppResult<Option<FetchedGap>> {
        let max_date = store.max_date().await?;

        let Some(interval) = fetch_interval(max_date, self.epoch_start, today) else {
            tracing::info!("Observation store is up to date (latest: {:?})", max_date);
            return Ok(None);
        };

        tracing::info!("Fetching archive for {} ({} days)", interval, interval.days());
        let archive = source.fetch_daily(interval).await?;

        Ok(Some(FetchedGap { interval, archive }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_empty_store_starts_at_epoch() {
        let interval = fetch_interval(None, date(2005, 1, 1), date(2024, 3, 10)).unwrap();
        assert_eq!(interval.start, date(2005, 1, 1));
        assert_eq!(interval.end, date(2024, 3, 9));
    }

    #[test]
    fn test_gap_starts_after_latest_date() {
        let interval =
            fetch_interval(Some(date(2024, 3, 5)), date(2005, 1, 1), date(2024, 3, 10)).unwrap();
        assert_eq!(interval.start, date(2024, 3, 6));
        assert_eq!(interval.end, date(2024, 3, 9));
        assert_eq!(interval.days(), 4);
    }

    #[test]
    fn test_current_store_has_no_gap() {
        assert!(fetch_interval(Some(date(2024, 3, 9)), date(2005, 1, 1), date(2024, 3, 10)).is_none());
        // Store already holds today
        assert!(fetch_interval(Some(date(2024, 3, 10)), date(2005, 1, 1), date(2024, 3, 10)).is_none());
    }

    #[test]
    fn test_epoch_in_future_has_no_gap() {
        assert!(fetch_interval(None, date(2024, 3, 10), date(2024, 3, 10)).is_none());
    }

    proptest! {
        #[test]
        fn prop_interval_bounded_by_store_and_yesterday(
            max_offset in proptest::option::of(0i64..10_000),
            today_offset in 0i64..10_000,
        ) {
            let epoch = date(2005, 1, 1);
            let today = epoch + chrono::Duration::days(today_offset);
            let max_date = max_offset.map(|o| epoch + chrono::Duration::days(o));

            if let Some(interval) = fetch_interval(max_date, epoch, today) {
                prop_assert!(interval.end < today);
                prop_assert!(interval.start <= interval.end);
                if let Some(max) = max_date {
                    prop_assert!(interval.start > max);
                }
            }
        }
    }
}
