//! Time-window filters and per-day grouping.
//!
//! Calendar questions ("today", "which day") depend on a time zone, which
//! callers pass in; the CLI uses [`chrono::Local`].

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::storage::PlayRecord;

pub const MILLIS_PER_DAY: i64 = 24 * 60 * 60 * 1000;

/// Calendar date of an epoch-millisecond timestamp in `tz`.
pub fn local_date<Tz: TimeZone>(timestamp_millis: i64, tz: &Tz) -> Option<NaiveDate> {
    DateTime::<Utc>::from_timestamp_millis(timestamp_millis)
        .map(|utc| utc.with_timezone(tz).date_naive())
}

/// Records within `[now - days, now]`, both ends inclusive.
pub fn records_for_last_days(records: &[PlayRecord], days: i64, now_ms: i64) -> Vec<PlayRecord> {
    let from = now_ms - days * MILLIS_PER_DAY;
    records
        .iter()
        .filter(|r| (from..=now_ms).contains(&r.timestamp_millis))
        .cloned()
        .collect()
}

/// Records whose local date in `tz` equals that of `now_ms`.
pub fn records_for_today<Tz: TimeZone>(
    records: &[PlayRecord],
    now_ms: i64,
    tz: &Tz,
) -> Vec<PlayRecord> {
    let Some(today) = local_date(now_ms, tz) else {
        return Vec::new();
    };
    records
        .iter()
        .filter(|r| local_date(r.timestamp_millis, tz) == Some(today))
        .cloned()
        .collect()
}

/// Averages of one calendar day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyAverage {
    pub day: NaiveDate,
    /// Number of sessions that day.
    pub times: usize,
    pub spend_average: f64,
    pub count_average: f64,
    pub frequency_average: f64,
    pub heart_rate_average: f64,
}

/// Group by local date, oldest day first.
pub fn daily_averages<Tz: TimeZone>(records: &[PlayRecord], tz: &Tz) -> Vec<DailyAverage> {
    let mut by_day: BTreeMap<NaiveDate, Vec<&PlayRecord>> = BTreeMap::new();
    for record in records {
        match local_date(record.timestamp_millis, tz) {
            Some(day) => by_day.entry(day).or_default().push(record),
            None => tracing::warn!(
                timestamp_millis = record.timestamp_millis,
                "skipping record with out-of-range timestamp"
            ),
        }
    }

    by_day
        .into_iter()
        .map(|(day, day_records)| {
            let n = day_records.len() as f64;
            let avg = |f: fn(&PlayRecord) -> f64| day_records.iter().map(|r| f(r)).sum::<f64>() / n;
            DailyAverage {
                day,
                times: day_records.len(),
                spend_average: avg(|r| r.spend_seconds as f64),
                count_average: avg(|r| r.count as f64),
                frequency_average: avg(|r| r.frequency),
                heart_rate_average: avg(|r| r.heart_rate),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::FixedOffset;

    fn at(timestamp_millis: i64, count: i32) -> PlayRecord {
        PlayRecord {
            timestamp_millis,
            spend_seconds: 60,
            count,
            frequency: count as f64 / 60.0,
            heart_rate: 0.0,
        }
    }

    #[test]
    fn last_days_window_is_inclusive() {
        let now = 10 * MILLIS_PER_DAY;
        let records = [
            at(now - 7 * MILLIS_PER_DAY - 1, 1),
            at(now - 7 * MILLIS_PER_DAY, 2),
            at(now, 3),
            at(now + 1, 4),
        ];
        let window = records_for_last_days(&records, 7, now);
        let counts: Vec<i32> = window.iter().map(|r| r.count).collect();
        assert_eq!(counts, vec![2, 3]);
    }

    #[test]
    fn today_depends_on_zone() {
        // 2024-01-01T23:30:00Z
        let now = 1_704_151_800_000;
        let earlier = now - 2 * 60 * 60 * 1000; // 21:30Z same UTC day
        let records = [at(earlier, 1), at(now, 2)];

        assert_eq!(records_for_today(&records, now, &Utc).len(), 2);

        // UTC+1: now is 00:30 on Jan 2, earlier is 22:30 on Jan 1
        let plus_one = FixedOffset::east_opt(3600).unwrap();
        let today = records_for_today(&records, now, &plus_one);
        assert_eq!(today.len(), 1);
        assert_eq!(today[0].count, 2);
    }

    #[test]
    fn daily_averages_sorted_by_day() {
        let day = MILLIS_PER_DAY;
        let records = [at(3 * day + 10, 30), at(day + 10, 10), at(day + 20, 20)];
        let averages = daily_averages(&records, &Utc);
        assert_eq!(averages.len(), 2);
        assert_eq!(averages[0].day, NaiveDate::from_ymd_opt(1970, 1, 2).unwrap());
        assert_eq!(averages[0].times, 2);
        assert_eq!(averages[0].count_average, 15.0);
        assert_eq!(averages[1].day, NaiveDate::from_ymd_opt(1970, 1, 4).unwrap());
        assert_eq!(averages[1].spend_average, 60.0);
    }

    #[test]
    fn empty_input() {
        assert!(daily_averages(&[], &Utc).is_empty());
        assert!(records_for_today(&[], 0, &Utc).is_empty());
    }
}
