//! Statistics over saved play records.
//!
//! Summaries of a field (`IntStats`, `DoubleStats`), time-window filters,
//! per-day averages, period reports and the weekly verdict.

mod daily;
mod report;
mod summary;

pub use daily::{
    daily_averages, local_date, records_for_last_days, records_for_today, DailyAverage,
    MILLIS_PER_DAY,
};
pub use report::{Overview, Report, ReportPeriod, Title, WeeklyVerdict};
pub use summary::{DoubleStats, IntStats};
