//! Daily / weekly / monthly reports and the weekly overview.

use chrono::TimeZone;
use serde::{Deserialize, Serialize};

use super::daily::{daily_averages, records_for_last_days, records_for_today, DailyAverage};
use super::summary::{DoubleStats, IntStats};
use crate::storage::PlayRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportPeriod {
    /// Today's calendar date.
    Daily,
    /// Last 7 days.
    Weekly,
    /// Last 30 days.
    Monthly,
}

impl ReportPeriod {
    pub fn select<Tz: TimeZone>(&self, records: &[PlayRecord], now_ms: i64, tz: &Tz) -> Vec<PlayRecord> {
        match self {
            ReportPeriod::Daily => records_for_today(records, now_ms, tz),
            ReportPeriod::Weekly => records_for_last_days(records, 7, now_ms),
            ReportPeriod::Monthly => records_for_last_days(records, 30, now_ms),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub period: ReportPeriod,
    pub times: usize,
    pub spend_seconds: IntStats,
    pub count: IntStats,
    pub frequency: DoubleStats,
    pub heart_rate: DoubleStats,
    /// Per-day breakdown; empty for the daily report.
    pub daily: Vec<DailyAverage>,
}

impl Report {
    pub fn build<Tz: TimeZone>(
        period: ReportPeriod,
        records: &[PlayRecord],
        now_ms: i64,
        tz: &Tz,
    ) -> Self {
        let selected = period.select(records, now_ms, tz);
        let daily = match period {
            ReportPeriod::Daily => Vec::new(),
            ReportPeriod::Weekly | ReportPeriod::Monthly => daily_averages(&selected, tz),
        };
        Self {
            period,
            times: selected.len(),
            spend_seconds: IntStats::of(&selected, |r| r.spend_seconds),
            count: IntStats::of(&selected, |r| r.count),
            frequency: DoubleStats::of(&selected, |r| r.frequency),
            heart_rate: DoubleStats::of(&selected, |r| r.heart_rate),
            daily,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.times == 0
    }
}

/// How the last seven days look.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeeklyVerdict {
    Desperate,
    Healthy,
    Worrying,
    Exhausted,
}

/// Honorary title unlocked alongside the verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Title {
    Rookie,
    Novice,
    Master,
    Burnout,
}

impl WeeklyVerdict {
    pub fn from_count(sessions: usize) -> Self {
        match sessions {
            0 => WeeklyVerdict::Desperate,
            1..=3 => WeeklyVerdict::Healthy,
            4..=7 => WeeklyVerdict::Worrying,
            _ => WeeklyVerdict::Exhausted,
        }
    }

    pub fn title(&self) -> Title {
        match self {
            WeeklyVerdict::Desperate => Title::Rookie,
            WeeklyVerdict::Healthy => Title::Novice,
            WeeklyVerdict::Worrying => Title::Master,
            WeeklyVerdict::Exhausted => Title::Burnout,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Overview {
    pub weekly_times: usize,
    pub verdict: WeeklyVerdict,
    pub title: Title,
}

impl Overview {
    pub fn build(records: &[PlayRecord], now_ms: i64) -> Self {
        let weekly_times = records_for_last_days(records, 7, now_ms).len();
        let verdict = WeeklyVerdict::from_count(weekly_times);
        Self {
            weekly_times,
            verdict,
            title: verdict.title(),
        }
    }
}
