//! Time windows and the fixed interval policy.

use std::{fmt, str::FromStr};

use chrono::{Days, NaiveDate};
use serde::Serialize;

use crate::{
    dates::NormalizedTable,
    error::DashboardError,
};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Inclusive `[start, end]` range of calendar dates. A window whose end
/// precedes its start is valid and simply matches nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct TimeWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl TimeWindow {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// `[anchor - days, anchor]`.
    pub fn trailing(anchor: NaiveDate, days: u64) -> Self {
        let start = anchor
            .checked_sub_days(Days::new(days))
            .unwrap_or(NaiveDate::MIN);
        Self::new(start, anchor)
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    pub fn is_empty(&self) -> bool {
        self.end < self.start
    }

    pub fn label(&self) -> String {
        format!(
            "{}..{}",
            self.start.format(DATE_FORMAT),
            self.end.format(DATE_FORMAT)
        )
    }
}

impl fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

/// Parses `START:END` (or `START..END`) with both bounds as `YYYY-MM-DD`.
impl FromStr for TimeWindow {
    type Err = DashboardError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let invalid = || DashboardError::InvalidRange {
            value: value.to_string(),
        };
        let trimmed = value.trim();
        let (start, end) = trimmed
            .split_once("..")
            .or_else(|| trimmed.split_once(':'))
            .ok_or_else(invalid)?;
        let start = NaiveDate::parse_from_str(start.trim(), DATE_FORMAT).map_err(|_| invalid())?;
        let end = NaiveDate::parse_from_str(end.trim(), DATE_FORMAT).map_err(|_| invalid())?;
        Ok(Self::new(start, end))
    }
}

/// Retains rows whose date falls inside the window, both ends included.
pub fn filter_by_window(table: &NormalizedTable, window: TimeWindow) -> NormalizedTable {
    let rows = table
        .rows()
        .iter()
        .filter(|row| window.contains(row.date))
        .cloned()
        .collect();
    table.with_rows(rows)
}

/// Granularity of a bucketed series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    Day,
    Week,
    Month,
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Period::Day => "day",
            Period::Week => "week",
            Period::Month => "month",
        };
        f.write_str(name)
    }
}

/// Post-resample trimming applied by some intervals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trim {
    None,
    /// Keep only the last `n` buckets.
    LastBuckets(usize),
    /// Keep buckets keyed on or after `today - days`. Anchored at the real
    /// date, not at the dataset's last date.
    SinceToday { days: u64 },
}

/// Preset trailing windows offered next to the free date-range picker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Interval {
    #[serde(rename = "1W")]
    OneWeek,
    #[serde(rename = "1M")]
    OneMonth,
    #[serde(rename = "3M")]
    ThreeMonths,
    #[serde(rename = "6M")]
    SixMonths,
    #[serde(rename = "1Y")]
    OneYear,
    #[serde(rename = "3Y")]
    ThreeYears,
}

impl Interval {
    pub const ALL: [Interval; 6] = [
        Interval::OneWeek,
        Interval::OneMonth,
        Interval::ThreeMonths,
        Interval::SixMonths,
        Interval::OneYear,
        Interval::ThreeYears,
    ];

    /// Length of the trailing window, counted back from the dataset's max date.
    pub fn window_days(self) -> u64 {
        match self {
            Interval::OneWeek => 7,
            Interval::OneMonth => 30,
            Interval::ThreeMonths => 90,
            Interval::SixMonths => 180,
            Interval::OneYear => 365,
            Interval::ThreeYears => 1095,
        }
    }

    pub fn period(self) -> Period {
        match self {
            Interval::OneWeek | Interval::OneMonth => Period::Day,
            Interval::ThreeMonths | Interval::SixMonths => Period::Week,
            Interval::OneYear | Interval::ThreeYears => Period::Month,
        }
    }

    pub fn trim(self) -> Trim {
        match self {
            Interval::OneWeek | Interval::OneMonth => Trim::None,
            Interval::ThreeMonths => Trim::LastBuckets(12),
            Interval::SixMonths => Trim::LastBuckets(26),
            Interval::OneYear => Trim::SinceToday { days: 365 },
            Interval::ThreeYears => Trim::SinceToday { days: 1095 },
        }
    }

    pub fn window(self, max_date: NaiveDate) -> TimeWindow {
        TimeWindow::trailing(max_date, self.window_days())
    }

    pub fn label(self) -> &'static str {
        match self {
            Interval::OneWeek => "1W",
            Interval::OneMonth => "1M",
            Interval::ThreeMonths => "3M",
            Interval::SixMonths => "6M",
            Interval::OneYear => "1Y",
            Interval::ThreeYears => "3Y",
        }
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Interval {
    type Err = DashboardError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_uppercase();
        Interval::ALL
            .into_iter()
            .find(|interval| interval.label() == normalized)
            .ok_or_else(|| DashboardError::InvalidInterval {
                value: value.to_string(),
            })
    }
}
