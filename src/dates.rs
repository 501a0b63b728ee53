//! Date sniffing and row normalization.
//!
//! The `Date` column is tried against a short, ordered list of explicit
//! formats. The first format that parses *every* value wins; otherwise each
//! value is parsed on its own by a lenient fallback and failures are dropped.

use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use log::{debug, info, warn};
use serde::Serialize;

use crate::{
    data::{DATE_COLUMN, RawTable, Value},
    error::DashboardError,
    window::TimeWindow,
};

/// Explicit formats tried in order, column-wide.
pub const CANDIDATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d-%m-%Y", "%m/%d/%Y", "%d/%b/%Y"];

const FALLBACK_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];

// Month-first before day-first, mirroring what most lenient parsers assume.
const FALLBACK_DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%Y.%m.%d",
    "%m/%d/%Y",
    "%d/%m/%Y",
    "%m-%d-%Y",
    "%d-%m-%Y",
    "%d.%m.%Y",
    "%d/%b/%Y",
    "%d-%b-%Y",
    "%d %b %Y",
    "%b %d %Y",
    "%b %d, %Y",
    "%Y%m%d",
];

/// How the `Date` column was interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "format", rename_all = "snake_case")]
pub enum DateStrategy {
    /// Every value parsed under this explicit format.
    Format(&'static str),
    /// No explicit format fit the whole column; values were parsed one by one.
    Fallback,
}

impl fmt::Display for DateStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DateStrategy::Format(fmt_str) => write!(f, "format {fmt_str}"),
            DateStrategy::Fallback => write!(f, "fallback parser"),
        }
    }
}

/// A row whose `Date` parsed; other cells keep their decoded type.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedRow {
    pub date: NaiveDate,
    pub values: Vec<Option<Value>>,
}

/// Date-indexed rows. `columns` excludes `Date` and lines up with each
/// row's `values`.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedTable {
    columns: Vec<String>,
    rows: Vec<NormalizedRow>,
    strategy: DateStrategy,
    dropped: usize,
}

impl NormalizedTable {
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[NormalizedRow] {
        &self.rows
    }

    pub fn strategy(&self) -> DateStrategy {
        self.strategy
    }

    /// Rows discarded because their `Date` failed every parse attempt.
    pub fn dropped(&self) -> usize {
        self.dropped
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn min_date(&self) -> Option<NaiveDate> {
        self.rows.iter().map(|r| r.date).min()
    }

    pub fn max_date(&self) -> Option<NaiveDate> {
        self.rows.iter().map(|r| r.date).max()
    }

    /// `[min, max]` of the dataset, or `None` when it has no rows.
    pub fn span(&self) -> Option<TimeWindow> {
        Some(TimeWindow::new(self.min_date()?, self.max_date()?))
    }

    /// Same columns, different rows.
    pub fn with_rows(&self, rows: Vec<NormalizedRow>) -> Self {
        Self {
            columns: self.columns.clone(),
            rows,
            strategy: self.strategy,
            dropped: self.dropped,
        }
    }

    /// Numeric reading of one cell; non-numeric and missing cells are `None`.
    pub fn numeric(&self, row: &NormalizedRow, column: usize) -> Option<f64> {
        row.values
            .get(column)
            .and_then(|v| v.as_ref())
            .and_then(Value::as_f64)
    }
}

pub fn normalize(raw: &RawTable) -> Result<NormalizedTable, DashboardError> {
    let date_idx = raw
        .column_index(DATE_COLUMN)
        .ok_or(DashboardError::MissingDateColumn)?;

    let cells: Vec<Option<&Value>> = raw.rows().iter().map(|r| r[date_idx].as_ref()).collect();
    let (strategy, parsed) = sniff_dates(&cells);
    debug!("Date column interpreted with {strategy}");

    let columns = raw
        .headers()
        .iter()
        .enumerate()
        .filter(|(idx, _)| *idx != date_idx)
        .map(|(_, name)| name.clone())
        .collect::<Vec<_>>();

    let mut rows = Vec::with_capacity(raw.row_count());
    for (raw_row, date) in raw.rows().iter().zip(parsed) {
        let Some(date) = date else {
            continue;
        };
        let values = raw_row
            .iter()
            .enumerate()
            .filter(|(idx, _)| *idx != date_idx)
            .map(|(_, cell)| cell.clone())
            .collect();
        rows.push(NormalizedRow { date, values });
    }

    let dropped = raw.row_count() - rows.len();
    if dropped > 0 {
        warn!("Dropped {dropped} row(s) with an unparseable 'Date'");
    }
    info!("Normalized {} row(s) using {strategy}", rows.len());
    Ok(NormalizedTable {
        columns,
        rows,
        strategy,
        dropped,
    })
}

/// Picks the first explicit format that parses every cell, or falls back to
/// per-value parsing.
pub fn sniff_dates(cells: &[Option<&Value>]) -> (DateStrategy, Vec<Option<NaiveDate>>) {
    for &format in CANDIDATE_FORMATS {
        let parsed: Option<Vec<NaiveDate>> = cells
            .iter()
            .map(|cell| cell.and_then(|value| parse_with_format(value, format)))
            .collect();
        if let Some(dates) = parsed {
            return (
                DateStrategy::Format(format),
                dates.into_iter().map(Some).collect(),
            );
        }
    }
    let dates = cells
        .iter()
        .map(|cell| cell.and_then(parse_lenient))
        .collect();
    (DateStrategy::Fallback, dates)
}

fn parse_with_format(value: &Value, format: &str) -> Option<NaiveDate> {
    match value {
        Value::String(s) => NaiveDate::parse_from_str(s.trim(), format).ok(),
        Value::Date(d) => Some(*d),
        Value::DateTime(dt) => Some(dt.date()),
        _ => None,
    }
}

/// Best-effort parse of a single value; time-of-day is discarded.
pub fn parse_lenient(value: &Value) -> Option<NaiveDate> {
    match value {
        Value::String(s) => parse_lenient_str(s.trim()),
        Value::Date(d) => Some(*d),
        Value::DateTime(dt) => Some(dt.date()),
        _ => None,
    }
}

fn parse_lenient_str(value: &str) -> Option<NaiveDate> {
    if value.is_empty() {
        return None;
    }
    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Some(parsed.date_naive());
    }
    FALLBACK_DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .map(|dt| dt.date())
        .or_else(|| {
            FALLBACK_DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(value, fmt).ok())
        })
}
