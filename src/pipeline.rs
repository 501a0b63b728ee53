//! The trend view: pick a window, filter, bucket per day, then resample and
//! trim according to the interval policy.

use chrono::NaiveDate;
use log::{debug, info, warn};

use crate::{
    bucket::{self, BucketedSeries},
    dates::NormalizedTable,
    error::DashboardError,
    kpi,
    summary::{self, SummaryReport},
    window::{Interval, TimeWindow, filter_by_window},
};

/// What the user chose in the date controls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WindowSelection {
    /// The whole dataset, day by day.
    #[default]
    Full,
    /// A free date range; a missing bound falls back to the dataset's edge.
    Range {
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    },
    /// One of the preset trailing intervals.
    Interval(Interval),
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrendView {
    pub window: TimeWindow,
    pub interval: Option<Interval>,
    /// Rows inside the window, before bucketing.
    pub rows: NormalizedTable,
    pub series: BucketedSeries,
    pub summary: SummaryReport,
}

/// Builds everything the trend tab renders from one immutable table.
///
/// `today` anchors the 1Y/3Y trim; every other window is anchored on the
/// dataset itself.
pub fn build_trend(
    table: &NormalizedTable,
    kpis: &[String],
    selection: WindowSelection,
    today: NaiveDate,
) -> Result<TrendView, DashboardError> {
    let span = table.span().ok_or(DashboardError::EmptyDataset)?;
    if kpis.is_empty() {
        warn!("No KPI selected; nothing to chart");
    }
    // Candidacy is judged on the whole dataset, never on the window.
    for name in kpis {
        kpi::require_kpi(table, name)?;
    }

    let (window, interval) = match selection {
        WindowSelection::Full => (span, None),
        WindowSelection::Range { start, end } => (
            TimeWindow::new(start.unwrap_or(span.start), end.unwrap_or(span.end)),
            None,
        ),
        WindowSelection::Interval(interval) => (interval.window(span.end), Some(interval)),
    };
    debug!("Trend window {window} (interval {interval:?})");

    let rows = filter_by_window(table, window);
    let daily = bucket::bucket_by_date(&rows, kpis)?;
    let series = match interval {
        Some(interval) => {
            let resampled = bucket::resample(&daily, interval.period());
            bucket::trim(resampled, interval.trim(), today)
        }
        None => daily,
    };
    let summary = summary::summarize(&series, kpis);
    info!(
        "Trend covers {} row(s) in {} {} bucket(s)",
        rows.len(),
        series.len(),
        series.period()
    );
    Ok(TrendView {
        window,
        interval,
        rows,
        series,
        summary,
    })
}

/// Interval view only: window from the dataset's max date, resample, trim.
pub fn apply_interval(
    table: &NormalizedTable,
    kpis: &[String],
    interval: Interval,
    today: NaiveDate,
) -> Result<BucketedSeries, DashboardError> {
    build_trend(table, kpis, WindowSelection::Interval(interval), today).map(|view| view.series)
}
