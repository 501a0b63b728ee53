//! Per-day bucketing and coarser resampling of KPI columns.
//!
//! Every aggregate is an arithmetic mean over the values that are present;
//! a bucket where a KPI has no values carries a missing aggregate, never zero.

use std::collections::BTreeMap;

use chrono::{Datelike, Days, NaiveDate};
use itertools::Itertools;
use log::debug;
use serde::Serialize;

use crate::{
    dates::NormalizedTable,
    error::DashboardError,
    kpi,
    window::{Period, Trim},
};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Bucket {
    pub key: NaiveDate,
    /// One entry per KPI, in the series' KPI order.
    pub values: Vec<Option<f64>>,
}

/// Date-keyed means with strictly increasing keys.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BucketedSeries {
    kpis: Vec<String>,
    period: Period,
    buckets: Vec<Bucket>,
}

impl BucketedSeries {
    pub fn kpis(&self) -> &[String] {
        &self.kpis
    }

    pub fn period(&self) -> Period {
        self.period
    }

    pub fn buckets(&self) -> &[Bucket] {
        &self.buckets
    }

    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    pub fn kpi_index(&self, name: &str) -> Option<usize> {
        self.kpis.iter().position(|k| k == name)
    }

    /// The column of one KPI, aligned with [`BucketedSeries::buckets`].
    pub fn values_of(&self, name: &str) -> Option<Vec<Option<f64>>> {
        let idx = self.kpi_index(name)?;
        Some(self.buckets.iter().map(|b| b.values[idx]).collect())
    }

    pub fn keys(&self) -> Vec<NaiveDate> {
        self.buckets.iter().map(|b| b.key).collect()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct MeanAccumulator {
    sum: f64,
    count: usize,
}

impl MeanAccumulator {
    pub(crate) fn add(&mut self, value: Option<f64>) {
        if let Some(value) = value {
            self.sum += value;
            self.count += 1;
        }
    }

    pub(crate) fn mean(&self) -> Option<f64> {
        (self.count > 0).then(|| self.sum / self.count as f64)
    }
}

/// Groups rows by exact date and averages each KPI per day. A KPI with no
/// values in `table` yields missing aggregates, not an error.
pub fn bucket_by_date(
    table: &NormalizedTable,
    kpis: &[String],
) -> Result<BucketedSeries, DashboardError> {
    let indices = kpis
        .iter()
        .map(|name| kpi::kpi_column(table, name))
        .collect::<Result<Vec<_>, _>>()?;

    let mut groups: BTreeMap<NaiveDate, Vec<MeanAccumulator>> = BTreeMap::new();
    for row in table.rows() {
        let accumulators = groups
            .entry(row.date)
            .or_insert_with(|| vec![MeanAccumulator::default(); indices.len()]);
        for (acc, &column) in accumulators.iter_mut().zip(&indices) {
            acc.add(table.numeric(row, column));
        }
    }

    let buckets = groups
        .into_iter()
        .map(|(key, accumulators)| Bucket {
            key,
            values: accumulators.iter().map(MeanAccumulator::mean).collect(),
        })
        .collect::<Vec<_>>();
    debug!("Bucketed {} row(s) into {} day(s)", table.len(), buckets.len());
    Ok(BucketedSeries {
        kpis: kpis.to_vec(),
        period: Period::Day,
        buckets,
    })
}

/// Re-aggregates an already bucketed series. Each coarse bucket is the mean
/// of the finer bucket values it covers, not of the raw rows behind them.
pub fn resample(series: &BucketedSeries, period: Period) -> BucketedSeries {
    let width = series.kpis.len();
    let buckets = series
        .buckets
        .iter()
        .chunk_by(|bucket| period_key(bucket.key, period))
        .into_iter()
        .map(|(key, members)| {
            let mut accumulators = vec![MeanAccumulator::default(); width];
            for bucket in members {
                for (acc, value) in accumulators.iter_mut().zip(&bucket.values) {
                    acc.add(*value);
                }
            }
            Bucket {
                key,
                values: accumulators.iter().map(MeanAccumulator::mean).collect(),
            }
        })
        .collect::<Vec<_>>();
    debug!(
        "Resampled {} {} bucket(s) into {} {} bucket(s)",
        series.len(),
        series.period,
        buckets.len(),
        period
    );
    BucketedSeries {
        kpis: series.kpis.clone(),
        period,
        buckets,
    }
}

/// Closing date of the period containing `date`. Weeks close on Sunday,
/// months on their last calendar day.
pub fn period_key(date: NaiveDate, period: Period) -> NaiveDate {
    match period {
        Period::Day => date,
        Period::Week => {
            let to_sunday = 6 - u64::from(date.weekday().num_days_from_monday());
            date.checked_add_days(Days::new(to_sunday)).unwrap_or(date)
        }
        Period::Month => month_end(date),
    }
}

fn month_end(date: NaiveDate) -> NaiveDate {
    let (year, month) = if date.month() == 12 {
        (date.year() + 1, 1)
    } else {
        (date.year(), date.month() + 1)
    };
    NaiveDate::from_ymd_opt(year, month, 1)
        .and_then(|first| first.pred_opt())
        .unwrap_or(date)
}

pub fn trim(series: BucketedSeries, policy: Trim, today: NaiveDate) -> BucketedSeries {
    let BucketedSeries {
        kpis,
        period,
        mut buckets,
    } = series;
    match policy {
        Trim::None => {}
        Trim::LastBuckets(count) => {
            let excess = buckets.len().saturating_sub(count);
            buckets.drain(..excess);
        }
        Trim::SinceToday { days } => {
            let cutoff = today
                .checked_sub_days(Days::new(days))
                .unwrap_or(NaiveDate::MIN);
            buckets.retain(|bucket| bucket.key >= cutoff);
        }
    }
    BucketedSeries {
        kpis,
        period,
        buckets,
    }
}
