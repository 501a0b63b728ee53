//! KPI headline figures, value distributions and the dataset overview.

use chrono::NaiveDate;
use serde::Serialize;

use crate::{
    bucket::BucketedSeries,
    dates::{DateStrategy, NormalizedTable},
    fiscal::{FinancialYear, financial_years_in},
    kpi,
};

/// Headline figures for one KPI over a bucketed series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KpiSummary {
    pub kpi: String,
    /// Value of the latest bucket, missing if that bucket had no data.
    pub current: Option<f64>,
    pub max: Option<f64>,
    pub min: Option<f64>,
    pub mean: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SummaryReport {
    pub entries: Vec<KpiSummary>,
}

impl SummaryReport {
    pub fn get(&self, kpi: &str) -> Option<&KpiSummary> {
        self.entries.iter().find(|entry| entry.kpi == kpi)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Current/max/min/mean for each requested KPI. Names the series does not
/// carry are skipped.
pub fn summarize(series: &BucketedSeries, kpis: &[String]) -> SummaryReport {
    let entries = kpis
        .iter()
        .filter_map(|kpi| {
            let values = series.values_of(kpi)?;
            let present: Vec<f64> = values.iter().flatten().copied().collect();
            let mean = (!present.is_empty())
                .then(|| present.iter().sum::<f64>() / present.len() as f64);
            Some(KpiSummary {
                kpi: kpi.clone(),
                current: values.last().copied().flatten(),
                max: present.iter().copied().reduce(f64::max),
                min: present.iter().copied().reduce(f64::min),
                mean,
            })
        })
        .collect();
    SummaryReport { entries }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HistogramBin {
    pub lower: f64,
    pub upper: f64,
    pub count: usize,
}

/// Equal-width bins over `[min, max]`; the maximum lands in the last bin.
/// Missing values are ignored and a constant column yields a single bin.
pub fn histogram(values: &[Option<f64>], bins: usize) -> Vec<HistogramBin> {
    let present: Vec<f64> = values
        .iter()
        .flatten()
        .copied()
        .filter(|v| v.is_finite())
        .collect();
    if bins == 0 || present.is_empty() {
        return Vec::new();
    }
    let min = present.iter().copied().fold(f64::INFINITY, f64::min);
    let max = present.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if min == max {
        return vec![HistogramBin {
            lower: min,
            upper: max,
            count: present.len(),
        }];
    }

    let width = (max - min) / bins as f64;
    let mut histogram: Vec<HistogramBin> = (0..bins)
        .map(|idx| HistogramBin {
            lower: min + width * idx as f64,
            upper: if idx + 1 == bins {
                max
            } else {
                min + width * (idx + 1) as f64
            },
            count: 0,
        })
        .collect();
    for value in present {
        let idx = (((value - min) / width) as usize).min(bins - 1);
        histogram[idx].count += 1;
    }
    histogram
}

/// What a freshly loaded dataset looks like after normalization.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatasetOverview {
    pub rows_read: usize,
    pub rows_kept: usize,
    pub rows_dropped: usize,
    pub date_strategy: DateStrategy,
    pub min_date: Option<NaiveDate>,
    pub max_date: Option<NaiveDate>,
    pub columns: Vec<String>,
    pub kpi_candidates: Vec<String>,
    pub financial_years: Vec<FinancialYear>,
}

pub fn overview(table: &NormalizedTable) -> DatasetOverview {
    DatasetOverview {
        rows_read: table.len() + table.dropped(),
        rows_kept: table.len(),
        rows_dropped: table.dropped(),
        date_strategy: table.strategy(),
        min_date: table.min_date(),
        max_date: table.max_date(),
        columns: table.columns().to_vec(),
        kpi_candidates: kpi::select_kpi_columns(table),
        financial_years: financial_years_in(table.rows().iter().map(|row| row.date)),
    }
}
