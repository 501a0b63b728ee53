//! Year-over-year comparison of one KPI across several periods.
//!
//! Each period is filtered on its own, grouped by (financial year, month)
//! and averaged. The long result can be pivoted so months run down the side
//! in fiscal order and periods run across the top.

use std::collections::{BTreeMap, HashMap};

use chrono::Month;
use log::debug;

use crate::{
    bucket::MeanAccumulator,
    dates::NormalizedTable,
    error::DashboardError,
    fiscal::{FISCAL_MONTHS, FinancialYear, fiscal_month_index, month_of},
    kpi,
    window::TimeWindow,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComparisonPeriod {
    Range(TimeWindow),
    FinancialYear(FinancialYear),
}

impl ComparisonPeriod {
    pub fn window(&self) -> TimeWindow {
        match self {
            ComparisonPeriod::Range(window) => *window,
            ComparisonPeriod::FinancialYear(fy) => fy.window(),
        }
    }

    pub fn label(&self) -> String {
        match self {
            ComparisonPeriod::Range(window) => window.label(),
            ComparisonPeriod::FinancialYear(fy) => fy.label(),
        }
    }
}

/// Mean of the KPI for one (financial year, month) cell of one period.
#[derive(Debug, Clone, PartialEq)]
pub struct ComparisonEntry {
    pub period: ComparisonPeriod,
    pub financial_year: FinancialYear,
    pub month: Month,
    pub mean: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ComparisonTable {
    kpi: String,
    entries: Vec<ComparisonEntry>,
}

pub fn compare_across_periods(
    table: &NormalizedTable,
    kpi: &str,
    periods: &[ComparisonPeriod],
) -> Result<ComparisonTable, DashboardError> {
    let column = kpi::require_kpi(table, kpi)?;

    let mut entries = Vec::new();
    for period in periods {
        let window = period.window();
        let mut groups: BTreeMap<(FinancialYear, usize), MeanAccumulator> = BTreeMap::new();
        for row in table.rows().iter().filter(|row| window.contains(row.date)) {
            let month = month_of(row.date);
            groups
                .entry((FinancialYear::containing(row.date), fiscal_month_index(month)))
                .or_default()
                .add(table.numeric(row, column));
        }
        debug!("Period {} covers {} month(s)", period.label(), groups.len());
        entries.extend(
            groups
                .into_iter()
                .map(|((financial_year, month_idx), acc)| ComparisonEntry {
                    period: *period,
                    financial_year,
                    month: FISCAL_MONTHS[month_idx],
                    mean: acc.mean(),
                }),
        );
    }
    entries.sort_by_key(|entry| (entry.financial_year, fiscal_month_index(entry.month)));

    Ok(ComparisonTable {
        kpi: kpi.to_string(),
        entries,
    })
}

impl ComparisonTable {
    pub fn kpi(&self) -> &str {
        &self.kpi
    }

    pub fn entries(&self) -> &[ComparisonEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Wide view: one row per month present (fiscal order), one column per
    /// period. A range that crosses financial years gets one column per year.
    pub fn pivot(&self) -> PivotTable {
        let mut years_per_period: HashMap<String, Vec<FinancialYear>> = HashMap::new();
        for entry in &self.entries {
            let years = years_per_period.entry(entry.period.label()).or_default();
            if !years.contains(&entry.financial_year) {
                years.push(entry.financial_year);
            }
        }
        let column_of = |entry: &ComparisonEntry| -> String {
            let label = entry.period.label();
            match entry.period {
                ComparisonPeriod::FinancialYear(_) => label,
                ComparisonPeriod::Range(_) if years_per_period[&label].len() == 1 => label,
                ComparisonPeriod::Range(_) => format!("{label} {}", entry.financial_year),
            }
        };

        let mut columns: Vec<String> = Vec::new();
        let mut cells: HashMap<(String, usize), Option<f64>> = HashMap::new();
        let mut month_present = [false; 12];
        for entry in &self.entries {
            let column = column_of(entry);
            if !columns.contains(&column) {
                columns.push(column.clone());
            }
            let month_idx = fiscal_month_index(entry.month);
            month_present[month_idx] = true;
            cells.entry((column, month_idx)).or_insert(entry.mean);
        }

        let rows = FISCAL_MONTHS
            .iter()
            .enumerate()
            .filter(|(idx, _)| month_present[*idx])
            .map(|(idx, month)| PivotRow {
                month: *month,
                cells: columns
                    .iter()
                    .map(|column| cells.get(&(column.clone(), idx)).copied().flatten())
                    .collect(),
            })
            .collect();

        PivotTable {
            kpi: self.kpi.clone(),
            columns,
            rows,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PivotRow {
    pub month: Month,
    /// Aligned with [`PivotTable::columns`]; `None` where a period has no data.
    pub cells: Vec<Option<f64>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PivotTable {
    kpi: String,
    columns: Vec<String>,
    rows: Vec<PivotRow>,
}

impl PivotTable {
    pub fn kpi(&self) -> &str {
        &self.kpi
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[PivotRow] {
        &self.rows
    }

    pub fn cell(&self, month: Month, column: &str) -> Option<f64> {
        let col = self.columns.iter().position(|c| c == column)?;
        self.rows
            .iter()
            .find(|row| row.month == month)
            .and_then(|row| row.cells[col])
    }
}
