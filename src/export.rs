//! CSV and single-sheet spreadsheet exports.
//!
//! Every view is first flattened into an [`ExportTable`] (header row plus
//! typed cells); the writers only know about that shape.

use std::{io::Write, path::Path};

use anyhow::{Context, Result};
use log::info;
use rust_xlsxwriter::{Workbook, XlsxError};

use crate::{
    bucket::BucketedSeries,
    compare::{ComparisonTable, PivotTable},
    data::{DATE_COLUMN, Value},
    dates::NormalizedTable,
    error::DashboardError,
    fiscal::month_abbrev,
    io_utils,
    summary::{HistogramBin, SummaryReport},
};

const SHEET_NAME: &str = "Report";

#[derive(Debug, Clone, PartialEq)]
pub struct ExportTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Option<Value>>>,
}

impl ExportTable {
    /// Cells rendered as text; missing cells become empty strings.
    pub fn display_rows(&self) -> Vec<Vec<String>> {
        self.rows
            .iter()
            .map(|row| {
                row.iter()
                    .map(|cell| cell.as_ref().map(Value::as_display).unwrap_or_default())
                    .collect()
            })
            .collect()
    }

    /// `Date` plus the chosen columns of the normalized rows; `None` keeps all.
    pub fn from_rows(table: &NormalizedTable, columns: Option<&[String]>) -> Result<Self, DashboardError> {
        let selected: Vec<(usize, String)> = match columns {
            Some(names) => names
                .iter()
                .map(|name| {
                    table
                        .column_index(name)
                        .map(|idx| (idx, name.clone()))
                        .ok_or_else(|| DashboardError::UnknownColumn { name: name.clone() })
                })
                .collect::<Result<_, _>>()?,
            None => table.columns().iter().cloned().enumerate().collect(),
        };
        let mut headers = vec![DATE_COLUMN.to_string()];
        headers.extend(selected.iter().map(|(_, name)| name.clone()));
        let rows = table
            .rows()
            .iter()
            .map(|row| {
                let mut cells = vec![Some(Value::Date(row.date))];
                cells.extend(selected.iter().map(|(idx, _)| row.values[*idx].clone()));
                cells
            })
            .collect();
        Ok(Self { headers, rows })
    }
}

impl From<&BucketedSeries> for ExportTable {
    fn from(series: &BucketedSeries) -> Self {
        let mut headers = vec![DATE_COLUMN.to_string()];
        headers.extend(series.kpis().iter().cloned());
        let rows = series
            .buckets()
            .iter()
            .map(|bucket| {
                let mut cells = vec![Some(Value::Date(bucket.key))];
                cells.extend(bucket.values.iter().map(|v| v.map(Value::Float)));
                cells
            })
            .collect();
        Self { headers, rows }
    }
}

impl From<&ComparisonTable> for ExportTable {
    fn from(table: &ComparisonTable) -> Self {
        let headers = vec![
            "Period".to_string(),
            "FinancialYear".to_string(),
            "Month".to_string(),
            table.kpi().to_string(),
        ];
        let rows = table
            .entries()
            .iter()
            .map(|entry| {
                vec![
                    Some(Value::String(entry.period.label())),
                    Some(Value::String(entry.financial_year.label())),
                    Some(Value::String(month_abbrev(entry.month).to_string())),
                    entry.mean.map(Value::Float),
                ]
            })
            .collect();
        Self { headers, rows }
    }
}

impl From<&PivotTable> for ExportTable {
    fn from(pivot: &PivotTable) -> Self {
        let mut headers = vec!["Month".to_string()];
        headers.extend(pivot.columns().iter().cloned());
        let rows = pivot
            .rows()
            .iter()
            .map(|row| {
                let mut cells = vec![Some(Value::String(month_abbrev(row.month).to_string()))];
                cells.extend(row.cells.iter().map(|v| v.map(Value::Float)));
                cells
            })
            .collect();
        Self { headers, rows }
    }
}

impl From<&SummaryReport> for ExportTable {
    fn from(report: &SummaryReport) -> Self {
        let headers = ["KPI", "Current", "Max", "Min", "Average"]
            .into_iter()
            .map(String::from)
            .collect();
        let rows = report
            .entries
            .iter()
            .map(|entry| {
                vec![
                    Some(Value::String(entry.kpi.clone())),
                    entry.current.map(Value::Float),
                    entry.max.map(Value::Float),
                    entry.min.map(Value::Float),
                    entry.mean.map(|m| Value::Float((m * 100.0).round() / 100.0)),
                ]
            })
            .collect();
        Self { headers, rows }
    }
}

impl From<&[HistogramBin]> for ExportTable {
    fn from(bins: &[HistogramBin]) -> Self {
        let headers = ["Lower", "Upper", "Count"]
            .into_iter()
            .map(String::from)
            .collect();
        let rows = bins
            .iter()
            .map(|bin| {
                vec![
                    Some(Value::Float(bin.lower)),
                    Some(Value::Float(bin.upper)),
                    Some(Value::Integer(bin.count as i64)),
                ]
            })
            .collect();
        Self { headers, rows }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Xlsx,
}

impl ExportFormat {
    /// `-` means CSV on stdout.
    pub fn from_path(path: &Path) -> Result<Self, DashboardError> {
        if io_utils::is_dash(path) {
            return Ok(ExportFormat::Csv);
        }
        let name = path.to_string_lossy();
        match io_utils::extension_of(&name).as_str() {
            "csv" => Ok(ExportFormat::Csv),
            "xlsx" => Ok(ExportFormat::Xlsx),
            other => Err(DashboardError::UnsupportedFormat {
                extension: other.to_string(),
            }),
        }
    }
}

pub fn write_csv<W: Write>(table: &ExportTable, writer: W) -> Result<()> {
    let mut writer = io_utils::csv_writer(writer);
    writer
        .write_record(&table.headers)
        .context("Writing CSV header")?;
    for (idx, row) in table.display_rows().iter().enumerate() {
        writer
            .write_record(row)
            .with_context(|| format!("Writing CSV row {}", idx + 1))?;
    }
    writer.flush().context("Flushing CSV output")?;
    Ok(())
}

/// UTF-8 CSV bytes, as offered by a download button.
pub fn to_csv_bytes(table: &ExportTable) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    write_csv(table, &mut buffer)?;
    Ok(buffer)
}

fn build_workbook(table: &ExportTable) -> Result<Workbook, XlsxError> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(SHEET_NAME)?;
    for (col, header) in table.headers.iter().enumerate() {
        worksheet.write_string(0, col as u16, header)?;
    }
    for (row_idx, row) in table.rows.iter().enumerate() {
        let row_num = (row_idx + 1) as u32;
        for (col, cell) in row.iter().enumerate() {
            let col = col as u16;
            match cell {
                None => {}
                Some(Value::Integer(i)) => {
                    worksheet.write_number(row_num, col, *i as f64)?;
                }
                Some(Value::Float(f)) => {
                    worksheet.write_number(row_num, col, *f)?;
                }
                Some(Value::Boolean(b)) => {
                    worksheet.write_boolean(row_num, col, *b)?;
                }
                Some(other) => {
                    worksheet.write_string(row_num, col, other.as_display())?;
                }
            }
        }
    }
    Ok(workbook)
}

/// Single-sheet workbook bytes mirroring the CSV content.
pub fn to_xlsx_bytes(table: &ExportTable) -> Result<Vec<u8>> {
    let mut workbook = build_workbook(table).context("Building workbook")?;
    workbook.save_to_buffer().context("Serializing workbook")
}

pub fn export_to_path(table: &ExportTable, path: &Path) -> Result<()> {
    match ExportFormat::from_path(path)? {
        ExportFormat::Csv => {
            write_csv(table, io_utils::open_output(path)?)?;
        }
        ExportFormat::Xlsx => {
            let mut workbook = build_workbook(table).context("Building workbook")?;
            workbook
                .save(path)
                .with_context(|| format!("Writing workbook {path:?}"))?;
        }
    }
    if !io_utils::is_dash(path) {
        info!("Exported {} row(s) to {:?}", table.rows.len(), path);
    }
    Ok(())
}
