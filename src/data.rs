use std::{collections::HashSet, fmt};

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::error::DashboardError;

/// Name of the column every dataset is expected to carry.
pub const DATE_COLUMN: &str = "Date";

/// A single decoded cell. Missing cells are represented as `None` by callers.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum Value {
    String(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
}

impl Value {
    pub fn as_display(&self) -> String {
        match self {
            Value::String(s) => s.clone(),
            Value::Integer(i) => i.to_string(),
            Value::Float(f) => format_float(*f),
            Value::Boolean(b) => b.to_string(),
            Value::Date(d) => d.format("%Y-%m-%d").to_string(),
            Value::DateTime(dt) => dt.format("%Y-%m-%d %H:%M:%S").to_string(),
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Integer(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, Value::Integer(_) | Value::Float(_))
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_display())
    }
}

pub fn format_float(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{value:.0}")
    } else {
        value.to_string()
    }
}

/// Infers the scalar type of a text cell the way a CSV reader would.
///
/// Empty (or whitespace-only) cells are missing.
pub fn infer_value(raw: &str) -> Option<Value> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(parsed) = trimmed.parse::<i64>() {
        return Some(Value::Integer(parsed));
    }
    if let Ok(parsed) = trimmed.parse::<f64>()
        && trimmed.chars().any(|c| c.is_ascii_digit())
    {
        return Some(Value::Float(parsed));
    }
    match trimmed {
        "true" | "True" | "TRUE" => Some(Value::Boolean(true)),
        "false" | "False" | "FALSE" => Some(Value::Boolean(false)),
        _ => Some(Value::String(raw.to_string())),
    }
}

/// Decoded rows with named columns, before any date handling.
#[derive(Debug, Clone, PartialEq)]
pub struct RawTable {
    headers: Vec<String>,
    rows: Vec<Vec<Option<Value>>>,
}

impl RawTable {
    /// Builds a table, rejecting repeated header names. Blank headers are named
    /// `Unnamed: {index}` first. Short rows are padded with missing cells and
    /// long rows are truncated to the header width.
    pub fn new(
        headers: Vec<String>,
        rows: Vec<Vec<Option<Value>>>,
    ) -> Result<Self, DashboardError> {
        let headers: Vec<String> = headers
            .into_iter()
            .enumerate()
            .map(|(idx, header)| {
                if header.trim().is_empty() {
                    format!("Unnamed: {idx}")
                } else {
                    header
                }
            })
            .collect();
        let mut seen = HashSet::with_capacity(headers.len());
        for header in &headers {
            if !seen.insert(header.as_str()) {
                return Err(DashboardError::DuplicateColumn {
                    name: header.clone(),
                });
            }
        }
        let width = headers.len();
        let rows = rows
            .into_iter()
            .map(|mut row| {
                row.resize(width, None);
                row
            })
            .collect();
        Ok(Self { headers, rows })
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Vec<Option<Value>>] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
