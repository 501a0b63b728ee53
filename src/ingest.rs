//! Upload decoding: a byte stream plus its file name becomes a [`RawTable`].
//!
//! The extension picks the decoder (`csv`, `xlsx`/`xls`, `json`). Anything
//! else is refused with [`DashboardError::UnsupportedFormat`] before a single
//! byte is read.

use std::{fs, io::Cursor, path::Path};

use anyhow::{Context, Result, anyhow, bail};
use calamine::{Data, Reader, open_workbook_auto_from_rs};
use encoding_rs::Encoding;
use log::{debug, info};
use serde_json::{Map, Value as JsonValue};

use crate::{
    data::{RawTable, Value, format_float, infer_value},
    error::DashboardError,
    io_utils,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFormat {
    Csv,
    Excel,
    Json,
}

impl InputFormat {
    pub fn from_file_name(name: &str) -> Result<Self, DashboardError> {
        match io_utils::extension_of(name).as_str() {
            "csv" => Ok(InputFormat::Csv),
            "xlsx" | "xls" => Ok(InputFormat::Excel),
            "json" => Ok(InputFormat::Json),
            other => Err(DashboardError::UnsupportedFormat {
                extension: other.to_string(),
            }),
        }
    }
}

/// Reads a file from disk and decodes it according to its extension.
pub fn load_path(path: &Path, encoding: &'static Encoding) -> Result<RawTable> {
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| anyhow!("Input path {path:?} has no file name"))?;
    // Refuse unsupported uploads before touching the file system.
    InputFormat::from_file_name(name)?;
    let bytes = fs::read(path).with_context(|| format!("Reading input file {path:?}"))?;
    decode(name, &bytes, encoding)
}

pub fn decode(file_name: &str, bytes: &[u8], encoding: &'static Encoding) -> Result<RawTable> {
    let format = InputFormat::from_file_name(file_name)?;
    debug!("Decoding '{file_name}' as {format:?}");
    let table = match format {
        InputFormat::Csv => decode_csv(bytes, encoding),
        InputFormat::Excel => decode_excel(bytes),
        InputFormat::Json => decode_json(bytes),
    }
    .with_context(|| format!("Decoding '{file_name}'"))?;
    info!(
        "Decoded {} row(s) across {} column(s) from '{}'",
        table.row_count(),
        table.headers().len(),
        file_name
    );
    Ok(table)
}

fn decode_csv(bytes: &[u8], encoding: &'static Encoding) -> Result<RawTable> {
    let mut reader = io_utils::open_csv_reader(bytes);
    let headers = io_utils::reader_headers(&mut reader, encoding)?;
    let mut rows = Vec::new();
    for (row_idx, record) in reader.byte_records().enumerate() {
        let record = record.with_context(|| format!("Reading row {}", row_idx + 2))?;
        let decoded = io_utils::decode_record(&record, encoding)
            .with_context(|| format!("Decoding row {}", row_idx + 2))?;
        rows.push(decoded.iter().map(|cell| infer_value(cell)).collect());
    }
    Ok(RawTable::new(headers, rows)?)
}

fn decode_excel(bytes: &[u8]) -> Result<RawTable> {
    let mut workbook =
        open_workbook_auto_from_rs(Cursor::new(bytes.to_vec())).context("Opening workbook")?;
    let sheet_names = workbook.sheet_names().to_vec();
    let Some(sheet_name) = sheet_names.first() else {
        bail!("Workbook has no sheets");
    };
    let range = workbook
        .worksheet_range(sheet_name)
        .with_context(|| format!("Reading sheet '{sheet_name}'"))?;

    let mut sheet_rows = range.rows();
    let headers = match sheet_rows.next() {
        Some(header_row) => header_row.iter().map(header_from_cell).collect(),
        None => Vec::new(),
    };
    let rows = sheet_rows
        .map(|row| row.iter().map(value_from_cell).collect())
        .collect();
    Ok(RawTable::new(headers, rows)?)
}

fn header_from_cell(cell: &Data) -> String {
    match cell {
        Data::String(s) => s.trim().to_string(),
        Data::Float(f) => format_float(*f),
        Data::Empty => String::new(),
        other => other.to_string(),
    }
}

fn value_from_cell(cell: &Data) -> Option<Value> {
    match cell {
        Data::Int(i) => Some(Value::Integer(*i)),
        Data::Float(f) => Some(Value::Float(*f)),
        Data::String(s) if s.trim().is_empty() => None,
        Data::String(s) => Some(Value::String(s.clone())),
        Data::Bool(b) => Some(Value::Boolean(*b)),
        Data::DateTime(dt) => dt.as_datetime().map(Value::DateTime),
        Data::DateTimeIso(s) | Data::DurationIso(s) => Some(Value::String(s.clone())),
        Data::Error(_) | Data::Empty => None,
    }
}

/// Accepts record-oriented (`[{..}, ..]`) and column-oriented
/// (`{"col": {"0": ..}}` or `{"col": [..]}`) documents.
fn decode_json(bytes: &[u8]) -> Result<RawTable> {
    let document: JsonValue = serde_json::from_slice(bytes).context("Parsing JSON document")?;
    match document {
        JsonValue::Array(records) => decode_json_records(records),
        JsonValue::Object(columns) => decode_json_columns(columns),
        _ => bail!("JSON document must be an array of records or an object of columns"),
    }
}

fn decode_json_records(records: Vec<JsonValue>) -> Result<RawTable> {
    let mut headers: Vec<String> = Vec::new();
    for (idx, record) in records.iter().enumerate() {
        let JsonValue::Object(fields) = record else {
            bail!("JSON record {idx} is not an object");
        };
        for key in fields.keys() {
            if !headers.iter().any(|h| h == key) {
                headers.push(key.clone());
            }
        }
    }
    let rows = records
        .iter()
        .map(|record| {
            headers
                .iter()
                .map(|header| record.get(header).and_then(value_from_json))
                .collect()
        })
        .collect();
    Ok(RawTable::new(headers, rows)?)
}

fn decode_json_columns(columns: Map<String, JsonValue>) -> Result<RawTable> {
    let headers: Vec<String> = columns.keys().cloned().collect();

    let mut index_keys: Vec<String> = Vec::new();
    let mut row_count = 0usize;
    for (name, column) in &columns {
        match column {
            JsonValue::Object(cells) => {
                for key in cells.keys() {
                    if !index_keys.iter().any(|k| k == key) {
                        index_keys.push(key.clone());
                    }
                }
            }
            JsonValue::Array(cells) => row_count = row_count.max(cells.len()),
            _ => bail!("JSON column '{name}' must be an object or an array"),
        }
    }
    if index_keys.iter().all(|k| k.parse::<i64>().is_ok()) {
        index_keys.sort_by_key(|k| k.parse::<i64>().unwrap_or_default());
    }
    let row_count = row_count.max(index_keys.len());

    let rows = (0..row_count)
        .map(|row_idx| {
            columns
                .values()
                .map(|column| match column {
                    JsonValue::Object(cells) => index_keys
                        .get(row_idx)
                        .and_then(|key| cells.get(key))
                        .and_then(value_from_json),
                    JsonValue::Array(cells) => cells.get(row_idx).and_then(value_from_json),
                    _ => None,
                })
                .collect()
        })
        .collect();
    Ok(RawTable::new(headers, rows)?)
}

fn value_from_json(value: &JsonValue) -> Option<Value> {
    match value {
        JsonValue::Null => None,
        JsonValue::Bool(b) => Some(Value::Boolean(*b)),
        JsonValue::Number(n) => n
            .as_i64()
            .map(Value::Integer)
            .or_else(|| n.as_f64().map(Value::Float)),
        JsonValue::String(s) if s.trim().is_empty() => None,
        JsonValue::String(s) => Some(Value::String(s.clone())),
        nested => Some(Value::String(nested.to_string())),
    }
}
