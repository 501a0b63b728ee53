#![allow(dead_code)]

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{Days, NaiveDate};
use kpi_trend::{
    data::{RawTable, Value},
    dates::{NormalizedTable, normalize},
};
use tempfile::{TempDir, tempdir};

pub fn ymd(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
}

/// Scratch directory helper that cleans up files automatically on drop.
pub struct TestWorkspace {
    temp_dir: TempDir,
}

impl TestWorkspace {
    /// Creates a fresh scratch directory for the current test case.
    pub fn new() -> Self {
        Self {
            temp_dir: tempdir().expect("temp dir"),
        }
    }

    /// Returns the root path for all files owned by this workspace.
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Path for a file that does not exist yet.
    pub fn file(&self, name: &str) -> PathBuf {
        self.temp_dir.path().join(name)
    }

    /// Writes `contents` into a file under the workspace and returns the path.
    pub fn write(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.file(name);
        let mut file = File::create(&path).expect("create temp file");
        file.write_all(contents.as_bytes())
            .expect("write temp file contents");
        path
    }
}

/// One row per day starting at `start`: `Revenue` counts up from 1, `Cost`
/// is constant and `Region` is text.
pub fn daily_csv(start: NaiveDate, days: u64) -> String {
    let mut csv = String::from("Date,Revenue,Cost,Region\n");
    for offset in 0..days {
        let date = start + Days::new(offset);
        csv.push_str(&format!(
            "{},{},{},{}\n",
            date.format("%Y-%m-%d"),
            offset + 1,
            10.5,
            if offset % 2 == 0 { "North" } else { "South" }
        ));
    }
    csv
}

/// Same shape as [`daily_csv`], already normalized.
pub fn daily_table(start: NaiveDate, days: u64) -> NormalizedTable {
    let rows = (0..days)
        .map(|offset| {
            let date = start + Days::new(offset);
            vec![
                Some(Value::String(date.format("%Y-%m-%d").to_string())),
                Some(Value::Integer(offset as i64 + 1)),
                Some(Value::Float(10.5)),
                Some(Value::String(
                    if offset % 2 == 0 { "North" } else { "South" }.to_string(),
                )),
            ]
        })
        .collect();
    let raw = RawTable::new(
        vec![
            "Date".to_string(),
            "Revenue".to_string(),
            "Cost".to_string(),
            "Region".to_string(),
        ],
        rows,
    )
    .expect("unique headers");
    normalize(&raw).expect("normalizes")
}

/// Rows given as `(date text, revenue)` pairs.
pub fn revenue_table(rows: &[(&str, f64)]) -> NormalizedTable {
    let raw = RawTable::new(
        vec!["Date".to_string(), "Revenue".to_string()],
        rows.iter()
            .map(|(date, revenue)| {
                vec![
                    Some(Value::String((*date).to_string())),
                    Some(Value::Float(*revenue)),
                ]
            })
            .collect(),
    )
    .expect("unique headers");
    normalize(&raw).expect("normalizes")
}

pub fn kpis(names: &[&str]) -> Vec<String> {
    names.iter().map(|name| name.to_string()).collect()
}
