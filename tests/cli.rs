mod common;

use assert_cmd::Command;
use common::{TestWorkspace, daily_csv, ymd};
use predicates::prelude::PredicateBooleanExt;
use predicates::str::contains;

fn kpi_trend() -> Command {
    let mut cmd = Command::cargo_bin("kpi-trend").expect("binary exists");
    cmd.env("RUST_LOG", "off");
    cmd
}

fn sample_workspace() -> (TestWorkspace, std::path::PathBuf) {
    let workspace = TestWorkspace::new();
    // 2022-01-01 through 2023-02-04.
    let path = workspace.write("sales.csv", &daily_csv(ymd(2022, 1, 1), 400));
    (workspace, path)
}

#[test]
fn inspect_reports_dates_kpis_and_financial_years() {
    let (_workspace, input) = sample_workspace();
    kpi_trend()
        .args(["inspect", "-i", input.to_str().unwrap()])
        .assert()
        .success()
        .stdout(
            contains("Rows kept: 400")
                .and(contains("Date parsing: format %Y-%m-%d"))
                .and(contains("KPI candidates: Revenue, Cost"))
                .and(contains("Financial years: FY2021-22, FY2022-23")),
        );
}

#[test]
fn inspect_json_is_machine_readable() {
    let (_workspace, input) = sample_workspace();
    let output = kpi_trend()
        .args(["inspect", "-i", input.to_str().unwrap(), "--json"])
        .output()
        .expect("run inspect");
    assert!(output.status.success());
    let report: serde_json::Value = serde_json::from_slice(&output.stdout).expect("json report");
    assert_eq!(report["rows_kept"], 400);
    assert_eq!(report["rows_dropped"], 0);
    assert_eq!(report["date_strategy"]["kind"], "format");
    assert_eq!(report["date_strategy"]["format"], "%Y-%m-%d");
    assert_eq!(report["max_date"], "2023-02-04");
    assert_eq!(report["financial_years"][1], "FY2022-23");
}

#[test]
fn trend_interval_exports_weekly_csv_to_stdout() {
    let (_workspace, input) = sample_workspace();
    let output = kpi_trend()
        .args([
            "trend",
            "-i",
            input.to_str().unwrap(),
            "-k",
            "Revenue",
            "--interval",
            "3M",
            "--today",
            "2023-02-04",
            "-o",
            "-",
        ])
        .output()
        .expect("run trend");
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).expect("utf-8");
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines.len(), 13);
    assert_eq!(lines[0], "Date,Revenue");
    assert_eq!(lines[12], "2023-02-05,397.5");
}

#[test]
fn trend_prints_summary_series_and_histogram() {
    let (_workspace, input) = sample_workspace();
    kpi_trend()
        .args([
            "trend",
            "-i",
            input.to_str().unwrap(),
            "--start",
            "2023-02-01",
            "--histogram-bins",
            "2",
        ])
        .assert()
        .success()
        .stdout(
            contains("Summary")
                .and(contains("Trend (2023-02-01..2023-02-04)"))
                .and(contains("Distribution of Revenue"))
                .and(contains("Distribution of Cost")),
        );
}

#[test]
fn trend_writes_filtered_rows_to_workbook() {
    let (workspace, input) = sample_workspace();
    let output = workspace.file("rows.xlsx");
    kpi_trend()
        .args([
            "trend",
            "-i",
            input.to_str().unwrap(),
            "--interval",
            "1W",
            "--rows",
            "-o",
            output.to_str().unwrap(),
        ])
        .assert()
        .success();
    let bytes = std::fs::read(&output).expect("workbook written");
    assert_eq!(&bytes[..2], b"PK");
}

#[test]
fn trend_rejects_interval_with_custom_range() {
    let (_workspace, input) = sample_workspace();
    kpi_trend()
        .args([
            "trend",
            "-i",
            input.to_str().unwrap(),
            "--interval",
            "1Y",
            "--end",
            "2023-01-01",
        ])
        .assert()
        .failure();
}

#[test]
fn trend_rejects_unknown_interval() {
    let (_workspace, input) = sample_workspace();
    kpi_trend()
        .args(["trend", "-i", input.to_str().unwrap(), "--interval", "2W"])
        .assert()
        .failure()
        .stderr(contains("unknown interval '2W'"));
}

#[test]
fn unsupported_upload_fails_with_message() {
    let workspace = TestWorkspace::new();
    let input = workspace.write("sales.txt", "Date,Revenue\n2024-01-01,1\n");
    kpi_trend()
        .args(["inspect", "-i", input.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(contains("error: unsupported file format 'txt'"));
}

#[test]
fn non_numeric_kpi_fails_with_message() {
    let (_workspace, input) = sample_workspace();
    kpi_trend()
        .args(["trend", "-i", input.to_str().unwrap(), "-k", "Region"])
        .assert()
        .failure()
        .stderr(contains("column 'Region' is not numeric"));
}

#[test]
fn compare_pivot_exports_financial_year_columns() {
    let (_workspace, input) = sample_workspace();
    let output = kpi_trend()
        .args([
            "compare",
            "-i",
            input.to_str().unwrap(),
            "-k",
            "Revenue",
            "--fy",
            "FY2021-22",
            "--fy",
            "FY2022-23",
            "--pivot",
            "-o",
            "-",
        ])
        .output()
        .expect("run compare");
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).expect("utf-8");
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines[0], "Month,FY2021-22,FY2022-23");
    assert_eq!(lines[1], "Apr,,105.5");
    assert_eq!(lines.len(), 13);
}

#[test]
fn compare_prints_long_table_for_ranges() {
    let (_workspace, input) = sample_workspace();
    kpi_trend()
        .args([
            "compare",
            "-i",
            input.to_str().unwrap(),
            "-k",
            "Revenue",
            "--range",
            "2022-05-01:2022-05-31",
        ])
        .assert()
        .success()
        .stdout(
            contains("Revenue by financial year and month")
                .and(contains("2022-05-01..2022-05-31"))
                .and(contains("FY2022-23"))
                .and(contains("May")),
        );
}

#[test]
fn compare_requires_a_period() {
    let (_workspace, input) = sample_workspace();
    kpi_trend()
        .args(["compare", "-i", input.to_str().unwrap(), "-k", "Revenue"])
        .assert()
        .failure();
}

#[test]
fn compare_rejects_inconsistent_financial_year() {
    let (_workspace, input) = sample_workspace();
    kpi_trend()
        .args([
            "compare",
            "-i",
            input.to_str().unwrap(),
            "-k",
            "Revenue",
            "--fy",
            "FY2022-25",
        ])
        .assert()
        .failure()
        .stderr(contains("invalid financial year 'FY2022-25'"));
}
