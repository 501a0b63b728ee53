mod common;

use std::fs;

use common::{TestWorkspace, daily_table, kpis, ymd};
use encoding_rs::UTF_8;
use kpi_trend::{
    compare::{ComparisonPeriod, compare_across_periods},
    data::Value,
    error::DashboardError,
    export::{ExportTable, export_to_path, to_csv_bytes},
    ingest::load_path,
    pipeline::{WindowSelection, build_trend},
    summary::histogram,
};

#[test]
fn series_export_has_date_then_kpis() {
    let table = daily_table(ymd(2024, 1, 1), 2);
    let view = build_trend(
        &table,
        &kpis(&["Revenue", "Cost"]),
        WindowSelection::Full,
        ymd(2024, 1, 2),
    )
    .expect("trend");
    let csv = String::from_utf8(to_csv_bytes(&ExportTable::from(&view.series)).expect("csv"))
        .expect("utf-8");
    assert_eq!(csv, "Date,Revenue,Cost\n2024-01-01,1,10.5\n2024-01-02,2,10.5\n");
}

#[test]
fn filtered_rows_export_keeps_original_cells() {
    let table = daily_table(ymd(2024, 1, 1), 3);
    let all = ExportTable::from_rows(&table, None).expect("all columns");
    assert_eq!(all.headers, ["Date", "Revenue", "Cost", "Region"]);
    assert_eq!(all.rows[2][3], Some(Value::String("North".to_string())));

    let chosen = kpis(&["Cost"]);
    let selected = ExportTable::from_rows(&table, Some(chosen.as_slice())).expect("selected columns");
    assert_eq!(selected.headers, ["Date", "Cost"]);

    let unknown = kpis(&["Profit"]);
    assert_eq!(
        ExportTable::from_rows(&table, Some(unknown.as_slice())),
        Err(DashboardError::UnknownColumn {
            name: "Profit".to_string()
        })
    );
}

#[test]
fn comparison_exports_in_long_and_wide_form() {
    let table = daily_table(ymd(2022, 3, 30), 4);
    let comparison = compare_across_periods(
        &table,
        "Revenue",
        &[ComparisonPeriod::Range("2022-03-01:2022-04-30".parse().expect("range"))],
    )
    .expect("compare");

    let long = String::from_utf8(to_csv_bytes(&ExportTable::from(&comparison)).expect("csv"))
        .expect("utf-8");
    assert_eq!(
        long,
        "Period,FinancialYear,Month,Revenue\n\
         2022-03-01..2022-04-30,FY2021-22,Mar,1.5\n\
         2022-03-01..2022-04-30,FY2022-23,Apr,3.5\n"
    );

    let wide = String::from_utf8(to_csv_bytes(&ExportTable::from(&comparison.pivot())).expect("csv"))
        .expect("utf-8");
    assert_eq!(
        wide,
        "Month,2022-03-01..2022-04-30 FY2021-22,2022-03-01..2022-04-30 FY2022-23\n\
         Apr,,3.5\n\
         Mar,1.5,\n"
    );
}

#[test]
fn csv_and_xlsx_files_are_written() {
    let workspace = TestWorkspace::new();
    let table = daily_table(ymd(2024, 1, 1), 3);
    let export = ExportTable::from_rows(&table, None).expect("rows");

    let csv_path = workspace.file("report.csv");
    export_to_path(&export, &csv_path).expect("csv export");
    let contents = fs::read_to_string(&csv_path).expect("read csv");
    assert!(contents.starts_with("Date,Revenue,Cost,Region\n2024-01-01,1,10.5,North\n"));

    let xlsx_path = workspace.file("report.xlsx");
    export_to_path(&export, &xlsx_path).expect("xlsx export");
    let reloaded = load_path(&xlsx_path, UTF_8).expect("reload workbook");
    assert_eq!(reloaded.headers(), ["Date", "Revenue", "Cost", "Region"]);
    assert_eq!(reloaded.row_count(), 3);
}

#[test]
fn unsupported_export_extension_is_rejected() {
    let workspace = TestWorkspace::new();
    let export = ExportTable {
        headers: vec!["Date".to_string()],
        rows: Vec::new(),
    };
    let path = workspace.file("report.pdf");
    let err = export_to_path(&export, &path).unwrap_err();
    assert_eq!(
        err.downcast_ref::<DashboardError>(),
        Some(&DashboardError::UnsupportedFormat {
            extension: "pdf".to_string()
        })
    );
    assert!(!path.exists());
}

#[test]
fn histogram_export_lists_bins() {
    let bins = histogram(&[Some(1.0), Some(2.0), Some(3.0), Some(4.0)], 2);
    let csv = String::from_utf8(to_csv_bytes(&ExportTable::from(bins.as_slice())).expect("csv"))
        .expect("utf-8");
    assert_eq!(csv, "Lower,Upper,Count\n1,2.5,2\n2.5,4,2\n");
}
