pub mod bucket;
pub mod cli;
pub mod compare;
pub mod data;
pub mod dates;
pub mod error;
pub mod export;
pub mod fiscal;
pub mod ingest;
pub mod io_utils;
pub mod kpi;
pub mod pipeline;
pub mod session;
pub mod summary;
pub mod table;
pub mod window;

use std::{env, sync::OnceLock};

use anyhow::{Context, Result};
use clap::Parser;
use log::{LevelFilter, debug, info, warn};

use crate::{
    cli::{Cli, Commands, InputArgs},
    compare::ComparisonPeriod,
    dates::NormalizedTable,
    export::ExportTable,
    pipeline::WindowSelection,
    session::ComparisonRanges,
    table::print_section,
};

static LOGGER: OnceLock<()> = OnceLock::new();

fn init_logging() {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var("RUST_LOG").is_err() {
            builder.filter_module("kpi_trend", LevelFilter::Info);
        }
        let _ = builder.format_timestamp_millis().try_init();
    });
}

pub fn run() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    match cli.command {
        Commands::Inspect(args) => handle_inspect(&args),
        Commands::Trend(args) => handle_trend(&args),
        Commands::Compare(args) => handle_compare(&args),
    }
}

fn load_table(args: &InputArgs) -> Result<NormalizedTable> {
    let encoding = io_utils::resolve_encoding(args.input_encoding.as_deref())?;
    info!(
        "Loading '{}' with encoding {}",
        args.input.display(),
        encoding.name()
    );
    let raw = ingest::load_path(&args.input, encoding)?;
    let table = dates::normalize(&raw)
        .with_context(|| format!("Normalizing dates in {:?}", args.input))?;
    Ok(table)
}

fn handle_inspect(args: &cli::InspectArgs) -> Result<()> {
    let table = load_table(&args.input)?;
    let overview = summary::overview(&table);
    if args.json {
        let json = serde_json::to_string_pretty(&overview).context("Serializing overview")?;
        println!("{json}");
        return Ok(());
    }

    let optional_date = |date: Option<chrono::NaiveDate>| {
        date.map(|d| d.to_string()).unwrap_or_else(|| "-".to_string())
    };
    println!("Rows read: {}", overview.rows_read);
    println!("Rows kept: {}", overview.rows_kept);
    println!("Rows dropped: {}", overview.rows_dropped);
    println!("Date parsing: {}", overview.date_strategy);
    println!("First date: {}", optional_date(overview.min_date));
    println!("Last date: {}", optional_date(overview.max_date));
    println!("Columns: {}", overview.columns.join(", "));
    println!("KPI candidates: {}", overview.kpi_candidates.join(", "));
    let years: Vec<String> = overview
        .financial_years
        .iter()
        .map(|fy| fy.label())
        .collect();
    println!("Financial years: {}", years.join(", "));
    Ok(())
}

fn handle_trend(args: &cli::TrendArgs) -> Result<()> {
    let table = load_table(&args.input)?;
    let kpis = kpi::resolve_kpis(&table, &args.kpis)?;
    let selection = match (args.interval, args.start, args.end) {
        (Some(interval), _, _) => WindowSelection::Interval(interval),
        (None, None, None) => WindowSelection::Full,
        (None, start, end) => WindowSelection::Range { start, end },
    };
    let today = args
        .today
        .unwrap_or_else(|| chrono::Local::now().date_naive());
    debug!("Trend selection {selection:?}, today {today}, KPIs {kpis:?}");

    let view = pipeline::build_trend(&table, &kpis, selection, today)?;
    if view.series.is_empty() {
        warn!("No rows fall inside {}; nothing to render", view.window);
    }

    let primary = if args.rows {
        ExportTable::from_rows(&view.rows, Some(kpis.as_slice()))?
    } else {
        ExportTable::from(&view.series)
    };
    if let Some(path) = &args.output {
        return export::export_to_path(&primary, path);
    }

    let heading = match view.interval {
        Some(interval) => format!("{} trend ({}, {})", interval, view.series.period(), view.window),
        None => format!("Trend ({})", view.window),
    };
    print_section("Summary", &ExportTable::from(&view.summary));
    print_section(&heading, &primary);
    if let Some(bins) = args.histogram_bins {
        for name in &kpis {
            let Some(column) = view.rows.column_index(name) else {
                continue;
            };
            let values: Vec<Option<f64>> = view
                .rows
                .rows()
                .iter()
                .map(|row| view.rows.numeric(row, column))
                .collect();
            let histogram = summary::histogram(&values, bins);
            print_section(
                &format!("Distribution of {name}"),
                &ExportTable::from(histogram.as_slice()),
            );
        }
    }
    Ok(())
}

fn handle_compare(args: &cli::CompareArgs) -> Result<()> {
    let table = load_table(&args.input)?;
    let ranges: ComparisonRanges = args.ranges.iter().copied().collect();
    let mut periods = ranges.periods();
    periods.extend(
        args.financial_years
            .iter()
            .copied()
            .map(ComparisonPeriod::FinancialYear),
    );
    info!(
        "Comparing '{}' across {} period(s)",
        args.kpi,
        periods.len()
    );

    let comparison = compare::compare_across_periods(&table, &args.kpi, &periods)?;
    if comparison.is_empty() {
        warn!("None of the selected periods contain data");
    }
    let output = if args.pivot {
        ExportTable::from(&comparison.pivot())
    } else {
        ExportTable::from(&comparison)
    };
    match &args.output {
        Some(path) => export::export_to_path(&output, path),
        None => {
            print_section(&format!("{} by financial year and month", args.kpi), &output);
            Ok(())
        }
    }
}
