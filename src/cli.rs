use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{ArgGroup, Args, Parser, Subcommand};

use crate::{fiscal::FinancialYear, window::{Interval, TimeWindow}};

#[derive(Debug, Parser)]
#[command(author, version, about = "Explore KPI trends in tabular datasets", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Summarize a dataset: date parsing, KPI candidates and financial years
    Inspect(InspectArgs),
    /// Chart-ready KPI series over a date range or preset interval
    Trend(TrendArgs),
    /// Compare one KPI month by month across ranges or financial years
    Compare(CompareArgs),
}

#[derive(Debug, Args)]
pub struct InputArgs {
    /// Dataset to load (.csv, .xlsx, .xls or .json)
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
    /// Character encoding of CSV input (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
}

#[derive(Debug, Args)]
pub struct InspectArgs {
    #[command(flatten)]
    pub input: InputArgs,
    /// Emit the report as JSON instead of text
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct TrendArgs {
    #[command(flatten)]
    pub input: InputArgs,
    /// KPI column to include (repeatable; defaults to the first three numeric columns)
    #[arg(short = 'k', long = "kpi", action = clap::ArgAction::Append)]
    pub kpis: Vec<String>,
    /// Preset interval: 1W, 1M, 3M, 6M, 1Y or 3Y
    #[arg(long, conflicts_with_all = ["start", "end"])]
    pub interval: Option<Interval>,
    /// First day of a custom range (YYYY-MM-DD)
    #[arg(long, value_parser = parse_date)]
    pub start: Option<NaiveDate>,
    /// Last day of a custom range (YYYY-MM-DD)
    #[arg(long, value_parser = parse_date)]
    pub end: Option<NaiveDate>,
    /// Date used as "today" by the 1Y/3Y trim (defaults to the local date)
    #[arg(long, value_parser = parse_date)]
    pub today: Option<NaiveDate>,
    /// Print or export the filtered rows instead of the bucketed series
    #[arg(long)]
    pub rows: bool,
    /// Print a distribution histogram with this many bins per KPI
    #[arg(long = "histogram-bins")]
    pub histogram_bins: Option<usize>,
    /// Export destination (.csv, .xlsx, or - for CSV on stdout)
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,
}

#[derive(Debug, Args)]
#[command(group(
    ArgGroup::new("periods")
        .required(true)
        .multiple(true)
        .args(["ranges", "financial_years"])
))]
pub struct CompareArgs {
    #[command(flatten)]
    pub input: InputArgs,
    /// KPI column to compare
    #[arg(short = 'k', long = "kpi")]
    pub kpi: String,
    /// Date range to compare, as START:END (repeatable)
    #[arg(long = "range", action = clap::ArgAction::Append)]
    pub ranges: Vec<TimeWindow>,
    /// Financial year to compare, e.g. FY2022-23 (repeatable)
    #[arg(long = "fy", action = clap::ArgAction::Append)]
    pub financial_years: Vec<FinancialYear>,
    /// Show months down the side and periods across the top
    #[arg(long)]
    pub pivot: bool,
    /// Export destination (.csv, .xlsx, or - for CSV on stdout)
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,
}

pub fn parse_date(value: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|err| format!("Expected a date like 2023-04-01: {err}"))
}
