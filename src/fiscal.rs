//! April-to-March financial years and fiscal month ordering.

use std::{fmt, str::FromStr, sync::LazyLock};

use chrono::{Datelike, Month, NaiveDate};
use regex::Regex;
use serde::{Serialize, Serializer};

use crate::{error::DashboardError, window::TimeWindow};

static FY_LABEL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^FY(\d{4})-(\d{2})$").expect("financial year pattern compiles")
});

/// Months in the order a financial year walks through them.
pub const FISCAL_MONTHS: [Month; 12] = [
    Month::April,
    Month::May,
    Month::June,
    Month::July,
    Month::August,
    Month::September,
    Month::October,
    Month::November,
    Month::December,
    Month::January,
    Month::February,
    Month::March,
];

/// A financial year identified by the calendar year it starts in.
/// `FY2022-23` runs from 2022-04-01 to 2023-03-31.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FinancialYear {
    pub start_year: i32,
}

impl FinancialYear {
    pub fn new(start_year: i32) -> Self {
        Self { start_year }
    }

    pub fn containing(date: NaiveDate) -> Self {
        if date.month() >= 4 {
            Self::new(date.year())
        } else {
            Self::new(date.year() - 1)
        }
    }

    pub fn label(&self) -> String {
        format!(
            "FY{}-{:02}",
            self.start_year,
            (self.start_year + 1).rem_euclid(100)
        )
    }

    /// Inclusive `[1 April, 31 March]`.
    pub fn window(&self) -> TimeWindow {
        let start = NaiveDate::from_ymd_opt(self.start_year, 4, 1).unwrap_or(NaiveDate::MIN);
        let end = NaiveDate::from_ymd_opt(self.start_year + 1, 3, 31).unwrap_or(NaiveDate::MAX);
        TimeWindow::new(start, end)
    }
}

impl fmt::Display for FinancialYear {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

impl Serialize for FinancialYear {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.label())
    }
}

impl FromStr for FinancialYear {
    type Err = DashboardError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let invalid = || DashboardError::InvalidFinancialYear {
            value: value.to_string(),
        };
        let normalized = value.trim().to_ascii_uppercase();
        let captures = FY_LABEL.captures(&normalized).ok_or_else(invalid)?;
        let start_year: i32 = captures[1].parse().map_err(|_| invalid())?;
        let suffix: i32 = captures[2].parse().map_err(|_| invalid())?;
        if (start_year + 1).rem_euclid(100) != suffix {
            return Err(invalid());
        }
        Ok(Self::new(start_year))
    }
}

/// Label of the financial year a date belongs to, e.g. `FY2022-23`.
pub fn assign_financial_year(date: NaiveDate) -> String {
    FinancialYear::containing(date).label()
}

/// Calendar month of a date.
pub fn month_of(date: NaiveDate) -> Month {
    FISCAL_MONTHS
        .into_iter()
        .find(|m| m.number_from_month() == date.month())
        .unwrap_or(Month::January)
}

/// Three-letter month label such as `Apr`.
pub fn month_abbrev(month: Month) -> &'static str {
    &month.name()[..3]
}

/// Position of a month within the financial year: April is 0, March is 11.
pub fn fiscal_month_index(month: Month) -> usize {
    ((month.number_from_month() + 8) % 12) as usize
}

/// Distinct financial years present in a set of dates, ascending.
pub fn financial_years_in<I>(dates: I) -> Vec<FinancialYear>
where
    I: IntoIterator<Item = NaiveDate>,
{
    let mut years: Vec<FinancialYear> = dates.into_iter().map(FinancialYear::containing).collect();
    years.sort();
    years.dedup();
    years
}
