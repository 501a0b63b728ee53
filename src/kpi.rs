use log::debug;

use crate::{data::Value, dates::NormalizedTable, error::DashboardError};

/// How many KPIs are pre-selected when the user has not picked any.
pub const DEFAULT_KPI_COUNT: usize = 3;

/// Every non-`Date` column whose present values are all integers or floats,
/// in original column order. A column with no values at all is not a KPI.
pub fn select_kpi_columns(table: &NormalizedTable) -> Vec<String> {
    table
        .columns()
        .iter()
        .enumerate()
        .filter(|(idx, _)| is_numeric_column(table, *idx))
        .map(|(_, name)| name.clone())
        .collect()
}

fn is_numeric_column(table: &NormalizedTable, column: usize) -> bool {
    let mut present = table
        .rows()
        .iter()
        .filter_map(|row| row.values.get(column).and_then(|v| v.as_ref()))
        .peekable();
    present.peek().is_some() && present.all(Value::is_numeric)
}

/// Validates a user selection against the KPI candidates.
///
/// An empty request selects the first [`DEFAULT_KPI_COUNT`] candidates. A
/// dataset without candidates is reported as [`DashboardError::NoNumericColumns`].
pub fn resolve_kpis(
    table: &NormalizedTable,
    requested: &[String],
) -> Result<Vec<String>, DashboardError> {
    let candidates = select_kpi_columns(table);
    if candidates.is_empty() {
        return Err(DashboardError::NoNumericColumns);
    }
    if requested.is_empty() {
        let defaults: Vec<String> = candidates.into_iter().take(DEFAULT_KPI_COUNT).collect();
        debug!("No KPI requested; defaulting to {defaults:?}");
        return Ok(defaults);
    }
    let mut resolved = Vec::with_capacity(requested.len());
    for name in requested {
        ensure_kpi(table, &candidates, name)?;
        if !resolved.contains(name) {
            resolved.push(name.clone());
        }
    }
    Ok(resolved)
}

/// Checks a single column name against the full dataset, distinguishing
/// unknown from non-numeric. On a table with no rows any known column passes.
pub fn require_kpi(table: &NormalizedTable, name: &str) -> Result<usize, DashboardError> {
    let index = column_of(table, name)?;
    if table.is_empty() || is_numeric_column(table, index) {
        Ok(index)
    } else {
        Err(DashboardError::NotNumeric {
            name: name.to_string(),
        })
    }
}

/// Column lookup for a table already cut down to a window. A KPI may have no
/// values there at all; only a present non-numeric value rejects it.
pub fn kpi_column(table: &NormalizedTable, name: &str) -> Result<usize, DashboardError> {
    let index = column_of(table, name)?;
    let has_text = table
        .rows()
        .iter()
        .filter_map(|row| row.values.get(index).and_then(Option::as_ref))
        .any(|value| !value.is_numeric());
    if has_text {
        Err(DashboardError::NotNumeric {
            name: name.to_string(),
        })
    } else {
        Ok(index)
    }
}

fn column_of(table: &NormalizedTable, name: &str) -> Result<usize, DashboardError> {
    table
        .column_index(name)
        .ok_or_else(|| DashboardError::UnknownColumn {
            name: name.to_string(),
        })
}

fn ensure_kpi(
    table: &NormalizedTable,
    candidates: &[String],
    name: &str,
) -> Result<usize, DashboardError> {
    let index = column_of(table, name)?;
    if !candidates.iter().any(|c| c == name) {
        return Err(DashboardError::NotNumeric {
            name: name.to_string(),
        });
    }
    Ok(index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{data::RawTable, dates::normalize};

    fn sample() -> NormalizedTable {
        let raw = RawTable::new(
            vec![
                "Region".into(),
                "Date".into(),
                "Revenue".into(),
                "Flag".into(),
                "Cost".into(),
                "Blank".into(),
            ],
            vec![
                vec![
                    Some(Value::String("North".into())),
                    Some(Value::String("2024-01-01".into())),
                    Some(Value::Integer(10)),
                    Some(Value::Boolean(true)),
                    Some(Value::Float(2.5)),
                    None,
                ],
                vec![
                    Some(Value::String("South".into())),
                    Some(Value::String("2024-01-02".into())),
                    Some(Value::Float(12.5)),
                    Some(Value::Boolean(false)),
                    None,
                    None,
                ],
            ],
        )
        .unwrap();
        normalize(&raw).unwrap()
    }

    #[test]
    fn numeric_columns_keep_original_order() {
        assert_eq!(select_kpi_columns(&sample()), vec!["Revenue", "Cost"]);
    }

    #[test]
    fn empty_request_defaults_to_leading_candidates() {
        assert_eq!(resolve_kpis(&sample(), &[]).unwrap(), vec!["Revenue", "Cost"]);
    }

    #[test]
    fn unknown_and_non_numeric_columns_are_distinguished() {
        let table = sample();
        assert_eq!(
            resolve_kpis(&table, &["Profit".to_string()]),
            Err(DashboardError::UnknownColumn {
                name: "Profit".into()
            })
        );
        assert_eq!(
            require_kpi(&table, "Region"),
            Err(DashboardError::NotNumeric {
                name: "Region".into()
            })
        );
    }

    #[test]
    fn dataset_without_numbers_is_reported() {
        let raw = RawTable::new(
            vec!["Date".into(), "Note".into()],
            vec![vec![
                Some(Value::String("2024-01-01".into())),
                Some(Value::String("hello".into())),
            ]],
        )
        .unwrap();
        let table = normalize(&raw).unwrap();
        assert!(select_kpi_columns(&table).is_empty());
        assert_eq!(resolve_kpis(&table, &[]), Err(DashboardError::NoNumericColumns));
    }

    #[test]
    fn windowed_lookup_accepts_columns_without_values() {
        let table = sample();
        // Blank is empty everywhere: not a candidate, but no text either.
        assert_eq!(kpi_column(&table, "Blank"), Ok(4));
        assert_eq!(
            require_kpi(&table, "Blank"),
            Err(DashboardError::NotNumeric {
                name: "Blank".into()
            })
        );
        assert_eq!(
            kpi_column(&table, "Flag"),
            Err(DashboardError::NotNumeric {
                name: "Flag".into()
            })
        );
        assert_eq!(
            kpi_column(&table, "Profit"),
            Err(DashboardError::UnknownColumn {
                name: "Profit".into()
            })
        );
    }
}
