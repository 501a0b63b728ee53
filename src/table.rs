//! Plain-text rendering of report tables for the terminal.

use std::{borrow::Cow, fmt::Write as _};

use crate::{data::Value, export::ExportTable};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Align {
    Left,
    Right,
}

/// Columns are separated by two spaces and sized to their widest cell.
/// Columns holding only numbers (or blanks) are right-aligned.
pub fn render_table(table: &ExportTable) -> String {
    let rows = table.display_rows();
    let column_count = table.headers.len();
    let aligns: Vec<Align> = (0..column_count)
        .map(|idx| {
            let numeric = table.rows.iter().any(|row| row.get(idx).is_some_and(Option::is_some))
                && table.rows.iter().all(|row| {
                    row.get(idx)
                        .and_then(Option::as_ref)
                        .is_none_or(Value::is_numeric)
                });
            if numeric { Align::Right } else { Align::Left }
        })
        .collect();

    let mut widths: Vec<usize> = table.headers.iter().map(|h| display_width(h)).collect();
    for row in &rows {
        for (idx, cell) in row.iter().enumerate().take(column_count) {
            widths[idx] = widths[idx].max(display_width(cell));
        }
    }
    for width in &mut widths {
        *width = (*width).max(3);
    }

    let mut output = String::new();
    let _ = writeln!(output, "{}", format_row(&table.headers, &widths, &aligns));
    let separator: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    let _ = writeln!(output, "{}", format_row(&separator, &widths, &aligns));
    for row in &rows {
        let _ = writeln!(output, "{}", format_row(row, &widths, &aligns));
    }
    output
}

/// Renders `table` under a title line; an empty table prints a note instead.
pub fn render_section(title: &str, table: &ExportTable) -> String {
    let mut output = format!("{title}\n");
    if table.rows.is_empty() {
        output.push_str("(no data)\n");
    } else {
        output.push_str(&render_table(table));
    }
    output
}

pub fn print_section(title: &str, table: &ExportTable) {
    println!("{}", render_section(title, table));
}

fn format_row(values: &[String], widths: &[usize], aligns: &[Align]) -> String {
    let cells: Vec<String> = values
        .iter()
        .zip(widths.iter().zip(aligns))
        .map(|(value, (width, align))| {
            let sanitized = sanitize_cell(value);
            let padding = " ".repeat(width.saturating_sub(display_width(&sanitized)));
            match align {
                Align::Left => format!("{sanitized}{padding}"),
                Align::Right => format!("{padding}{sanitized}"),
            }
        })
        .collect();
    cells.join("  ").trim_end().to_string()
}

fn display_width(value: &str) -> usize {
    let mut width = 0usize;
    let mut chars = value.chars();
    while let Some(ch) = chars.next() {
        if ch == '\u{1b}' {
            // ANSI colour sequences take no room on screen.
            for next in chars.by_ref() {
                if next == 'm' {
                    break;
                }
            }
        } else {
            width += 1;
        }
    }
    width
}

fn sanitize_cell(value: &str) -> Cow<'_, str> {
    if value.contains(['\n', '\r', '\t']) {
        Cow::Owned(value.replace(['\n', '\r', '\t'], " "))
    } else {
        Cow::Borrowed(value)
    }
}
