//! Output formatting for fetched rows.
//!
//! Supports table, JSON, CSV, and raw output formats. Rows of one relation
//! need not share a column set, so the header is the union of every row's
//! columns in first-seen order and missing fields print as empty cells.

use std::fmt;
use std::str::FromStr;

use comfy_table::{Cell, ContentArrangement, Table};
use hangar_db::{Row, Value};

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Formatted table output.
    Table,
    /// JSON output.
    Json,
    /// CSV output.
    Csv,
    /// Raw output (values separated by tabs).
    Raw,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "table" => Ok(OutputFormat::Table),
            "json" => Ok(OutputFormat::Json),
            "csv" => Ok(OutputFormat::Csv),
            "raw" => Ok(OutputFormat::Raw),
            other => Err(format!(
                "Unknown format '{}'. Available: table, json, csv, raw",
                other
            )),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OutputFormat::Table => "table",
            OutputFormat::Json => "json",
            OutputFormat::Csv => "csv",
            OutputFormat::Raw => "raw",
        };
        write!(f, "{}", name)
    }
}

/// Formats rows according to the specified format.
pub fn format_rows(rows: &[Row], format: OutputFormat) -> String {
    match format {
        OutputFormat::Table => format_table(rows),
        OutputFormat::Json => format_json(rows),
        OutputFormat::Csv => format_csv(rows),
        OutputFormat::Raw => format_raw(rows),
    }
}

/// Union of the rows' column names, in first-seen order.
fn header(rows: &[Row]) -> Vec<String> {
    let mut columns: Vec<String> = Vec::new();
    for row in rows {
        for column in row.columns() {
            if !columns.iter().any(|c| c == column) {
                columns.push(column.to_string());
            }
        }
    }
    columns
}

fn cell_text(row: &Row, column: &str) -> String {
    match row.get(column) {
        Some(Value::Null) | None => String::new(),
        Some(value) => value.to_string(),
    }
}

/// Formats the rows as a table.
fn format_table(rows: &[Row]) -> String {
    let columns = header(rows);
    let mut table = Table::new();

    table
        .set_content_arrangement(ContentArrangement::Dynamic)
        .load_preset(comfy_table::presets::UTF8_FULL)
        .apply_modifier(comfy_table::modifiers::UTF8_ROUND_CORNERS);

    if !columns.is_empty() {
        table.set_header(columns.iter().map(Cell::new));
    }

    for row in rows {
        let cells: Vec<Cell> = columns
            .iter()
            .map(|c| match row.get(c) {
                Some(Value::Null) => Cell::new("NULL"),
                Some(value) => Cell::new(value.to_string()),
                None => Cell::new(""),
            })
            .collect();
        table.add_row(cells);
    }

    table.to_string()
}

/// Formats the rows as JSON objects, keeping each row's own fields.
fn format_json(rows: &[Row]) -> String {
    serde_json::to_string_pretty(rows).unwrap_or_else(|_| "[]".to_string())
}

/// Formats the rows as CSV.
fn format_csv(rows: &[Row]) -> String {
    let columns = header(rows);
    let mut output = String::new();

    if !columns.is_empty() {
        let names: Vec<String> = columns.iter().map(|c| escape_csv(c)).collect();
        output.push_str(&names.join(","));
        output.push('\n');
    }

    for row in rows {
        let values: Vec<String> = columns
            .iter()
            .map(|c| escape_csv(&cell_text(row, c)))
            .collect();
        output.push_str(&values.join(","));
        output.push('\n');
    }

    output
}

/// Escapes a value for CSV output.
fn escape_csv(value: &str) -> String {
    if value.contains(',') || value.contains('"') || value.contains('\n') || value.contains('\r') {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// Formats the rows as raw tab-separated values.
fn format_raw(rows: &[Row]) -> String {
    let columns = header(rows);
    let mut output = String::new();

    if !columns.is_empty() {
        output.push_str(&columns.join("\t"));
        output.push('\n');
    }

    for row in rows {
        let values: Vec<String> = columns.iter().map(|c| cell_text(row, c)).collect();
        output.push_str(&values.join("\t"));
        output.push('\n');
    }

    output
}
