//! CSV repair and normalization
//!
//! Model output is free text that usually, but not always, contains CSV.
//! This module coerces whatever came back into a well-formed CSV with the
//! fixed transaction schema. The contract is best-effort by design: these
//! functions never fail, a structurally valid CSV always comes out, with a
//! single sentinel row when nothing usable could be recovered.

use chrono::Local;
use csv::{ReaderBuilder, Trim, WriterBuilder};
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::models::TransactionRow;

/// Fixed output schema, in order. The first three are required, the rest
/// optional; all six always appear in the output.
pub const COLUMNS: [&str; 6] = [
    "date",
    "description",
    "amount",
    "balance",
    "category",
    "installments",
];

/// UTF-8 byte-order marker prepended for spreadsheet compatibility
const BOM: &str = "\u{feff}";

/// Build a normalized CSV from a raw model response
pub fn from_model_response(response: &str) -> String {
    match normalize_response(response) {
        Ok(csv) => csv,
        Err(e) => {
            warn!("Failed to normalize model output into CSV: {}", e);
            sentinel_csv("Error processing data")
        }
    }
}

fn normalize_response(response: &str) -> Result<String> {
    // Strip any BOM from a previous pass so normalization is idempotent
    let trimmed = response.trim().trim_start_matches('\u{feff}').trim_start();

    let candidate = if trimmed.starts_with("date,") {
        trimmed.to_string()
    } else {
        // Keep only lines that look tabular; prose headers and footers
        // around the CSV block are dropped
        let csv_lines: Vec<&str> = trimmed
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && line.contains(','))
            .collect();

        if csv_lines.is_empty() {
            return Ok(sentinel_csv("No data extracted"));
        }
        csv_lines.join("\n")
    };

    let rows = parse_rows(&candidate)?;
    debug!("Normalized model output into {} rows", rows.len());
    write_csv(&rows)
}

/// Parse tabular text into schema-ordered rows
///
/// The first line is treated as the header. Every schema column missing
/// from the header materializes as empty; columns outside the schema are
/// dropped.
fn parse_rows(candidate: &str) -> Result<Vec<[String; 6]>> {
    let mut reader = ReaderBuilder::new()
        .flexible(true)
        .trim(Trim::All)
        .from_reader(candidate.as_bytes());

    let headers = reader.headers()?.clone();
    let column_index: Vec<Option<usize>> = COLUMNS
        .iter()
        .map(|col| headers.iter().position(|h| h.eq_ignore_ascii_case(col)))
        .collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        let mut row: [String; 6] = Default::default();
        for (slot, index) in row.iter_mut().zip(&column_index) {
            *slot = index
                .and_then(|i| record.get(i))
                .unwrap_or_default()
                .to_string();
        }
        rows.push(row);
    }
    Ok(rows)
}

/// Build a normalized CSV directly from structured transaction rows
pub fn from_transactions(transactions: &[TransactionRow]) -> String {
    if transactions.is_empty() {
        return sentinel_csv("No transactions found");
    }

    let rows: Vec<[String; 6]> = transactions
        .iter()
        .map(|t| {
            [
                t.date.clone(),
                t.description.clone(),
                t.amount.clone(),
                t.balance.clone(),
                t.category.clone(),
                t.installments.clone(),
            ]
        })
        .collect();

    match write_csv(&rows) {
        Ok(csv) => csv,
        Err(e) => {
            warn!("Failed to serialize transactions into CSV: {}", e);
            sentinel_csv("Error processing data")
        }
    }
}

/// Serialize schema-ordered rows with the header and BOM prefix
fn write_csv(rows: &[[String; 6]]) -> Result<String> {
    let mut writer = WriterBuilder::new().from_writer(Vec::new());
    writer.write_record(COLUMNS)?;
    for row in rows {
        writer.write_record(row)?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| Error::InvalidData(format!("CSV writer flush failed: {}", e)))?;
    let body = String::from_utf8(bytes)
        .map_err(|e| Error::InvalidData(format!("CSV output not UTF-8: {}", e)))?;
    Ok(format!("{}{}", BOM, body))
}

/// Schema header plus a single sentinel data row
fn sentinel_csv(message: &str) -> String {
    let row = [message, "", "", "", "", ""].map(String::from);
    // write_csv over a fixed row cannot fail; fall back to a hand-built
    // line if it somehow does
    write_csv(&[row]).unwrap_or_else(|_| format!("{}date,description,amount,balance,category,installments\n{},,,,,\n", BOM, message))
}

/// Number of data lines in a normalized CSV (excludes the header)
pub fn transaction_count(csv_content: &str) -> usize {
    csv_content.trim().lines().count().saturating_sub(1)
}

/// Derive an output filename from the bank/document pair or the original
/// filename, suffixed with a timestamp
pub fn output_filename(bank: &str, document_type: &str, original: Option<&str>) -> String {
    let timestamp = Local::now().format("%Y%m%d_%H%M%S");
    let base = match original {
        Some(name) if !name.is_empty() => name
            .rsplit_once('.')
            .map(|(stem, _)| stem)
            .unwrap_or(name)
            .to_string(),
        _ => format!("{}_{}", bank, document_type),
    };
    format!("{}_extracted_{}.csv", base, timestamp)
}
