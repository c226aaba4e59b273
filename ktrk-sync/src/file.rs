//! CSV file adapter (uploads and flat-file sources)
//!
//! The first row is the header row. A payload that is actually HTML (a
//! login or error page saved where an export should be) is rejected
//! before parsing with a descriptive error, since the CSV reader would
//! otherwise produce one garbage row per markup line.

use std::path::Path;

use csv::ReaderBuilder;

use ktrk_common::rows::Row;
use ktrk_common::{Error, Result};

/// Read a CSV file into rows
pub fn read_csv_file(path: &Path) -> Result<Vec<Row>> {
    let bytes = std::fs::read(path).map_err(|e| {
        Error::Source(format!("cannot read {}: {}", path.display(), e))
    })?;
    parse_csv_bytes(&bytes)
}

/// Parse an uploaded or fetched CSV payload into rows
pub fn parse_csv_bytes(bytes: &[u8]) -> Result<Vec<Row>> {
    if looks_like_html(bytes) {
        return Err(Error::Payload(
            "expected CSV data but got an HTML page (check credentials and export URL)".to_string(),
        ));
    }

    let mut reader = ReaderBuilder::new().flexible(true).from_reader(bytes);
    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| Error::Payload(format!("unreadable CSV header row: {e}")))?
        .iter()
        .enumerate()
        .map(|(i, h)| {
            let h = h.trim();
            if h.is_empty() {
                format!("_col{i}")
            } else {
                h.to_string()
            }
        })
        .collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| Error::Payload(format!("unreadable CSV record: {e}")))?;
        let mut row = Row::new();
        for (i, header) in headers.iter().enumerate() {
            row.set(header.clone(), record.get(i).unwrap_or("").to_string());
        }
        rows.push(row);
    }
    Ok(rows)
}

/// Cheap HTML sniff over the first non-blank bytes (BOM tolerated)
fn looks_like_html(bytes: &[u8]) -> bool {
    let text = String::from_utf8_lossy(&bytes[..bytes.len().min(512)]);
    let head = text.trim_start_matches('\u{feff}').trim_start().to_lowercase();
    head.starts_with("<!doctype") || head.starts_with("<html")
}
