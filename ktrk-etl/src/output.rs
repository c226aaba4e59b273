//! CSV writers for validated output and quarantine

use std::path::Path;

use ktrk_common::rows::Row;
use ktrk_common::{Error, Result};

use crate::schema::InvalidRow;

/// Write rows as CSV. Columns come from the first row's key order;
/// later rows fill missing columns with blanks. An empty input still
/// produces the file, just with no content.
pub fn write_csv(path: &Path, rows: &[Row]) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut writer = csv::Writer::from_path(path)
        .map_err(|e| Error::Io(std::io::Error::other(e.to_string())))?;

    if let Some(first) = rows.first() {
        let columns: Vec<String> = first.keys().map(|k| k.to_string()).collect();
        write_records(&mut writer, &columns, rows.iter().map(|r| (r, Vec::new())))?;
    }

    writer.flush()?;
    Ok(())
}

/// Write quarantined rows, with `_error` and `_row_index` columns
/// appended after the data columns. No file is written when there is
/// nothing to quarantine.
pub fn write_quarantine(path: &Path, invalid: &[InvalidRow]) -> Result<()> {
    let Some(first) = invalid.first() else {
        return Ok(());
    };
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut writer = csv::Writer::from_path(path)
        .map_err(|e| Error::Io(std::io::Error::other(e.to_string())))?;

    let mut columns: Vec<String> = first.row.keys().map(|k| k.to_string()).collect();
    columns.push("_error".to_string());
    columns.push("_row_index".to_string());
    write_records(
        &mut writer,
        &columns,
        invalid
            .iter()
            .map(|inv| (&inv.row, vec![inv.error_text(), inv.index.to_string()])),
    )?;

    writer.flush()?;
    Ok(())
}

fn write_records<'a, W, I>(writer: &mut csv::Writer<W>, columns: &[String], rows: I) -> Result<()>
where
    W: std::io::Write,
    I: Iterator<Item = (&'a Row, Vec<String>)>,
{
    writer
        .write_record(columns)
        .map_err(|e| Error::Io(std::io::Error::other(e.to_string())))?;

    for (row, extra) in rows {
        let data_columns = columns.len() - extra.len();
        let mut record: Vec<String> = columns[..data_columns]
            .iter()
            .map(|c| row.get_or_empty(c).to_string())
            .collect();
        record.extend(extra);
        writer
            .write_record(&record)
            .map_err(|e| Error::Io(std::io::Error::other(e.to_string())))?;
    }

    Ok(())
}
