//! Raw row loading for delimited SMRT files
//!
//! Files have no header line for a schema reader to consume: every line is a
//! record, records have different widths (6-field header, 5-field body,
//! free-form footer), and every field is kept as the exact text between
//! delimiters. Blank lines are skipped.

use std::io::Read;
use std::path::Path;
use tracing::debug;

use crate::error::Result;
use crate::models::Row;

pub const DEFAULT_DELIMITER: u8 = b',';

/// Read all rows from any reader
pub fn parse_rows<R: Read>(reader: R, delimiter: u8) -> Result<Vec<Row>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(delimiter)
        .trim(csv::Trim::None)
        .from_reader(reader);

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        rows.push(record.iter().map(str::to_string).collect());
    }

    Ok(rows)
}

/// Read all rows from a file on disk
pub fn load_rows(path: &Path, delimiter: u8) -> Result<Vec<Row>> {
    let file = std::fs::File::open(path)?;
    let rows = parse_rows(file, delimiter)?;

    debug!(file = %path.display(), rows = rows.len(), "Loaded rows");
    Ok(rows)
}
