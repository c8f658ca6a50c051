//! Envelope validation for SMRT files
//!
//! A file is accepted or rejected as a whole by looking at its first row
//! (header) and last row (footer). Body rows are only checked for shape:
//! each must carry exactly five fields so reconciliation never has to guess.
//!
//! # Header layout
//! ```text
//! HEADR,SMRT,GAZ,20240101,120000,PN000001
//! ^type ^fmt ^sender ^date ^time  ^generation code
//! ```

use smrt_common::types::{WireDate, WireTime};
use smrt_common::SmrtError;
use thiserror::Error;

use crate::models::{
    BodyRecord, GenerationCode, Header, Row, SmrtFile, FORMAT_MARKER, HEADER_RECORD_TYPE,
    SENDER_CODE, TRAILER_RECORD_TYPE,
};

/// Why a row set was rejected. Only the first failing check is reported.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EnvelopeError {
    #[error("file contains no rows")]
    Empty,

    #[error("header has {0} fields, expected 6")]
    HeaderFieldCount(usize),

    #[error("record type '{0}' is not 'HEADR'")]
    RecordType(String),

    #[error("format marker '{0}' is not 'SMRT'")]
    FormatMarker(String),

    #[error("sender code '{0}' is not 'GAZ'")]
    SenderCode(String),

    #[error("creation date: {0}")]
    CreationDate(SmrtError),

    #[error("creation time: {0}")]
    CreationTime(SmrtError),

    #[error("generation code '{0}' is not (PN|DV) followed by 6 digits")]
    GenerationCode(String),

    #[error("footer does not start with 'TRAIL'")]
    MissingTrailer,

    #[error("body row {row} has {found} fields, expected 5")]
    BodyFieldCount { row: usize, found: usize },
}

/// Parse and validate a header row
pub fn parse_header(row: &[String]) -> Result<Header, EnvelopeError> {
    let [record_type, format, sender, date, time, code] = row else {
        return Err(EnvelopeError::HeaderFieldCount(row.len()));
    };

    if record_type != HEADER_RECORD_TYPE {
        return Err(EnvelopeError::RecordType(record_type.clone()));
    }
    if format != FORMAT_MARKER {
        return Err(EnvelopeError::FormatMarker(format.clone()));
    }
    if sender != SENDER_CODE {
        return Err(EnvelopeError::SenderCode(sender.clone()));
    }

    let creation_date = WireDate::parse(date).map_err(EnvelopeError::CreationDate)?;
    let creation_time = WireTime::parse(time).map_err(EnvelopeError::CreationTime)?;
    let generation_code = GenerationCode::parse(code)
        .ok_or_else(|| EnvelopeError::GenerationCode(code.clone()))?;

    Ok(Header {
        creation_date,
        creation_time,
        generation_code,
    })
}

pub fn check_header(row: &[String]) -> bool {
    parse_header(row).is_ok()
}

/// A footer passes when its first field is `TRAIL`; an empty row fails.
pub fn check_footer(row: &[String]) -> bool {
    row.first().is_some_and(|field| field == TRAILER_RECORD_TYPE)
}

/// Run every envelope check and return the validated file.
pub fn check(rows: &[Row]) -> Result<SmrtFile, EnvelopeError> {
    let (header_row, rest) = rows.split_first().ok_or(EnvelopeError::Empty)?;

    // A single-row file uses the header as its own footer
    let (footer_row, body) = match rest.split_last() {
        Some((footer, body)) => (footer, body),
        None => (header_row, &[][..]),
    };

    let header = parse_header(header_row)?;

    if !check_footer(footer_row) {
        return Err(EnvelopeError::MissingTrailer);
    }

    let records = body
        .iter()
        .enumerate()
        .map(|(i, fields)| {
            BodyRecord::from_fields(fields).ok_or(EnvelopeError::BodyFieldCount {
                row: i + 1,
                found: fields.len(),
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(SmrtFile {
        header,
        records,
        footer: footer_row.clone(),
    })
}

/// Binary accept/reject decision for a row set
pub fn validate(rows: &[Row]) -> bool {
    check(rows).is_ok()
}
