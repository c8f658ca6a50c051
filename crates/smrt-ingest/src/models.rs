//! SMRT file and store data models

use smrt_common::types::{WireDate, WireTime};
use std::collections::HashSet;

/// One delimited line of a file, fields kept verbatim
pub type Row = Vec<String>;

/// Literal in header field 0
pub const HEADER_RECORD_TYPE: &str = "HEADR";
/// Literal in header field 1
pub const FORMAT_MARKER: &str = "SMRT";
/// Literal in header field 2
pub const SENDER_CODE: &str = "GAZ";
/// Literal in footer field 0
pub const TRAILER_RECORD_TYPE: &str = "TRAIL";

pub const BODY_FIELD_COUNT: usize = 5;

const GENERATION_CODE_LEN: usize = 8;

/// Environment tag at the start of a generation code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Environment {
    /// `PN`
    Production,
    /// `DV`
    Development,
}

impl Environment {
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "PN" => Some(Environment::Production),
            "DV" => Some(Environment::Development),
            _ => None,
        }
    }

    pub fn tag(self) -> &'static str {
        match self {
            Environment::Production => "PN",
            Environment::Development => "DV",
        }
    }
}

/// File generation code, `(PN|DV)` followed by 6 digits. Unique per file.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GenerationCode {
    raw: String,
    environment: Environment,
    sequence: u32,
}

impl GenerationCode {
    pub fn parse(s: &str) -> Option<Self> {
        if s.len() != GENERATION_CODE_LEN {
            return None;
        }

        let environment = Environment::from_tag(s.get(..2)?)?;
        let digits = s.get(2..)?;
        if !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }

        Some(Self {
            raw: s.to_string(),
            environment,
            sequence: digits.parse().ok()?,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn environment(&self) -> Environment {
        self.environment
    }

    pub fn sequence(&self) -> u32 {
        self.sequence
    }
}

impl std::fmt::Display for GenerationCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Validated header row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    pub creation_date: WireDate,
    pub creation_time: WireTime,
    pub generation_code: GenerationCode,
}

/// One reading line between header and footer.
///
/// Dates, times and consumption are copied verbatim; only the field count is
/// checked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BodyRecord {
    pub marker: String,
    pub meter_id: String,
    pub measurement_date: String,
    pub measurement_time: String,
    pub consumption: String,
}

impl BodyRecord {
    pub(crate) fn from_fields(fields: &[String]) -> Option<Self> {
        match fields {
            [marker, meter_id, date, time, consumption] => Some(Self {
                marker: marker.clone(),
                meter_id: meter_id.clone(),
                measurement_date: date.clone(),
                measurement_time: time.clone(),
                consumption: consumption.clone(),
            }),
            _ => None,
        }
    }
}

/// A file whose envelope passed validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmrtFile {
    pub header: Header,
    pub records: Vec<BodyRecord>,
    pub footer: Row,
}

impl SmrtFile {
    /// The file identity (its generation code)
    pub fn file_id(&self) -> &str {
        self.header.generation_code.as_str()
    }

    /// Distinct meter ids in first-seen order
    pub fn meter_ids(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.records
            .iter()
            .map(|r| r.meter_id.as_str())
            .filter(|id| seen.insert(*id))
            .collect()
    }
}

// ============================================================================
// Stored rows
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct FileRecord {
    pub file_id: String,
    pub date_received: String,
    pub time_received: String,
}

#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct MeterRecord {
    pub meter_id: String,
    pub last_updated_date: String,
    pub last_updated_time: String,
}

#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct ReadingRecord {
    pub reading_id: i64,
    pub file_id: String,
    pub meter_id: String,
    pub measurement_date: String,
    pub measurement_time: String,
    pub consumption: String,
}
