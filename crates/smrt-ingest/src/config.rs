//! Configuration management

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{IngestError, Result};
use crate::loader::DEFAULT_DELIMITER;

// ============================================================================
// Ingestion Configuration Constants
// ============================================================================

/// Default directory scanned for incoming files.
pub const DEFAULT_INPUT_DIR: &str = "./sample_data";

/// Default directory receiving rejected files.
pub const DEFAULT_QUARANTINE_DIR: &str = "./invalid_data";

/// Default database URL, a file in the working directory.
pub const DEFAULT_DATABASE_URL: &str = "sqlite://SMRTdata.db";

/// Default maximum database connections in the pool.
pub const DEFAULT_DATABASE_MAX_CONNECTIONS: u32 = 1;

/// Default database connection timeout in seconds.
pub const DEFAULT_DATABASE_CONNECT_TIMEOUT_SECS: u64 = 10;

/// What happens to an accepted file after its transaction commits
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ProcessedPolicy {
    /// Leave the file in the input directory
    #[default]
    Leave,
    /// Remove the file
    Delete,
    /// Move the file into the archive directory
    Archive,
}

impl std::str::FromStr for ProcessedPolicy {
    type Err = IngestError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "leave" => Ok(ProcessedPolicy::Leave),
            "delete" => Ok(ProcessedPolicy::Delete),
            "archive" => Ok(ProcessedPolicy::Archive),
            other => Err(IngestError::config(format!(
                "Unknown processed policy '{}', expected leave, delete or archive",
                other
            ))),
        }
    }
}

/// Ingestion configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestConfig {
    pub input_dir: PathBuf,
    pub quarantine_dir: PathBuf,
    pub processed: ProcessedPolicy,
    pub archive_dir: Option<PathBuf>,
    pub delimiter: u8,
    pub database: DatabaseConfig,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub connect_timeout_secs: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_DATABASE_URL.to_string(),
            max_connections: DEFAULT_DATABASE_MAX_CONNECTIONS,
            connect_timeout_secs: DEFAULT_DATABASE_CONNECT_TIMEOUT_SECS,
        }
    }
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from(DEFAULT_INPUT_DIR),
            quarantine_dir: PathBuf::from(DEFAULT_QUARANTINE_DIR),
            processed: ProcessedPolicy::default(),
            archive_dir: None,
            delimiter: DEFAULT_DELIMITER,
            database: DatabaseConfig::default(),
        }
    }
}

impl IngestConfig {
    /// Load configuration from `.env`, the environment and defaults, let
    /// `overrides` adjust it (command-line flags), then validate.
    pub fn load_with<O>(overrides: O) -> Result<Self>
    where
        O: FnOnce(&mut Self) -> Result<()>,
    {
        dotenvy::dotenv().ok();
        Self::resolve(|key| std::env::var(key).ok(), overrides)
    }

    /// [`from_lookup`](Self::from_lookup), then `overrides`, then
    /// [`validate`](Self::validate)
    pub fn resolve<F, O>(lookup: F, overrides: O) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
        O: FnOnce(&mut Self) -> Result<()>,
    {
        let mut config = Self::from_lookup(lookup)?;
        overrides(&mut config)?;
        config.validate()?;
        Ok(config)
    }

    /// Build from an arbitrary key lookup. Numeric values that fail to parse
    /// fall back to their defaults; policy and delimiter values are rejected.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let processed = match lookup("SMRT_PROCESSED_POLICY") {
            Some(value) => value.parse()?,
            None => ProcessedPolicy::default(),
        };

        let delimiter = match lookup("SMRT_DELIMITER") {
            Some(value) => parse_delimiter(&value)?,
            None => DEFAULT_DELIMITER,
        };

        Ok(Self {
            input_dir: lookup("SMRT_INPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_INPUT_DIR)),
            quarantine_dir: lookup("SMRT_QUARANTINE_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_QUARANTINE_DIR)),
            processed,
            archive_dir: lookup("SMRT_ARCHIVE_DIR").map(PathBuf::from),
            delimiter,
            database: DatabaseConfig {
                url: lookup("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string()),
                max_connections: lookup("DATABASE_MAX_CONNECTIONS")
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(DEFAULT_DATABASE_MAX_CONNECTIONS),
                connect_timeout_secs: lookup("DATABASE_CONNECT_TIMEOUT")
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(DEFAULT_DATABASE_CONNECT_TIMEOUT_SECS),
            },
        })
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if same_path(&self.input_dir, &self.quarantine_dir) {
            return Err(IngestError::config(format!(
                "Quarantine directory must differ from input directory ({})",
                self.input_dir.display()
            )));
        }

        if self.processed == ProcessedPolicy::Archive {
            match &self.archive_dir {
                None => {
                    return Err(IngestError::config(
                        "Archive policy requires an archive directory",
                    ));
                },
                Some(archive) if same_path(archive, &self.input_dir) => {
                    return Err(IngestError::config(format!(
                        "Archive directory must differ from input directory ({})",
                        archive.display()
                    )));
                },
                Some(_) => {},
            }
        }

        if !self.delimiter.is_ascii() {
            return Err(IngestError::config("Delimiter must be a single ASCII character"));
        }

        if self.database.url.is_empty() {
            return Err(IngestError::config("Database URL cannot be empty"));
        }

        if self.database.max_connections == 0 {
            return Err(IngestError::config(
                "Database max_connections must be greater than 0",
            ));
        }

        // Every pooled connection to :memory: would open its own database
        if self.database.url.contains(":memory:") && self.database.max_connections > 1 {
            return Err(IngestError::config(
                "In-memory databases require max_connections = 1",
            ));
        }

        if self.processed != ProcessedPolicy::Archive && self.archive_dir.is_some() {
            tracing::warn!("Archive directory is set but processed policy is not 'archive'");
        }

        Ok(())
    }
}

/// Parse a delimiter setting: exactly one ASCII character
pub fn parse_delimiter(value: &str) -> Result<u8> {
    match value.as_bytes() {
        [byte] if byte.is_ascii() => Ok(*byte),
        _ => Err(IngestError::config(format!(
            "Delimiter '{}' must be a single ASCII character",
            value
        ))),
    }
}

fn same_path(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = IngestConfig::from_lookup(|_| None).unwrap();
        assert_eq!(config.input_dir, PathBuf::from("./sample_data"));
        assert_eq!(config.quarantine_dir, PathBuf::from("./invalid_data"));
        assert_eq!(config.processed, ProcessedPolicy::Leave);
        assert_eq!(config.archive_dir, None);
        assert_eq!(config.delimiter, b',');
        assert_eq!(config.database.url, "sqlite://SMRTdata.db");
        assert_eq!(config.database.max_connections, 1);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_overrides_from_lookup() {
        let config = IngestConfig::from_lookup(lookup_from(&[
            ("SMRT_INPUT_DIR", "/data/in"),
            ("SMRT_QUARANTINE_DIR", "/data/bad"),
            ("SMRT_PROCESSED_POLICY", "Archive"),
            ("SMRT_ARCHIVE_DIR", "/data/done"),
            ("SMRT_DELIMITER", "|"),
            ("DATABASE_URL", "sqlite:///tmp/smrt.db"),
            ("DATABASE_MAX_CONNECTIONS", "4"),
            ("DATABASE_CONNECT_TIMEOUT", "not-a-number"),
        ]))
        .unwrap();

        assert_eq!(config.input_dir, PathBuf::from("/data/in"));
        assert_eq!(config.processed, ProcessedPolicy::Archive);
        assert_eq!(config.archive_dir, Some(PathBuf::from("/data/done")));
        assert_eq!(config.delimiter, b'|');
        assert_eq!(config.database.max_connections, 4);
        assert_eq!(
            config.database.connect_timeout_secs,
            DEFAULT_DATABASE_CONNECT_TIMEOUT_SECS
        );
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_bad_policy_and_delimiter_are_errors() {
        let result = IngestConfig::from_lookup(lookup_from(&[("SMRT_PROCESSED_POLICY", "shred")]));
        assert!(matches!(result, Err(IngestError::Config(_))));

        let result = IngestConfig::from_lookup(lookup_from(&[("SMRT_DELIMITER", ";;")]));
        assert!(matches!(result, Err(IngestError::Config(_))));
    }

    #[test]
    fn test_parse_delimiter() {
        assert_eq!(parse_delimiter(",").unwrap(), b',');
        assert_eq!(parse_delimiter("\t").unwrap(), b'\t');
        assert!(parse_delimiter("").is_err());
        assert!(parse_delimiter("ab").is_err());
        assert!(parse_delimiter("é").is_err());
    }

    #[test]
    fn test_validate_rejects_same_input_and_quarantine() {
        let config = IngestConfig {
            quarantine_dir: PathBuf::from(DEFAULT_INPUT_DIR),
            ..IngestConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_archive_policy() {
        let mut config = IngestConfig {
            processed: ProcessedPolicy::Archive,
            ..IngestConfig::default()
        };
        assert!(config.validate().is_err());

        config.archive_dir = Some(PathBuf::from(DEFAULT_INPUT_DIR));
        assert!(config.validate().is_err());

        config.archive_dir = Some(PathBuf::from("./archive"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_database_settings() {
        let mut config = IngestConfig::default();
        config.database.url = String::new();
        assert!(config.validate().is_err());

        let mut config = IngestConfig::default();
        config.database.max_connections = 0;
        assert!(config.validate().is_err());

        let mut config = IngestConfig::default();
        config.database.url = "sqlite::memory:".to_string();
        assert!(config.validate().is_ok());
        config.database.max_connections = 2;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_resolve_validates_after_overrides() {
        let env = lookup_from(&[("SMRT_QUARANTINE_DIR", DEFAULT_INPUT_DIR)]);

        // Invalid as loaded, fixed by the override
        let config = IngestConfig::resolve(&env, |config| {
            config.quarantine_dir = PathBuf::from("./rejected");
            Ok(())
        })
        .unwrap();
        assert_eq!(config.quarantine_dir, PathBuf::from("./rejected"));

        assert!(IngestConfig::resolve(&env, |_| Ok(())).is_err());

        // Valid as loaded, broken by the override
        let result = IngestConfig::resolve(lookup_from(&[]), |config| {
            config.processed = ProcessedPolicy::Archive;
            Ok(())
        });
        assert!(matches!(result, Err(IngestError::Config(_))));
    }

    #[test]
    fn test_resolve_propagates_override_errors() {
        let result = IngestConfig::resolve(lookup_from(&[]), |config| {
            config.delimiter = parse_delimiter("||")?;
            Ok(())
        });
        assert!(result.is_err());
    }

    #[test]
    fn test_policy_from_str() {
        assert_eq!("leave".parse::<ProcessedPolicy>().unwrap(), ProcessedPolicy::Leave);
        assert_eq!("DELETE".parse::<ProcessedPolicy>().unwrap(), ProcessedPolicy::Delete);
        assert!("".parse::<ProcessedPolicy>().is_err());
    }
}
