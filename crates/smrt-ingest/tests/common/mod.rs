//! Shared fixtures for pipeline tests

#![allow(dead_code)]

use anyhow::Result;
use chrono::NaiveDateTime;
use smrt_ingest::{run_batch, BatchStats, Clock, DatabaseConfig, IngestConfig, SqliteStore};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub const VALID_FILE: &str = "HEADR,SMRT,GAZ,20240101,120000,PN000001\n\
                              X,DEV1,20240101,120000,42\n\
                              TRAIL\n";

pub const INVALID_FILE: &str = "HEADR,SMRT,BGS,20240101,120000,PN000002\n\
                                X,DEV1,20240101,120000,42\n\
                                TRAIL\n";

/// Always reports the same instant
pub struct FixedClock(pub NaiveDateTime);

impl FixedClock {
    pub fn at(date_time: &str) -> Self {
        Self(NaiveDateTime::parse_from_str(date_time, "%Y%m%d %H%M%S").expect("valid fixture time"))
    }
}

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        self.0
    }
}

/// Isolated input, quarantine and database under one temp dir
pub struct Harness {
    pub dir: TempDir,
    pub config: IngestConfig,
    pub store: SqliteStore,
    pub clock: FixedClock,
}

impl Harness {
    pub async fn new() -> Result<Self> {
        let dir = tempfile::tempdir()?;
        let input_dir = dir.path().join("sample_data");
        std::fs::create_dir(&input_dir)?;

        let config = IngestConfig {
            input_dir,
            quarantine_dir: dir.path().join("invalid_data"),
            database: DatabaseConfig {
                url: format!("sqlite://{}", dir.path().join("SMRTdata.db").display()),
                ..DatabaseConfig::default()
            },
            ..IngestConfig::default()
        };
        config.validate()?;

        let store = SqliteStore::connect(&config.database).await?;
        store.migrate().await?;

        Ok(Self {
            dir,
            config,
            store,
            clock: FixedClock::at("20240315 093000"),
        })
    }

    pub fn input_path(&self, name: &str) -> PathBuf {
        self.config.input_dir.join(name)
    }

    pub fn quarantine_path(&self, name: &str) -> PathBuf {
        self.config.quarantine_dir.join(name)
    }

    pub fn write_input(&self, name: &str, contents: impl AsRef<[u8]>) -> Result<PathBuf> {
        let path = self.input_path(name);
        std::fs::write(&path, contents)?;
        Ok(path)
    }

    pub async fn run(&self) -> Result<BatchStats> {
        Ok(run_batch(&self.config, &self.store, &self.clock).await?)
    }
}

pub fn exists(path: &Path) -> bool {
    path.try_exists().unwrap_or(false)
}
