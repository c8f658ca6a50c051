//! SMRT Ingest - batch loader for SMRT meter-reading files

use anyhow::Result;
use clap::Parser;
use smrt_common::logging::{init_logging, LogConfig, LogLevel};
use smrt_ingest::config::parse_delimiter;
use smrt_ingest::{run_batch, IngestConfig, ProcessedPolicy, SqliteStore, SystemClock};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(name = "smrt-ingest")]
#[command(author, version, about = "Ingest SMRT meter-reading files into SQLite")]
#[command(after_help = "Flags override SMRT_INPUT_DIR, SMRT_QUARANTINE_DIR, DATABASE_URL, \
SMRT_PROCESSED_POLICY, SMRT_ARCHIVE_DIR and SMRT_DELIMITER from the environment or .env.")]
struct Cli {
    /// Directory scanned for incoming files
    #[arg(short, long)]
    input_dir: Option<PathBuf>,

    /// Directory receiving rejected files
    #[arg(short, long)]
    quarantine_dir: Option<PathBuf>,

    /// Database URL
    #[arg(short, long)]
    database_url: Option<String>,

    /// What to do with accepted files
    #[arg(long, value_enum)]
    processed: Option<ProcessedPolicy>,

    /// Destination for the archive policy
    #[arg(long)]
    archive_dir: Option<PathBuf>,

    /// Field delimiter, one ASCII character
    #[arg(long)]
    delimiter: Option<String>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    /// Apply command-line overrides on top of the environment
    fn apply(self, config: &mut IngestConfig) -> smrt_ingest::Result<()> {
        if let Some(dir) = self.input_dir {
            config.input_dir = dir;
        }
        if let Some(dir) = self.quarantine_dir {
            config.quarantine_dir = dir;
        }
        if let Some(url) = self.database_url {
            config.database.url = url;
        }
        if let Some(policy) = self.processed {
            config.processed = policy;
        }
        if let Some(dir) = self.archive_dir {
            config.archive_dir = Some(dir);
        }
        if let Some(delimiter) = self.delimiter {
            config.delimiter = parse_delimiter(&delimiter)?;
        }
        Ok(())
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    // LOG_* values may come from .env as well
    dotenvy::dotenv().ok();

    let log_level = if cli.verbose {
        LogLevel::Debug
    } else {
        LogLevel::Info
    };

    // Environment variables take precedence over these defaults
    let log_config = LogConfig::builder()
        .level(log_level)
        .log_file_prefix("smrt-ingest")
        .filter_directives("sqlx=warn")
        .build()
        .merge_env()?;

    let _guard = init_logging(&log_config)?;

    let config = IngestConfig::load_with(|config| cli.apply(config))?;

    info!(
        input_dir = %config.input_dir.display(),
        quarantine_dir = %config.quarantine_dir.display(),
        database = %config.database.url,
        processed = ?config.processed,
        "Starting SMRT ingestion"
    );

    let store = SqliteStore::connect(&config.database).await?;
    store.migrate().await?;

    let stats = run_batch(&config, &store, &SystemClock).await?;
    store.close().await;

    if stats.is_success() {
        println!("SUCCESS");
        Ok(ExitCode::SUCCESS)
    } else {
        error!(failed = stats.failed, "Batch finished with failures");
        Ok(ExitCode::FAILURE)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_overrides_environment_values() {
        let cli = Cli::try_parse_from([
            "smrt-ingest",
            "--input-dir",
            "/in",
            "--database-url",
            "sqlite:///tmp/cli.db",
            "--processed",
            "archive",
            "--archive-dir",
            "/done",
            "--delimiter",
            ";",
        ])
        .unwrap();

        let mut config = IngestConfig::default();
        cli.apply(&mut config).unwrap();

        assert_eq!(config.input_dir, PathBuf::from("/in"));
        assert_eq!(config.quarantine_dir, PathBuf::from("./invalid_data"));
        assert_eq!(config.database.url, "sqlite:///tmp/cli.db");
        assert_eq!(config.processed, ProcessedPolicy::Archive);
        assert_eq!(config.archive_dir, Some(PathBuf::from("/done")));
        assert_eq!(config.delimiter, b';');
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_cli_without_flags_keeps_config() {
        let cli = Cli::try_parse_from(["smrt-ingest", "-v"]).unwrap();
        assert!(cli.verbose);

        let mut config = IngestConfig::default();
        cli.apply(&mut config).unwrap();
        assert_eq!(config.input_dir, PathBuf::from("./sample_data"));
        assert_eq!(config.processed, ProcessedPolicy::Leave);
    }

    #[test]
    fn test_help_names_environment_variables() {
        use clap::CommandFactory;

        let help = Cli::command().render_long_help().to_string();
        assert!(help.contains("SMRT_INPUT_DIR"));
        assert!(help.contains("DATABASE_URL"));
        assert!(!help.contains("[env:"));
    }

    #[test]
    fn test_cli_rejects_bad_values() {
        assert!(Cli::try_parse_from(["smrt-ingest", "--processed", "shred"]).is_err());

        let cli = Cli::try_parse_from(["smrt-ingest", "--delimiter", "::"]).unwrap();
        assert!(cli.apply(&mut IngestConfig::default()).is_err());
    }
}
