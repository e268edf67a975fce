//! Command line flags.
//!
//! Every flag can also come from the environment so a club laptop can pin
//! its paths once.

use clap::Parser;
use clubroll_core::config::{DEFAULT_DB_PATH, DEFAULT_ROSTER_PATH};
use clubroll_core::{default_log_level, TrackerConfig, DEFAULT_EMAIL_DOMAIN};
use std::path::{Path, PathBuf};

const LOG_DIR_NAME: &str = "logs";

#[derive(Debug, Clone, Parser)]
#[command(name = "clubroll", version, about = "Club roster and attendance tracker")]
pub struct Cli {
    /// SQLite store. Created from the roster on first run.
    #[arg(long, env = "CLUBROLL_DB", default_value = DEFAULT_DB_PATH)]
    pub db: PathBuf,

    /// Roster imported when the store does not exist yet.
    #[arg(long, env = "CLUBROLL_ROSTER", default_value = DEFAULT_ROSTER_PATH)]
    pub roster: PathBuf,

    /// Single-byte field delimiter of the roster file.
    #[arg(
        long,
        env = "CLUBROLL_DELIMITER",
        default_value = ",",
        value_parser = parse_delimiter
    )]
    pub delimiter: u8,

    /// Suffix appended to member usernames to form their email.
    #[arg(long, env = "CLUBROLL_EMAIL_DOMAIN", default_value = DEFAULT_EMAIL_DOMAIN)]
    pub email_domain: String,

    /// trace|debug|info|warn|error|off
    #[arg(long, env = "CLUBROLL_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Defaults to `logs/` next to the store.
    #[arg(long, env = "CLUBROLL_LOG_DIR")]
    pub log_dir: Option<PathBuf>,
}

impl Cli {
    pub fn tracker_config(&self) -> TrackerConfig {
        TrackerConfig::new(&self.db, &self.roster)
            .with_delimiter(self.delimiter)
            .with_email_domain(&self.email_domain)
    }

    pub fn log_level(&self) -> &str {
        self.log_level.as_deref().unwrap_or(default_log_level())
    }

    pub fn log_dir(&self) -> PathBuf {
        match &self.log_dir {
            Some(dir) => dir.clone(),
            None => self
                .db
                .parent()
                .unwrap_or_else(|| Path::new(""))
                .join(LOG_DIR_NAME),
        }
    }
}

fn parse_delimiter(value: &str) -> Result<u8, String> {
    match value.as_bytes() {
        [byte] if byte.is_ascii() => Ok(*byte),
        _ if value == "\\t" => Ok(b'\t'),
        _ => Err(format!("delimiter must be one ASCII character, got `{value}`")),
    }
}
