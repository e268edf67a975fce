//! Tracker runtime configuration.
//!
//! # Responsibility
//! - Hold every setting resolved once at process start.
//! - Provide the defaults the shell falls back to.
//!
//! # Invariants
//! - Paths are fixed for the process lifetime.
//! - `email_domain` always starts with `@`.

use crate::model::member::{normalize_email_domain, DEFAULT_EMAIL_DOMAIN};
use std::path::PathBuf;

/// Store file used when none is configured.
pub const DEFAULT_DB_PATH: &str = "Product/deca_tracker.db";
/// Roster file imported on first run when none is configured.
pub const DEFAULT_ROSTER_PATH: &str = "Product/CurrentMembers.csv";
pub const DEFAULT_DELIMITER: u8 = b',';

/// Settings for one tracker process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackerConfig {
    /// SQLite store; its absence marks the first run.
    pub db_path: PathBuf,
    /// Delimited roster imported on first run.
    pub roster_path: PathBuf,
    pub delimiter: u8,
    pub email_domain: String,
}

impl TrackerConfig {
    pub fn new(db_path: impl Into<PathBuf>, roster_path: impl Into<PathBuf>) -> Self {
        Self {
            db_path: db_path.into(),
            roster_path: roster_path.into(),
            ..Self::default()
        }
    }

    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    pub fn with_email_domain(mut self, email_domain: &str) -> Self {
        self.email_domain = normalize_email_domain(email_domain);
        self
    }
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from(DEFAULT_DB_PATH),
            roster_path: PathBuf::from(DEFAULT_ROSTER_PATH),
            delimiter: DEFAULT_DELIMITER,
            email_domain: DEFAULT_EMAIL_DOMAIN.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::TrackerConfig;

    #[test]
    fn builder_normalizes_email_domain() {
        let config = TrackerConfig::new("club.db", "roster.csv")
            .with_delimiter(b';')
            .with_email_domain("club.org");
        assert_eq!(config.email_domain, "@club.org");
        assert_eq!(config.delimiter, b';');
        assert_eq!(config.db_path.to_str(), Some("club.db"));
    }
}
