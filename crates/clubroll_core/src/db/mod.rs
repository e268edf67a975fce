//! Tracker store: connection setup, schema versioning and the first-run
//! sentinel.
//!
//! # Responsibility
//! - Open the one connection the tracker uses for its whole run.
//! - Bring the store to the current schema, adopting stores that predate
//!   version tracking.
//! - Tell first runs apart from later ones by the presence of the store file.
//!
//! # Invariants
//! - `PRAGMA user_version` holds the applied schema version.
//! - No repository reads `members` or `attendance` before migrations succeed.

use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod migrations;
mod open;

pub use migrations::MigrationReport;
pub use open::{open_db, open_db_in_memory, store_exists};

pub type DbResult<T> = Result<T, DbError>;

/// Store-level failure while opening or migrating.
#[derive(Debug)]
pub enum DbError {
    Sqlite(rusqlite::Error),
    /// The store was written by a newer release.
    UnsupportedSchemaVersion {
        db_version: u32,
        latest_supported: u32,
    },
    /// An unversioned store has a tracker table without a required column.
    IncompatibleStore {
        table: &'static str,
        column: &'static str,
    },
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "{err}"),
            Self::UnsupportedSchemaVersion {
                db_version,
                latest_supported,
            } => write!(
                f,
                "store schema version {db_version} is newer than supported {latest_supported}"
            ),
            Self::IncompatibleStore { table, column } => write!(
                f,
                "existing store cannot be adopted: table `{table}` has no `{column}` column"
            ),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
            Self::UnsupportedSchemaVersion { .. } | Self::IncompatibleStore { .. } => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}
