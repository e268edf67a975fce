//! Tracker schema migrations.
//!
//! # Responsibility
//! - Register the `members` and `attendance` schema steps in order.
//! - Bring a store up to `latest_version()` in one transaction.
//! - Adopt stores written before version tracking existed.
//!
//! # Invariants
//! - `version` values are strictly increasing; the applied version is
//!   mirrored to `PRAGMA user_version`.
//! - Every step is `IF NOT EXISTS`-safe, so a `user_version = 0` store that
//!   already holds tracker tables keeps its rows.
//! - An adopted table missing a tracker column fails the migration and
//!   leaves `user_version` untouched.

use crate::db::{DbError, DbResult};
use log::info;
use rusqlite::{Connection, Transaction};

#[derive(Debug, Clone, Copy)]
struct Migration {
    version: u32,
    sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        sql: include_str!("0001_members.sql"),
    },
    Migration {
        version: 2,
        sql: include_str!("0002_attendance.sql"),
    },
];

/// Columns an adopted store must already carry, per tracker table.
const TRACKER_TABLES: &[(&str, &[&str])] = &[
    (
        "members",
        &[
            "id",
            "name",
            "grade",
            "status",
            "email",
            "registered_paid",
            "money_owed",
            "payment_method",
        ],
    ),
    (
        "attendance",
        &[
            "id", "sep", "oct", "nov", "dec", "jan", "feb", "mar", "apr", "may", "jun",
        ],
    ),
];

/// What `apply_migrations` did to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MigrationReport {
    pub from_version: u32,
    pub to_version: u32,
    /// The store predates version tracking and its tables were kept.
    pub adopted: bool,
}

/// Returns the latest migration version known by this binary.
pub fn latest_version() -> u32 {
    MIGRATIONS.last().map_or(0, |migration| migration.version)
}

/// Applies all pending migrations on the provided connection.
pub fn apply_migrations(conn: &mut Connection) -> DbResult<MigrationReport> {
    let from_version = current_user_version(conn)?;
    let latest = latest_version();

    if from_version > latest {
        return Err(DbError::UnsupportedSchemaVersion {
            db_version: from_version,
            latest_supported: latest,
        });
    }

    let mut report = MigrationReport {
        from_version,
        to_version: from_version,
        adopted: false,
    };
    if from_version == latest {
        return Ok(report);
    }

    let tx = conn.transaction()?;
    report.adopted = from_version == 0 && holds_tracker_tables(&tx)?;
    for migration in MIGRATIONS {
        if migration.version <= from_version {
            continue;
        }

        tx.execute_batch(migration.sql)?;
        tx.execute_batch(&format!("PRAGMA user_version = {};", migration.version))?;
    }
    if report.adopted {
        ensure_tracker_columns(&tx)?;
    }
    tx.commit()?;
    report.to_version = latest;

    info!(
        "event=db_migrate module=db status=ok from_version={} to_version={} adopted={}",
        report.from_version,
        report.to_version,
        u8::from(report.adopted)
    );
    Ok(report)
}

fn current_user_version(conn: &Connection) -> DbResult<u32> {
    let version = conn.query_row("PRAGMA user_version;", [], |row| row.get::<_, u32>(0))?;
    Ok(version)
}

fn holds_tracker_tables(tx: &Transaction<'_>) -> DbResult<bool> {
    for &(table, _) in TRACKER_TABLES {
        let found: i64 = tx.query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1;",
            [table],
            |row| row.get(0),
        )?;
        if found > 0 {
            return Ok(true);
        }
    }
    Ok(false)
}

fn ensure_tracker_columns(tx: &Transaction<'_>) -> DbResult<()> {
    for &(table, columns) in TRACKER_TABLES {
        let mut stmt = tx.prepare(&format!("PRAGMA table_info({table});"))?;
        let present = stmt
            .query_map([], |row| row.get::<_, String>(1))?
            .collect::<Result<Vec<_>, _>>()?;
        let missing = columns
            .iter()
            .copied()
            .find(|column| !present.iter().any(|name| name == column));
        if let Some(column) = missing {
            return Err(DbError::IncompatibleStore { table, column });
        }
    }
    Ok(())
}
