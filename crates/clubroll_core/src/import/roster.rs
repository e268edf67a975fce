//! Roster file parsing and one-shot store bootstrap.

use crate::config::TrackerConfig;
use crate::db::{open_db, store_exists, DbError};
use crate::model::member::{email_from_username, Member, MemberId};
use crate::repo::member_repo::{MemberRepository, SqliteMemberRepository};
use crate::repo::RepoError;
use csv::{ReaderBuilder, Trim};
use log::{error, info, warn};
use rusqlite::Connection;
use serde::Deserialize;
use std::collections::HashMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::Instant;

const ROSTER_FIELD_COUNT: usize = 8;

pub type ImportResult<T> = Result<T, ImportError>;

/// Fatal first-run failure. The roster file must be fixed before relaunch.
#[derive(Debug)]
pub enum ImportError {
    /// Roster file cannot be opened.
    Open { path: PathBuf, source: std::io::Error },
    /// Directory for a new store cannot be created.
    StoreDir { path: PathBuf, source: std::io::Error },
    /// Reader-level failure (I/O, invalid UTF-8).
    Csv(csv::Error),
    /// One record is malformed.
    InvalidRecord { line: u64, message: String },
    /// Two records share an id.
    DuplicateId { line: u64, id: MemberId },
    Db(DbError),
    Repo(RepoError),
}

impl Display for ImportError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Open { path, source } => {
                write!(f, "cannot open roster `{}`: {source}", path.display())
            }
            Self::StoreDir { path, source } => {
                write!(f, "cannot create store directory `{}`: {source}", path.display())
            }
            Self::Csv(err) => write!(f, "cannot read roster: {err}"),
            Self::InvalidRecord { line, message } => {
                write!(f, "invalid roster record on line {line}: {message}")
            }
            Self::DuplicateId { line, id } => {
                write!(f, "duplicate member id {id} on roster line {line}")
            }
            Self::Db(err) => write!(f, "{err}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ImportError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Open { source, .. } | Self::StoreDir { source, .. } => Some(source),
            Self::Csv(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::Repo(err) => Some(err),
            Self::InvalidRecord { .. } | Self::DuplicateId { .. } => None,
        }
    }
}

impl From<csv::Error> for ImportError {
    fn from(value: csv::Error) -> Self {
        Self::Csv(value)
    }
}

impl From<DbError> for ImportError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<RepoError> for ImportError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

/// What `bootstrap` did to reach a usable store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootstrapOutcome {
    /// First run: the roster was imported with this many members.
    Imported(usize),
    /// The store already existed and was opened unchanged.
    Existing,
}

/// Positional roster columns.
#[derive(Debug, Deserialize)]
struct RosterRow {
    id: MemberId,
    name: String,
    grade: i64,
    status: String,
    email: String,
    registered_paid: String,
    money_owed: f64,
    payment_method: String,
}

impl RosterRow {
    fn into_member(self, email_domain: &str) -> Member {
        // Bare usernames get the institutional suffix; full addresses pass through.
        let email = if self.email.contains('@') {
            self.email
        } else {
            email_from_username(&self.email, email_domain)
        };
        Member {
            id: self.id,
            name: self.name,
            grade: self.grade,
            status: self.status,
            email,
            registered_paid: self.registered_paid,
            money_owed: self.money_owed,
            payment_method: self.payment_method,
        }
    }
}

/// Parses the roster file at `path`.
pub fn parse_roster(
    path: impl AsRef<Path>,
    delimiter: u8,
    email_domain: &str,
) -> ImportResult<Vec<Member>> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| ImportError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    parse_roster_reader(file, delimiter, email_domain)
}

/// Parses roster text from any reader. The first row is a header and is
/// ignored; blank lines are skipped.
pub fn parse_roster_reader<R: Read>(
    reader: R,
    delimiter: u8,
    email_domain: &str,
) -> ImportResult<Vec<Member>> {
    let mut csv_reader = ReaderBuilder::new()
        .has_headers(true)
        .delimiter(delimiter)
        .trim(Trim::All)
        .flexible(true)
        .from_reader(reader);

    let mut members = Vec::new();
    let mut seen: HashMap<MemberId, u64> = HashMap::new();

    for record in csv_reader.records() {
        let record = record?;
        let line = record.position().map_or(0, |position| position.line());

        if record.len() != ROSTER_FIELD_COUNT {
            return Err(ImportError::InvalidRecord {
                line,
                message: format!(
                    "expected {ROSTER_FIELD_COUNT} fields, found {}",
                    record.len()
                ),
            });
        }

        let row = record
            .deserialize::<RosterRow>(None)
            .map_err(|err| ImportError::InvalidRecord {
                line,
                message: err.to_string(),
            })?;
        let member = row.into_member(email_domain);
        member.validate().map_err(|err| ImportError::InvalidRecord {
            line,
            message: err.to_string(),
        })?;

        if seen.insert(member.id, line).is_some() {
            return Err(ImportError::DuplicateId {
                line,
                id: member.id,
            });
        }
        members.push(member);
    }

    Ok(members)
}

/// Bulk-loads parsed members and their attendance rows in one transaction.
pub fn import_roster(conn: &Connection, members: &[Member]) -> ImportResult<usize> {
    let repo = SqliteMemberRepository::try_new(conn)?;
    Ok(repo.create_members(members)?)
}

/// Opens the configured store, importing the roster when it does not exist.
///
/// # Side effects
/// - First run: creates the store file, or removes it again if the load
///   fails so the next launch retries the import.
/// - Emits `roster_import` logging events.
pub fn bootstrap(config: &TrackerConfig) -> ImportResult<(Connection, BootstrapOutcome)> {
    if store_exists(&config.db_path) {
        info!("event=roster_import module=import status=skipped reason=store_exists");
        let conn = open_db(&config.db_path)?;
        return Ok((conn, BootstrapOutcome::Existing));
    }

    let started_at = Instant::now();
    info!("event=roster_import module=import status=start");

    let members = parse_roster(&config.roster_path, config.delimiter, &config.email_domain)
        .map_err(|err| {
            error!(
                "event=roster_import module=import status=error error_code=roster_parse_failed error={}",
                err
            );
            err
        })?;

    if let Some(parent) = config.db_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|source| ImportError::StoreDir {
                path: parent.to_path_buf(),
                source,
            })?;
        }
    }

    let (conn, count) = load_new_store(&config.db_path, &members)?;
    info!(
        "event=roster_import module=import status=ok members={} duration_ms={}",
        count,
        started_at.elapsed().as_millis()
    );
    Ok((conn, BootstrapOutcome::Imported(count)))
}

/// Creates the store at `db_path` and loads `members` into it.
///
/// Any failure after the file may exist, opening and migrating included,
/// removes the file again so the store never looks initialized without its
/// roster.
fn load_new_store(db_path: &Path, members: &[Member]) -> ImportResult<(Connection, usize)> {
    let loaded = open_db(db_path)
        .map_err(ImportError::from)
        .and_then(|conn| import_roster(&conn, members).map(|count| (conn, count)));

    loaded.map_err(|err| {
        error!(
            "event=roster_import module=import status=error error_code=roster_load_failed error={}",
            err
        );
        if db_path.exists() {
            match std::fs::remove_file(db_path) {
                Ok(()) => info!("event=store_cleanup module=import status=ok"),
                Err(remove_err) => warn!(
                    "event=store_cleanup module=import status=error error={}",
                    remove_err
                ),
            }
        }
        err
    })
}
