//! Attendance repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Read the attendance sheet joined with member names.
//! - Write one meeting's marks for many members atomically.
//! - Detect member/attendance rows that have lost their partner.
//!
//! # Invariants
//! - Only the chosen slot column is written by `record_marks`.
//! - `record_marks` is all-or-nothing: an unknown id rolls back every mark.
//! - Slot column names come from `MeetingSlot::column()` only.
//! - Reads never fail on slot contents: legacy answers that are no mark are
//!   surfaced verbatim so the operator can still open every menu.

use crate::model::attendance::{AttendanceRecord, Mark, MeetingSlot};
use crate::model::member::MemberId;
use crate::repo::{ensure_connection_ready, RepoError, RepoResult};
use log::warn;
use rusqlite::{params, Connection, Row};
use std::collections::BTreeMap;

const ATTENDANCE_COLUMNS: &[&str] = &[
    "id", "sep", "oct", "nov", "dec", "jan", "feb", "mar", "apr", "may", "jun",
];

/// Result column of the first slot in `sheet_select_sql()`, after id and name.
const SHEET_FIRST_SLOT_INDEX: usize = 2;

/// Member shown during roll call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RollCallEntry {
    pub member_id: MemberId,
    pub name: String,
}

/// Ids present on only one side of the member/attendance pairing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConsistencyReport {
    pub members_without_attendance: Vec<MemberId>,
    pub attendance_without_member: Vec<MemberId>,
}

impl ConsistencyReport {
    pub fn is_consistent(&self) -> bool {
        self.members_without_attendance.is_empty() && self.attendance_without_member.is_empty()
    }
}

/// Repository interface for the attendance sheet.
pub trait AttendanceRepository {
    /// Members eligible for roll call, ordered by id.
    fn roll_call(&self) -> RepoResult<Vec<RollCallEntry>>;
    /// Full attendance sheet with member names, ordered by id.
    fn list_attendance(&self) -> RepoResult<Vec<AttendanceRecord>>;
    fn get_attendance(&self, id: MemberId) -> RepoResult<Option<AttendanceRecord>>;
    /// Writes `marks` into `slot` in one transaction; returns rows written.
    fn record_marks(
        &self,
        slot: MeetingSlot,
        marks: &BTreeMap<MemberId, Mark>,
    ) -> RepoResult<usize>;
    /// Lists ids that violate the one-row-per-member pairing.
    fn check_consistency(&self) -> RepoResult<ConsistencyReport>;
}

/// SQLite-backed attendance repository.
pub struct SqliteAttendanceRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteAttendanceRepository<'conn> {
    /// Creates repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, "attendance", ATTENDANCE_COLUMNS)?;
        Ok(Self { conn })
    }
}

impl AttendanceRepository for SqliteAttendanceRepository<'_> {
    fn roll_call(&self) -> RepoResult<Vec<RollCallEntry>> {
        let mut stmt = self.conn.prepare(
            "SELECT
                attendance.id,
                members.name
             FROM attendance
             INNER JOIN members ON members.id = attendance.id
             ORDER BY attendance.id ASC;",
        )?;
        let mut rows = stmt.query([])?;
        let mut entries = Vec::new();
        while let Some(row) = rows.next()? {
            entries.push(RollCallEntry {
                member_id: row.get(0)?,
                name: row.get(1)?,
            });
        }
        Ok(entries)
    }

    fn list_attendance(&self) -> RepoResult<Vec<AttendanceRecord>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{} ORDER BY attendance.id ASC;", sheet_select_sql()))?;
        let mut rows = stmt.query([])?;
        let mut records = Vec::new();
        while let Some(row) = rows.next()? {
            records.push(parse_attendance_row(row)?);
        }
        Ok(records)
    }

    fn get_attendance(&self, id: MemberId) -> RepoResult<Option<AttendanceRecord>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{} WHERE attendance.id = ?1;", sheet_select_sql()))?;
        let mut rows = stmt.query([id])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_attendance_row(row)?));
        }
        Ok(None)
    }

    fn record_marks(
        &self,
        slot: MeetingSlot,
        marks: &BTreeMap<MemberId, Mark>,
    ) -> RepoResult<usize> {
        let sql = format!("UPDATE attendance SET {} = ?1 WHERE id = ?2;", slot.column());
        let tx = self.conn.unchecked_transaction()?;
        {
            let mut stmt = tx.prepare(&sql)?;
            for (&id, mark) in marks {
                let changed = stmt.execute(params![mark.as_db(), id])?;
                if changed == 0 {
                    return Err(RepoError::NotFound(id));
                }
            }
        }
        tx.commit()?;
        Ok(marks.len())
    }

    fn check_consistency(&self) -> RepoResult<ConsistencyReport> {
        Ok(ConsistencyReport {
            members_without_attendance: collect_ids(
                self.conn,
                "SELECT members.id
                 FROM members
                 LEFT JOIN attendance ON attendance.id = members.id
                 WHERE attendance.id IS NULL
                 ORDER BY members.id ASC;",
            )?,
            attendance_without_member: collect_ids(
                self.conn,
                "SELECT attendance.id
                 FROM attendance
                 LEFT JOIN members ON members.id = attendance.id
                 WHERE members.id IS NULL
                 ORDER BY attendance.id ASC;",
            )?,
        })
    }
}

fn sheet_select_sql() -> String {
    let slot_columns = MeetingSlot::ALL
        .iter()
        .map(|slot| format!("attendance.{}", slot.column()))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "SELECT attendance.id, members.name, {slot_columns}
         FROM attendance
         INNER JOIN members ON members.id = attendance.id"
    )
}

fn parse_attendance_row(row: &Row<'_>) -> RepoResult<AttendanceRecord> {
    let mut record = AttendanceRecord::blank(row.get(0)?, row.get::<_, String>(1)?);
    for slot in MeetingSlot::ALL {
        let stored: Option<String> = row.get(SHEET_FIRST_SLOT_INDEX + slot.position())?;
        let Some(value) = stored.filter(|value| !value.trim().is_empty()) else {
            continue;
        };
        match Mark::from_db(&value) {
            Some(mark) => record.marks[slot.position()] = Some(mark),
            None => {
                warn!(
                    "event=attendance_read module=repo status=degraded member_id={} slot={} reason=unrecognized_mark",
                    record.member_id,
                    slot.column()
                );
                record.unrecognized.insert(slot, value);
            }
        }
    }
    Ok(record)
}

fn collect_ids(conn: &Connection, sql: &str) -> RepoResult<Vec<MemberId>> {
    let mut stmt = conn.prepare(sql)?;
    let mut rows = stmt.query([])?;
    let mut ids = Vec::new();
    while let Some(row) = rows.next()? {
        ids.push(row.get(0)?);
    }
    Ok(ids)
}
