//! Member repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide CRUD APIs over the `members` table.
//! - Keep the paired `attendance` row in lockstep on create/delete.
//!
//! # Invariants
//! - Create inserts the member row and an all-null attendance row in one
//!   transaction; delete removes both in one transaction.
//! - Update touches `members` only and never changes `id`.
//! - `Member::validate` guards every write; reads return rows as stored.

use crate::model::member::{Member, MemberId};
use crate::repo::{ensure_connection_ready, RepoError, RepoResult};
use log::warn;
use rusqlite::{params, Connection, Row, Transaction};

const MEMBER_SELECT_SQL: &str = "SELECT
    id,
    name,
    grade,
    status,
    email,
    registered_paid,
    money_owed,
    payment_method
FROM members";

const MEMBER_COLUMNS: &[&str] = &[
    "id",
    "name",
    "grade",
    "status",
    "email",
    "registered_paid",
    "money_owed",
    "payment_method",
];

/// Repository interface for member CRUD operations.
pub trait MemberRepository {
    /// Inserts one member together with its attendance row.
    fn create_member(&self, member: &Member) -> RepoResult<MemberId>;
    /// Inserts many members (and their attendance rows) all-or-nothing.
    fn create_members(&self, members: &[Member]) -> RepoResult<usize>;
    /// Overwrites every non-id column of an existing member.
    fn update_member(&self, member: &Member) -> RepoResult<()>;
    /// Removes a member and its attendance row.
    fn delete_member(&self, id: MemberId) -> RepoResult<()>;
    fn get_member(&self, id: MemberId) -> RepoResult<Option<Member>>;
    /// Lists all members ordered by id.
    fn list_members(&self) -> RepoResult<Vec<Member>>;
}

/// SQLite-backed member repository.
pub struct SqliteMemberRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteMemberRepository<'conn> {
    /// Creates repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, "members", MEMBER_COLUMNS)?;
        Ok(Self { conn })
    }
}

impl MemberRepository for SqliteMemberRepository<'_> {
    fn create_member(&self, member: &Member) -> RepoResult<MemberId> {
        member.validate()?;

        let tx = self.conn.unchecked_transaction()?;
        insert_member_pair(&tx, member)?;
        tx.commit()?;

        Ok(member.id)
    }

    fn create_members(&self, members: &[Member]) -> RepoResult<usize> {
        for member in members {
            member.validate()?;
        }

        let tx = self.conn.unchecked_transaction()?;
        for member in members {
            insert_member_pair(&tx, member)?;
        }
        tx.commit()?;

        Ok(members.len())
    }

    fn update_member(&self, member: &Member) -> RepoResult<()> {
        member.validate()?;

        let changed = self.conn.execute(
            "UPDATE members
             SET
                name = ?1,
                grade = ?2,
                status = ?3,
                email = ?4,
                registered_paid = ?5,
                money_owed = ?6,
                payment_method = ?7
             WHERE id = ?8;",
            params![
                member.name.as_str(),
                member.grade,
                member.status.as_str(),
                member.email.as_str(),
                member.registered_paid.as_str(),
                member.money_owed,
                member.payment_method.as_str(),
                member.id,
            ],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound(member.id));
        }

        Ok(())
    }

    fn delete_member(&self, id: MemberId) -> RepoResult<()> {
        let tx = self.conn.unchecked_transaction()?;

        let changed = tx.execute("DELETE FROM members WHERE id = ?1;", [id])?;
        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }
        tx.execute("DELETE FROM attendance WHERE id = ?1;", [id])?;

        tx.commit()?;
        Ok(())
    }

    fn get_member(&self, id: MemberId) -> RepoResult<Option<Member>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{MEMBER_SELECT_SQL} WHERE id = ?1;"))?;

        let mut rows = stmt.query([id])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_member_row(row)?));
        }

        Ok(None)
    }

    fn list_members(&self) -> RepoResult<Vec<Member>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{MEMBER_SELECT_SQL} ORDER BY id ASC;"))?;
        let mut rows = stmt.query([])?;
        let mut members = Vec::new();

        while let Some(row) = rows.next()? {
            members.push(parse_member_row(row)?);
        }

        Ok(members)
    }
}

fn insert_member_pair(tx: &Transaction<'_>, member: &Member) -> RepoResult<()> {
    if member_exists_in_tx(tx, member.id)? {
        return Err(RepoError::DuplicateId(member.id));
    }

    tx.execute(
        "INSERT INTO members (
            id,
            name,
            grade,
            status,
            email,
            registered_paid,
            money_owed,
            payment_method
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8);",
        params![
            member.id,
            member.name.as_str(),
            member.grade,
            member.status.as_str(),
            member.email.as_str(),
            member.registered_paid.as_str(),
            member.money_owed,
            member.payment_method.as_str(),
        ],
    )?;

    // A leftover row here can only come from a pre-transactional release.
    let stale = tx.execute("DELETE FROM attendance WHERE id = ?1;", [member.id])?;
    if stale > 0 {
        warn!(
            "event=attendance_orphan_dropped module=repo status=ok member_id={}",
            member.id
        );
    }
    tx.execute("INSERT INTO attendance (id) VALUES (?1);", [member.id])?;

    Ok(())
}

fn member_exists_in_tx(tx: &Transaction<'_>, id: MemberId) -> RepoResult<bool> {
    let exists: i64 = tx.query_row(
        "SELECT EXISTS(SELECT 1 FROM members WHERE id = ?1);",
        [id],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

/// Stored rows are returned as found. Stores adopted from older releases may
/// hold blank text fields; `validate` guards writes only, so such a member
/// can still be listed, removed or repaired through an edit.
fn parse_member_row(row: &Row<'_>) -> RepoResult<Member> {
    Ok(Member {
        id: row.get("id")?,
        name: row.get("name")?,
        grade: row.get("grade")?,
        status: row.get("status")?,
        email: row.get("email")?,
        registered_paid: row.get("registered_paid")?,
        money_owed: row.get("money_owed")?,
        payment_method: row.get("payment_method")?,
    })
}
