//! Attendance ledger use-case service.
//!
//! # Responsibility
//! - Expose the fixed meeting calendar for selection.
//! - Record one meeting's roll call against the attendance sheet.
//! - Interpret operator answers during roll call.
//!
//! # Invariants
//! - Recording touches only the chosen slot of the members named in `marks`.
//! - Members missing from `marks` keep whatever value they already had.

use crate::model::attendance::{AttendanceRecord, Mark, MeetingSlot, UnknownSlot};
use crate::model::member::MemberId;
use crate::repo::attendance_repo::{AttendanceRepository, ConsistencyReport, RollCallEntry};
use crate::repo::RepoError;
use log::{info, warn};
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Ledger error for attendance use-cases.
#[derive(Debug)]
pub enum LedgerError {
    /// Slot name is not one of the ten meetings.
    UnknownSlot(UnknownSlot),
    /// A mark targets an id with no attendance row.
    UnknownMember(MemberId),
    /// Persistence-layer failure.
    Repo(RepoError),
}

impl Display for LedgerError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownSlot(err) => write!(f, "{err}"),
            Self::UnknownMember(id) => write!(f, "no attendance row for member {id}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for LedgerError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::UnknownSlot(err) => Some(err),
            Self::Repo(err) => Some(err),
            Self::UnknownMember(_) => None,
        }
    }
}

impl From<RepoError> for LedgerError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound(id) => Self::UnknownMember(id),
            other => Self::Repo(other),
        }
    }
}

impl From<UnknownSlot> for LedgerError {
    fn from(value: UnknownSlot) -> Self {
        Self::UnknownSlot(value)
    }
}

/// Attendance ledger facade over repository implementations.
pub struct AttendanceService<R: AttendanceRepository> {
    repo: R,
}

impl<R: AttendanceRepository> AttendanceService<R> {
    /// Creates a ledger using the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// The ten meeting slots in club-year order.
    pub fn list_meeting_slots(&self) -> &'static [MeetingSlot] {
        &MeetingSlot::ALL
    }

    /// Members to prompt during roll call, with display names.
    pub fn roll_call(&self) -> Result<Vec<RollCallEntry>, LedgerError> {
        Ok(self.repo.roll_call()?)
    }

    /// Full attendance sheet joined with names.
    pub fn list_attendance(&self) -> Result<Vec<AttendanceRecord>, LedgerError> {
        Ok(self.repo.list_attendance()?)
    }

    /// Records one meeting for every member named in `marks`.
    ///
    /// # Errors
    /// - `UnknownMember` when an id has no attendance row; no mark is kept.
    pub fn record_meeting(
        &self,
        slot: MeetingSlot,
        marks: &BTreeMap<MemberId, Mark>,
    ) -> Result<usize, LedgerError> {
        let written = self.repo.record_marks(slot, marks)?;
        let attended = marks
            .values()
            .filter(|mark| **mark == Mark::Attended)
            .count();
        info!(
            "event=meeting_record module=ledger status=ok slot={} marks={} attended={}",
            slot.column(),
            written,
            attended
        );
        Ok(written)
    }

    /// Same as `record_meeting`, resolving the slot by name (`sep`, `June`).
    pub fn record_meeting_named(
        &self,
        slot_name: &str,
        marks: &BTreeMap<MemberId, Mark>,
    ) -> Result<usize, LedgerError> {
        let slot = slot_name.parse::<MeetingSlot>()?;
        self.record_meeting(slot, marks)
    }

    /// Reports member/attendance pairing violations and logs them.
    pub fn check_consistency(&self) -> Result<ConsistencyReport, LedgerError> {
        let report = self.repo.check_consistency()?;
        if !report.is_consistent() {
            warn!(
                "event=consistency_check module=ledger status=degraded members_without_attendance={} attendance_without_member={}",
                report.members_without_attendance.len(),
                report.attendance_without_member.len()
            );
        }
        Ok(report)
    }
}

/// Interprets a roll-call answer.
///
/// Blank or affirmative answers mean attended; explicit negatives mean
/// absent. Anything else returns `None` so the caller can ask again.
pub fn parse_response(answer: &str) -> Option<Mark> {
    match answer.trim().to_ascii_lowercase().as_str() {
        "" | "y" | "yes" => Some(Mark::Attended),
        "n" | "no" => Some(Mark::Absent),
        _ => None,
    }
}
