//! Meeting calendar and attendance marks.
//!
//! # Responsibility
//! - Define the ten fixed meeting slots of the club year (September to June).
//! - Define presence marks and their storage encoding.
//!
//! # Invariants
//! - Slot order is the calendar order of the club year.
//! - Selection indexes are 1-based and map 1:1 onto `MeetingSlot::ALL`.
//! - An unrecorded slot is `None`, never a default mark.
//! - A stored value that is no mark is kept verbatim in
//!   `AttendanceRecord::unrecognized`, never dropped or guessed.

use crate::model::member::MemberId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// One monthly meeting of the club year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MeetingSlot {
    Sep,
    Oct,
    Nov,
    Dec,
    Jan,
    Feb,
    Mar,
    Apr,
    May,
    Jun,
}

impl MeetingSlot {
    /// All slots in club-year order. July and August have no meeting.
    pub const ALL: [MeetingSlot; 10] = [
        Self::Sep,
        Self::Oct,
        Self::Nov,
        Self::Dec,
        Self::Jan,
        Self::Feb,
        Self::Mar,
        Self::Apr,
        Self::May,
        Self::Jun,
    ];

    /// Column name in the `attendance` table.
    pub fn column(self) -> &'static str {
        match self {
            Self::Sep => "sep",
            Self::Oct => "oct",
            Self::Nov => "nov",
            Self::Dec => "dec",
            Self::Jan => "jan",
            Self::Feb => "feb",
            Self::Mar => "mar",
            Self::Apr => "apr",
            Self::May => "may",
            Self::Jun => "jun",
        }
    }

    /// Display label used in menus and table headers.
    pub fn label(self) -> &'static str {
        match self {
            Self::Sep => "Sep",
            Self::Oct => "Oct",
            Self::Nov => "Nov",
            Self::Dec => "Dec",
            Self::Jan => "Jan",
            Self::Feb => "Feb",
            Self::Mar => "Mar",
            Self::Apr => "Apr",
            Self::May => "May",
            Self::Jun => "June",
        }
    }

    /// 1-based menu index.
    pub fn index(self) -> usize {
        self.position() + 1
    }

    /// Resolves a 1-based menu index.
    pub fn from_index(index: usize) -> Option<Self> {
        index
            .checked_sub(1)
            .and_then(|position| Self::ALL.get(position).copied())
    }

    pub(crate) fn position(self) -> usize {
        self as usize
    }
}

impl Display for MeetingSlot {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Error for slot names that are not part of the club year.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownSlot(pub String);

impl Display for UnknownSlot {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "unknown meeting slot `{}`", self.0)
    }
}

impl std::error::Error for UnknownSlot {}

impl FromStr for MeetingSlot {
    type Err = UnknownSlot;

    /// Accepts column names and labels, case-insensitive (`sep`, `June`).
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|slot| {
                slot.column() == normalized || slot.label().to_ascii_lowercase() == normalized
            })
            .ok_or_else(|| UnknownSlot(value.to_string()))
    }
}

/// Presence indicator for one member at one meeting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mark {
    Attended,
    Absent,
}

impl Mark {
    /// Storage encoding (`Y` / `N`).
    pub fn as_db(self) -> &'static str {
        match self {
            Self::Attended => "Y",
            Self::Absent => "N",
        }
    }

    /// Decodes a stored mark.
    ///
    /// Older releases stored roll-call answers as typed, so `yes`, `No` and
    /// padded values decode too. Returns `None` for anything else.
    pub fn from_db(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "y" | "yes" => Some(Self::Attended),
            "n" | "no" => Some(Self::Absent),
            _ => None,
        }
    }
}

/// Attendance sheet row joined with the member's display name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendanceRecord {
    pub member_id: MemberId,
    pub name: String,
    /// Indexed by `MeetingSlot::position()`.
    pub marks: [Option<Mark>; 10],
    /// Raw stored text of slots that hold something other than a mark.
    #[serde(default)]
    pub unrecognized: BTreeMap<MeetingSlot, String>,
}

impl AttendanceRecord {
    /// Record with no meeting recorded yet.
    pub fn blank(member_id: MemberId, name: impl Into<String>) -> Self {
        Self {
            member_id,
            name: name.into(),
            marks: [None; 10],
            unrecognized: BTreeMap::new(),
        }
    }

    /// Mark recorded for `slot`, if any.
    pub fn mark(&self, slot: MeetingSlot) -> Option<Mark> {
        self.marks[slot.position()]
    }

    /// Number of meetings recorded as attended.
    pub fn attended_count(&self) -> usize {
        self.marks
            .iter()
            .filter(|mark| **mark == Some(Mark::Attended))
            .count()
    }

    /// Number of meetings with anything recorded, readable or not.
    pub fn recorded_count(&self) -> usize {
        self.marks.iter().filter(|mark| mark.is_some()).count() + self.unrecognized.len()
    }

    /// Whether no meeting has been recorded for this member yet.
    pub fn is_blank(&self) -> bool {
        self.recorded_count() == 0
    }
}
