//! Core domain logic for the club roster and attendance tracker.
//! This crate is the single source of truth for the member/attendance
//! pairing invariant.

pub mod config;
pub mod db;
pub mod import;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use config::TrackerConfig;
pub use import::{bootstrap, BootstrapOutcome, ImportError};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::attendance::{AttendanceRecord, Mark, MeetingSlot, UnknownSlot};
pub use model::member::{
    Member, MemberEdit, MemberId, MemberValidationError, NewMember, DEFAULT_EMAIL_DOMAIN,
};
pub use repo::attendance_repo::{
    AttendanceRepository, ConsistencyReport, RollCallEntry, SqliteAttendanceRepository,
};
pub use repo::member_repo::{MemberRepository, SqliteMemberRepository};
pub use repo::{RepoError, RepoResult};
pub use service::attendance_service::{parse_response, AttendanceService, LedgerError};
pub use service::member_service::{MemberService, RegistryError};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
