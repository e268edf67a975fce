//! Roster and attendance domain model.
//!
//! # Responsibility
//! - Define the member record and the operator-facing input shapes.
//! - Define the fixed meeting calendar and presence marks.
//!
//! # Invariants
//! - Every member is identified by a stable, operator-assigned `MemberId`.
//! - Every member owns exactly one attendance row keyed by the same id.

pub mod attendance;
pub mod member;
