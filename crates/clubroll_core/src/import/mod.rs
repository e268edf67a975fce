//! First-run roster import.
//!
//! # Responsibility
//! - Parse the delimited roster file into validated members.
//! - Bootstrap the store exactly once, gated on the store file's absence.
//!
//! # Invariants
//! - The roster is parsed completely before the store file is created.
//! - The bulk load is a single transaction.
//! - An existing store is opened as-is and never re-imported.

mod roster;

pub use roster::{
    bootstrap, import_roster, parse_roster, parse_roster_reader, BootstrapOutcome, ImportError,
    ImportResult,
};
