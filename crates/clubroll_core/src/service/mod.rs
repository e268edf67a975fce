//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into registry and ledger use cases.
//! - Keep the shell decoupled from storage details.

pub mod attendance_service;
pub mod member_service;
