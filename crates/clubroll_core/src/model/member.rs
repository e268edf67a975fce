//! Member domain model.
//!
//! # Responsibility
//! - Define the canonical member record stored in `members`.
//! - Validate operator input and derive the institutional email address.
//! - Merge partial edits by named field.
//!
//! # Invariants
//! - `id` is assigned once at creation and never changes.
//! - No text field of a stored member is blank.
//! - `money_owed` is always finite.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Operator-assigned member number, the primary key of both tables.
pub type MemberId = i64;

/// Institutional suffix appended to usernames when none is configured.
pub const DEFAULT_EMAIL_DOMAIN: &str = "@share.epsb.ca";

/// Canonical member record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Member {
    pub id: MemberId,
    pub name: String,
    /// School grade / class level.
    pub grade: i64,
    /// Club status label, e.g. `active` or `executive`.
    pub status: String,
    /// Full address, always `username + domain` for members added in-app.
    pub email: String,
    pub registered_paid: String,
    /// Outstanding balance in dollars.
    pub money_owed: f64,
    pub payment_method: String,
}

impl Member {
    /// Checks field presence and numeric sanity before persistence.
    pub fn validate(&self) -> Result<(), MemberValidationError> {
        for (field, value) in [
            ("name", &self.name),
            ("status", &self.status),
            ("email", &self.email),
            ("registered_paid", &self.registered_paid),
            ("payment_method", &self.payment_method),
        ] {
            if value.trim().is_empty() {
                return Err(MemberValidationError::BlankField(field));
            }
        }

        if !self.money_owed.is_finite() {
            return Err(MemberValidationError::InvalidNumber {
                field: "money_owed",
                value: self.money_owed.to_string(),
            });
        }

        Ok(())
    }
}

/// Validation failure for member input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MemberValidationError {
    /// A mandatory field was blank after trimming.
    BlankField(&'static str),
    /// A numeric field did not parse.
    InvalidNumber { field: &'static str, value: String },
}

impl Display for MemberValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankField(field) => write!(f, "field `{field}` must not be blank"),
            Self::InvalidNumber { field, value } => {
                write!(f, "field `{field}` expects a number, got `{value}`")
            }
        }
    }
}

impl Error for MemberValidationError {}

/// Raw operator input for a new member.
///
/// Numeric fields arrive as text so the registry can reject bad input even
/// when it is called without the shell's re-prompt loop in front of it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewMember {
    pub id: MemberId,
    pub name: String,
    pub grade: String,
    pub status: String,
    /// Username only; the domain suffix is appended on creation.
    pub username: String,
    pub registered_paid: String,
    pub money_owed: String,
    pub payment_method: String,
}

impl NewMember {
    /// Converts operator input into a validated member record.
    pub fn into_member(self, email_domain: &str) -> Result<Member, MemberValidationError> {
        let username = required("username", &self.username)?;
        let member = Member {
            id: self.id,
            name: required("name", &self.name)?,
            grade: parse_grade(&self.grade)?,
            status: required("status", &self.status)?,
            email: email_from_username(&username, email_domain),
            registered_paid: required("registered_paid", &self.registered_paid)?,
            money_owed: parse_money(&self.money_owed)?,
            payment_method: required("payment_method", &self.payment_method)?,
        };
        member.validate()?;
        Ok(member)
    }
}

/// Partial update for an existing member.
///
/// A blank field means "keep the current value". There is deliberately no
/// `id` field: identifiers cannot be edited.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemberEdit {
    pub name: String,
    pub grade: String,
    pub status: String,
    pub username: String,
    pub registered_paid: String,
    pub money_owed: String,
    pub payment_method: String,
}

impl MemberEdit {
    /// Returns whether every field is blank.
    pub fn is_empty(&self) -> bool {
        [
            &self.name,
            &self.grade,
            &self.status,
            &self.username,
            &self.registered_paid,
            &self.money_owed,
            &self.payment_method,
        ]
        .iter()
        .all(|value| value.trim().is_empty())
    }

    /// Merges non-blank fields over `current`, field by field.
    pub fn apply_to(
        &self,
        current: &Member,
        email_domain: &str,
    ) -> Result<Member, MemberValidationError> {
        let mut merged = current.clone();

        if let Some(name) = non_blank(&self.name) {
            merged.name = name;
        }
        if !self.grade.trim().is_empty() {
            merged.grade = parse_grade(&self.grade)?;
        }
        if let Some(status) = non_blank(&self.status) {
            merged.status = status;
        }
        if let Some(username) = non_blank(&self.username) {
            merged.email = email_from_username(&username, email_domain);
        }
        if let Some(registered_paid) = non_blank(&self.registered_paid) {
            merged.registered_paid = registered_paid;
        }
        if !self.money_owed.trim().is_empty() {
            merged.money_owed = parse_money(&self.money_owed)?;
        }
        if let Some(payment_method) = non_blank(&self.payment_method) {
            merged.payment_method = payment_method;
        }

        merged.validate()?;
        Ok(merged)
    }
}

/// Normalizes a configured domain so it always starts with `@`.
pub fn normalize_email_domain(domain: &str) -> String {
    let trimmed = domain.trim();
    if trimmed.starts_with('@') {
        trimmed.to_string()
    } else {
        format!("@{trimmed}")
    }
}

/// Builds the institutional email for `username`.
pub fn email_from_username(username: &str, email_domain: &str) -> String {
    format!("{}{}", username.trim(), email_domain)
}

/// Recovers the username portion of an institutional email.
///
/// Addresses outside the domain are returned unchanged.
pub fn username_from_email<'a>(email: &'a str, email_domain: &str) -> &'a str {
    email.strip_suffix(email_domain).unwrap_or(email)
}

/// Parses a grade / class level.
pub fn parse_grade(value: &str) -> Result<i64, MemberValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(MemberValidationError::BlankField("grade"));
    }
    trimmed
        .parse::<i64>()
        .map_err(|_| MemberValidationError::InvalidNumber {
            field: "grade",
            value: trimmed.to_string(),
        })
}

/// Parses an amount owed in dollars. A leading `$` is tolerated.
pub fn parse_money(value: &str) -> Result<f64, MemberValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(MemberValidationError::BlankField("money_owed"));
    }
    let digits = trimmed.strip_prefix('$').unwrap_or(trimmed);
    match digits.parse::<f64>() {
        Ok(amount) if amount.is_finite() => Ok(amount),
        _ => Err(MemberValidationError::InvalidNumber {
            field: "money_owed",
            value: trimmed.to_string(),
        }),
    }
}

fn required(field: &'static str, value: &str) -> Result<String, MemberValidationError> {
    non_blank(value).ok_or(MemberValidationError::BlankField(field))
}

fn non_blank(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
