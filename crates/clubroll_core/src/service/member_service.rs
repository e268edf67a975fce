//! Member registry use-case service.
//!
//! # Responsibility
//! - Look up, add, remove and edit members on behalf of the shell.
//! - Derive institutional emails from usernames.
//! - Translate repository failures into operator-level outcomes
//!   (not found, duplicate id, invalid input).
//!
//! # Invariants
//! - Every mutation is preceded by a lookup of the target id.
//! - A rejected operation performs no write.
//! - Edits merge by named field; blank input keeps the stored value.

use crate::model::member::{
    normalize_email_domain, username_from_email, Member, MemberEdit, MemberId,
    MemberValidationError, NewMember, DEFAULT_EMAIL_DOMAIN,
};
use crate::repo::member_repo::MemberRepository;
use crate::repo::RepoError;
use log::info;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Registry error for member use-cases.
#[derive(Debug)]
pub enum RegistryError {
    /// Operator input failed validation; the shell should re-prompt.
    Validation(MemberValidationError),
    /// Target member does not exist.
    NotFound(MemberId),
    /// A member with this id already exists.
    Conflict(MemberId),
    /// Persistence-layer failure.
    Repo(RepoError),
    /// Write succeeded but the read-back disagrees.
    InconsistentState(&'static str),
}

impl Display for RegistryError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "Member with ID {id} doesn't exist!"),
            Self::Conflict(id) => write!(f, "Member with ID {id} already exists!"),
            Self::Repo(err) => write!(f, "{err}"),
            Self::InconsistentState(details) => write!(f, "inconsistent member state: {details}"),
        }
    }
}

impl Error for RegistryError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for RegistryError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound(id) => Self::NotFound(id),
            RepoError::DuplicateId(id) => Self::Conflict(id),
            RepoError::Validation(err) => Self::Validation(err),
            other => Self::Repo(other),
        }
    }
}

impl From<MemberValidationError> for RegistryError {
    fn from(value: MemberValidationError) -> Self {
        Self::Validation(value)
    }
}

/// Member registry facade over repository implementations.
pub struct MemberService<R: MemberRepository> {
    repo: R,
    email_domain: String,
}

impl<R: MemberRepository> MemberService<R> {
    /// Creates a registry using the default institutional email domain.
    pub fn new(repo: R) -> Self {
        Self::with_email_domain(repo, DEFAULT_EMAIL_DOMAIN)
    }

    /// Creates a registry with a custom email domain suffix.
    pub fn with_email_domain(repo: R, email_domain: &str) -> Self {
        Self {
            repo,
            email_domain: normalize_email_domain(email_domain),
        }
    }

    /// Domain suffix appended to usernames.
    pub fn email_domain(&self) -> &str {
        &self.email_domain
    }

    /// Username portion of a member's email, as offered during edits.
    pub fn current_username<'m>(&self, member: &'m Member) -> &'m str {
        username_from_email(&member.email, &self.email_domain)
    }

    /// Gets one member by id.
    pub fn lookup(&self, id: MemberId) -> Result<Option<Member>, RegistryError> {
        Ok(self.repo.get_member(id)?)
    }

    /// Lists all members ordered by id.
    pub fn list(&self) -> Result<Vec<Member>, RegistryError> {
        Ok(self.repo.list_members()?)
    }

    /// Adds a member and its empty attendance row.
    ///
    /// # Errors
    /// - `Conflict` when the id is taken; nothing is written.
    /// - `Validation` when a field is blank or non-numeric.
    pub fn add(&self, input: NewMember) -> Result<Member, RegistryError> {
        let id = input.id;
        if self.repo.get_member(id)?.is_some() {
            return Err(RegistryError::Conflict(id));
        }

        let member = input.into_member(&self.email_domain)?;
        self.repo.create_member(&member)?;
        info!("event=member_add module=registry status=ok member_id={id}");

        self.repo
            .get_member(id)?
            .ok_or(RegistryError::InconsistentState(
                "added member not found in read-back",
            ))
    }

    /// Removes a member and its attendance row; returns the removed record.
    pub fn remove(&self, id: MemberId) -> Result<Member, RegistryError> {
        let existing = self.repo.get_member(id)?.ok_or(RegistryError::NotFound(id))?;

        self.repo.delete_member(id)?;
        info!("event=member_remove module=registry status=ok member_id={id}");

        Ok(existing)
    }

    /// Applies a partial edit; blank fields keep their stored values.
    ///
    /// An all-blank edit returns the current record without writing.
    pub fn edit(&self, id: MemberId, edit: &MemberEdit) -> Result<Member, RegistryError> {
        let current = self.repo.get_member(id)?.ok_or(RegistryError::NotFound(id))?;
        if edit.is_empty() {
            info!(
                "event=member_edit module=registry status=skipped member_id={id} reason=no_changes"
            );
            return Ok(current);
        }

        let merged = edit.apply_to(&current, &self.email_domain)?;
        self.repo.update_member(&merged)?;
        info!("event=member_edit module=registry status=ok member_id={id}");

        self.repo
            .get_member(id)?
            .ok_or(RegistryError::InconsistentState(
                "edited member not found in read-back",
            ))
    }
}
