//! Recipient list management
//!
//! The list keeps insertion order and guarantees that no two recipients
//! share an email address, compared case-insensitively.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ulid::Ulid;

use crate::{
    ValidationError,
    address::{normalise, validate_email},
};

/// A single campaign recipient.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recipient {
    pub id: Ulid,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub added_at: DateTime<Utc>,
}

impl Recipient {
    /// Create a recipient with a fresh id.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidEmail`] if `email` is not valid.
    pub fn new(email: &str, name: Option<String>) -> Result<Self, ValidationError> {
        Ok(Self {
            id: Ulid::new(),
            email: validate_email(email)?,
            name: name.filter(|n| !n.trim().is_empty()),
            added_at: Utc::now(),
        })
    }
}

/// Result of a bulk import: what was added and what was skipped.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportReport {
    pub added: usize,
    pub invalid: usize,
    pub duplicates: usize,
}

impl ImportReport {
    #[must_use]
    pub const fn skipped(&self) -> usize {
        self.invalid + self.duplicates
    }
}

/// Ordered, de-duplicated recipient list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<Recipient>", into = "Vec<Recipient>")]
pub struct RecipientList {
    recipients: Vec<Recipient>,
    seen: HashSet<String>,
}

impl RecipientList {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one recipient.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidEmail`] for a malformed address and
    /// [`ValidationError::DuplicateRecipient`] if it is already listed.
    pub fn add(&mut self, email: &str, name: Option<String>) -> Result<&Recipient, ValidationError> {
        let recipient = Recipient::new(email, name)?;
        self.push(recipient)
    }

    /// Import many `(email, name)` entries, skipping and counting the bad ones.
    pub fn import<I, S>(&mut self, entries: I) -> ImportReport
    where
        I: IntoIterator<Item = (S, Option<String>)>,
        S: AsRef<str>,
    {
        let mut report = ImportReport::default();

        for (email, name) in entries {
            match self.add(email.as_ref(), name) {
                Ok(_) => report.added += 1,
                Err(ValidationError::DuplicateRecipient(_)) => report.duplicates += 1,
                Err(_) => report.invalid += 1,
            }
        }

        report
    }

    /// Remove the recipient with `id`, returning it if present.
    pub fn remove(&mut self, id: Ulid) -> Option<Recipient> {
        let index = self.recipients.iter().position(|r| r.id == id)?;
        let recipient = self.recipients.remove(index);
        self.seen.remove(&normalise(&recipient.email));
        Some(recipient)
    }

    pub fn clear(&mut self) {
        self.recipients.clear();
        self.seen.clear();
    }

    /// Whether `email` is already on the list (case-insensitive).
    #[must_use]
    pub fn contains(&self, email: &str) -> bool {
        self.seen.contains(&normalise(email))
    }

    #[must_use]
    pub fn get(&self, id: Ulid) -> Option<&Recipient> {
        self.recipients.iter().find(|r| r.id == id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.recipients.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.recipients.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Recipient> {
        self.recipients.iter()
    }

    #[must_use]
    pub fn as_slice(&self) -> &[Recipient] {
        &self.recipients
    }

    fn push(&mut self, recipient: Recipient) -> Result<&Recipient, ValidationError> {
        if !self.seen.insert(normalise(&recipient.email)) {
            return Err(ValidationError::DuplicateRecipient(recipient.email));
        }

        self.recipients.push(recipient);
        Ok(&self.recipients[self.recipients.len() - 1])
    }
}

/// Rebuilds the uniqueness index, dropping later duplicates.
impl From<Vec<Recipient>> for RecipientList {
    fn from(recipients: Vec<Recipient>) -> Self {
        let mut list = Self::new();
        for recipient in recipients {
            let _ = list.push(recipient);
        }
        list
    }
}

impl From<RecipientList> for Vec<Recipient> {
    fn from(list: RecipientList) -> Self {
        list.recipients
    }
}

impl<'a> IntoIterator for &'a RecipientList {
    type Item = &'a Recipient;
    type IntoIter = std::slice::Iter<'a, Recipient>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
