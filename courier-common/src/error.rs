//! Error types shared across courier crates.
//!
//! [`ValidationError`] covers everything detected before any network
//! activity takes place; it is surfaced immediately and never retried.
//! [`StoreError`] is returned by the repository traits.

use thiserror::Error;

/// Input was missing or malformed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// No transport configuration is available.
    #[error("SMTP configuration is missing")]
    MissingTransportConfig,

    /// A transport configuration field is unusable.
    #[error("Invalid SMTP configuration: {0}")]
    InvalidTransportConfig(String),

    /// The recipient list is empty.
    #[error("No recipients to send to")]
    NoRecipients,

    /// An email address failed validation.
    #[error("Invalid email address: {0}")]
    InvalidEmail(String),

    /// The email address is already on the list (case-insensitive).
    #[error("Duplicate recipient: {0}")]
    DuplicateRecipient(String),

    /// The subject line is empty.
    #[error("Subject is required")]
    MissingSubject,

    /// Neither a text nor an HTML body was supplied.
    #[error("Message body is required (text or html)")]
    MissingBody,

    /// Both a text and an HTML body were supplied.
    #[error("Exactly one message body may be set, found both text and html")]
    AmbiguousBody,

    /// The campaign label is empty.
    #[error("Campaign name is required")]
    MissingCampaign,

    /// An attachment could not be accepted.
    #[error("Invalid attachment {filename}: {reason}")]
    InvalidAttachment { filename: String, reason: String },
}

/// A repository operation failed.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Reading or writing the backing storage failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A stored document could not be encoded or decoded.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Internal error (lock poisoning, etc.).
    #[error("Internal error: {0}")]
    Internal(String),
}

impl<T> From<std::sync::PoisonError<T>> for StoreError {
    fn from(e: std::sync::PoisonError<T>) -> Self {
        Self::Internal(format!("Lock poisoned: {e}"))
    }
}
