//! Typed error handling for delivery operations.
//!
//! This module separates three levels of failure:
//! - [`TransportError`]: a single session operation (verify, send) failed
//! - [`DeliveryError`]: one recipient could not be delivered to, after retries
//! - [`CampaignError`]: the campaign as a whole could not run or was aborted
//!
//! Per-recipient failures never escalate into a [`CampaignError`]; they are
//! recorded as failed outcomes and the campaign carries on.

use std::time::Duration;

use courier_common::{StoreError, ValidationError};
use thiserror::Error;

/// Failure of one operation on a transport session.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// The operation did not complete within its time limit.
    #[error("Timed out after {0:?}")]
    Timeout(Duration),

    /// The connection could not be established or was lost.
    #[error("Connection error: {0}")]
    Connection(String),

    /// The server answered, but refused the request.
    #[error("Rejected by server: {0}")]
    Rejected(String),

    /// The server did not confirm the session was usable.
    #[error("Verification failed: {0}")]
    Verification(String),

    /// Transport parameters could not be turned into a session.
    #[error("Invalid transport configuration: {0}")]
    Configuration(String),

    /// The message could not be encoded for the wire.
    #[error("Message could not be built: {0}")]
    Build(String),
}

/// Delivery to a single recipient failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeliveryError {
    /// Input was rejected before any connection was attempted.
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// The transport configuration could not be used at all.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// No session could be verified within the allowed attempts.
    #[error("Connection failed after {attempts} {}: {cause}", attempt_noun(.attempts))]
    ConnectionFailed { attempts: u32, cause: TransportError },

    /// The message could not be sent within the allowed attempts.
    #[error("Send failed after {attempts} {}: {cause}", attempt_noun(.attempts))]
    SendFailed { attempts: u32, cause: TransportError },
}

impl DeliveryError {
    /// Returns `true` if this error was raised before touching the network.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Returns `true` if the connection could never be verified.
    #[must_use]
    pub const fn is_connection_failure(&self) -> bool {
        matches!(self, Self::ConnectionFailed { .. })
    }

    /// Returns `true` if a verified session failed to transmit the message.
    #[must_use]
    pub const fn is_send_failure(&self) -> bool {
        matches!(self, Self::SendFailed { .. })
    }
}

#[allow(clippy::trivially_copy_pass_by_ref)]
const fn attempt_noun(attempts: &u32) -> &'static str {
    if *attempts == 1 { "attempt" } else { "attempts" }
}

/// The campaign could not be started, or was aborted part way through.
#[derive(Debug, Error)]
pub enum CampaignError {
    /// Input was rejected before any delivery was attempted.
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// An outcome could not be written to the send log.
    #[error("Failed to record outcome: {0}")]
    Sink(#[from] StoreError),

    /// Something outside the per-recipient isolation went wrong.
    #[error("Campaign aborted: {0}")]
    Aborted(String),
}

impl From<lettre::transport::smtp::Error> for TransportError {
    fn from(error: lettre::transport::smtp::Error) -> Self {
        if error.is_timeout() {
            Self::Connection(format!("timed out: {error}"))
        } else if error.is_permanent() || error.is_transient() {
            Self::Rejected(error.to_string())
        } else {
            Self::Connection(error.to_string())
        }
    }
}
