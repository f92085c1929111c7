//! Transport sessions.
//!
//! A [`Transport`] opens [`Session`]s; a session is a live handle to the
//! mail-sending backend that can be verified, used to send, and closed.
//! The delivery client owns each session it opens and closes it itself.

use async_trait::async_trait;
use courier_common::{Message, TransportConfig};
use ulid::Ulid;

use crate::{error::TransportError, policy::TransportParameters};

pub mod smtp;

pub use smtp::SmtpTransport;
pub use test::{TestSession, TestTransport};

/// Opens sessions against a mail-sending backend.
#[async_trait]
pub trait Transport: Send + Sync + std::fmt::Debug {
    /// Prepare a session for `config`.
    ///
    /// Opening does not have to touch the network; [`Session::verify`] is
    /// what proves the session usable.
    ///
    /// # Errors
    ///
    /// If the configuration cannot be turned into a session at all. This is
    /// not retried.
    async fn open(
        &self,
        config: &TransportConfig,
        parameters: &TransportParameters,
    ) -> Result<Box<dyn Session>, TransportError>;
}

/// A single transport session.
#[async_trait]
pub trait Session: Send {
    /// Confirm the backend accepts this session (connect, greet, authenticate).
    ///
    /// # Errors
    ///
    /// If the backend is unreachable or refuses the session
    async fn verify(&mut self) -> Result<(), TransportError>;

    /// Send `message`, returning the message identifier assigned to it.
    ///
    /// # Errors
    ///
    /// If the message cannot be built or the backend refuses it
    async fn send(&mut self, message: &Message) -> Result<String, TransportError>;

    /// Release the session. Calling this more than once has no effect.
    async fn close(&mut self);
}

/// Build a globally unique `Message-ID` value for mail from `from_email`.
pub(crate) fn generate_message_id(from_email: &str) -> String {
    let domain = from_email
        .rsplit_once('@')
        .map_or("localhost", |(_, domain)| domain);

    format!("<{}@{domain}>", Ulid::new())
}
