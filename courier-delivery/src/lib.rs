//! Campaign delivery for courier
//!
//! This crate provides:
//! - A [`DeliveryClient`] that opens and verifies a transport session with
//!   bounded retries, sends one message and always closes the session
//! - A [`CampaignProcessor`] that delivers a message to a recipient list in
//!   paced, concurrently processed batches
//! - Retry and provider-aware TLS policies
//! - A `lettre` backed SMTP transport, plus a scriptable one for tests

mod client;
mod error;
pub mod policy;
pub mod processor;
pub mod transport;

pub use client::DeliveryClient;
pub use error::{CampaignError, DeliveryError, TransportError};
pub use policy::{RetryPolicy, TlsPolicyResolver};
pub use processor::{BatchSettings, CampaignProcessor, PreparedCampaign, prepare};
pub use transport::{Session, SmtpTransport, TestTransport, Transport};
