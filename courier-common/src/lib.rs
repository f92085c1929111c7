//! Shared types for courier
//!
//! This crate holds the domain model every other courier crate speaks:
//! - Transport configuration and outgoing messages
//! - Recipient lists with case-insensitive de-duplication
//! - Send outcomes, batch progress and campaign summaries
//! - Repository traits standing in for persisted state
//! - Logging setup

pub mod address;
pub mod error;
pub mod logging;
pub mod message;
pub mod outcome;
pub mod recipient;
pub mod traits;
pub mod transport;

pub use tracing;

pub use self::{
    error::{StoreError, ValidationError},
    message::{
        Attachment, Body, MAX_ATTACHMENT_SIZE, Message, MessageDraft, MessageTemplate,
    },
    outcome::{BatchProgress, CampaignResult, CampaignSummary, OutcomeStatus, SendOutcome},
    recipient::{ImportReport, Recipient, RecipientList},
    traits::{ConfigProvider, DraftStore, OutcomeSink, RecipientProvider, Repository},
    transport::TransportConfig,
};

#[derive(Debug, Clone, Copy)]
pub enum Signal {
    Shutdown,
}
