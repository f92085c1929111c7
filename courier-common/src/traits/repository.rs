use async_trait::async_trait;

use crate::{MessageDraft, RecipientList, SendOutcome, StoreError, TransportConfig};

/// Source of the active transport configuration.
#[async_trait]
pub trait ConfigProvider: Send + Sync {
    /// The stored configuration, if one has been saved.
    ///
    /// # Errors
    ///
    /// If the backing storage cannot be read
    async fn transport_config(&self) -> Result<Option<TransportConfig>, StoreError>;

    /// Replace the stored configuration.
    ///
    /// # Errors
    ///
    /// If the backing storage cannot be written
    async fn set_transport_config(&self, config: TransportConfig) -> Result<(), StoreError>;

    /// Forget the stored configuration.
    ///
    /// # Errors
    ///
    /// If the backing storage cannot be written
    async fn clear_transport_config(&self) -> Result<(), StoreError>;
}

/// Source of the current recipient list.
#[async_trait]
pub trait RecipientProvider: Send + Sync {
    /// All current recipients.
    ///
    /// # Errors
    ///
    /// If the backing storage cannot be read
    async fn recipients(&self) -> Result<RecipientList, StoreError>;

    /// Replace the recipient list wholesale.
    ///
    /// # Errors
    ///
    /// If the backing storage cannot be written
    async fn set_recipients(&self, recipients: RecipientList) -> Result<(), StoreError>;
}

/// Append-only writer for send outcomes.
#[async_trait]
pub trait OutcomeSink: Send + Sync {
    /// Record one outcome.
    ///
    /// # Errors
    ///
    /// If the backing storage cannot be written
    async fn append(&self, outcome: SendOutcome) -> Result<(), StoreError>;

    /// Every recorded outcome, newest first.
    ///
    /// # Errors
    ///
    /// If the backing storage cannot be read
    async fn outcomes(&self) -> Result<Vec<SendOutcome>, StoreError>;

    /// Drop the whole log.
    ///
    /// # Errors
    ///
    /// If the backing storage cannot be written
    async fn clear_outcomes(&self) -> Result<(), StoreError>;
}

/// Storage for the message being composed.
#[async_trait]
pub trait DraftStore: Send + Sync {
    /// # Errors
    ///
    /// If the backing storage cannot be read
    async fn draft(&self) -> Result<Option<MessageDraft>, StoreError>;

    /// # Errors
    ///
    /// If the backing storage cannot be written
    async fn set_draft(&self, draft: MessageDraft) -> Result<(), StoreError>;

    /// # Errors
    ///
    /// If the backing storage cannot be written
    async fn clear_draft(&self) -> Result<(), StoreError>;
}

/// Everything courier persists.
pub trait Repository: ConfigProvider + RecipientProvider + OutcomeSink + DraftStore {}

impl<T> Repository for T where T: ConfigProvider + RecipientProvider + OutcomeSink + DraftStore {}
