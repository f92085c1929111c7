use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use courier_common::{
    ConfigProvider, DraftStore, MessageDraft, OutcomeSink, RecipientList, RecipientProvider,
    SendOutcome, StoreError, TransportConfig,
};

#[derive(Debug, Default)]
struct State {
    config: Option<TransportConfig>,
    recipients: RecipientList,
    /// Oldest first; reversed on read
    outcomes: Vec<SendOutcome>,
    draft: Option<MessageDraft>,
}

/// In-memory repository
///
/// Everything lives behind one `RwLock` and is lost when the process exits.
/// Used for tests and for running without a data directory. Clones share
/// the same state.
///
/// The send log can be capped; once full, the oldest outcomes are dropped.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<RwLock<State>>,
    /// Maximum number of outcomes kept (None = unlimited)
    outcome_limit: Option<usize>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store that keeps at most `limit` outcomes
    #[must_use]
    pub fn with_outcome_limit(limit: usize) -> Self {
        Self {
            outcome_limit: Some(limit),
            ..Self::default()
        }
    }

    /// Number of recorded outcomes
    ///
    /// Recovers gracefully if the lock is poisoned by accessing the underlying data.
    #[must_use]
    pub fn outcome_count(&self) -> usize {
        self.state
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .outcomes
            .len()
    }
}

#[async_trait]
impl ConfigProvider for MemoryStore {
    async fn transport_config(&self) -> Result<Option<TransportConfig>, StoreError> {
        Ok(self.state.read()?.config.clone())
    }

    async fn set_transport_config(&self, config: TransportConfig) -> Result<(), StoreError> {
        self.state.write()?.config = Some(config);
        Ok(())
    }

    async fn clear_transport_config(&self) -> Result<(), StoreError> {
        self.state.write()?.config = None;
        Ok(())
    }
}

#[async_trait]
impl RecipientProvider for MemoryStore {
    async fn recipients(&self) -> Result<RecipientList, StoreError> {
        Ok(self.state.read()?.recipients.clone())
    }

    async fn set_recipients(&self, recipients: RecipientList) -> Result<(), StoreError> {
        self.state.write()?.recipients = recipients;
        Ok(())
    }
}

#[async_trait]
impl OutcomeSink for MemoryStore {
    async fn append(&self, outcome: SendOutcome) -> Result<(), StoreError> {
        let mut state = self.state.write()?;
        state.outcomes.push(outcome);

        if let Some(limit) = self.outcome_limit {
            let excess = state.outcomes.len().saturating_sub(limit);
            state.outcomes.drain(..excess);
        }

        Ok(())
    }

    async fn outcomes(&self) -> Result<Vec<SendOutcome>, StoreError> {
        Ok(self.state.read()?.outcomes.iter().rev().cloned().collect())
    }

    async fn clear_outcomes(&self) -> Result<(), StoreError> {
        self.state.write()?.outcomes.clear();
        Ok(())
    }
}

#[async_trait]
impl DraftStore for MemoryStore {
    async fn draft(&self) -> Result<Option<MessageDraft>, StoreError> {
        Ok(self.state.read()?.draft.clone())
    }

    async fn set_draft(&self, draft: MessageDraft) -> Result<(), StoreError> {
        self.state.write()?.draft = Some(draft);
        Ok(())
    }

    async fn clear_draft(&self) -> Result<(), StoreError> {
        self.state.write()?.draft = None;
        Ok(())
    }
}
