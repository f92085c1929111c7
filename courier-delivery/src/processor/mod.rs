//! Bulk send orchestration.
//!
//! A campaign is validated up front, split into consecutive batches and
//! delivered one batch at a time. Recipients inside a batch are delivered
//! concurrently; batches are separated by a fixed pause.

mod batch;

use std::{sync::Arc, time::Duration};

use courier_common::{
    BatchProgress, CampaignSummary, MessageDraft, MessageTemplate, OutcomeSink, RecipientList,
    TransportConfig, ValidationError, internal,
};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::UnboundedSender;

use self::batch::Delivery;
use crate::{client::DeliveryClient, error::CampaignError};

/// Batch sizing and pacing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchSettings {
    /// Recipients delivered concurrently per batch.
    ///
    /// Default: 50
    #[serde(default = "defaults::batch_size")]
    pub batch_size: usize,

    /// Pause between two batches, in milliseconds. No pause follows the last.
    ///
    /// Default: 2000
    #[serde(default = "defaults::batch_delay_ms")]
    pub batch_delay_ms: u64,
}

impl Default for BatchSettings {
    fn default() -> Self {
        Self {
            batch_size: defaults::batch_size(),
            batch_delay_ms: defaults::batch_delay_ms(),
        }
    }
}

impl BatchSettings {
    /// Effective batch size, never zero.
    #[must_use]
    pub const fn size(&self) -> usize {
        if self.batch_size == 0 {
            1
        } else {
            self.batch_size
        }
    }

    #[must_use]
    pub const fn delay(&self) -> Duration {
        Duration::from_millis(self.batch_delay_ms)
    }
}

mod defaults {
    pub const fn batch_size() -> usize {
        50
    }

    pub const fn batch_delay_ms() -> u64 {
        2_000
    }
}

/// A campaign that passed validation and is ready to run.
#[derive(Debug, Clone)]
pub struct PreparedCampaign {
    pub name: String,
    pub config: TransportConfig,
    pub template: MessageTemplate,
}

/// Check everything a campaign needs before any network activity.
///
/// Checks run in this order: transport configuration present and valid,
/// at least one recipient, then the draft (subject, exactly one body,
/// attachments) and finally a campaign label.
///
/// # Errors
///
/// The first [`ValidationError`] found.
pub fn prepare(
    config: Option<&TransportConfig>,
    recipients: &RecipientList,
    draft: &MessageDraft,
) -> Result<PreparedCampaign, ValidationError> {
    let config = config.ok_or(ValidationError::MissingTransportConfig)?;
    config.validate()?;

    if recipients.is_empty() {
        return Err(ValidationError::NoRecipients);
    }

    let template = draft.validate()?;
    let name = template
        .campaign
        .clone()
        .ok_or(ValidationError::MissingCampaign)?;

    Ok(PreparedCampaign {
        name,
        config: config.clone(),
        template,
    })
}

/// Runs campaigns through a shared [`DeliveryClient`].
#[derive(Debug, Clone)]
pub struct CampaignProcessor {
    client: Arc<DeliveryClient>,
    settings: BatchSettings,
}

impl CampaignProcessor {
    #[must_use]
    pub const fn new(client: Arc<DeliveryClient>, settings: BatchSettings) -> Self {
        Self { client, settings }
    }

    #[must_use]
    pub const fn settings(&self) -> &BatchSettings {
        &self.settings
    }

    #[must_use]
    pub fn client(&self) -> &Arc<DeliveryClient> {
        &self.client
    }

    /// Deliver `draft` to every recipient.
    ///
    /// Every recipient is attempted exactly once. Outcomes are appended to
    /// `sink` as they resolve and running totals are published on
    /// `progress` after each one. The returned summary carries cumulative
    /// totals over all batches.
    ///
    /// # Errors
    ///
    /// - [`CampaignError::Validation`] before anything is sent
    /// - [`CampaignError::Sink`] or [`CampaignError::Aborted`] if the run
    ///   had to stop; outcomes already recorded are kept
    pub async fn run<S>(
        &self,
        config: Option<&TransportConfig>,
        recipients: &RecipientList,
        draft: &MessageDraft,
        sink: &S,
        progress: Option<UnboundedSender<BatchProgress>>,
    ) -> Result<CampaignSummary, CampaignError>
    where
        S: OutcomeSink + ?Sized,
    {
        let campaign = prepare(config, recipients, draft)?;
        let batch_size = self.settings.size();
        let mut totals = BatchProgress::new(recipients.len(), batch_size);

        internal!(
            level = INFO,
            campaign = %campaign.name,
            recipients = totals.total,
            batches = totals.batches,
            batch_size,
            "Starting campaign"
        );

        let delivery = Delivery {
            client: Arc::clone(&self.client),
            config: Arc::new(campaign.config),
            template: Arc::new(campaign.template),
        };

        for (index, chunk) in recipients.as_slice().chunks(batch_size).enumerate() {
            if index > 0 {
                tokio::time::sleep(self.settings.delay()).await;
            }

            totals.batch = index;
            batch::run(&delivery, chunk, &mut totals, sink, progress.as_ref()).await?;

            internal!(
                level = INFO,
                campaign = %campaign.name,
                batch = index + 1,
                batches = totals.batches,
                sent = totals.sent,
                failed = totals.failed,
                "Batch complete"
            );
        }

        let summary = CampaignSummary::from_progress(campaign.name, &totals);
        internal!(level = INFO, "{summary}");

        Ok(summary)
    }
}
