//! Fan-out of one batch of recipients.

use std::sync::Arc;

use courier_common::{
    BatchProgress, MessageTemplate, OutcomeSink, Recipient, SendOutcome, TransportConfig,
    tracing::{debug, error},
};
use tokio::{sync::mpsc::UnboundedSender, task::JoinSet};

use crate::{client::DeliveryClient, error::CampaignError};

/// Shared, read-only inputs every delivery task in a campaign needs.
#[derive(Debug, Clone)]
pub(super) struct Delivery {
    pub client: Arc<DeliveryClient>,
    pub config: Arc<TransportConfig>,
    pub template: Arc<MessageTemplate>,
}

impl Delivery {
    /// Deliver to one recipient and turn the result into an outcome.
    ///
    /// Never fails: every error becomes a failed outcome.
    async fn deliver(self, email: String) -> SendOutcome {
        let campaign = self.template.campaign.as_deref();

        let result = match self.template.address_to(&email) {
            Ok(message) => self.client.send(&self.config, &message).await,
            Err(e) => Err(e.into()),
        };

        match result {
            Ok(message_id) => SendOutcome::success(&email, campaign, message_id),
            Err(e) => {
                debug!(recipient = %email, error = %e, "Delivery failed");
                SendOutcome::failure(&email, campaign, e.to_string())
            }
        }
    }
}

/// Deliver to every recipient in `batch` concurrently.
///
/// Each outcome is folded into `progress`, appended to `sink`, and the
/// updated totals are published before the next outcome is looked at.
///
/// # Errors
///
/// If a delivery task panics or `sink` refuses an outcome. The remaining
/// tasks in the batch are cancelled.
pub(super) async fn run<S>(
    delivery: &Delivery,
    batch: &[Recipient],
    progress: &mut BatchProgress,
    sink: &S,
    updates: Option<&UnboundedSender<BatchProgress>>,
) -> Result<(), CampaignError>
where
    S: OutcomeSink + ?Sized,
{
    let mut join_set = JoinSet::new();

    for recipient in batch {
        join_set.spawn(delivery.clone().deliver(recipient.email.clone()));
    }

    while let Some(joined) = join_set.join_next().await {
        let outcome = match joined {
            Ok(outcome) => outcome,
            Err(e) => {
                error!(error = %e, "Delivery task did not complete");
                join_set.shutdown().await;
                return Err(CampaignError::Aborted(format!("delivery task failed: {e}")));
            }
        };

        progress.record(outcome.status());

        if let Err(e) = sink.append(outcome).await {
            error!(error = %e, "Failed to record outcome");
            join_set.shutdown().await;
            return Err(e.into());
        }

        if let Some(updates) = updates {
            // A dropped receiver only means nobody is watching
            let _ = updates.send(*progress);
        }
    }

    Ok(())
}
