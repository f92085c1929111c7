//! Delivery outcomes and campaign progress accounting.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Final state of one recipient's delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeStatus {
    Success,
    Failed,
}

/// One entry in the append-only send log.
///
/// Fields are private so an outcome cannot be altered once recorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendOutcome {
    recipient: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    campaign: Option<String>,
    status: OutcomeStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    message_id: Option<String>,
    timestamp: DateTime<Utc>,
}

impl SendOutcome {
    #[must_use]
    pub fn success(recipient: &str, campaign: Option<&str>, message_id: String) -> Self {
        Self {
            recipient: recipient.to_string(),
            campaign: campaign.map(ToString::to_string),
            status: OutcomeStatus::Success,
            error: None,
            message_id: Some(message_id),
            timestamp: Utc::now(),
        }
    }

    #[must_use]
    pub fn failure(recipient: &str, campaign: Option<&str>, error: String) -> Self {
        Self {
            recipient: recipient.to_string(),
            campaign: campaign.map(ToString::to_string),
            status: OutcomeStatus::Failed,
            error: Some(error),
            message_id: None,
            timestamp: Utc::now(),
        }
    }

    #[must_use]
    pub fn recipient(&self) -> &str {
        &self.recipient
    }

    #[must_use]
    pub fn campaign(&self) -> Option<&str> {
        self.campaign.as_deref()
    }

    #[must_use]
    pub const fn status(&self) -> OutcomeStatus {
        self.status
    }

    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    #[must_use]
    pub fn message_id(&self) -> Option<&str> {
        self.message_id.as_deref()
    }

    #[must_use]
    pub const fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self.status, OutcomeStatus::Success)
    }
}

/// Running totals for an in-flight campaign.
///
/// Emitted after every individual outcome. `batch` is zero-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchProgress {
    pub total: usize,
    pub batch_size: usize,
    pub batch: usize,
    pub batches: usize,
    pub sent: usize,
    pub failed: usize,
}

impl BatchProgress {
    #[must_use]
    pub const fn new(total: usize, batch_size: usize) -> Self {
        Self {
            total,
            batch_size,
            batch: 0,
            batches: total.div_ceil(batch_size),
            sent: 0,
            failed: 0,
        }
    }

    /// Recipients with a recorded outcome so far.
    #[must_use]
    pub const fn completed(&self) -> usize {
        self.sent + self.failed
    }

    #[must_use]
    pub const fn is_complete(&self) -> bool {
        self.completed() == self.total
    }

    /// Fold one outcome into the totals.
    pub const fn record(&mut self, status: OutcomeStatus) {
        match status {
            OutcomeStatus::Success => self.sent += 1,
            OutcomeStatus::Failed => self.failed += 1,
        }
    }
}

/// How a finished campaign went overall.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CampaignResult {
    FullSuccess,
    PartialFailure,
    FullFailure,
}

/// Final report of a completed campaign run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CampaignSummary {
    pub campaign: String,
    pub total: usize,
    pub sent: usize,
    pub failed: usize,
    pub batches: usize,
    pub result: CampaignResult,
}

impl CampaignSummary {
    #[must_use]
    pub fn from_progress(campaign: impl Into<String>, progress: &BatchProgress) -> Self {
        let result = if progress.failed == 0 {
            CampaignResult::FullSuccess
        } else if progress.sent == 0 {
            CampaignResult::FullFailure
        } else {
            CampaignResult::PartialFailure
        };

        Self {
            campaign: campaign.into(),
            total: progress.total,
            sent: progress.sent,
            failed: progress.failed,
            batches: progress.batches,
            result,
        }
    }
}

impl std::fmt::Display for CampaignSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.result {
            CampaignResult::FullSuccess => write!(
                f,
                "Campaign '{}' sent successfully to all {} recipients",
                self.campaign, self.sent
            ),
            CampaignResult::PartialFailure => write!(
                f,
                "Campaign '{}' partially sent: {} sent, {} failed",
                self.campaign, self.sent, self.failed
            ),
            CampaignResult::FullFailure => write!(
                f,
                "Campaign '{}' failed: all {} deliveries failed",
                self.campaign, self.failed
            ),
        }
    }
}
