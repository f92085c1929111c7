//! Campaign runs and the send log

use axum::{Json, extract::State, http::StatusCode};
use courier_common::{BatchProgress, CampaignSummary, MessageDraft, SendOutcome, internal};
use courier_delivery::CampaignError;
use tokio::sync::mpsc;

use crate::{error::ApiError, extract::Payload, state::AppState};

/// `POST /api/campaigns`
///
/// Runs `draft` against the stored configuration and recipient list. The run
/// happens on its own task, so it carries on to completion even if the
/// request times out. Only one campaign runs at a time.
pub async fn run(
    State(state): State<AppState>,
    Payload(draft): Payload<MessageDraft>,
) -> Result<Json<CampaignSummary>, ApiError> {
    let guard = state
        .begin_campaign()
        .ok_or_else(|| ApiError::Conflict("A campaign is already running".to_string()))?;

    let config = state.store.transport_config().await?;
    let recipients = state.store.recipients().await?;

    let (tx, rx) = mpsc::unbounded_channel();
    tokio::spawn(log_progress(rx));

    let task = tokio::spawn(async move {
        let _guard = guard;
        state
            .processor
            .run(config.as_ref(), &recipients, &draft, &*state.store, Some(tx))
            .await
    });

    let summary = task
        .await
        .map_err(|e| CampaignError::Aborted(format!("campaign task failed: {e}")))??;

    Ok(Json(summary))
}

async fn log_progress(mut rx: mpsc::UnboundedReceiver<BatchProgress>) {
    while let Some(progress) = rx.recv().await {
        internal!(
            level = INFO,
            batch = progress.batch + 1,
            batches = progress.batches,
            sent = progress.sent,
            failed = progress.failed,
            total = progress.total,
            "Campaign progress"
        );
    }
}

/// `GET /api/logs`, newest first
pub async fn logs(State(state): State<AppState>) -> Result<Json<Vec<SendOutcome>>, ApiError> {
    Ok(Json(state.store.outcomes().await?))
}

/// `DELETE /api/logs`
pub async fn clear_logs(State(state): State<AppState>) -> Result<StatusCode, ApiError> {
    state.store.clear_outcomes().await?;
    Ok(StatusCode::NO_CONTENT)
}
