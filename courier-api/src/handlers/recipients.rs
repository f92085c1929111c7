//! Recipient list management

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use courier_common::{ImportReport, RecipientList, internal};
use serde::{Deserialize, Serialize};
use ulid::Ulid;

use crate::{error::ApiError, extract::Payload, state::AppState};

#[derive(Debug, Deserialize)]
pub struct RecipientEntry {
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ImportRequest {
    pub recipients: Vec<RecipientEntry>,
}

#[derive(Debug, Serialize)]
pub struct ImportResponse {
    #[serde(flatten)]
    pub report: ImportReport,
    pub total: usize,
}

/// `GET /api/recipients`
pub async fn list(State(state): State<AppState>) -> Result<Json<RecipientList>, ApiError> {
    Ok(Json(state.store.recipients().await?))
}

/// `POST /api/recipients`
///
/// Adds to the existing list. Invalid and duplicate addresses are skipped
/// and counted rather than failing the request.
pub async fn import(
    State(state): State<AppState>,
    Payload(request): Payload<ImportRequest>,
) -> Result<Json<ImportResponse>, ApiError> {
    let _guard = state.recipients.lock().await;

    let mut recipients = state.store.recipients().await?;
    let report = recipients.import(
        request
            .recipients
            .into_iter()
            .map(|entry| (entry.email, entry.name)),
    );
    let total = recipients.len();

    state.store.set_recipients(recipients).await?;

    internal!(
        level = INFO,
        added = report.added,
        invalid = report.invalid,
        duplicates = report.duplicates,
        total,
        "Recipients imported"
    );

    Ok(Json(ImportResponse { report, total }))
}

/// `DELETE /api/recipients`
pub async fn clear(State(state): State<AppState>) -> Result<StatusCode, ApiError> {
    let _guard = state.recipients.lock().await;
    state.store.set_recipients(RecipientList::new()).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `DELETE /api/recipients/{id}`
pub async fn remove(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = Ulid::from_string(&id)
        .map_err(|e| ApiError::BadRequest(format!("Invalid recipient id '{id}': {e}")))?;

    let _guard = state.recipients.lock().await;

    let mut recipients = state.store.recipients().await?;
    recipients
        .remove(id)
        .ok_or(ApiError::NotFound("Recipient"))?;
    state.store.set_recipients(recipients).await?;

    Ok(StatusCode::NO_CONTENT)
}
