//! Stored transport configuration and message draft

use axum::{Json, extract::State, http::StatusCode};
use courier_common::{MessageDraft, TransportConfig};

use crate::{error::ApiError, extract::Payload, state::AppState};

/// `GET /api/config`, with the password blanked out
pub async fn get_config(State(state): State<AppState>) -> Result<Json<TransportConfig>, ApiError> {
    state
        .store
        .transport_config()
        .await?
        .map(|config| Json(config.redacted()))
        .ok_or(ApiError::NotFound("SMTP configuration"))
}

/// `PUT /api/config`
///
/// An empty password keeps the stored one, so a configuration read back
/// from `GET` can be edited and saved without re-entering it.
pub async fn put_config(
    State(state): State<AppState>,
    Payload(mut config): Payload<TransportConfig>,
) -> Result<Json<TransportConfig>, ApiError> {
    config.validate()?;

    if config.password.is_empty()
        && let Some(existing) = state.store.transport_config().await?
    {
        config.password = existing.password;
    }

    let redacted = config.redacted();
    state.store.set_transport_config(config).await?;

    Ok(Json(redacted))
}

/// `DELETE /api/config`
pub async fn delete_config(State(state): State<AppState>) -> Result<StatusCode, ApiError> {
    state.store.clear_transport_config().await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `GET /api/draft`
pub async fn get_draft(State(state): State<AppState>) -> Result<Json<MessageDraft>, ApiError> {
    state
        .store
        .draft()
        .await?
        .map(Json)
        .ok_or(ApiError::NotFound("Draft"))
}

/// `PUT /api/draft`; drafts are stored unvalidated
pub async fn put_draft(
    State(state): State<AppState>,
    Payload(draft): Payload<MessageDraft>,
) -> Result<StatusCode, ApiError> {
    state.store.set_draft(draft).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `DELETE /api/draft`
pub async fn delete_draft(State(state): State<AppState>) -> Result<StatusCode, ApiError> {
    state.store.clear_draft().await?;
    Ok(StatusCode::NO_CONTENT)
}
