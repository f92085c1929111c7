//! API error types and their HTTP mapping

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use courier_common::{StoreError, ValidationError};
use courier_delivery::{CampaignError, DeliveryError};
use serde_json::json;
use thiserror::Error;

/// Errors returned by API handlers
///
/// Every variant renders as `{"success": false, "error": "..."}`.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Failed to bind to the specified address
    #[error("Failed to bind API server to {address}: {source}")]
    Bind {
        address: String,
        source: std::io::Error,
    },

    /// API server encountered a runtime error
    #[error("API server error: {0}")]
    Server(String),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Delivery(#[from] DeliveryError),

    #[error(transparent)]
    Campaign(#[from] CampaignError),

    #[error(transparent)]
    Store(#[from] StoreError),

    /// Malformed request that is not a domain validation failure
    #[error("{0}")]
    BadRequest(String),

    #[error("{0} not found")]
    NotFound(&'static str),

    /// The request clashes with work already in progress
    #[error("{0}")]
    Conflict(String),
}

impl ApiError {
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_)
            | Self::BadRequest(_)
            | Self::Delivery(DeliveryError::Validation(_))
            | Self::Campaign(CampaignError::Validation(_)) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Bind { .. }
            | Self::Server(_)
            | Self::Delivery(_)
            | Self::Campaign(_)
            | Self::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        } else {
            tracing::debug!(error = %self, status = status.as_u16(), "Request rejected");
        }

        (
            status,
            Json(json!({ "success": false, "error": self.to_string() })),
        )
            .into_response()
    }
}
