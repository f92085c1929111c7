//! Request body extraction

use axum::extract::{FromRequest, rejection::JsonRejection};

use crate::error::ApiError;

/// JSON request body whose rejections render through [`ApiError`]
///
/// A body that is not JSON, or does not fit the target type, comes back as
/// a 400 with the usual `{"success": false, "error": "..."}` shape.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct Payload<T>(pub T);

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}
