//! HTTP interface for courier
//!
//! # Endpoints
//!
//! - **`POST /api/send-email`** - Send one message with an inline transport configuration
//! - **`/api/config`** - Read, store or clear the saved transport configuration
//! - **`/api/recipients`** - List, import or clear recipients; `DELETE /api/recipients/{id}` removes one
//! - **`/api/draft`** - Read, store or clear the message draft
//! - **`POST /api/campaigns`** - Run a campaign against the stored configuration and recipients
//! - **`/api/logs`** - Read (newest first) or clear the send log
//! - **`GET /health`** - Liveness
//!
//! Failures render as `{"success": false, "error": "..."}` with a status
//! derived from the error kind.

mod config;
mod error;
mod extract;
pub mod handlers;
mod server;
mod state;

pub use config::ApiConfig;
pub use error::ApiError;
pub use extract::Payload;
pub use server::{ApiServer, router};
pub use state::AppState;
