//! API HTTP server

use std::time::Duration;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{delete, get, post},
};
use courier_common::{Signal, internal};
use tokio::{net::TcpListener, sync::broadcast};
use tower_http::timeout::TimeoutLayer;

use crate::{
    ApiConfig, ApiError, AppState,
    handlers::{self, campaigns, recipients, send, settings},
};

/// Build the API router over `state`
pub fn router(state: AppState, config: &ApiConfig) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/api/send-email", post(send::send_email))
        .route(
            "/api/config",
            get(settings::get_config)
                .put(settings::put_config)
                .delete(settings::delete_config),
        )
        .route(
            "/api/draft",
            get(settings::get_draft)
                .put(settings::put_draft)
                .delete(settings::delete_draft),
        )
        .route(
            "/api/recipients",
            get(recipients::list)
                .post(recipients::import)
                .delete(recipients::clear),
        )
        .route("/api/recipients/{id}", delete(recipients::remove))
        .route("/api/campaigns", post(campaigns::run))
        .route("/api/logs", get(campaigns::logs).delete(campaigns::clear_logs))
        .with_state(state)
        .layer(DefaultBodyLimit::max(config.max_body_bytes))
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.request_timeout_secs,
        )))
}

/// HTTP front end for sending, recipient management and campaigns
pub struct ApiServer {
    listener: TcpListener,
    router: Router,
}

impl ApiServer {
    /// Bind the listener and build the router
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Bind`] if the listen address cannot be bound.
    pub async fn new(config: &ApiConfig, state: AppState) -> Result<Self, ApiError> {
        let listener = TcpListener::bind(&config.listen_address)
            .await
            .map_err(|e| ApiError::Bind {
                address: config.listen_address.clone(),
                source: e,
            })?;

        internal!(
            level = INFO,
            address = %config.listen_address,
            "API server bound"
        );

        Ok(Self {
            listener,
            router: router(state, config),
        })
    }

    /// Address the server actually listens on
    ///
    /// # Errors
    ///
    /// Returns an error if the socket has no local address.
    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.listener.local_addr()
    }

    /// Serve requests until a shutdown signal arrives
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Server`] if the server fails while running.
    pub async fn serve(self, mut shutdown: broadcast::Receiver<Signal>) -> Result<(), ApiError> {
        internal!(level = INFO, "API server starting");

        axum::serve(self.listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                internal!(level = INFO, "API server received shutdown signal");
            })
            .await
            .map_err(|e| ApiError::Server(e.to_string()))?;

        internal!(level = INFO, "API server stopped");
        Ok(())
    }
}
