use std::{
    path::Path,
    sync::{Arc, LazyLock},
};

use anyhow::Context;

use courier_api::{ApiConfig, ApiServer, AppState};
use courier_common::{Signal, internal, logging};
use courier_delivery::{BatchSettings, CampaignProcessor, DeliveryClient};
use courier_store::StoreConfig;
use serde::Deserialize;
use tokio::sync::broadcast;

/// Top level configuration, read from `courier.config.ron`
///
/// Every section is optional:
///
/// ```ron
/// (
///     api: (listen_address: "127.0.0.1:3001"),
///     store: File(path: "/var/lib/courier"),
///     delivery: (send: (max_attempts: 3, timeout_ms: 15000, backoff: Fixed(delay_ms: 1000))),
///     batch: (batch_size: 25, batch_delay_ms: 5000),
/// )
/// ```
#[derive(Debug, Default, Deserialize)]
pub struct Courier {
    #[serde(default)]
    api: ApiConfig,
    #[serde(default)]
    store: StoreConfig,
    #[serde(alias = "client", default)]
    delivery: DeliveryClient,
    #[serde(alias = "batches", default)]
    batch: BatchSettings,
}

pub static SHUTDOWN_BROADCAST: LazyLock<broadcast::Sender<Signal>> = LazyLock::new(|| {
    let (sender, _receiver) = broadcast::channel(64);
    sender
});

async fn shutdown() -> anyhow::Result<()> {
    let mut terminate = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())?;

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            internal!(level = INFO, "CTRL+C entered -- Enter it again to force shutdown");
        }
        _ = terminate.recv() => {
            internal!(level = INFO, "Terminate Signal received, shutting down");
        }
    };

    SHUTDOWN_BROADCAST
        .send(Signal::Shutdown)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Interrupted, e.to_string()))?;

    // The API server normally wins the race once in-flight requests drain
    tokio::signal::ctrl_c().await?;
    internal!(level = WARN, "Forcing shutdown");

    Ok(())
}

impl Courier {
    /// Read and parse the RON configuration at `path`
    ///
    /// # Errors
    ///
    /// If the file cannot be read or is not a valid configuration; the
    /// error names `path`.
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {}", path.display()))?;

        ron::from_str(&content)
            .with_context(|| format!("Failed to parse config from {}", path.display()))
    }

    #[must_use]
    pub const fn api(&self) -> &ApiConfig {
        &self.api
    }

    #[must_use]
    pub const fn store(&self) -> &StoreConfig {
        &self.store
    }

    #[must_use]
    pub const fn delivery(&self) -> &DeliveryClient {
        &self.delivery
    }

    #[must_use]
    pub const fn batch(&self) -> &BatchSettings {
        &self.batch
    }

    /// Open the store and build the state the API serves from
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be opened.
    pub async fn state(&self) -> anyhow::Result<AppState> {
        let store = self.store.open().await?;
        let processor = CampaignProcessor::new(Arc::new(self.delivery.clone()), self.batch);

        internal!(
            level = INFO,
            batch_size = self.batch.size(),
            batch_delay_ms = self.batch.batch_delay_ms,
            "Campaign processor ready"
        );

        Ok(AppState::new(store, Arc::new(processor)))
    }

    /// Run the API until a shutdown signal arrives
    ///
    /// # Errors
    ///
    /// This function will return an error if the store cannot be opened or
    /// the API server cannot bind its listen address.
    pub async fn run(self) -> anyhow::Result<()> {
        logging::init();

        let state = self.state().await?;
        let server = ApiServer::new(&self.api, state).await?;

        internal!(level = INFO, "Controller running");

        let ret = tokio::select! {
            r = server.serve(SHUTDOWN_BROADCAST.subscribe()) => {
                r.map_err(anyhow::Error::from)
            }
            r = shutdown() => {
                r
            }
        };

        internal!(level = INFO, "Shutting down...");

        ret
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use courier_common::RecipientProvider;
    use courier_delivery::policy::{Backoff, RetryPolicy};
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let courier: Courier = ron::from_str("()").unwrap();

        assert_eq!(courier.api(), &ApiConfig::default());
        assert_eq!(courier.store(), &StoreConfig::default());
        assert_eq!(courier.batch(), &BatchSettings::default());
        assert_eq!(courier.delivery().verify, RetryPolicy::verification());
        assert_eq!(courier.delivery().send, RetryPolicy::send());
    }

    #[test]
    fn test_config_sections() {
        let courier: Courier = ron::from_str(
            r#"(
                api: (listen_address: "127.0.0.1:0"),
                store: Memory(outcome_limit: None),
                delivery: (verify: (max_attempts: 5, timeout_ms: 2000, backoff: None)),
                batch: (batch_size: 10),
            )"#,
        )
        .unwrap();

        assert_eq!(courier.api().listen_address, "127.0.0.1:0");
        assert_eq!(courier.store(), &StoreConfig::Memory { outcome_limit: None });
        assert_eq!(courier.delivery().verify.max_attempts, 5);
        assert_eq!(courier.delivery().verify.backoff, Backoff::None);
        assert_eq!(courier.batch().size(), 10);
        assert_eq!(courier.batch().batch_delay_ms, 2000);
    }

    #[test]
    fn test_load_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("courier.config.ron");
        std::fs::write(&path, "(batch: (batch_size: 5))").unwrap();

        let courier = Courier::load(&path).unwrap();
        assert_eq!(courier.batch().size(), 5);
    }

    #[test]
    fn test_load_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("courier.config.ron");

        let error = Courier::load(&path).unwrap_err();
        assert!(
            error
                .to_string()
                .starts_with(&format!("Failed to read config from {}", path.display())),
            "{error}"
        );

        std::fs::write(&path, "(batch: (batch_size: \"five\"))").unwrap();

        let error = Courier::load(&path).unwrap_err();
        assert_eq!(
            error.to_string(),
            format!("Failed to parse config from {}", path.display())
        );
        assert!(error.chain().count() > 1);
    }

    #[tokio::test]
    async fn test_state_opens_file_store() {
        let dir = tempfile::tempdir().unwrap();
        let courier: Courier = ron::from_str(&format!(
            "(store: File(path: {:?}))",
            dir.path().join("data")
        ))
        .unwrap();

        let state = courier.state().await.unwrap();

        assert!(state.store.recipients().await.unwrap().is_empty());
        assert!(dir.path().join("data").is_dir());
    }
}
