//! Persistence for courier
//!
//! Implementations of the repository traits from `courier_common::traits`:
//! - [`MemoryStore`]: process-local, for tests and throwaway runs
//! - [`FileStore`]: JSON documents and a JSON Lines send log in a data directory

mod backends;

use std::{path::PathBuf, sync::Arc};

pub use backends::{FileStore, MemoryStore};
use courier_common::{Repository, StoreError};
use serde::Deserialize;

/// Which repository implementation to run with
///
/// File-backed store in RON config, optionally capping the send log:
/// ```ron
/// Courier (
///     store: File(
///         path: "/var/lib/courier",
///         outcome_limit: Some(100000),
///     ),
/// )
/// ```
///
/// Memory-backed store:
/// ```ron
/// Courier (
///     store: Memory(
///         outcome_limit: Some(10000),
///     ),
/// )
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub enum StoreConfig {
    /// File-based store (production)
    File {
        path: PathBuf,
        /// Maximum number of outcomes kept (omit for unlimited)
        #[serde(default)]
        outcome_limit: Option<usize>,
    },
    /// Memory-based store (testing/development)
    Memory {
        /// Maximum number of outcomes kept (omit for unlimited)
        #[serde(default)]
        outcome_limit: Option<usize>,
    },
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self::File {
            path: FileStore::default().path().to_path_buf(),
            outcome_limit: None,
        }
    }
}

impl StoreConfig {
    /// Prepare the configured store for use
    ///
    /// # Errors
    ///
    /// If a file-backed store's data directory cannot be prepared
    pub async fn open(&self) -> Result<Arc<dyn Repository>, StoreError> {
        match self {
            Self::File {
                path,
                outcome_limit,
            } => {
                let store = match outcome_limit {
                    Some(limit) => FileStore::with_outcome_limit(path.clone(), *limit),
                    None => FileStore::new(path.clone()),
                };
                store.init().await?;
                Ok(Arc::new(store))
            }
            Self::Memory { outcome_limit } => Ok(Arc::new(
                outcome_limit.map_or_else(MemoryStore::new, MemoryStore::with_outcome_limit),
            )),
        }
    }
}
