use std::{
    io::{Error, ErrorKind},
    path::{Component, Path, PathBuf},
    sync::Arc,
};

use async_trait::async_trait;
use courier_common::{
    ConfigProvider, DraftStore, MessageDraft, OutcomeSink, RecipientList, RecipientProvider,
    SendOutcome, StoreError, TransportConfig, internal,
};
use serde::{Serialize, de::DeserializeOwned};
use tokio::{fs, io::AsyncWriteExt, sync::Mutex};

const CONFIG: &str = "config.json";
const RECIPIENTS: &str = "recipients.json";
const OUTCOMES: &str = "outcomes.jsonl";
const DRAFT: &str = "draft.json";

const TEMP_PREFIX: &str = ".tmp_";

/// File-based repository
///
/// Each key is one file inside a data directory:
/// - `config.json`: the transport configuration
/// - `recipients.json`: the recipient list
/// - `outcomes.jsonl`: the send log, one JSON object per line, oldest first
/// - `draft.json`: the message being composed
///
/// A missing file reads as empty.
///
/// # Atomicity
/// Documents are written to a `.tmp_` file and renamed into place, so a
/// crash never leaves a half-written document behind. The send log is only
/// ever appended to; a torn final line left by a crash is skipped on read.
/// Writers are serialised by a single lock.
///
/// # Outcome limit
/// With a limit set, reads return at most `limit` outcomes and the log is
/// compacted down to the newest `limit` lines once it grows past twice that.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
    outcome_limit: Option<usize>,
    lock: Arc<Mutex<LogState>>,
}

/// Guarded by the store lock
#[derive(Debug, Default)]
struct LogState {
    /// Lines in the send log, once known
    lines: Option<usize>,
}

impl Default for FileStore {
    fn default() -> Self {
        Self::new("/var/lib/courier")
    }
}

impl FileStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            outcome_limit: None,
            lock: Arc::new(Mutex::new(LogState::default())),
        }
    }

    /// Create a store whose send log keeps at most `limit` outcomes
    #[must_use]
    pub fn with_outcome_limit(path: impl Into<PathBuf>, limit: usize) -> Self {
        Self {
            outcome_limit: Some(limit),
            ..Self::new(path)
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Create the data directory and remove temporary files left by a crash
    ///
    /// # Errors
    ///
    /// If the path contains `..` components, or the directory cannot be
    /// created or read, or exists as a file
    pub async fn init(&self) -> Result<(), StoreError> {
        if self.path.components().any(|c| c == Component::ParentDir) {
            return Err(StoreError::Io(Error::new(
                ErrorKind::InvalidInput,
                format!(
                    "Data directory cannot contain '..' components: {}",
                    self.path.display()
                ),
            )));
        }

        fs::create_dir_all(&self.path).await?;

        if !fs::metadata(&self.path).await?.is_dir() {
            return Err(StoreError::Io(Error::new(
                ErrorKind::NotADirectory,
                format!("{} is not a directory", self.path.display()),
            )));
        }

        let mut entries = fs::read_dir(&self.path).await?;
        while let Some(entry) = entries.next_entry().await? {
            if entry.file_name().to_string_lossy().starts_with(TEMP_PREFIX) {
                internal!(
                    level = WARN,
                    file = %entry.path().display(),
                    "Removing incomplete document"
                );
                fs::remove_file(entry.path()).await?;
            }
        }

        internal!(level = INFO, path = %self.path.display(), "File store ready");
        Ok(())
    }

    async fn load<T: DeserializeOwned>(&self, name: &str) -> Result<Option<T>, StoreError> {
        let contents = match fs::read(self.path.join(name)).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        serde_json::from_slice(&contents)
            .map(Some)
            .map_err(|e| StoreError::Serialization(format!("{name}: {e}")))
    }

    /// Write `value` to `name`, replacing it atomically. Callers hold `lock`.
    async fn save<T: Serialize + Sync>(&self, name: &str, value: &T) -> Result<(), StoreError> {
        let contents = serde_json::to_vec_pretty(value)
            .map_err(|e| StoreError::Serialization(format!("{name}: {e}")))?;

        let temp = self.path.join(format!("{TEMP_PREFIX}{name}"));
        fs::write(&temp, contents).await?;
        fs::rename(&temp, self.path.join(name)).await?;

        Ok(())
    }

    /// Every outcome in the send log, oldest first. Callers hold `lock`.
    async fn read_log(&self) -> Result<Vec<SendOutcome>, StoreError> {
        let contents = match fs::read(self.path.join(OUTCOMES)).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let terminated = contents.ends_with(b"\n");
        let mut lines = contents
            .split(|byte| *byte == b'\n')
            .filter(|line| !line.trim_ascii().is_empty())
            .peekable();

        let mut outcomes = Vec::new();
        while let Some(line) = lines.next() {
            match serde_json::from_slice(line) {
                Ok(outcome) => outcomes.push(outcome),
                Err(e) if !terminated && lines.peek().is_none() => {
                    internal!(level = WARN, error = %e, "Skipping incomplete send log entry");
                }
                Err(e) => return Err(StoreError::Serialization(format!("{OUTCOMES}: {e}"))),
            }
        }

        Ok(outcomes)
    }

    /// Rewrite the send log with only its newest `limit` entries. Callers
    /// hold `lock`.
    async fn compact_log(&self, limit: usize) -> Result<usize, StoreError> {
        let mut outcomes = self.read_log().await?;
        let excess = outcomes.len().saturating_sub(limit);
        outcomes.drain(..excess);

        let mut contents = Vec::new();
        for outcome in &outcomes {
            contents.extend(encode_line(outcome)?);
        }

        let temp = self.path.join(format!("{TEMP_PREFIX}{OUTCOMES}"));
        fs::write(&temp, contents).await?;
        fs::rename(&temp, self.path.join(OUTCOMES)).await?;

        internal!(level = DEBUG, dropped = excess, kept = outcomes.len(), "Compacted send log");
        Ok(outcomes.len())
    }

    async fn remove(&self, name: &str) -> Result<(), StoreError> {
        match fs::remove_file(self.path.join(name)).await {
            Err(e) if e.kind() != ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }
}

fn encode_line(outcome: &SendOutcome) -> Result<Vec<u8>, StoreError> {
    let mut line = serde_json::to_vec(outcome)
        .map_err(|e| StoreError::Serialization(format!("{OUTCOMES}: {e}")))?;
    line.push(b'\n');
    Ok(line)
}

#[async_trait]
impl ConfigProvider for FileStore {
    async fn transport_config(&self) -> Result<Option<TransportConfig>, StoreError> {
        self.load(CONFIG).await
    }

    async fn set_transport_config(&self, config: TransportConfig) -> Result<(), StoreError> {
        let _guard = self.lock.lock().await;
        self.save(CONFIG, &config).await
    }

    async fn clear_transport_config(&self) -> Result<(), StoreError> {
        let _guard = self.lock.lock().await;
        self.remove(CONFIG).await
    }
}

#[async_trait]
impl RecipientProvider for FileStore {
    async fn recipients(&self) -> Result<RecipientList, StoreError> {
        Ok(self.load(RECIPIENTS).await?.unwrap_or_default())
    }

    async fn set_recipients(&self, recipients: RecipientList) -> Result<(), StoreError> {
        let _guard = self.lock.lock().await;
        self.save(RECIPIENTS, &recipients).await
    }
}

#[async_trait]
impl OutcomeSink for FileStore {
    async fn append(&self, outcome: SendOutcome) -> Result<(), StoreError> {
        let line = encode_line(&outcome)?;
        let mut log = self.lock.lock().await;

        let mut file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.path.join(OUTCOMES))
            .await?;
        file.write_all(&line).await?;
        file.flush().await?;

        let Some(limit) = self.outcome_limit else {
            return Ok(());
        };

        let lines = match log.lines {
            Some(lines) => lines + 1,
            None => self.read_log().await?.len(),
        };

        log.lines = Some(if lines > limit.saturating_mul(2) {
            self.compact_log(limit).await?
        } else {
            lines
        });

        Ok(())
    }

    async fn outcomes(&self) -> Result<Vec<SendOutcome>, StoreError> {
        let _guard = self.lock.lock().await;

        let mut outcomes = self.read_log().await?;
        outcomes.reverse();
        if let Some(limit) = self.outcome_limit {
            outcomes.truncate(limit);
        }

        Ok(outcomes)
    }

    async fn clear_outcomes(&self) -> Result<(), StoreError> {
        let mut log = self.lock.lock().await;
        self.remove(OUTCOMES).await?;
        log.lines = Some(0);
        Ok(())
    }
}

#[async_trait]
impl DraftStore for FileStore {
    async fn draft(&self) -> Result<Option<MessageDraft>, StoreError> {
        self.load(DRAFT).await
    }

    async fn set_draft(&self, draft: MessageDraft) -> Result<(), StoreError> {
        let _guard = self.lock.lock().await;
        self.save(DRAFT, &draft).await
    }

    async fn clear_draft(&self) -> Result<(), StoreError> {
        let _guard = self.lock.lock().await;
        self.remove(DRAFT).await
    }
}
