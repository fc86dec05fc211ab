//! Key-model persistence: one record per type, restored independently

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::sync::{mpsc, oneshot};

use crate::error::StoreError;
use super::playback::SessionSnapshot;
use super::types::{PlayMode, User};

/// Record types kept by the engine
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RecordType {
    UserIdentity,
    PlayMode,
    Volume,
    PlaybackSnapshot,
    LastSignInDate,
}

impl RecordType {
    pub fn name(self) -> &'static str {
        match self {
            RecordType::UserIdentity => "user",
            RecordType::PlayMode => "play_mode",
            RecordType::Volume => "volume",
            RecordType::PlaybackSnapshot => "playback_snapshot",
            RecordType::LastSignInDate => "last_sign_in_date",
        }
    }
}

/// Raw record storage. Last writer wins; no cross-record transactions.
pub trait Store: Send + Sync {
    fn get(&self, record: RecordType) -> Result<Option<Vec<u8>>, StoreError>;
    fn set(&self, record: RecordType, bytes: &[u8]) -> Result<(), StoreError>;
}

/// One JSON file per record under a data directory
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path(&self, record: RecordType) -> PathBuf {
        self.dir.join(format!("{}.json", record.name()))
    }
}

impl Store for FileStore {
    fn get(&self, record: RecordType) -> Result<Option<Vec<u8>>, StoreError> {
        let path = self.path(record);
        if !path.exists() {
            return Ok(None);
        }
        Ok(Some(std::fs::read(path)?))
    }

    fn set(&self, record: RecordType, bytes: &[u8]) -> Result<(), StoreError> {
        if !self.dir.exists() {
            std::fs::create_dir_all(&self.dir)?;
        }
        // write then rename so a crash never leaves a half-written record
        let path = self.path(record);
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, bytes)?;
        std::fs::rename(&tmp, &path)?;
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryStore {
    records: Mutex<HashMap<RecordType, Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Store for MemoryStore {
    fn get(&self, record: RecordType) -> Result<Option<Vec<u8>>, StoreError> {
        let records = self.records.lock().map_err(|e| StoreError::Decode(e.to_string()))?;
        Ok(records.get(&record).cloned())
    }

    fn set(&self, record: RecordType, bytes: &[u8]) -> Result<(), StoreError> {
        let mut records = self.records.lock().map_err(|e| StoreError::Encode(e.to_string()))?;
        records.insert(record, bytes.to_vec());
        Ok(())
    }
}

pub fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, StoreError> {
    serde_json::to_vec(value).map_err(|e| StoreError::Encode(e.to_string()))
}

pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, StoreError> {
    serde_json::from_slice(bytes).map_err(|e| StoreError::Decode(e.to_string()))
}

/// Typed read. Missing and unreadable records both come back as `None`;
/// the latter is logged.
pub fn load<T: DeserializeOwned>(store: &dyn Store, record: RecordType) -> Option<T> {
    let bytes = match store.get(record) {
        Ok(Some(bytes)) => bytes,
        Ok(None) => return None,
        Err(e) => {
            tracing::warn!(record = record.name(), error = %e, "Failed to read record, using default");
            return None;
        }
    };
    match decode(&bytes) {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!(record = record.name(), error = %e, "Malformed record, using default");
            None
        }
    }
}

pub fn save<T: Serialize>(store: &dyn Store, record: RecordType, value: &T) -> Result<(), StoreError> {
    store.set(record, &encode(value)?)
}

/// Everything read back at startup. Each field stands alone.
#[derive(Clone, Debug, Default)]
pub struct Restored {
    pub user: Option<User>,
    pub mode: Option<PlayMode>,
    pub volume: Option<u8>,
    pub snapshot: Option<SessionSnapshot>,
    pub last_sign_in: Option<String>,
}

pub fn restore_all(store: &dyn Store) -> Restored {
    let restored = Restored {
        user: load(store, RecordType::UserIdentity),
        mode: load(store, RecordType::PlayMode),
        volume: load(store, RecordType::Volume),
        snapshot: load(store, RecordType::PlaybackSnapshot),
        last_sign_in: load(store, RecordType::LastSignInDate),
    };
    tracing::info!(
        user = restored.user.is_some(),
        mode = restored.mode.is_some(),
        volume = restored.volume.is_some(),
        snapshot = restored.snapshot.is_some(),
        "Restored session records"
    );
    restored
}

enum WriteCommand {
    Write(RecordType, Vec<u8>),
    Flush(oneshot::Sender<()>),
}

/// Fire-and-forget writer. Records are encoded by the caller right after the
/// mutation, then written in order by a single background task.
#[derive(Clone)]
pub struct StoreWriter {
    tx: mpsc::UnboundedSender<WriteCommand>,
}

impl StoreWriter {
    pub fn spawn(store: Arc<dyn Store>) -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel();
        tokio::spawn(async move {
            while let Some(command) = rx.recv().await {
                match command {
                    WriteCommand::Write(record, bytes) => {
                        let store = store.clone();
                        let outcome = tokio::task::spawn_blocking(move || store.set(record, &bytes)).await;
                        match outcome {
                            Ok(Ok(())) => tracing::debug!(record = record.name(), "Record written"),
                            Ok(Err(e)) => tracing::error!(record = record.name(), error = %e, "Failed to write record"),
                            Err(e) => tracing::error!(record = record.name(), error = %e, "Record write task failed"),
                        }
                    }
                    WriteCommand::Flush(done) => {
                        let _ = done.send(());
                    }
                }
            }
        });
        Self { tx }
    }

    pub fn save<T: Serialize>(&self, record: RecordType, value: &T) {
        match encode(value) {
            Ok(bytes) => {
                if self.tx.send(WriteCommand::Write(record, bytes)).is_err() {
                    tracing::warn!(record = record.name(), "Store writer closed, record dropped");
                }
            }
            Err(e) => tracing::error!(record = record.name(), error = %e, "Failed to encode record"),
        }
    }

    /// Resolves once every write queued before it has landed
    pub async fn flush(&self) {
        let (done, wait) = oneshot::channel();
        if self.tx.send(WriteCommand::Flush(done)).is_ok() {
            let _ = wait.await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::types::Track;

    fn snapshot() -> SessionSnapshot {
        SessionSnapshot {
            queue: vec![Track {
                id: 1,
                title: "one".into(),
                artists: vec!["a".into(), "b".into()],
                album: "al".into(),
                duration_ms: 1234,
                locator: "s://1".into(),
            }],
            current_index: Some(0),
            updated_at: Some(chrono::Utc::now()),
            menu_key: "playlist_3".into(),
        }
    }

    #[test]
    fn file_store_round_trips_records() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().join("data"));

        assert!(store.get(RecordType::Volume).unwrap().is_none());
        let snap = snapshot();
        save(&store, RecordType::PlaybackSnapshot, &snap).unwrap();
        save(&store, RecordType::PlayMode, &PlayMode::Random).unwrap();

        let back: SessionSnapshot = load(&store, RecordType::PlaybackSnapshot).unwrap();
        assert_eq!(back, snap);
        assert_eq!(load::<PlayMode>(&store, RecordType::PlayMode), Some(PlayMode::Random));
    }

    #[test]
    fn malformed_volume_does_not_affect_other_records() {
        let store = MemoryStore::new();
        store.set(RecordType::Volume, b"{not json").unwrap();
        save(&store, RecordType::PlayMode, &PlayMode::SingleLoop).unwrap();
        save(&store, RecordType::UserIdentity, &User { id: 4, nickname: "n".into() }).unwrap();

        let restored = restore_all(&store);

        assert_eq!(restored.volume, None);
        assert_eq!(restored.mode, Some(PlayMode::SingleLoop));
        assert_eq!(restored.user.map(|u| u.id), Some(4));
        assert!(restored.snapshot.is_none());
    }

    #[tokio::test]
    async fn writer_applies_in_order_and_flushes() {
        let store = Arc::new(MemoryStore::new());
        let writer = StoreWriter::spawn(store.clone());

        for volume in [10u8, 20, 30] {
            writer.save(RecordType::Volume, &volume);
        }
        writer.flush().await;

        assert_eq!(load::<u8>(store.as_ref(), RecordType::Volume), Some(30));
    }
}
