//! Storage collaborator contract and the two shipped implementations.

use std::path::PathBuf;
use std::sync::Mutex;

use async_trait::async_trait;
use tracing::info;
use uuid::Uuid;

use papyrix_common::ProcessedRecord;

/// External storage collaborator. Accepts one merged record per document
/// and assigns the persistent document identity. The relational layer
/// (schema, full-text ranking) lives behind this trait and never sees
/// pipeline internals.
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn persist(&self, record: &ProcessedRecord) -> anyhow::Result<Uuid>;
}

/// Writes each record as pretty-printed JSON into a processed directory,
/// one `processed_<id>.json` file per document.
pub struct JsonArtifactStore {
    dir: PathBuf,
}

impl JsonArtifactStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn artifact_path(&self, id: Uuid) -> PathBuf {
        self.dir.join(format!("processed_{id}.json"))
    }
}

#[async_trait]
impl RecordStore for JsonArtifactStore {
    async fn persist(&self, record: &ProcessedRecord) -> anyhow::Result<Uuid> {
        let id = Uuid::new_v4();
        std::fs::create_dir_all(&self.dir)?;
        let path = self.artifact_path(id);
        let json = serde_json::to_vec_pretty(record)?;
        std::fs::write(&path, json)?;
        info!(document = %record.document, path = %path.display(), "record persisted");
        Ok(id)
    }
}

/// Test double: keeps every persisted record in memory.
#[derive(Default)]
pub struct InMemoryStore {
    records: Mutex<Vec<(Uuid, ProcessedRecord)>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<(Uuid, ProcessedRecord)> {
        self.records.lock().expect("store lock").clone()
    }

    pub fn len(&self) -> usize {
        self.records.lock().expect("store lock").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl RecordStore for InMemoryStore {
    async fn persist(&self, record: &ProcessedRecord) -> anyhow::Result<Uuid> {
        let id = Uuid::new_v4();
        self.records.lock().expect("store lock").push((id, record.clone()));
        Ok(id)
    }
}
