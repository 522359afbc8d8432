//! A remote store persisted as a JSON document.

use crate::error::StoreResult;
use crate::store::{MemoryStore, RemoteStore, StoreDocument};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;
use wisync_model::{Project, RecordId, RemoteRecord, Revision};

/// A store backed by a JSON file.
///
/// The whole document is loaded on open and rewritten on every save. A save
/// only becomes visible once the file has been written. Used for offline
/// exports and by the command-line tool.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    inner: MemoryStore,
}

impl JsonFileStore {
    /// Opens the store at `path`.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref().to_path_buf();
        let bytes = fs::read(&path)?;
        let document: StoreDocument = serde_json::from_slice(&bytes)?;
        debug!(
            path = %path.display(),
            records = document.records.len(),
            projects = document.projects.len(),
            "opened store"
        );
        Ok(Self {
            path,
            inner: MemoryStore::from_document(document),
        })
    }

    /// Creates a new store at `path`, overwriting any existing file.
    pub fn create(path: impl AsRef<Path>, document: StoreDocument) -> StoreResult<Self> {
        let store = Self {
            path: path.as_ref().to_path_buf(),
            inner: MemoryStore::from_document(document),
        };
        store.flush()?;
        Ok(store)
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Ids of every record, ascending.
    pub fn ids(&self) -> Vec<RecordId> {
        self.inner.ids()
    }

    fn flush(&self) -> StoreResult<()> {
        self.write_document(&self.inner.to_document())
    }

    fn write_document(&self, document: &StoreDocument) -> StoreResult<()> {
        let json = serde_json::to_vec_pretty(document)?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl RemoteStore for JsonFileStore {
    fn get_record(&self, id: RecordId, revision: Option<Revision>) -> StoreResult<RemoteRecord> {
        self.inner.get_record(id, revision)
    }

    fn validate(&self, record: &RemoteRecord) -> Vec<String> {
        self.inner.validate(record)
    }

    fn save(&self, record: &mut RemoteRecord) -> StoreResult<()> {
        self.inner.save_and_persist(record, |document| self.write_document(document))
    }

    fn get_project(&self, name: &str) -> StoreResult<Project> {
        self.inner.get_project(name)
    }
}
