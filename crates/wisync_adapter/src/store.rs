//! Remote store abstraction.

use crate::error::{StoreError, StoreResult};
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use wisync_model::{Project, RecordId, RemoteRecord, Revision};

/// A remote work item store.
///
/// This trait is the adapter's only view of the work item tracking service.
/// Implementations own the records and decide what a valid save is.
pub trait RemoteStore: Send + Sync {
    /// Fetches a record at `revision`, or at its latest revision when `None`.
    fn get_record(&self, id: RecordId, revision: Option<Revision>) -> StoreResult<RemoteRecord>;

    /// Returns the names of fields the store considers invalid.
    fn validate(&self, record: &RemoteRecord) -> Vec<String>;

    /// Saves local edits. On success `record` is updated in place to the new
    /// revision, with server defaults applied.
    fn save(&self, record: &mut RemoteRecord) -> StoreResult<()>;

    /// Looks up a team project by name.
    fn get_project(&self, name: &str) -> StoreResult<Project>;
}

impl<S: RemoteStore + ?Sized> RemoteStore for std::sync::Arc<S> {
    fn get_record(&self, id: RecordId, revision: Option<Revision>) -> StoreResult<RemoteRecord> {
        (**self).get_record(id, revision)
    }

    fn validate(&self, record: &RemoteRecord) -> Vec<String> {
        (**self).validate(record)
    }

    fn save(&self, record: &mut RemoteRecord) -> StoreResult<()> {
        (**self).save(record)
    }

    fn get_project(&self, name: &str) -> StoreResult<Project> {
        (**self).get_project(name)
    }
}

/// Full history of one work item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordHistory {
    /// Work item id.
    pub id: RecordId,
    /// Every saved revision, oldest first.
    pub revisions: Vec<RemoteRecord>,
}

/// Serializable contents of a store.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoreDocument {
    /// Team projects.
    #[serde(default)]
    pub projects: Vec<Project>,
    /// Work item histories.
    #[serde(default)]
    pub records: Vec<RecordHistory>,
}

/// An in-memory store.
///
/// Failures can be scripted with [`push_read_failure`](Self::push_read_failure)
/// and [`push_save_failure`](Self::push_save_failure); each scripted error is
/// returned by exactly one later call.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: RwLock<BTreeMap<RecordId, Vec<RemoteRecord>>>,
    projects: RwLock<Vec<Project>>,
    read_failures: Mutex<VecDeque<StoreError>>,
    save_failures: Mutex<VecDeque<StoreError>>,
    reads: AtomicUsize,
    saves: AtomicUsize,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store holding the contents of `document`.
    pub fn from_document(document: StoreDocument) -> Self {
        let store = Self::new();
        {
            let mut records = store.records.write();
            for history in document.records {
                records.insert(history.id, history.revisions);
            }
        }
        *store.projects.write() = document.projects;
        store
    }

    /// Exports the store contents.
    pub fn to_document(&self) -> StoreDocument {
        let records = self.records.read();
        document_of(&records, &self.projects.read())
    }

    /// Adds a revision to a record's history as-is.
    pub fn insert(&self, record: RemoteRecord) {
        self.records.write().entry(record.id).or_default().push(record);
    }

    /// Adds a team project.
    pub fn insert_project(&self, project: Project) {
        self.projects.write().push(project);
    }

    /// Ids of every record, ascending.
    pub fn ids(&self) -> Vec<RecordId> {
        self.records.read().keys().copied().collect()
    }

    /// Makes a later `get_record` call fail with `error`.
    pub fn push_read_failure(&self, error: StoreError) {
        self.read_failures.lock().push_back(error);
    }

    /// Makes a later `save` call fail with `error`.
    pub fn push_save_failure(&self, error: StoreError) {
        self.save_failures.lock().push_back(error);
    }

    /// Number of `get_record` calls so far.
    pub fn read_calls(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    /// Number of `save` calls so far.
    pub fn save_calls(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    /// Latest saved revision of a record.
    pub fn latest(&self, id: RecordId) -> Option<RemoteRecord> {
        self.records.read().get(&id).and_then(|h| h.last().cloned())
    }

    /// Saves `record`, handing the resulting document to `persist` before the
    /// new revision becomes visible.
    ///
    /// When `persist` fails, neither the store nor `record` changes, so the
    /// caller can retry the same save.
    pub(crate) fn save_and_persist<F>(
        &self,
        record: &mut RemoteRecord,
        persist: F,
    ) -> StoreResult<()>
    where
        F: FnOnce(&StoreDocument) -> StoreResult<()>,
    {
        self.begin_save()?;
        let mut records = self.records.write();

        let mut staged_records = records.clone();
        let mut staged = record.clone();
        apply_save(staged_records.entry(staged.id).or_default(), &mut staged)?;
        persist(&document_of(&staged_records, &self.projects.read()))?;

        *records = staged_records;
        *record = staged;
        Ok(())
    }

    fn begin_save(&self) -> StoreResult<()> {
        self.saves.fetch_add(1, Ordering::SeqCst);
        match self.save_failures.lock().pop_front() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

// Lock order is records, then projects.
fn document_of(
    records: &BTreeMap<RecordId, Vec<RemoteRecord>>,
    projects: &[Project],
) -> StoreDocument {
    StoreDocument {
        projects: projects.to_vec(),
        records: records
            .iter()
            .map(|(id, revisions)| RecordHistory {
                id: *id,
                revisions: revisions.clone(),
            })
            .collect(),
    }
}

impl RemoteStore for MemoryStore {
    fn get_record(&self, id: RecordId, revision: Option<Revision>) -> StoreResult<RemoteRecord> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = self.read_failures.lock().pop_front() {
            return Err(err);
        }

        let records = self.records.read();
        let history = records.get(&id).ok_or(StoreError::NotFound { id, revision })?;
        let found = match revision {
            None => history.last(),
            Some(rev) => history.iter().find(|r| r.revision == rev),
        };
        found.cloned().ok_or(StoreError::NotFound { id, revision })
    }

    fn validate(&self, record: &RemoteRecord) -> Vec<String> {
        record.invalid_fields().map(|f| f.name.clone()).collect()
    }

    fn save(&self, record: &mut RemoteRecord) -> StoreResult<()> {
        self.begin_save()?;
        let mut records = self.records.write();
        let history = records.entry(record.id).or_default();
        apply_save(history, record)
    }

    fn get_project(&self, name: &str) -> StoreResult<Project> {
        self.projects
            .read()
            .iter()
            .find(|p| p.name.eq_ignore_ascii_case(name))
            .cloned()
            .ok_or_else(|| StoreError::ProjectNotFound(name.to_string()))
    }
}

/// Applies a save to a record history the way a work item server does.
///
/// - a value outside an enforced allowed-values list is a format error
/// - saving from a revision other than the latest is rejected
/// - empty fields take their server default
/// - the record moves to the next revision and its edits become the
///   original values
///
/// On error neither `history` nor `record` has been touched.
fn apply_save(history: &mut Vec<RemoteRecord>, record: &mut RemoteRecord) -> StoreResult<()> {
    if let Some(field) = record.fields.values().find(|f| !f.value_is_allowed()) {
        return Err(StoreError::Format(format!(
            "value '{}' is not allowed for field {}",
            field.value, field.reference_name
        )));
    }

    let next = match history.last() {
        Some(latest) if latest.revision != record.revision => {
            return Err(StoreError::Rejected(format!(
                "work item {} was saved from revision {} but the latest is {}",
                record.id, record.revision, latest.revision
            )));
        }
        Some(latest) => latest.revision.next().ok_or_else(|| {
            StoreError::Rejected(format!(
                "work item {} has reached the last revision number",
                record.id
            ))
        })?,
        None => Revision(1),
    };

    for field in record.fields.values_mut() {
        let changed = field.is_dirty || (field.value.is_empty() && field.server_default.is_some());
        field.value = field.value_with_server_default();
        field.original_value = field.value.clone();
        field.is_changed_in_revision = changed;
        field.is_dirty = false;
        field.is_changed_by_user = false;
    }
    record.revision = next;
    history.push(record.clone());
    Ok(())
}
