//! Error types for the sync adapter.

use thiserror::Error;
use wisync_model::{RecordId, Revision};

/// Result type for remote store calls.
pub type StoreResult<T> = Result<T, StoreError>;

/// Result type for adapter operations.
pub type AdapterResult<T> = Result<T, AdapterError>;

/// Errors reported by a remote store.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The record, or the requested revision of it, does not exist.
    #[error("work item {id} not found at revision {}", revision_label(.revision))]
    NotFound {
        /// Requested id.
        id: RecordId,
        /// Requested revision, `None` for the latest.
        revision: Option<Revision>,
    },

    /// The project does not exist.
    #[error("project not found: {0}")]
    ProjectNotFound(String),

    /// A field value could not be formatted for the store.
    #[error("format error: {0}")]
    Format(String),

    /// The store could not be reached or timed out.
    #[error("transient store error: {0}")]
    Transient(String),

    /// The store refused the write.
    #[error("save rejected: {0}")]
    Rejected(String),

    /// I/O error in a file-backed store.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed store document.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

fn revision_label(revision: &Option<Revision>) -> String {
    revision.map_or_else(|| "latest".to_string(), |r| r.to_string())
}

impl StoreError {
    /// Returns true for format-class failures, which a commit ignores.
    pub fn is_format(&self) -> bool {
        matches!(self, StoreError::Format(_))
    }
}

/// Errors surfaced by [`SyncAdapter`](crate::SyncAdapter) operations.
#[derive(Error, Debug)]
pub enum AdapterError {
    /// A requested revision does not exist.
    #[error("work item {id} has no revision {revision}")]
    NotFound {
        /// Work item id.
        id: RecordId,
        /// Requested revision.
        revision: Revision,
    },

    /// Reading the record failed on every attempt.
    #[error("reading work item {id} failed after {attempts} attempts: {source}")]
    TransientRead {
        /// Work item id.
        id: RecordId,
        /// Attempts made.
        attempts: u32,
        /// Last store error.
        #[source]
        source: StoreError,
    },

    /// Saving the record failed on every attempt.
    #[error("saving work item {id} failed after {attempts} attempts: {source}")]
    Commit {
        /// Work item id.
        id: RecordId,
        /// Attempts made.
        attempts: u32,
        /// Last store error.
        #[source]
        source: StoreError,
    },

    /// A record was committed against a snapshot of another record.
    #[error("snapshot of work item {snapshot} cannot commit work item {record}")]
    IdentityMismatch {
        /// Id of the record passed in.
        record: RecordId,
        /// Id the snapshot mirrors.
        snapshot: RecordId,
    },

    /// Any other store error.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// The background worker running the operation failed.
    #[error("adapter worker failed: {0}")]
    Worker(String),
}
