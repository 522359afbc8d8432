//! The sync adapter.

use crate::config::AdapterConfig;
use crate::error::{AdapterError, AdapterResult, StoreError};
use crate::pause::{Pause, ThreadPause};
use crate::progress::ProgressTracker;
use crate::store::RemoteStore;
use parking_lot::RwLock;
use std::time::{Duration, Instant};
use tracing::{debug, error, trace, warn};
use wisync_model::{
    FieldDescriptor, LocalSnapshot, Project, ProjectData, RecordId, RemoteRecord, Revision,
};

/// How a successful commit ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitOutcome {
    /// The store accepted the save.
    Saved,
    /// The store raised a format-class error, which was logged and ignored.
    SwallowedFormatError,
}

/// Counters across the adapter's lifetime.
#[derive(Debug, Clone, Default)]
pub struct AdapterStats {
    /// Snapshots built by `wrap`, `wrap_at_revision` and `bulk_wrap`.
    pub wrapped: u64,
    /// Successful refreshes.
    pub refreshes: u64,
    /// Successful commits, including swallowed format errors.
    pub commits: u64,
    /// Format errors swallowed by commit.
    pub swallowed_format_errors: u64,
    /// Retries taken on reads.
    pub read_retries: u64,
    /// Retries taken on writes.
    pub write_retries: u64,
    /// Duration of the last commit.
    pub last_commit_duration: Option<Duration>,
}

/// Moves work item data between a [`RemoteStore`] and [`LocalSnapshot`]s.
///
/// Every operation runs to completion on the caller's thread, including
/// backoff waits. Calls against the same record must not overlap.
pub struct SyncAdapter<S: RemoteStore, P: Pause = ThreadPause> {
    config: AdapterConfig,
    store: S,
    pause: P,
    stats: RwLock<AdapterStats>,
}

impl<S: RemoteStore> SyncAdapter<S, ThreadPause> {
    /// Creates an adapter that blocks the calling thread while backing off.
    pub fn new(config: AdapterConfig, store: S) -> Self {
        Self::with_pause(config, store, ThreadPause)
    }
}

impl<S: RemoteStore, P: Pause> SyncAdapter<S, P> {
    /// Creates an adapter with a custom pause.
    pub fn with_pause(config: AdapterConfig, store: S, pause: P) -> Self {
        Self {
            config,
            store,
            pause,
            stats: RwLock::new(AdapterStats::default()),
        }
    }

    /// The adapter configuration.
    pub fn config(&self) -> &AdapterConfig {
        &self.config
    }

    /// The underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// The pause used between attempts.
    pub fn pause(&self) -> &P {
        &self.pause
    }

    /// Gets the current stats.
    pub fn stats(&self) -> AdapterStats {
        self.stats.read().clone()
    }

    /// Builds a snapshot of `remote` at its current revision.
    pub fn wrap(&self, remote: &RemoteRecord) -> LocalSnapshot {
        trace!(id = %remote.id, revision = %remote.revision, "wrapping work item");
        self.stats.write().wrapped += 1;
        LocalSnapshot::from_record(remote)
    }

    /// Fetches `remote` at a historical revision and wraps it.
    ///
    /// The in-memory record only knows its current revision, so this always
    /// goes to the store.
    pub fn wrap_at_revision(
        &self,
        remote: &RemoteRecord,
        revision: Revision,
    ) -> AdapterResult<LocalSnapshot> {
        debug!(id = %remote.id, %revision, "loading work item revision");
        let historical = self
            .store
            .get_record(remote.id, Some(revision))
            .map_err(|e| match e {
                StoreError::NotFound { id, .. } => AdapterError::NotFound { id, revision },
                other => AdapterError::Store(other),
            })?;
        Ok(self.wrap(&historical))
    }

    /// Replaces the snapshot's fields with the record's current ones.
    ///
    /// A failed read is retried per the read retry policy. The snapshot is
    /// left untouched when every attempt fails.
    pub fn refresh(&self, snapshot: &mut LocalSnapshot) -> AdapterResult<()> {
        let current = self.read_current(snapshot.id())?;
        snapshot.replace_from(&current);
        self.stats.write().refreshes += 1;
        trace!(id = %snapshot.id(), revision = %snapshot.revision(), "refreshed work item");
        Ok(())
    }

    /// Saves local edits on `remote`, then refreshes `snapshot` from the store.
    ///
    /// Invalid fields are logged but do not stop the save. A format-class
    /// failure on the first attempt is logged and ignored after a pause;
    /// other failures are retried per the write retry policy.
    pub fn commit(
        &self,
        remote: &mut RemoteRecord,
        snapshot: &mut LocalSnapshot,
    ) -> AdapterResult<CommitOutcome> {
        let start = Instant::now();
        debug!(id = %remote.id, "committing work item");

        if remote.id != snapshot.id() {
            return Err(AdapterError::IdentityMismatch {
                record: remote.id,
                snapshot: snapshot.id(),
            });
        }
        debug!(
            id = %remote.id,
            changed_by = remote.changed_by.as_deref().unwrap_or("unknown"),
            "commit context"
        );

        self.log_invalid_fields(remote);

        let outcome = self.save_with_retry(remote)?;
        self.refresh(snapshot)?;

        let elapsed = start.elapsed();
        {
            let mut stats = self.stats.write();
            stats.commits += 1;
            stats.last_commit_duration = Some(elapsed);
        }
        debug!(
            id = %remote.id,
            revision = %snapshot.revision(),
            elapsed_ms = elapsed.as_millis() as u64,
            "commit finished"
        );
        Ok(outcome)
    }

    /// Describes every field of `remote`.
    pub fn describe_fields(&self, remote: &RemoteRecord) -> Vec<FieldDescriptor> {
        FieldDescriptor::describe(remote)
    }

    /// Wraps every record, preserving order.
    ///
    /// Logs a progress line for the first record and then whenever the
    /// progress interval has passed.
    pub fn bulk_wrap<'a, I>(&self, remotes: I) -> Vec<LocalSnapshot>
    where
        I: IntoIterator<Item = &'a RemoteRecord>,
        I::IntoIter: ExactSizeIterator,
    {
        let remotes = remotes.into_iter();
        let total = remotes.len();
        debug!(total, "loading work items");

        let mut tracker = ProgressTracker::new(total, self.config.progress_interval);
        let mut snapshots = Vec::with_capacity(total);
        for remote in remotes {
            if let Some(progress) = tracker.advance() {
                debug!("{}", progress);
            }
            snapshots.push(self.wrap(remote));
        }

        debug!(total, "work items loaded");
        snapshots
    }

    /// Wraps a team project.
    pub fn wrap_project(&self, project: &Project) -> ProjectData {
        ProjectData::from(project)
    }

    /// Resolves project data back to the store's project.
    pub fn project_of(&self, data: &ProjectData) -> AdapterResult<Project> {
        let project = self.store.get_project(&data.name)?;
        if project.id.to_string() != data.id {
            return Err(AdapterError::Store(StoreError::ProjectNotFound(format!(
                "{} (id {})",
                data.name, data.id
            ))));
        }
        Ok(project)
    }

    fn read_current(&self, id: RecordId) -> AdapterResult<RemoteRecord> {
        let policy = self.config.read_retry;
        let mut attempts = 0;
        loop {
            attempts += 1;
            match self.store.get_record(id, None) {
                Ok(record) => return Ok(record),
                Err(e) => match policy.next_delay(attempts) {
                    Some(delay) => {
                        error!(
                            %id,
                            attempt = attempts,
                            error = %e,
                            "reading work item failed, retrying in {:?}",
                            delay
                        );
                        self.stats.write().read_retries += 1;
                        self.pause.pause(delay);
                    }
                    None => {
                        return Err(AdapterError::TransientRead {
                            id,
                            attempts,
                            source: e,
                        })
                    }
                },
            }
        }
    }

    fn save_with_retry(&self, remote: &mut RemoteRecord) -> AdapterResult<CommitOutcome> {
        let policy = self.config.write_retry;
        let mut attempts = 0;
        loop {
            attempts += 1;
            trace!(id = %remote.id, attempt = attempts, "saving work item");
            let err = match self.store.save(remote) {
                Ok(()) => return Ok(CommitOutcome::Saved),
                Err(e) => e,
            };

            // Format errors are only ignored on the first attempt.
            if attempts == 1 && err.is_format() {
                error!(id = %remote.id, error = %err, "ignoring format error on save");
                self.pause.pause(self.config.format_error_pause);
                self.stats.write().swallowed_format_errors += 1;
                return Ok(CommitOutcome::SwallowedFormatError);
            }

            match policy.next_delay(attempts) {
                Some(delay) => {
                    error!(
                        id = %remote.id,
                        attempt = attempts,
                        error = %err,
                        "saving work item failed, retrying in {:?}",
                        delay
                    );
                    self.stats.write().write_retries += 1;
                    self.pause.pause(delay);
                }
                None => {
                    return Err(AdapterError::Commit {
                        id: remote.id,
                        attempts,
                        source: err,
                    })
                }
            }
        }
    }

    fn log_invalid_fields(&self, remote: &RemoteRecord) {
        let invalid = self.store.validate(remote);
        if invalid.is_empty() {
            return;
        }
        warn!(
            id = %remote.id,
            count = invalid.len(),
            "work item has invalid fields; the save may still succeed, \
             enable debug logging for details"
        );
        for name in &invalid {
            match remote.field(name) {
                Some(field) => match FieldDescriptor::new(remote, field).to_json() {
                    Ok(json) => debug!(id = %remote.id, "invalid field:\n{}", json),
                    Err(e) => debug!(id = %remote.id, field = %name, error = %e, "invalid field"),
                },
                None => {
                    debug!(id = %remote.id, field = %name, "invalid field not present on record")
                }
            }
        }
    }
}
