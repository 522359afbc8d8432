//! Async front end that runs adapter operations on the blocking pool.

use crate::adapter::{AdapterStats, CommitOutcome, SyncAdapter};
use crate::error::{AdapterError, AdapterResult};
use crate::pause::{Pause, ThreadPause};
use crate::store::RemoteStore;
use parking_lot::Mutex;
use std::sync::Arc;
use wisync_model::{FieldDescriptor, LocalSnapshot, RemoteRecord, Revision};

/// Result of an async commit: the saved record, its refreshed snapshot and
/// how the commit ended.
#[derive(Debug, Clone)]
pub struct Committed {
    /// The record after the save.
    pub record: RemoteRecord,
    /// The refreshed snapshot.
    pub snapshot: LocalSnapshot,
    /// Commit outcome.
    pub outcome: CommitOutcome,
}

/// Runs a [`SyncAdapter`] on tokio's blocking thread pool.
///
/// Backoff waits then block a pool thread instead of the async caller.
/// Operations are serialized: at most one runs at a time per worker. The
/// operation lock is only taken on the pool, never on the async thread.
pub struct AdapterWorker<S: RemoteStore, P: Pause = ThreadPause> {
    adapter: Arc<SyncAdapter<S, P>>,
    op_lock: Arc<Mutex<()>>,
}

impl<S: RemoteStore, P: Pause> Clone for AdapterWorker<S, P> {
    fn clone(&self) -> Self {
        Self {
            adapter: Arc::clone(&self.adapter),
            op_lock: Arc::clone(&self.op_lock),
        }
    }
}

impl<S: RemoteStore + 'static, P: Pause + 'static> AdapterWorker<S, P> {
    /// Creates a worker owning `adapter`.
    pub fn new(adapter: SyncAdapter<S, P>) -> Self {
        Self {
            adapter: Arc::new(adapter),
            op_lock: Arc::new(Mutex::new(())),
        }
    }

    /// The wrapped adapter.
    pub fn adapter(&self) -> &SyncAdapter<S, P> {
        &self.adapter
    }

    /// Gets the adapter's current stats. Does not wait for a running
    /// operation.
    pub fn stats(&self) -> AdapterStats {
        self.adapter.stats()
    }

    async fn run<T, F>(&self, op: F) -> AdapterResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&SyncAdapter<S, P>) -> AdapterResult<T> + Send + 'static,
    {
        let adapter = Arc::clone(&self.adapter);
        let op_lock = Arc::clone(&self.op_lock);
        tokio::task::spawn_blocking(move || {
            let _guard = op_lock.lock();
            op(&adapter)
        })
        .await
        .map_err(|e| AdapterError::Worker(e.to_string()))?
    }

    /// See [`SyncAdapter::wrap`].
    pub async fn wrap(&self, remote: RemoteRecord) -> AdapterResult<LocalSnapshot> {
        self.run(move |a| Ok(a.wrap(&remote))).await
    }

    /// See [`SyncAdapter::wrap_at_revision`].
    pub async fn wrap_at_revision(
        &self,
        remote: RemoteRecord,
        revision: Revision,
    ) -> AdapterResult<LocalSnapshot> {
        self.run(move |a| a.wrap_at_revision(&remote, revision)).await
    }

    /// See [`SyncAdapter::refresh`]. Returns the refreshed snapshot.
    pub async fn refresh(&self, mut snapshot: LocalSnapshot) -> AdapterResult<LocalSnapshot> {
        self.run(move |a| {
            a.refresh(&mut snapshot)?;
            Ok(snapshot)
        })
        .await
    }

    /// See [`SyncAdapter::commit`].
    pub async fn commit(
        &self,
        mut record: RemoteRecord,
        mut snapshot: LocalSnapshot,
    ) -> AdapterResult<Committed> {
        self.run(move |a| {
            let outcome = a.commit(&mut record, &mut snapshot)?;
            Ok(Committed {
                record,
                snapshot,
                outcome,
            })
        })
        .await
    }

    /// See [`SyncAdapter::describe_fields`].
    pub async fn describe_fields(
        &self,
        remote: RemoteRecord,
    ) -> AdapterResult<Vec<FieldDescriptor>> {
        self.run(move |a| Ok(a.describe_fields(&remote))).await
    }

    /// See [`SyncAdapter::bulk_wrap`].
    pub async fn bulk_wrap(&self, remotes: Vec<RemoteRecord>) -> AdapterResult<Vec<LocalSnapshot>> {
        self.run(move |a| Ok(a.bulk_wrap(&remotes))).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AdapterConfig;
    use crate::error::StoreError;
    use crate::pause::RecordingPause;
    use crate::store::MemoryStore;
    use std::sync::mpsc;
    use std::time::Duration;
    use wisync_model::{FieldValue, RecordId};

    /// Signals when a backoff starts, then waits until released.
    struct HeldPause {
        entered: Mutex<mpsc::Sender<()>>,
        release: Mutex<mpsc::Receiver<()>>,
    }

    impl Pause for HeldPause {
        fn pause(&self, _duration: Duration) {
            let _ = self.entered.lock().send(());
            let _ = self.release.lock().recv();
        }
    }

    fn worker() -> AdapterWorker<MemoryStore, RecordingPause> {
        let store = MemoryStore::new();
        store.insert(RemoteRecord::new(42, 1, "Bug").with_value("Title", "Foo"));
        AdapterWorker::new(SyncAdapter::with_pause(
            AdapterConfig::default(),
            store,
            RecordingPause::new(),
        ))
    }

    #[tokio::test]
    async fn commit_through_worker() {
        let worker = worker();
        let mut record = RemoteRecord::new(42, 1, "Bug").with_value("Title", "Foo");
        let snapshot = worker.wrap(record.clone()).await.unwrap();
        record.set_value("Title", "Bar").unwrap();

        let committed = worker.commit(record, snapshot).await.unwrap();
        assert_eq!(committed.outcome, CommitOutcome::Saved);
        assert_eq!(committed.record.revision, Revision(2));
        assert_eq!(committed.snapshot.field("Title"), Some(&FieldValue::from("Bar")));
        assert_eq!(worker.stats().commits, 1);
    }

    #[tokio::test]
    async fn errors_propagate() {
        let worker = worker();
        let record = RemoteRecord::new(42, 1, "Bug");
        let err = worker.wrap_at_revision(record, Revision(5)).await.unwrap_err();
        assert!(matches!(err, AdapterError::NotFound { id: RecordId(42), .. }));
    }

    #[tokio::test]
    async fn refresh_after_transient_failure() {
        let worker = worker();
        worker
            .adapter()
            .store()
            .push_read_failure(StoreError::Transient("timeout".into()));

        let snapshot = worker.wrap(RemoteRecord::new(42, 0, "Bug")).await.unwrap();
        let refreshed = worker.refresh(snapshot).await.unwrap();
        assert_eq!(refreshed.revision(), Revision(1));
        assert_eq!(worker.stats().read_retries, 1);
    }

    #[tokio::test]
    async fn concurrent_callers_share_one_adapter() {
        let worker = worker();
        let records: Vec<_> = (1..=20u32).map(|id| RemoteRecord::new(id, 1, "Task")).collect();

        let a = worker.clone();
        let b = worker.clone();
        let (left, right) = tokio::join!(a.bulk_wrap(records.clone()), b.bulk_wrap(records));
        assert_eq!(left.unwrap().len(), 20);
        assert_eq!(right.unwrap().len(), 20);
        assert_eq!(worker.stats().wrapped, 40);
    }

    #[tokio::test]
    async fn stats_do_not_wait_for_backoff() {
        let (entered_tx, entered_rx) = mpsc::channel();
        let (release_tx, release_rx) = mpsc::channel();
        let store = MemoryStore::new();
        store.insert(RemoteRecord::new(42, 1, "Bug").with_value("Title", "Foo"));
        store.push_save_failure(StoreError::Transient("timeout".into()));
        let worker = AdapterWorker::new(SyncAdapter::with_pause(
            AdapterConfig::default(),
            store,
            HeldPause {
                entered: Mutex::new(entered_tx),
                release: Mutex::new(release_rx),
            },
        ));

        let mut record = RemoteRecord::new(42, 1, "Bug").with_value("Title", "Foo");
        let snapshot = worker.wrap(record.clone()).await.unwrap();
        record.set_value("Title", "Bar").unwrap();
        let commit = tokio::spawn({
            let worker = worker.clone();
            async move { worker.commit(record, snapshot).await }
        });

        // Wait until the commit is parked in its write backoff.
        tokio::task::spawn_blocking(move || entered_rx.recv())
            .await
            .unwrap()
            .unwrap();
        let stats = worker.stats();
        assert_eq!(stats.write_retries, 1);
        assert_eq!(stats.commits, 0);

        release_tx.send(()).unwrap();
        let committed = commit.await.unwrap().unwrap();
        assert_eq!(committed.outcome, CommitOutcome::Saved);
        assert_eq!(worker.stats().commits, 1);
    }
}
