//! Integration tests for the sync adapter against in-memory and file stores.

use parking_lot::Mutex;
use proptest::prelude::*;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use wisync_adapter::{
    AdapterConfig, AdapterError, CommitOutcome, JsonFileStore, MemoryStore, Pause, RecordHistory,
    RecordingPause, RemoteStore, StoreDocument, StoreError, StoreResult, SyncAdapter,
};
use wisync_model::{FieldValue, Project, RecordId, RemoteField, RemoteRecord, Revision};

/// A store shared with the test so it can change records behind the
/// adapter's back.
struct SharedStore {
    inner: Arc<MemoryStore>,
}

impl RemoteStore for SharedStore {
    fn get_record(&self, id: RecordId, revision: Option<Revision>) -> StoreResult<RemoteRecord> {
        self.inner.get_record(id, revision)
    }

    fn validate(&self, record: &RemoteRecord) -> Vec<String> {
        self.inner.validate(record)
    }

    fn save(&self, record: &mut RemoteRecord) -> StoreResult<()> {
        self.inner.save(record)
    }

    fn get_project(&self, name: &str) -> StoreResult<Project> {
        self.inner.get_project(name)
    }
}

/// Collects formatted log output in memory.
#[derive(Clone, Default)]
struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl io::Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Runs `f` with a debug-level subscriber and returns what it logged.
fn capture_logs<T>(f: impl FnOnce() -> T) -> (T, String) {
    let buffer = LogBuffer::default();
    let writer = buffer.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter("debug")
        .with_ansi(false)
        .with_writer(move || writer.clone())
        .finish();
    let result = tracing::subscriber::with_default(subscriber, f);
    let logs = String::from_utf8_lossy(&buffer.0.lock()).into_owned();
    (result, logs)
}

/// Recreates a directory instead of waiting, so a retried save can write.
struct RecreateDir(PathBuf);

impl Pause for RecreateDir {
    fn pause(&self, _duration: Duration) {
        std::fs::create_dir_all(&self.0).unwrap();
    }
}

fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("debug")
        .with_test_writer()
        .try_init();
}

fn shared_adapter() -> (Arc<MemoryStore>, SyncAdapter<SharedStore, RecordingPause>) {
    let store = Arc::new(MemoryStore::new());
    store.insert(
        RemoteRecord::new(42, 1, "Bug")
            .with_field(RemoteField::new("Title", "Foo").with_reference_name("System.Title"))
            .with_field(
                RemoteField::new("Priority", FieldValue::Null)
                    .with_reference_name("Microsoft.VSTS.Common.Priority")
                    .with_server_default(2i64),
            )
            .with_field(
                RemoteField::new("State", "New")
                    .with_reference_name("System.State")
                    .with_allowed_values(["New", "Active", "Closed"]),
            ),
    );
    let adapter = SyncAdapter::with_pause(
        AdapterConfig::default(),
        SharedStore {
            inner: Arc::clone(&store),
        },
        RecordingPause::new(),
    );
    (store, adapter)
}

#[test]
fn wrap_example_record() {
    let store = MemoryStore::new();
    for rev in 1..=3u32 {
        store.insert(RemoteRecord::new(42, rev, "Bug").with_value("Title", "Foo"));
    }
    let adapter = SyncAdapter::with_pause(AdapterConfig::default(), store, RecordingPause::new());

    let record = adapter.store().get_record(RecordId(42), None).unwrap();
    let snapshot = adapter.wrap(&record);
    assert_eq!(snapshot.id(), RecordId(42));
    assert_eq!(snapshot.revision(), Revision(3));
    assert_eq!(snapshot.fields().len(), 1);
    assert_eq!(snapshot.field("Title"), Some(&FieldValue::from("Foo")));

    let missing = adapter.wrap_at_revision(&record, Revision(99));
    assert!(matches!(missing, Err(AdapterError::NotFound { .. })));
}

#[test]
fn refresh_is_idempotent() {
    let (_store, adapter) = shared_adapter();
    let record = adapter.store().get_record(RecordId(42), None).unwrap();
    let mut snapshot = adapter.wrap(&record);

    adapter.refresh(&mut snapshot).unwrap();
    let first = snapshot.clone();
    adapter.refresh(&mut snapshot).unwrap();
    assert_eq!(snapshot, first);
}

#[test]
fn refresh_picks_up_remote_changes() {
    let (store, adapter) = shared_adapter();
    let record = adapter.store().get_record(RecordId(42), None).unwrap();
    let mut snapshot = adapter.wrap(&record);

    // Another client saves a new revision.
    let mut other = store.get_record(RecordId(42), None).unwrap();
    other.set_value("State", "Active").unwrap();
    store.save(&mut other).unwrap();

    adapter.refresh(&mut snapshot).unwrap();
    assert_eq!(snapshot.revision(), Revision(2));
    assert_eq!(snapshot.field("State"), Some(&FieldValue::from("Active")));
}

#[test]
fn commit_applies_server_defaults() {
    init_logging();
    let (store, adapter) = shared_adapter();
    let mut record = adapter.store().get_record(RecordId(42), None).unwrap();
    let mut snapshot = adapter.wrap(&record);
    record.set_value("Title", "Bar").unwrap();

    let outcome = adapter.commit(&mut record, &mut snapshot).unwrap();
    assert_eq!(outcome, CommitOutcome::Saved);

    let latest = store.latest(RecordId(42)).unwrap();
    assert_eq!(snapshot, adapter.wrap(&latest));
    assert_eq!(snapshot.field("Priority"), Some(&FieldValue::Integer(2)));
    assert_eq!(snapshot.field("Title"), Some(&FieldValue::from("Bar")));

    // A further refresh changes nothing.
    let before = snapshot.clone();
    adapter.refresh(&mut snapshot).unwrap();
    assert_eq!(snapshot, before);
}

#[test]
fn disallowed_value_is_swallowed_as_format_error() {
    init_logging();
    let (store, adapter) = shared_adapter();
    let mut record = adapter.store().get_record(RecordId(42), None).unwrap();
    let mut snapshot = adapter.wrap(&record);
    record.set_value("State", "Bogus").unwrap();

    let outcome = adapter.commit(&mut record, &mut snapshot).unwrap();
    assert_eq!(outcome, CommitOutcome::SwallowedFormatError);
    assert_eq!(adapter.pause().pauses(), vec![Duration::from_secs(10)]);

    // Nothing was written; the snapshot mirrors the store.
    assert_eq!(store.save_calls(), 1);
    assert_eq!(snapshot.revision(), Revision(1));
    assert_eq!(snapshot.field("State"), Some(&FieldValue::from("New")));
}

#[test]
fn stale_save_surfaces_commit_error() {
    let (store, adapter) = shared_adapter();
    let mut record = adapter.store().get_record(RecordId(42), None).unwrap();
    let mut snapshot = adapter.wrap(&record);

    let mut other = store.get_record(RecordId(42), None).unwrap();
    other.set_value("Title", "Theirs").unwrap();
    store.save(&mut other).unwrap();

    record.set_value("Title", "Mine").unwrap();
    let err = adapter.commit(&mut record, &mut snapshot).unwrap_err();
    assert!(matches!(
        err,
        AdapterError::Commit {
            attempts: 2,
            source: StoreError::Rejected(_),
            ..
        }
    ));
    assert_eq!(adapter.pause().pauses(), vec![Duration::from_secs(10)]);
    assert_eq!(snapshot.revision(), Revision(1));
}

#[test]
fn commit_then_refresh_failure_surfaces_read_error() {
    let (store, adapter) = shared_adapter();
    let mut record = adapter.store().get_record(RecordId(42), None).unwrap();
    let mut snapshot = adapter.wrap(&record);
    record.set_value("Title", "Bar").unwrap();

    store.push_read_failure(StoreError::Transient("timeout".into()));
    store.push_read_failure(StoreError::Transient("timeout".into()));

    let err = adapter.commit(&mut record, &mut snapshot).unwrap_err();
    assert!(matches!(err, AdapterError::TransientRead { attempts: 2, .. }));
    // The save itself went through.
    assert_eq!(store.latest(RecordId(42)).unwrap().revision, Revision(2));
    assert_eq!(adapter.pause().pauses(), vec![Duration::from_secs(8)]);
}

#[test]
fn file_store_commit_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("store.json");
    let document = StoreDocument {
        projects: vec![Project::new("Fabrikam")],
        records: vec![RecordHistory {
            id: RecordId(7),
            revisions: vec![RemoteRecord::new(7, 1, "Task").with_value("Title", "Draft")],
        }],
    };
    let store = JsonFileStore::create(&path, document).unwrap();
    let adapter = SyncAdapter::with_pause(AdapterConfig::default(), store, RecordingPause::new());

    let mut record = adapter.store().get_record(RecordId(7), None).unwrap();
    let mut snapshot = adapter.wrap(&record);
    record.set_value("Title", "Final").unwrap();
    adapter.commit(&mut record, &mut snapshot).unwrap();

    let reopened = JsonFileStore::open(&path).unwrap();
    let latest = reopened.get_record(RecordId(7), None).unwrap();
    assert_eq!(latest.revision, snapshot.revision());
    assert_eq!(latest.value("Title"), Some(&FieldValue::from("Final")));

    let project = adapter.store().get_project("Fabrikam").unwrap();
    let data = adapter.wrap_project(&project);
    assert_eq!(adapter.project_of(&data).unwrap(), project);
}

#[test]
fn commit_retries_failed_file_write_once() {
    let dir = tempfile::tempdir().unwrap();
    let data_dir = dir.path().join("data");
    std::fs::create_dir(&data_dir).unwrap();
    let path = data_dir.join("store.json");
    let document = StoreDocument {
        projects: Vec::new(),
        records: vec![RecordHistory {
            id: RecordId(7),
            revisions: vec![RemoteRecord::new(7, 1, "Task").with_value("Title", "Draft")],
        }],
    };
    let store = JsonFileStore::create(&path, document).unwrap();
    let adapter = SyncAdapter::with_pause(
        AdapterConfig::default(),
        store,
        RecreateDir(data_dir.clone()),
    );

    let mut record = adapter.store().get_record(RecordId(7), None).unwrap();
    let mut snapshot = adapter.wrap(&record);
    record.set_value("Title", "Final").unwrap();

    // The first write fails; the pause before the retry restores the directory.
    std::fs::remove_dir_all(&data_dir).unwrap();
    let outcome = adapter.commit(&mut record, &mut snapshot).unwrap();
    assert_eq!(outcome, CommitOutcome::Saved);
    assert_eq!(adapter.stats().write_retries, 1);
    assert_eq!(snapshot.revision(), Revision(2));

    let reopened = JsonFileStore::open(&path).unwrap();
    let revisions: Vec<_> = (1..=3u32)
        .filter(|rev| reopened.get_record(RecordId(7), Some(Revision(*rev))).is_ok())
        .collect();
    assert_eq!(revisions, vec![1, 2]);
    assert_eq!(
        reopened.get_record(RecordId(7), None).unwrap().value("Title"),
        Some(&FieldValue::from("Final"))
    );
}

#[test]
fn swallowed_format_error_is_logged() {
    let (store, adapter) = shared_adapter();
    let mut record = adapter.store().get_record(RecordId(42), None).unwrap();
    let mut snapshot = adapter.wrap(&record);
    record.set_value("State", "Bogus").unwrap();

    let (outcome, logs) = capture_logs(|| adapter.commit(&mut record, &mut snapshot));
    assert_eq!(outcome.unwrap(), CommitOutcome::SwallowedFormatError);
    assert!(logs.contains("ERROR"), "{logs}");
    assert!(logs.contains("ignoring format error on save"), "{logs}");
    assert!(logs.contains("not allowed for field System.State"), "{logs}");
    assert_eq!(store.save_calls(), 1);
}

#[test]
fn bulk_wrap_logs_progress() {
    let adapter = SyncAdapter::with_pause(
        AdapterConfig::default().with_progress_interval(Duration::from_secs(3600)),
        MemoryStore::new(),
        RecordingPause::new(),
    );
    let records: Vec<_> = (1..=3u32).map(|id| RemoteRecord::new(id, 1, "Task")).collect();

    let (snapshots, logs) = capture_logs(|| adapter.bulk_wrap(&records));
    assert_eq!(snapshots.len(), 3);
    assert!(logs.contains("1/3 33.33%"), "{logs}");
    assert!(!logs.contains("2/3"), "{logs}");
    assert!(logs.contains("work items loaded"), "{logs}");
}

fn record_strategy() -> impl Strategy<Value = RemoteRecord> {
    (
        1u32..10_000,
        1u32..100,
        proptest::collection::btree_map("[A-Z][a-z]{0,8}", "[a-z ]{0,12}", 0..6),
    )
        .prop_map(|(id, rev, fields)| {
            fields
                .into_iter()
                .fold(RemoteRecord::new(id, rev, "Task"), |r, (name, value)| {
                    r.with_value(name, value)
                })
        })
}

proptest! {
    #[test]
    fn bulk_wrap_preserves_order_and_content(
        records in proptest::collection::vec(record_strategy(), 0..40)
    ) {
        let adapter = SyncAdapter::with_pause(
            AdapterConfig::default().with_progress_interval(Duration::ZERO),
            MemoryStore::new(),
            RecordingPause::new(),
        );
        let snapshots = adapter.bulk_wrap(&records);

        prop_assert_eq!(snapshots.len(), records.len());
        for (snapshot, record) in snapshots.iter().zip(&records) {
            prop_assert_eq!(snapshot, &adapter.wrap(record));
            prop_assert_eq!(snapshot.fields(), &record.field_values());
        }
    }
}
