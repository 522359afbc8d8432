//! # wisync adapter
//!
//! Moves work item data between a remote work item store and local,
//! revision-tagged snapshots.
//!
//! This crate provides:
//! - `SyncAdapter`: wrap, wrap-at-revision, refresh, commit, field
//!   descriptions and bulk wrapping
//! - Bounded retry with configurable backoff for reads and writes
//! - The `RemoteStore` trait, with in-memory and JSON file implementations
//! - `AdapterWorker`, which runs the adapter on tokio's blocking pool
//!
//! ## Commit semantics
//!
//! A commit validates the record, saves it and refreshes the snapshot:
//! 1. Invalid fields are logged, never fatal
//! 2. A format-class save failure on the first attempt is logged and ignored
//! 3. Any other failure is retried per the write policy, then surfaced
//! 4. On success the snapshot is re-read so server defaults show up
//!
//! ## Key Invariants
//!
//! - A snapshot always reflects exactly one revision of one record
//! - Snapshots are replaced wholesale, never merged
//! - Retries are bounded; the last error is surfaced unchanged

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod adapter;
mod config;
mod error;
mod file_store;
mod pause;
mod progress;
mod store;
mod worker;

pub use adapter::{AdapterStats, CommitOutcome, SyncAdapter};
pub use config::{AdapterConfig, RetryPolicy, TeamProjectConfig};
pub use error::{AdapterError, AdapterResult, StoreError, StoreResult};
pub use file_store::JsonFileStore;
pub use pause::{Pause, RecordingPause, ThreadPause};
pub use progress::{Progress, ProgressTracker};
pub use store::{MemoryStore, RecordHistory, RemoteStore, StoreDocument};
pub use worker::{AdapterWorker, Committed};
