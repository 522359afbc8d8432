//! Load command implementation.

use serde::Serialize;
use std::collections::BTreeMap;
use wisync_adapter::{JsonFileStore, RemoteStore, SyncAdapter};
use wisync_model::{LocalSnapshot, RecordId};

/// Bulk load summary.
#[derive(Debug, Default, PartialEq, Eq, Serialize)]
pub struct LoadSummary {
    /// Number of work items loaded.
    pub loaded: usize,
    /// Work item count per type.
    pub by_type: BTreeMap<String, usize>,
}

impl LoadSummary {
    /// Summarizes a set of snapshots.
    pub fn from_snapshots(snapshots: &[LocalSnapshot]) -> Self {
        let mut summary = Self {
            loaded: snapshots.len(),
            ..Self::default()
        };
        for snapshot in snapshots {
            *summary
                .by_type
                .entry(snapshot.work_item_type().to_string())
                .or_default() += 1;
        }
        summary
    }
}

/// Runs the load command.
pub fn run(
    adapter: &SyncAdapter<JsonFileStore>,
    ids: &[u32],
) -> Result<(), Box<dyn std::error::Error>> {
    let ids: Vec<RecordId> = if ids.is_empty() {
        adapter.store().ids()
    } else {
        ids.iter().copied().map(RecordId).collect()
    };

    let records = ids
        .into_iter()
        .map(|id| adapter.store().get_record(id, None))
        .collect::<Result<Vec<_>, _>>()?;
    let snapshots = adapter.bulk_wrap(&records);

    println!(
        "{}",
        serde_json::to_string_pretty(&LoadSummary::from_snapshots(&snapshots))?
    );

    Ok(())
}
