//! Set command implementation.

use wisync_adapter::{CommitOutcome, JsonFileStore, RemoteStore, SyncAdapter};
use wisync_model::{FieldValue, RecordId};

/// Splits a `FIELD=VALUE` argument.
pub fn parse_assignment(raw: &str) -> Result<(String, FieldValue), String> {
    let (name, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("Expected FIELD=VALUE, got {:?}", raw))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("Missing field name in {:?}", raw));
    }
    Ok((name.to_string(), FieldValue::parse_literal(value)))
}

/// Runs the set command.
pub fn run(
    adapter: &SyncAdapter<JsonFileStore>,
    id: u32,
    assignments: &[String],
) -> Result<(), Box<dyn std::error::Error>> {
    let edits = assignments
        .iter()
        .map(|raw| parse_assignment(raw))
        .collect::<Result<Vec<_>, _>>()?;

    let mut record = adapter.store().get_record(RecordId(id), None)?;
    let mut snapshot = adapter.wrap(&record);
    for (name, value) in edits {
        record.set_value(&name, value)?;
    }

    match adapter.commit(&mut record, &mut snapshot)? {
        CommitOutcome::Saved => {
            println!("Saved work item {} at revision {}", id, snapshot.revision());
        }
        CommitOutcome::SwallowedFormatError => {
            println!(
                "Work item {} was not saved (format error ignored); still at revision {}",
                id,
                snapshot.revision()
            );
        }
    }

    Ok(())
}
