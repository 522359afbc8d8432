//! Describe command implementation.

use wisync_adapter::{JsonFileStore, RemoteStore, SyncAdapter};
use wisync_model::RecordId;

/// Runs the describe command.
pub fn run(
    adapter: &SyncAdapter<JsonFileStore>,
    id: u32,
    field: Option<&str>,
) -> Result<(), Box<dyn std::error::Error>> {
    let record = adapter.store().get_record(RecordId(id), None)?;
    let descriptors: Vec<_> = adapter
        .describe_fields(&record)
        .into_iter()
        .filter(|d| field.map_or(true, |f| d.name == f || d.reference_name == f))
        .collect();

    if let (Some(name), true) = (field, descriptors.is_empty()) {
        return Err(format!("Work item {} has no field {:?}", id, name).into());
    }

    for descriptor in &descriptors {
        println!("{}", descriptor.to_json()?);
    }

    Ok(())
}
