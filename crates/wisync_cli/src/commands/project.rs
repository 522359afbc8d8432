//! Project command implementation.

use wisync_adapter::{JsonFileStore, RemoteStore, SyncAdapter};

/// Runs the project command.
pub fn run(
    adapter: &SyncAdapter<JsonFileStore>,
    name: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let project = adapter.store().get_project(name)?;
    let data = adapter.wrap_project(&project);
    println!("{}", serde_json::to_string_pretty(&data)?);
    Ok(())
}
