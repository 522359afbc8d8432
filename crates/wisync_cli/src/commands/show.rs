//! Show command implementation.

use wisync_adapter::{JsonFileStore, RemoteStore, SyncAdapter};
use wisync_model::{LocalSnapshot, RecordId, Revision};

/// Runs the show command.
pub fn run(
    adapter: &SyncAdapter<JsonFileStore>,
    id: u32,
    revision: Option<u32>,
    format: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let record = adapter.store().get_record(RecordId(id), None)?;
    let snapshot = match revision {
        Some(rev) => adapter.wrap_at_revision(&record, Revision(rev))?,
        None => adapter.wrap(&record),
    };

    match format {
        "json" => println!("{}", serde_json::to_string_pretty(&snapshot)?),
        _ => print!("{}", render_text(&snapshot)),
    }

    Ok(())
}

fn render_text(snapshot: &LocalSnapshot) -> String {
    let mut out = format!(
        "{} #{} (rev {})\n",
        snapshot.work_item_type(),
        snapshot.id(),
        snapshot.revision()
    );
    let width = snapshot.fields().keys().map(String::len).max().unwrap_or(0);
    for (name, value) in snapshot.fields() {
        out.push_str(&format!("  {name:<width$}  {value}\n"));
    }
    out
}
