//! Show command implementation.

use std::path::Path;

use anyhow::Result;
use console::style;

use alsvid_model::SnapshotId;
use alsvid_store::{ChannelStore, SqliteStore};

/// Show the entities owned by a snapshot.
pub fn execute(db: &Path, id: i64) -> Result<()> {
    let store =
        SqliteStore::open(db).map_err(|e| anyhow::anyhow!("Failed to open database: {e}"))?;

    let snapshot = store
        .get_snapshot(SnapshotId(id))
        .map_err(|e| anyhow::anyhow!("Failed to load snapshot: {e}"))?
        .ok_or_else(|| anyhow::anyhow!("Snapshot not found: {id}"))?;

    let entities = store
        .entities_in(snapshot.id)
        .map_err(|e| anyhow::anyhow!("Failed to load entities: {e}"))?;

    println!(
        "{} {} ({} entities)",
        style("Snapshot").bold(),
        style(&snapshot).yellow(),
        entities.len()
    );

    for entity in entities {
        println!("  {:<28} {}", entity.label, style(entity.kind).cyan());
        for (field, target) in &entity.refs {
            let target_label = store
                .get_entity(*target)
                .ok()
                .flatten()
                .map_or_else(|| target.to_string(), |e| e.label);
            println!("    {:<26} -> {}", field, target_label);
        }
    }
    Ok(())
}
