//! List command implementation.

use std::path::Path;

use anyhow::Result;
use console::style;

use alsvid_store::{ChannelStore, SqliteStore};

/// List all stored snapshots by label, time and id.
pub fn execute(db: &Path) -> Result<()> {
    let store =
        SqliteStore::open(db).map_err(|e| anyhow::anyhow!("Failed to open database: {e}"))?;
    let snapshots = store
        .list_snapshots()
        .map_err(|e| anyhow::anyhow!("Failed to list snapshots: {e}"))?;

    if snapshots.is_empty() {
        println!("No snapshots in {}", db.display());
        return Ok(());
    }

    println!(
        "{:<24} {:<22} {:>6}",
        style("LABEL").bold(),
        style("CREATED").bold(),
        style("ID").bold()
    );
    for snap in snapshots {
        println!(
            "{:<24} {:<22} {:>6}",
            snap.label,
            snap.created_at.format("%Y-%m-%d %H:%M:%S"),
            snap.id
        );
    }
    Ok(())
}
