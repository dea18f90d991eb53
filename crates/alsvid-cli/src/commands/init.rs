//! Init command implementation.

use std::path::Path;

use anyhow::Result;
use console::style;

use alsvid_store::SqliteStore;

/// Create (or open, initializing the schema of) a channel database.
pub fn execute(db: &Path) -> Result<()> {
    SqliteStore::open(db).map_err(|e| anyhow::anyhow!("Failed to open database: {e}"))?;
    println!(
        "{} Initialized channel database at {}",
        style("✓").green().bold(),
        style(db.display()).yellow()
    );
    Ok(())
}
