//! CLI command implementations.

pub mod init;
pub mod list;
pub mod show;

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};

/// Resolve the database path: explicit flag, or `~/.alsvid/channels.sqlite`.
pub fn database_path(flag: Option<PathBuf>) -> Result<PathBuf> {
    if let Some(path) = flag {
        return Ok(path);
    }
    let home = dirs::home_dir().context("Could not determine home directory")?;
    let state_dir = home.join(".alsvid");
    if !state_dir.exists() {
        fs::create_dir_all(&state_dir)
            .with_context(|| format!("Failed to create state directory: {}", state_dir.display()))?;
    }
    Ok(state_dir.join("channels.sqlite"))
}
