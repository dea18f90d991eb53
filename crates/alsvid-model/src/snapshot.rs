//! Snapshot metadata types.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Label of the distinguished active-workspace snapshot.
pub const ACTIVE_LABEL: &str = "__temp__";

/// Unique identifier for a snapshot, assigned by the backing store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SnapshotId(pub i64);

impl fmt::Display for SnapshotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for SnapshotId {
    fn from(id: i64) -> Self {
        SnapshotId(id)
    }
}

/// A named, timestamped grouping of channel and source entities.
///
/// Snapshots are immutable once committed by a save; several snapshots
/// may share a label, and history is append-only by (label, time).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotMeta {
    /// Store-assigned identity.
    pub id: SnapshotId,

    /// Snapshot name. The active workspace uses [`ACTIVE_LABEL`].
    pub label: String,

    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl SnapshotMeta {
    /// Whether this is the active-workspace snapshot.
    pub fn is_active_workspace(&self) -> bool {
        self.label == ACTIVE_LABEL
    }
}

impl fmt::Display for SnapshotMeta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}, {})",
            self.label,
            self.id,
            self.created_at.format("%Y-%m-%d %H:%M:%S")
        )
    }
}
