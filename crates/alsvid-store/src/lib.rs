//! SQLite persistence for the Alsvid channel library.
//!
//! The store holds two tables: `snapshots` (named, timestamped entity
//! groupings) and `entities` (channel/source records with their
//! reference fields and opaque parameter payload as JSON columns).
//!
//! The trait is synchronous by design: the channel library is a
//! single-session, run-to-completion system with no suspension points,
//! so every store call blocks until the row is durable.

mod error;
mod sqlite_store;

pub use error::{StoreError, StoreResult};
pub use sqlite_store::SqliteStore;

use chrono::{DateTime, Utc};

use alsvid_model::{Entity, EntityId, SnapshotId, SnapshotMeta};

/// Trait for persistent channel/snapshot storage.
pub trait ChannelStore: Send {
    /// Insert a new entity and return its store-assigned id.
    fn insert_entity(&self, entity: &Entity) -> StoreResult<EntityId>;

    /// Overwrite an existing entity row (label, refs, params, owner).
    fn update_entity(&self, entity: &Entity) -> StoreResult<()>;

    /// Load an entity by id.
    fn get_entity(&self, id: EntityId) -> StoreResult<Option<Entity>>;

    /// Load every entity owned by a snapshot.
    fn entities_in(&self, snapshot: SnapshotId) -> StoreResult<Vec<Entity>>;

    /// Bulk-delete every entity owned by a snapshot. Returns the count.
    fn delete_entities_in(&self, snapshot: SnapshotId) -> StoreResult<usize>;

    /// Create a new snapshot row.
    fn create_snapshot(&self, label: &str, created_at: DateTime<Utc>) -> StoreResult<SnapshotMeta>;

    /// Load snapshot metadata by id.
    fn get_snapshot(&self, id: SnapshotId) -> StoreResult<Option<SnapshotMeta>>;

    /// Bump a snapshot's timestamp.
    fn touch_snapshot(&self, id: SnapshotId, time: DateTime<Utc>) -> StoreResult<()>;

    /// List all snapshots, most recent first.
    fn list_snapshots(&self) -> StoreResult<Vec<SnapshotMeta>>;

    /// Begin a write transaction. Group mutations (clone, save) run
    /// inside one so a partial snapshot never becomes visible.
    fn begin(&self) -> StoreResult<()>;

    /// Commit the current transaction.
    fn commit(&self) -> StoreResult<()>;

    /// Roll back the current transaction.
    fn rollback(&self) -> StoreResult<()>;
}
