//! SQLite-backed channel store.

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use rusqlite::Connection;

use alsvid_model::{Entity, EntityId, EntityKind, Params, RefField, SnapshotId, SnapshotMeta};

use crate::error::{StoreError, StoreResult};
use crate::ChannelStore;

/// SQLite-based channel store.
///
/// Backs the library with a single-file (or in-memory) relational
/// store. Table layout: `snapshots` metadata rows plus `entities` rows
/// carrying reference fields and the opaque parameter payload as JSON
/// text columns.
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Open (creating if needed) a store at the given path.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let conn = Connection::open(path)?;
        let store = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        store.init_schema()?;
        Ok(store)
    }

    /// Open a fresh in-memory store.
    pub fn in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        store.init_schema()?;
        Ok(store)
    }

    fn lock(&self) -> StoreResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| StoreError::Database(e.to_string()))
    }

    fn init_schema(&self) -> StoreResult<()> {
        let conn = self.lock()?;
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS snapshots (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                label TEXT NOT NULL,
                created_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_snapshots_label ON snapshots(label);

            CREATE TABLE IF NOT EXISTS entities (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                label TEXT NOT NULL,
                kind TEXT NOT NULL,
                snapshot_id INTEGER NOT NULL,
                refs TEXT NOT NULL,
                params TEXT NOT NULL,
                FOREIGN KEY (snapshot_id) REFERENCES snapshots(id)
            );

            CREATE INDEX IF NOT EXISTS idx_entities_snapshot ON entities(snapshot_id);
            CREATE INDEX IF NOT EXISTS idx_entities_label ON entities(label);
            "#,
        )?;
        Ok(())
    }
}

/// Encode the set reference fields as a JSON object keyed by the
/// persistence field names (`phys_chan`, `generator`, ...).
fn refs_to_json(entity: &Entity) -> String {
    let mut map = serde_json::Map::new();
    for (field, target) in &entity.refs {
        map.insert(field.as_str().to_string(), serde_json::json!(target.0));
    }
    serde_json::Value::Object(map).to_string()
}

fn row_to_entity(
    id: i64,
    label: String,
    kind: String,
    snapshot_id: i64,
    refs: String,
    params: String,
) -> StoreResult<Entity> {
    let kind: EntityKind = kind.parse()?;
    let mut entity = Entity::new(kind, label, SnapshotId(snapshot_id));
    entity.id = EntityId(id);
    entity.params = serde_json::from_str::<Params>(&params)?;

    let refs: serde_json::Map<String, serde_json::Value> = serde_json::from_str(&refs)?;
    for (name, value) in refs {
        let field: RefField = name.parse()?;
        let target = value
            .as_i64()
            .ok_or_else(|| StoreError::Database(format!("non-integer ref {name} on row {id}")))?;
        entity.refs.insert(field, EntityId(target));
    }
    Ok(entity)
}

impl ChannelStore for SqliteStore {
    fn insert_entity(&self, entity: &Entity) -> StoreResult<EntityId> {
        let conn = self.lock()?;
        conn.execute(
            r#"
            INSERT INTO entities (label, kind, snapshot_id, refs, params)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            rusqlite::params![
                entity.label,
                entity.kind.name(),
                entity.snapshot.0,
                refs_to_json(entity),
                serde_json::Value::Object(entity.params.clone()).to_string(),
            ],
        )?;
        Ok(EntityId(conn.last_insert_rowid()))
    }

    fn update_entity(&self, entity: &Entity) -> StoreResult<()> {
        let conn = self.lock()?;
        let updated = conn.execute(
            r#"
            UPDATE entities
            SET label = ?2, kind = ?3, snapshot_id = ?4, refs = ?5, params = ?6
            WHERE id = ?1
            "#,
            rusqlite::params![
                entity.id.0,
                entity.label,
                entity.kind.name(),
                entity.snapshot.0,
                refs_to_json(entity),
                serde_json::Value::Object(entity.params.clone()).to_string(),
            ],
        )?;
        if updated == 0 {
            return Err(StoreError::EntityNotFound(entity.id.0));
        }
        Ok(())
    }

    fn get_entity(&self, id: EntityId) -> StoreResult<Option<Entity>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT id, label, kind, snapshot_id, refs, params FROM entities WHERE id = ?1",
        )?;
        let mut rows = stmt.query(rusqlite::params![id.0])?;

        if let Some(row) = rows.next()? {
            let entity = row_to_entity(
                row.get(0)?,
                row.get(1)?,
                row.get(2)?,
                row.get(3)?,
                row.get(4)?,
                row.get(5)?,
            )?;
            Ok(Some(entity))
        } else {
            Ok(None)
        }
    }

    fn entities_in(&self, snapshot: SnapshotId) -> StoreResult<Vec<Entity>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT id, label, kind, snapshot_id, refs, params
            FROM entities WHERE snapshot_id = ?1 ORDER BY id ASC
            "#,
        )?;
        let mut rows = stmt.query(rusqlite::params![snapshot.0])?;

        let mut entities = Vec::new();
        while let Some(row) = rows.next()? {
            entities.push(row_to_entity(
                row.get(0)?,
                row.get(1)?,
                row.get(2)?,
                row.get(3)?,
                row.get(4)?,
                row.get(5)?,
            )?);
        }
        Ok(entities)
    }

    fn delete_entities_in(&self, snapshot: SnapshotId) -> StoreResult<usize> {
        let conn = self.lock()?;
        let deleted = conn.execute(
            "DELETE FROM entities WHERE snapshot_id = ?1",
            rusqlite::params![snapshot.0],
        )?;
        Ok(deleted)
    }

    fn create_snapshot(&self, label: &str, created_at: DateTime<Utc>) -> StoreResult<SnapshotMeta> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO snapshots (label, created_at) VALUES (?1, ?2)",
            rusqlite::params![label, created_at.to_rfc3339()],
        )?;
        Ok(SnapshotMeta {
            id: SnapshotId(conn.last_insert_rowid()),
            label: label.to_string(),
            created_at,
        })
    }

    fn get_snapshot(&self, id: SnapshotId) -> StoreResult<Option<SnapshotMeta>> {
        let conn = self.lock()?;
        let mut stmt =
            conn.prepare("SELECT id, label, created_at FROM snapshots WHERE id = ?1")?;
        let mut rows = stmt.query(rusqlite::params![id.0])?;

        if let Some(row) = rows.next()? {
            let created: String = row.get(2)?;
            Ok(Some(SnapshotMeta {
                id: SnapshotId(row.get(0)?),
                label: row.get(1)?,
                created_at: DateTime::parse_from_rfc3339(&created)
                    .map_err(|e| StoreError::Database(e.to_string()))?
                    .with_timezone(&Utc),
            }))
        } else {
            Ok(None)
        }
    }

    fn touch_snapshot(&self, id: SnapshotId, time: DateTime<Utc>) -> StoreResult<()> {
        let conn = self.lock()?;
        let updated = conn.execute(
            "UPDATE snapshots SET created_at = ?2 WHERE id = ?1",
            rusqlite::params![id.0, time.to_rfc3339()],
        )?;
        if updated == 0 {
            return Err(StoreError::SnapshotNotFound(id.0));
        }
        Ok(())
    }

    fn list_snapshots(&self) -> StoreResult<Vec<SnapshotMeta>> {
        let conn = self.lock()?;
        let mut stmt =
            conn.prepare("SELECT id, label, created_at FROM snapshots ORDER BY created_at DESC, id DESC")?;
        let mut rows = stmt.query([])?;

        let mut metas = Vec::new();
        while let Some(row) = rows.next()? {
            let created: String = row.get(2)?;
            metas.push(SnapshotMeta {
                id: SnapshotId(row.get(0)?),
                label: row.get(1)?,
                created_at: DateTime::parse_from_rfc3339(&created)
                    .map_err(|e| StoreError::Database(e.to_string()))?
                    .with_timezone(&Utc),
            });
        }
        Ok(metas)
    }

    fn begin(&self) -> StoreResult<()> {
        let conn = self.lock()?;
        conn.execute_batch("BEGIN IMMEDIATE")?;
        Ok(())
    }

    fn commit(&self) -> StoreResult<()> {
        let conn = self.lock()?;
        conn.execute_batch("COMMIT")?;
        Ok(())
    }

    fn rollback(&self) -> StoreResult<()> {
        let conn = self.lock()?;
        conn.execute_batch("ROLLBACK")?;
        Ok(())
    }
}
