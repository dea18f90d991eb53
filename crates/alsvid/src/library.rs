//! The channel library: active workspace lifecycle, snapshot registry
//! access, and the label-keyed dictionary façade.

use chrono::Utc;
use rustc_hash::FxHashMap;
use std::path::Path;
use tracing::{debug, info};

use alsvid_model::{ACTIVE_LABEL, Entity, EntityId, SnapshotId, SnapshotMeta};
use alsvid_store::{ChannelStore, SqliteStore, StoreError};

use crate::clone::clone_into;
use crate::error::{LibError, LibResult};
use crate::graph::ConnectivityGraph;

/// A versioned registry of channel entities.
///
/// The library binds a persistence store and maintains one mutable
/// active workspace (a snapshot labelled `__temp__`) that experiment
/// code reads and writes between saves. `save_as` exports the
/// workspace as a new immutable snapshot; `load` replaces the
/// workspace contents with a clone of a stored snapshot.
///
/// Single-session only: the library assumes one logical owner and
/// performs no internal locking.
pub struct ChannelLibrary {
    store: Box<dyn ChannelStore>,
    workspace: SnapshotMeta,
    channels: Vec<EntityId>,
    sources: Vec<EntityId>,
    channel_dict: FxHashMap<String, EntityId>,
    connectivity: ConnectivityGraph,
    save_target: Option<String>,
}

impl ChannelLibrary {
    /// Bind an existing store and create a fresh, empty workspace.
    pub fn with_store(store: Box<dyn ChannelStore>) -> LibResult<Self> {
        let workspace = store.create_snapshot(ACTIVE_LABEL, Utc::now())?;
        info!(workspace = %workspace.id, "channel library initialized");
        Ok(Self {
            store,
            workspace,
            channels: Vec::new(),
            sources: Vec::new(),
            channel_dict: FxHashMap::default(),
            connectivity: ConnectivityGraph::new(),
            save_target: None,
        })
    }

    /// Open (creating if needed) a library backed by a database file.
    pub fn open(path: impl AsRef<Path>) -> LibResult<Self> {
        Self::with_store(Box::new(SqliteStore::open(path)?))
    }

    /// Open a library backed by an in-memory store.
    pub fn in_memory() -> LibResult<Self> {
        Self::with_store(Box::new(SqliteStore::in_memory()?))
    }

    /// The active workspace's snapshot metadata.
    pub fn workspace(&self) -> &SnapshotMeta {
        &self.workspace
    }

    /// Ids of the channel entities tracked in the workspace.
    pub fn channels(&self) -> &[EntityId] {
        &self.channels
    }

    /// Ids of the source entities tracked in the workspace.
    pub fn sources(&self) -> &[EntityId] {
        &self.sources
    }

    /// Every entity currently owned by the active workspace.
    pub fn get_current_channels(&self) -> LibResult<Vec<Entity>> {
        Ok(self.store.entities_in(self.workspace.id)?)
    }

    /// Fetch an entity by id, failing if it no longer exists.
    pub fn fetch(&self, id: EntityId) -> LibResult<Entity> {
        self.store
            .get_entity(id)?
            .ok_or(LibError::Store(StoreError::EntityNotFound(id.0)))
    }

    /// Find a workspace entity by label.
    pub fn find_by_label(&self, label: &str) -> LibResult<Option<Entity>> {
        Ok(self
            .get_current_channels()?
            .into_iter()
            .find(|e| e.label == label))
    }

    /// Create a new entity in the active workspace.
    ///
    /// Label uniqueness within the workspace is enforced here: a second
    /// entity with an existing label is rejected with `DuplicateLabel`.
    /// (The clone engine relies on this as a precondition.)
    pub fn create(&mut self, entity: Entity) -> LibResult<Entity> {
        if self.find_by_label(&entity.label)?.is_some() {
            return Err(LibError::DuplicateLabel(entity.label));
        }
        let mut entity = entity;
        entity.snapshot = self.workspace.id;
        entity.id = self.store.insert_entity(&entity)?;
        if entity.is_channel() {
            self.channels.push(entity.id);
        } else {
            self.sources.push(entity.id);
        }
        debug!(label = %entity.label, kind = %entity.kind, "created entity");
        Ok(entity)
    }

    /// Write back a mutated entity.
    pub fn update(&self, entity: &Entity) -> LibResult<()> {
        Ok(self.store.update_entity(entity)?)
    }

    /// List all snapshots in the registry, most recent first.
    pub fn list(&self) -> LibResult<Vec<SnapshotMeta>> {
        Ok(self.store.list_snapshots()?)
    }

    /// Bulk-delete every entity owned by the active workspace and bump
    /// its timestamp. The cached channel dictionary is left stale on
    /// purpose; refresh it with [`update_channel_dict`](Self::update_channel_dict).
    pub fn clear(&mut self) -> LibResult<()> {
        let deleted = self.store.delete_entities_in(self.workspace.id)?;
        let now = Utc::now();
        self.store.touch_snapshot(self.workspace.id, now)?;
        self.workspace.created_at = now;
        self.channels.clear();
        self.sources.clear();
        debug!(deleted, "cleared active workspace");
        Ok(())
    }

    /// Replace the active workspace's contents with a clone of the
    /// given snapshot. The snapshot's name becomes the save target for
    /// a later [`save`](Self::save).
    pub fn load(&mut self, id: SnapshotId) -> LibResult<()> {
        let snapshot = self
            .store
            .get_snapshot(id)?
            .ok_or(LibError::SnapshotNotFound(id.0))?;
        if snapshot.id == self.workspace.id {
            // Loading the workspace into itself would delete the very
            // entities about to be copied.
            return Err(LibError::SnapshotNotFound(id.0));
        }
        let entities = self.store.entities_in(id)?;
        let (channels, sources): (Vec<_>, Vec<_>) =
            entities.into_iter().partition(Entity::is_channel);

        self.store.begin()?;
        let prev_created = self.workspace.created_at;
        let prev_channels = self.channels.clone();
        let prev_sources = self.sources.clone();
        let result = self
            .clear()
            .and_then(|()| clone_into(self.store.as_ref(), &channels, &sources, self.workspace.id));
        match result {
            Ok(out) => {
                self.store.commit()?;
                self.channels = out.channels;
                self.sources = out.sources;
                self.save_target = Some(snapshot.label.clone());
                info!(snapshot = %snapshot, "loaded snapshot into workspace");
                Ok(())
            }
            Err(e) => {
                // The rollback un-deletes the workspace entities, so the
                // in-memory tracking has to revert with it.
                let _ = self.store.rollback();
                self.workspace.created_at = prev_created;
                self.channels = prev_channels;
                self.sources = prev_sources;
                Err(e)
            }
        }
    }

    /// [`load`](Self::load) by raw snapshot id.
    pub fn load_by_id(&mut self, id: i64) -> LibResult<()> {
        self.load(SnapshotId(id))
    }

    /// Export the active workspace as a new named, timestamped
    /// snapshot. Non-destructive: the workspace keeps its entities and
    /// stays mutable.
    pub fn save_as(&mut self, name: &str) -> LibResult<SnapshotMeta> {
        let entities = self.store.entities_in(self.workspace.id)?;
        let (channels, sources): (Vec<_>, Vec<_>) =
            entities.into_iter().partition(Entity::is_channel);

        self.store.begin()?;
        let result = self
            .store
            .create_snapshot(name, Utc::now())
            .map_err(LibError::from)
            .and_then(|meta| {
                clone_into(self.store.as_ref(), &channels, &sources, meta.id)?;
                Ok(meta)
            });
        match result {
            Ok(meta) => {
                self.store.commit()?;
                self.save_target = Some(name.to_string());
                info!(snapshot = %meta, "saved workspace snapshot");
                Ok(meta)
            }
            Err(e) => {
                let _ = self.store.rollback();
                Err(e)
            }
        }
    }

    /// Save under the current save target (the name of the last loaded
    /// or saved snapshot).
    pub fn save(&mut self) -> LibResult<SnapshotMeta> {
        let name = self.save_target.clone().ok_or(LibError::NoSaveTarget)?;
        self.save_as(&name)
    }

    /// Fold the current workspace's qubits and edges into the
    /// connectivity graph. Add-only; see [`ConnectivityGraph`].
    pub fn build_connectivity_graph(&mut self) -> LibResult<()> {
        let entities = self.get_current_channels()?;
        self.connectivity.extend_from(&entities);
        Ok(())
    }

    /// Discard the connectivity graph and rebuild it from scratch.
    /// Required after the workspace's edge set has shrunk.
    pub fn rebuild_connectivity_graph(&mut self) -> LibResult<()> {
        self.connectivity = ConnectivityGraph::new();
        self.build_connectivity_graph()
    }

    /// The derived qubit connectivity graph.
    pub fn connectivity(&self) -> &ConnectivityGraph {
        &self.connectivity
    }

    // --- Dictionary façade -------------------------------------------------
    //
    // A cached label -> id view over the workspace. It is refreshed
    // only by `update_channel_dict`; `load` and the factories do not
    // keep it in sync.

    /// Rebuild the cached label dictionary from the workspace.
    pub fn update_channel_dict(&mut self) -> LibResult<()> {
        self.channel_dict = self
            .get_current_channels()?
            .into_iter()
            .map(|e| (e.label, e.id))
            .collect();
        Ok(())
    }

    /// Look up an entity id by label in the cached dictionary.
    pub fn get(&self, label: &str) -> Option<EntityId> {
        self.channel_dict.get(label).copied()
    }

    /// Insert or overwrite a dictionary entry.
    pub fn set(&mut self, label: impl Into<String>, id: EntityId) {
        self.channel_dict.insert(label.into(), id);
    }

    /// Remove a dictionary entry.
    pub fn delete(&mut self, label: &str) -> Option<EntityId> {
        self.channel_dict.remove(label)
    }

    /// Whether the cached dictionary contains a label.
    pub fn contains(&self, label: &str) -> bool {
        self.channel_dict.contains_key(label)
    }

    /// Labels in the cached dictionary.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.channel_dict.keys().map(String::as_str)
    }

    /// Entity ids in the cached dictionary.
    pub fn values(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.channel_dict.values().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alsvid_model::{EntityKind, RefField};

    fn lib() -> ChannelLibrary {
        ChannelLibrary::in_memory().unwrap()
    }

    fn labels(lib: &ChannelLibrary) -> Vec<String> {
        let mut v: Vec<_> = lib
            .get_current_channels()
            .unwrap()
            .into_iter()
            .map(|e| e.label)
            .collect();
        v.sort();
        v
    }

    #[test]
    fn test_fresh_workspace_is_empty() {
        let lib = lib();
        assert_eq!(lib.workspace().label, ACTIVE_LABEL);
        assert!(lib.get_current_channels().unwrap().is_empty());
        assert_eq!(lib.list().unwrap().len(), 1);
    }

    #[test]
    fn test_duplicate_label_rejected() {
        let mut lib = lib();
        lib.create(Entity::new(EntityKind::Qubit, "q1", SnapshotId(0)))
            .unwrap();
        let err = lib
            .create(Entity::new(EntityKind::Measurement, "q1", SnapshotId(0)))
            .unwrap_err();
        assert!(matches!(err, LibError::DuplicateLabel(l) if l == "q1"));
    }

    #[test]
    fn test_save_is_non_destructive() {
        let mut lib = lib();
        let ws = lib.workspace().id;
        lib.create(Entity::new(EntityKind::Qubit, "q1", ws)).unwrap();
        lib.create(Entity::new(EntityKind::Qubit, "q2", ws)).unwrap();
        let before = labels(&lib);

        let snap = lib.save_as("snap1").unwrap();
        assert_eq!(snap.label, "snap1");

        // Workspace unchanged, still __temp__, still populated.
        assert_eq!(labels(&lib), before);
        assert_eq!(lib.workspace().label, ACTIVE_LABEL);

        // The snapshot holds an isomorphic, equal-cardinality set.
        let stored = lib.store.entities_in(snap.id).unwrap();
        let mut stored_labels: Vec<_> = stored.iter().map(|e| e.label.clone()).collect();
        stored_labels.sort();
        assert_eq!(stored_labels, before);
    }

    #[test]
    fn test_load_replaces_workspace() {
        let mut lib = lib();
        let ws = lib.workspace().id;
        lib.create(Entity::new(EntityKind::Qubit, "q1", ws)).unwrap();
        let snap = lib.save_as("snap1").unwrap();

        lib.clear().unwrap();
        lib.create(Entity::new(EntityKind::Qubit, "stray", ws))
            .unwrap();

        lib.load(snap.id).unwrap();
        assert_eq!(labels(&lib), vec!["q1".to_string()]);
        assert_eq!(lib.channels().len(), 1);
        assert!(lib.sources().is_empty());
    }

    #[test]
    fn test_load_unknown_snapshot() {
        let mut lib = lib();
        let err = lib.load_by_id(424242).unwrap_err();
        assert!(matches!(err, LibError::SnapshotNotFound(424242)));
    }

    #[test]
    fn test_save_then_save_targets_same_name() {
        let mut lib = lib();
        let ws = lib.workspace().id;
        lib.create(Entity::new(EntityKind::Qubit, "q1", ws)).unwrap();

        assert!(matches!(lib.save(), Err(LibError::NoSaveTarget)));
        lib.save_as("cal").unwrap();
        lib.save().unwrap();

        let cals: Vec<_> = lib
            .list()
            .unwrap()
            .into_iter()
            .filter(|s| s.label == "cal")
            .collect();
        // History is append-only: two snapshots share the name.
        assert_eq!(cals.len(), 2);
    }

    #[test]
    fn test_saved_snapshot_relinks_chain() {
        // Scenario: q1 -> phys_chan "q1-12" -> generator "src1";
        // the snapshot's copy of q1 must reach the snapshot's copy of
        // src1, not the original.
        let mut lib = lib();
        let ws = lib.workspace().id;

        let src = lib
            .create(Entity::new(EntityKind::MicrowaveSource, "src1", ws))
            .unwrap();
        let mut phys = Entity::new(EntityKind::PhysicalQuadratureChannel, "q1-12", ws);
        phys.set_ref(RefField::Generator, src.id).unwrap();
        let phys = lib.create(phys).unwrap();
        let mut qubit = Entity::new(EntityKind::Qubit, "q1", ws);
        qubit.set_ref(RefField::PhysChan, phys.id).unwrap();
        lib.create(qubit).unwrap();

        let snap = lib.save_as("snap1").unwrap();
        let stored = lib.store.entities_in(snap.id).unwrap();
        let snap_qubit = stored.iter().find(|e| e.label == "q1").unwrap();
        let snap_src = stored.iter().find(|e| e.label == "src1").unwrap();

        let snap_phys_id = snap_qubit.get_ref(RefField::PhysChan).unwrap();
        let snap_phys = lib.fetch(snap_phys_id).unwrap();
        assert_eq!(snap_phys.snapshot, snap.id);
        assert_eq!(snap_phys.get_ref(RefField::Generator), Some(snap_src.id));
        assert_ne!(snap_src.id, src.id);
    }

    #[test]
    fn test_channel_dict_is_explicitly_refreshed() {
        let mut lib = lib();
        let ws = lib.workspace().id;
        let q = lib
            .create(Entity::new(EntityKind::Qubit, "q1", ws))
            .unwrap();

        // Stale until refreshed.
        assert!(!lib.contains("q1"));
        lib.update_channel_dict().unwrap();
        assert_eq!(lib.get("q1"), Some(q.id));
        assert_eq!(lib.keys().count(), 1);

        lib.delete("q1");
        assert!(!lib.contains("q1"));
    }
}
