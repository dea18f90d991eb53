//! Snapshot clone engine: copy a set of interlinked entities into a
//! new owning snapshot while rewriting every inter-entity reference.
//!
//! The copy proceeds in two order-independent passes:
//!
//! 1. **Materialize**: insert a copy of each entity (same kind, same
//!    label, parameters verbatim, no references) attached to the
//!    destination snapshot, recording a pending `(field, label)` pair
//!    for every reference the original carried, plus a global
//!    `label -> new id` map over everything copied in this operation.
//! 2. **Relink**: resolve each pending pair through the label map and
//!    write the reference on the copy. Labels that do not resolve
//!    (the reference pointed outside the copied set) are dropped, so
//!    no copy ever points back into the source snapshot.
//!
//! Labels serve as the operation's own namespace for resolving
//! references: destination identities are store-assigned and unknown
//! until the first pass has run, while labels are stable and
//! human-chosen. Precondition: labels are unique across the copied
//! set. Two copied entities sharing a label make relink resolution
//! ambiguous and the result is unspecified; the engine does not check.

use rustc_hash::FxHashMap;
use tracing::debug;

use alsvid_model::{Entity, EntityId, RefField, SnapshotId};
use alsvid_store::ChannelStore;

use crate::error::LibResult;

/// New entity ids produced by a clone, split the way snapshots track
/// them: channel entities and source entities.
#[derive(Debug, Clone, Default)]
pub struct CloneOutput {
    /// Copies of the channel-variant entities, in input order.
    pub channels: Vec<EntityId>,
    /// Copies of the source-variant entities, in input order.
    pub sources: Vec<EntityId>,
}

/// A reference waiting to be rewritten onto a copied entity.
struct PendingRelink {
    copy: EntityId,
    field: RefField,
    label: String,
}

/// Copy `channels` and `sources` into `dest`, preserving every
/// reference edge among the copied set.
///
/// The caller is responsible for wrapping the call in a store
/// transaction so a failed clone leaves no partial snapshot behind.
pub fn clone_into(
    store: &dyn ChannelStore,
    channels: &[Entity],
    sources: &[Entity],
    dest: SnapshotId,
) -> LibResult<CloneOutput> {
    let mut output = CloneOutput::default();
    let mut label_to_new: FxHashMap<&str, EntityId> = FxHashMap::default();
    let mut pending: Vec<PendingRelink> = Vec::new();

    // Labels of the copied set, for naming references during pass 1.
    let id_to_label: FxHashMap<EntityId, &str> = channels
        .iter()
        .chain(sources)
        .map(|e| (e.id, e.label.as_str()))
        .collect();

    // Pass 1: materialize copies without references.
    for original in channels.iter().chain(sources) {
        let mut copy = Entity::new(original.kind, original.label.clone(), dest);
        copy.params = original.params.clone();
        copy.id = store.insert_entity(&copy)?;

        debug!(label = %copy.label, kind = %copy.kind, id = %copy.id, "materialized copy");

        for (&field, &target) in &original.refs {
            // Name the referenced entity. References leaving the copied
            // set resolve against the store so a same-labeled in-set
            // entity still captures them; a dangling id is dropped here.
            let label = match id_to_label.get(&target) {
                Some(label) => (*label).to_string(),
                None => match store.get_entity(target)? {
                    Some(e) => e.label,
                    None => continue,
                },
            };
            pending.push(PendingRelink {
                copy: copy.id,
                field,
                label,
            });
        }

        label_to_new.insert(original.label.as_str(), copy.id);
        if original.is_channel() {
            output.channels.push(copy.id);
        } else {
            output.sources.push(copy.id);
        }
    }

    // Pass 2: relink. Group pending pairs per copy so each entity is
    // rewritten once.
    let mut per_copy: FxHashMap<EntityId, Vec<(RefField, EntityId)>> = FxHashMap::default();
    for p in pending {
        let Some(&new_target) = label_to_new.get(p.label.as_str()) else {
            // Reference pointed outside the copied set: leave unset.
            debug!(field = %p.field, label = %p.label, "dropping out-of-set reference");
            continue;
        };
        per_copy.entry(p.copy).or_default().push((p.field, new_target));
    }

    for (copy_id, links) in per_copy {
        let Some(mut copy) = store.get_entity(copy_id)? else {
            continue;
        };
        for (field, target) in links {
            copy.set_ref(field, target)?;
        }
        store.update_entity(&copy)?;
    }

    Ok(output)
}
