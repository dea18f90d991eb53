//! Alsvid channel entity data model
//!
//! This crate provides the core data structures for describing how an
//! experiment's logical signal paths map onto physical instruments:
//! typed channel entities (qubits, physical I/O channels, markers,
//! receivers, microwave sources) with cross-references, grouped into
//! named, timestamped snapshots.
//!
//! # Overview
//!
//! Entities are plain records with a store-assigned [`EntityId`], a
//! human-chosen `label`, a [`EntityKind`] discriminator, an owning
//! [`SnapshotId`], reference fields pointing at other entities, and an
//! opaque JSON parameter payload. Reference fields are described by a
//! static per-kind schema ([`EntityKind::ref_fields`]) rather than
//! runtime introspection, so generic routines (copying, persistence)
//! can walk every reference of any variant without reflection.
//!
//! # Example
//!
//! ```rust
//! use alsvid_model::{Entity, EntityId, EntityKind, RefField, SnapshotId};
//!
//! let ws = SnapshotId(1);
//! let mut qubit = Entity::new(EntityKind::Qubit, "q1", ws);
//! qubit.set_ref(RefField::PhysChan, EntityId(42));
//!
//! assert_eq!(qubit.get_ref(RefField::PhysChan), Some(EntityId(42)));
//! assert!(EntityKind::Qubit.ref_fields().contains(&RefField::PhysChan));
//! ```

pub mod entity;
pub mod error;
pub mod snapshot;

pub use entity::{Entity, EntityId, EntityKind, Params, RefField};
pub use error::{ModelError, ModelResult};
pub use snapshot::{ACTIVE_LABEL, SnapshotId, SnapshotMeta};
