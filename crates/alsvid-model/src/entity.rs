//! Channel entity records and their static reference-field schema.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ModelError;
use crate::snapshot::SnapshotId;

/// Unique identifier for an entity, assigned by the backing store.
///
/// Freshly constructed entities carry `EntityId(0)` until the store
/// inserts them and hands back the real rowid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityId(pub i64);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for EntityId {
    fn from(id: i64) -> Self {
        EntityId(id)
    }
}

/// Discriminator for the channel entity variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    /// Physical I/Q output pair on an AWG.
    PhysicalQuadratureChannel,
    /// Physical marker output on an AWG.
    PhysicalMarkerChannel,
    /// Logical marker (trigger/gate) channel.
    LogicalMarkerChannel,
    /// Digitizer receiver channel.
    ReceiverChannel,
    /// Logical qubit channel.
    Qubit,
    /// Measurement channel for a qubit.
    Measurement,
    /// Two-qubit interaction edge.
    Edge,
    /// Microwave generator feeding a physical channel.
    MicrowaveSource,
}

impl EntityKind {
    /// Stable string name used by the persistence layer.
    pub fn name(&self) -> &'static str {
        match self {
            EntityKind::PhysicalQuadratureChannel => "PhysicalQuadratureChannel",
            EntityKind::PhysicalMarkerChannel => "PhysicalMarkerChannel",
            EntityKind::LogicalMarkerChannel => "LogicalMarkerChannel",
            EntityKind::ReceiverChannel => "ReceiverChannel",
            EntityKind::Qubit => "Qubit",
            EntityKind::Measurement => "Measurement",
            EntityKind::Edge => "Edge",
            EntityKind::MicrowaveSource => "MicrowaveSource",
        }
    }

    /// Whether this kind lives in the source collection of a snapshot
    /// rather than the channel collection.
    pub fn is_source(&self) -> bool {
        matches!(self, EntityKind::MicrowaveSource)
    }

    /// The reference fields this kind may carry.
    ///
    /// This is the static schema generic routines walk instead of
    /// reflecting over entity attributes: any reference not listed here
    /// cannot be set on an entity of this kind.
    pub fn ref_fields(&self) -> &'static [RefField] {
        match self {
            EntityKind::PhysicalQuadratureChannel | EntityKind::PhysicalMarkerChannel => {
                &[RefField::Generator]
            }
            EntityKind::LogicalMarkerChannel => &[RefField::PhysChan],
            EntityKind::ReceiverChannel | EntityKind::MicrowaveSource => &[],
            EntityKind::Qubit => &[RefField::PhysChan],
            EntityKind::Measurement => &[
                RefField::PhysChan,
                RefField::TrigChan,
                RefField::GateChan,
                RefField::ReceiverChan,
            ],
            EntityKind::Edge => &[RefField::Source, RefField::Target],
        }
    }
}

impl FromStr for EntityKind {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PhysicalQuadratureChannel" => Ok(EntityKind::PhysicalQuadratureChannel),
            "PhysicalMarkerChannel" => Ok(EntityKind::PhysicalMarkerChannel),
            "LogicalMarkerChannel" => Ok(EntityKind::LogicalMarkerChannel),
            "ReceiverChannel" => Ok(EntityKind::ReceiverChannel),
            "Qubit" => Ok(EntityKind::Qubit),
            "Measurement" => Ok(EntityKind::Measurement),
            "Edge" => Ok(EntityKind::Edge),
            "MicrowaveSource" => Ok(EntityKind::MicrowaveSource),
            other => Err(ModelError::UnknownKind(other.to_string())),
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A reference-valued field pointing at another entity.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum RefField {
    /// Physical channel backing a logical channel.
    PhysChan,
    /// Microwave source feeding a physical channel.
    Generator,
    /// Digitizer trigger marker of a measurement.
    TrigChan,
    /// Gate marker of a measurement.
    GateChan,
    /// Receiver channel of a measurement.
    ReceiverChan,
    /// Source qubit of an edge.
    Source,
    /// Target qubit of an edge.
    Target,
}

impl RefField {
    /// Stable string name used by the persistence layer.
    pub fn as_str(&self) -> &'static str {
        match self {
            RefField::PhysChan => "phys_chan",
            RefField::Generator => "generator",
            RefField::TrigChan => "trig_chan",
            RefField::GateChan => "gate_chan",
            RefField::ReceiverChan => "receiver_chan",
            RefField::Source => "source",
            RefField::Target => "target",
        }
    }
}

impl FromStr for RefField {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "phys_chan" => Ok(RefField::PhysChan),
            "generator" => Ok(RefField::Generator),
            "trig_chan" => Ok(RefField::TrigChan),
            "gate_chan" => Ok(RefField::GateChan),
            "receiver_chan" => Ok(RefField::ReceiverChan),
            "source" => Ok(RefField::Source),
            "target" => Ok(RefField::Target),
            other => Err(ModelError::UnknownRefField(other.to_string())),
        }
    }
}

impl fmt::Display for RefField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Opaque scalar parameter payload (instrument names, powers, pulse
/// parameter maps, ...). The library copies it verbatim and never
/// interprets it.
pub type Params = serde_json::Map<String, serde_json::Value>;

/// A channel entity: one record in the library's object graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    /// Store-assigned identity (0 until inserted).
    pub id: EntityId,

    /// Human-facing name, unique within an active workspace.
    pub label: String,

    /// Variant discriminator.
    pub kind: EntityKind,

    /// Owning snapshot. Exactly one owner at a time.
    pub snapshot: SnapshotId,

    /// Set reference fields. Fields absent from the map are unset.
    pub refs: BTreeMap<RefField, EntityId>,

    /// Opaque scalar payload.
    pub params: Params,
}

impl Entity {
    /// Create a new, not-yet-persisted entity attached to a snapshot.
    pub fn new(kind: EntityKind, label: impl Into<String>, snapshot: SnapshotId) -> Self {
        Self {
            id: EntityId(0),
            label: label.into(),
            kind,
            snapshot,
            refs: BTreeMap::new(),
            params: Params::new(),
        }
    }

    /// Attach a scalar parameter (builder style).
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    /// Get a reference field, or `None` if unset.
    pub fn get_ref(&self, field: RefField) -> Option<EntityId> {
        self.refs.get(&field).copied()
    }

    /// Set a reference field to point at another entity.
    ///
    /// Fails if `field` is not part of this kind's schema.
    pub fn set_ref(&mut self, field: RefField, target: EntityId) -> Result<(), ModelError> {
        if !self.kind.ref_fields().contains(&field) {
            return Err(ModelError::FieldNotInSchema {
                kind: self.kind.name().to_string(),
                field: field.as_str().to_string(),
            });
        }
        self.refs.insert(field, target);
        Ok(())
    }

    /// Unset a reference field. Returns the previous target, if any.
    pub fn clear_ref(&mut self, field: RefField) -> Option<EntityId> {
        self.refs.remove(&field)
    }

    /// Whether this entity belongs to the channel collection (as opposed
    /// to the source collection) of its snapshot.
    pub fn is_channel(&self) -> bool {
        !self.kind.is_source()
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.kind.name(), self.label)
    }
}
