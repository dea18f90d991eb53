//! Factories and linking helpers for building a channel set.
//!
//! Every function takes the library handle explicitly; there is no
//! process-global current library. Fetch-or-create factories look a
//! label up in the active workspace and only create on a miss, so
//! calling one twice with the same label returns the same entity.

use serde_json::json;

use alsvid_model::{Entity, EntityId, EntityKind, RefField};

use crate::error::{LibError, LibResult};
use crate::instrument::{Aps2, TriggerSource, X6};
use crate::library::ChannelLibrary;

/// Create a new qubit channel in the active workspace.
pub fn new_qubit(lib: &mut ChannelLibrary, label: &str) -> LibResult<Entity> {
    lib.create(Entity::new(EntityKind::Qubit, label, lib.workspace().id))
}

/// Create a new microwave source in the active workspace.
pub fn new_source(
    lib: &mut ChannelLibrary,
    label: &str,
    source_type: &str,
    address: &str,
    power: f64,
) -> LibResult<Entity> {
    lib.create(
        Entity::new(EntityKind::MicrowaveSource, label, lib.workspace().id)
            .with_param("source_type", source_type)
            .with_param("address", address)
            .with_param("power", power),
    )
}

/// Create a new edge between two qubits, labelled
/// `<source>-<target>`. The stored direction is source to target.
pub fn new_edge(
    lib: &mut ChannelLibrary,
    source: EntityId,
    target: EntityId,
) -> LibResult<Entity> {
    let src = lib.fetch(source)?;
    let tgt = lib.fetch(target)?;
    let mut edge = Entity::new(
        EntityKind::Edge,
        format!("{}-{}", src.label, tgt.label),
        lib.workspace().id,
    );
    edge.set_ref(RefField::Source, source)?;
    edge.set_ref(RefField::Target, target)?;
    lib.create(edge)
}

fn fetch_or_create(lib: &mut ChannelLibrary, label: &str, kind: EntityKind) -> LibResult<Entity> {
    match lib.find_by_label(label)? {
        Some(existing) if existing.kind == kind => Ok(existing),
        Some(existing) => Err(LibError::KindMismatch {
            label: label.to_string(),
            expected: kind.name().to_string(),
            found: existing.kind.name().to_string(),
        }),
        None => lib.create(Entity::new(kind, label, lib.workspace().id)),
    }
}

/// Return the saved qubit with this label, or create a new one.
pub fn qubit_factory(lib: &mut ChannelLibrary, label: &str) -> LibResult<Entity> {
    fetch_or_create(lib, label, EntityKind::Qubit)
}

/// Return the saved measurement channel with this label, or create a
/// new one.
pub fn meas_factory(lib: &mut ChannelLibrary, label: &str) -> LibResult<Entity> {
    fetch_or_create(lib, label, EntityKind::Measurement)
}

/// Return the saved logical marker channel with this label, or create
/// a new one.
pub fn marker_factory(lib: &mut ChannelLibrary, label: &str) -> LibResult<Entity> {
    fetch_or_create(lib, label, EntityKind::LogicalMarkerChannel)
}

/// The edge connecting two qubits, looked up symmetrically in the
/// connectivity graph: the stored direction does not matter for the
/// lookup. Fails if no edge connects the pair in either direction.
pub fn edge_factory(
    lib: &ChannelLibrary,
    source: EntityId,
    target: EntityId,
) -> LibResult<Entity> {
    match lib.connectivity().edge_between(source, target) {
        Some(edge_id) => lib.fetch(edge_id),
        None => {
            let name = |id: EntityId| {
                lib.fetch(id)
                    .map(|e| e.label)
                    .unwrap_or_else(|_| id.to_string())
            };
            Err(LibError::EdgeNotFound {
                source: name(source),
                target: name(target),
            })
        }
    }
}

/// Drive a qubit from an AWG's quadrature pair, optionally feeding the
/// physical channel from a microwave source.
pub fn set_control(
    lib: &mut ChannelLibrary,
    qubit: EntityId,
    awg: &Aps2,
    generator: Option<EntityId>,
) -> LibResult<()> {
    let mut qubit = lib.fetch(qubit)?;
    qubit.set_ref(RefField::PhysChan, awg.chan12)?;
    lib.update(&qubit)?;

    if let Some(generator) = generator {
        let mut phys = lib.fetch(awg.chan12)?;
        phys.set_ref(RefField::Generator, generator)?;
        lib.update(&phys)?;
    }
    Ok(())
}

/// Options for [`set_measure`].
#[derive(Debug, Clone)]
pub struct MeasureOpts {
    /// Microwave source feeding the measurement channel, if any.
    pub generator: Option<EntityId>,
    /// Digitizer receiver channel (1-based).
    pub dig_channel: u8,
    /// AWG marker used as digitizer trigger (1-based).
    pub trig_channel: u8,
    /// Whether to create a gate marker channel.
    pub gate: bool,
    /// AWG marker used as gate (1-based).
    pub gate_channel: u8,
    /// Trigger pulse length in seconds.
    pub trigger_length: f64,
}

impl Default for MeasureOpts {
    fn default() -> Self {
        Self {
            generator: None,
            dig_channel: 1,
            trig_channel: 1,
            gate: false,
            gate_channel: 2,
            trigger_length: 1e-7,
        }
    }
}

/// Measure a qubit through an AWG and a digitizer.
///
/// Creates a `M-<qubit>` measurement channel wired to the AWG's
/// quadrature pair, a `digTrig-<qubit>` trigger marker on the chosen
/// AWG marker, and optionally a `M-<qubit>-gate` marker.
pub fn set_measure(
    lib: &mut ChannelLibrary,
    qubit: EntityId,
    awg: &Aps2,
    dig: &X6,
    opts: MeasureOpts,
) -> LibResult<Entity> {
    let qubit = lib.fetch(qubit)?;

    let mut trig = lib.create(
        Entity::new(
            EntityKind::LogicalMarkerChannel,
            format!("digTrig-{}", qubit.label),
            lib.workspace().id,
        )
        .with_param(
            "pulse_params",
            json!({"length": opts.trigger_length, "shape_fun": "constant"}),
        ),
    )?;
    trig.set_ref(RefField::PhysChan, awg.marker(opts.trig_channel)?)?;
    lib.update(&trig)?;

    let mut meas = Entity::new(
        EntityKind::Measurement,
        format!("M-{}", qubit.label),
        lib.workspace().id,
    );
    meas.set_ref(RefField::PhysChan, awg.chan12)?;
    meas.set_ref(RefField::TrigChan, trig.id)?;
    meas.set_ref(RefField::ReceiverChan, dig.receiver(opts.dig_channel)?)?;

    if opts.gate {
        let mut gate = lib.create(Entity::new(
            EntityKind::LogicalMarkerChannel,
            format!("M-{}-gate", qubit.label),
            lib.workspace().id,
        ))?;
        gate.set_ref(RefField::PhysChan, awg.marker(opts.gate_channel)?)?;
        lib.update(&gate)?;
        meas.set_ref(RefField::GateChan, gate.id)?;
    }

    let meas = lib.create(meas)?;

    if let Some(generator) = opts.generator {
        let mut phys = lib.fetch(awg.chan12)?;
        phys.set_ref(RefField::Generator, generator)?;
        lib.update(&phys)?;
    }

    Ok(meas)
}

/// Make an AWG the master trigger source: creates the `slave_trig`
/// marker channel on the chosen AWG marker and switches the AWG to
/// internal triggering.
pub fn set_master(
    lib: &mut ChannelLibrary,
    awg: &mut Aps2,
    trig_channel: u8,
    pulse_length: f64,
) -> LibResult<Entity> {
    let mut slave_trig = lib.create(
        Entity::new(
            EntityKind::LogicalMarkerChannel,
            "slave_trig",
            lib.workspace().id,
        )
        .with_param(
            "pulse_params",
            json!({"length": pulse_length, "shape_fun": "constant"}),
        ),
    )?;
    slave_trig.set_ref(RefField::PhysChan, awg.marker(trig_channel)?)?;
    lib.update(&slave_trig)?;

    awg.master = true;
    awg.trigger_source = TriggerSource::Internal;
    Ok(slave_trig)
}
