//! End-to-end snapshot lifecycle tests: build a two-qubit channel set
//! with instrument helpers, save it, mutate, and load it back.

use alsvid::factory::{
    edge_factory, new_edge, new_qubit, new_source, set_control, set_measure, MeasureOpts,
};
use alsvid::{Aps2, ChannelLibrary, EntityKind, LibError, RefField, StartupConfig, X6};

fn two_qubit_setup(lib: &mut ChannelLibrary) {
    let q1 = new_qubit(lib, "q1").unwrap();
    let q2 = new_qubit(lib, "q2").unwrap();
    new_edge(lib, q1.id, q2.id).unwrap();

    let awg = Aps2::new(lib, "BBNAPS1").unwrap();
    let dig = X6::new(lib, "X6-1").unwrap();
    let src = new_source(lib, "Holz1", "HolzworthHS9000", "HS9004A-009-1", -30.0).unwrap();

    set_control(lib, q1.id, &awg, Some(src.id)).unwrap();
    set_measure(lib, q1.id, &awg, &dig, MeasureOpts::default()).unwrap();
}

#[test]
fn save_load_roundtrip_preserves_topology() {
    let mut lib = ChannelLibrary::in_memory().unwrap();
    two_qubit_setup(&mut lib);

    let count_before = lib.get_current_channels().unwrap().len();
    let snap = lib.save_as("nightly_cal").unwrap();

    // Mutate the workspace after saving; the snapshot must not change.
    new_qubit(&mut lib, "q3").unwrap();
    lib.load(snap.id).unwrap();

    let entities = lib.get_current_channels().unwrap();
    assert_eq!(entities.len(), count_before);
    assert!(entities.iter().all(|e| e.snapshot == lib.workspace().id));
    assert!(!entities.iter().any(|e| e.label == "q3"));

    // The control chain q1 -> BBNAPS1-12 -> Holz1 survived two clones.
    let q1 = entities.iter().find(|e| e.label == "q1").unwrap();
    let phys = lib.fetch(q1.get_ref(RefField::PhysChan).unwrap()).unwrap();
    assert_eq!(phys.label, "BBNAPS1-12");
    let r#gen = lib.fetch(phys.get_ref(RefField::Generator).unwrap()).unwrap();
    assert_eq!(r#gen.label, "Holz1");
    assert_eq!(r#gen.kind, EntityKind::MicrowaveSource);
    assert_eq!(r#gen.snapshot, lib.workspace().id);

    // Measurement wiring survived too.
    let meas = entities.iter().find(|e| e.label == "M-q1").unwrap();
    let trig = lib.fetch(meas.get_ref(RefField::TrigChan).unwrap()).unwrap();
    assert_eq!(trig.label, "digTrig-q1");
    let recv = lib
        .fetch(meas.get_ref(RefField::ReceiverChan).unwrap())
        .unwrap();
    assert_eq!(recv.label, "RecvChan-X6-1-1");
}

#[test]
fn connectivity_survives_load() {
    let mut lib = ChannelLibrary::in_memory().unwrap();
    two_qubit_setup(&mut lib);
    let snap = lib.save_as("cal").unwrap();
    lib.load(snap.id).unwrap();

    // Rebuild from scratch: the loaded workspace has fresh entity ids.
    lib.rebuild_connectivity_graph().unwrap();
    assert_eq!(lib.connectivity().node_count(), 2);
    assert_eq!(lib.connectivity().edge_count(), 1);

    let entities = lib.get_current_channels().unwrap();
    let q1 = entities.iter().find(|e| e.label == "q1").unwrap();
    let q2 = entities.iter().find(|e| e.label == "q2").unwrap();
    let edge = edge_factory(&lib, q2.id, q1.id).unwrap();
    assert_eq!(edge.label, "q1-q2");
    assert_eq!(edge.get_ref(RefField::Source), Some(q1.id));
}

#[test]
fn save_after_load_appends_history() {
    let mut lib = ChannelLibrary::in_memory().unwrap();
    two_qubit_setup(&mut lib);
    let first = lib.save_as("cal").unwrap();
    lib.load(first.id).unwrap();

    // save() targets the loaded snapshot's name and appends.
    lib.save().unwrap();
    let cals: Vec<_> = lib
        .list()
        .unwrap()
        .into_iter()
        .filter(|s| s.label == "cal")
        .collect();
    assert_eq!(cals.len(), 2);
    assert_ne!(cals[0].id, cals[1].id);
}

#[test]
fn file_backed_library_persists_snapshots() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("channels.sqlite");

    let snap_id = {
        let mut lib = ChannelLibrary::open(&path).unwrap();
        two_qubit_setup(&mut lib);
        lib.save_as("persisted").unwrap().id
    };

    // A new session sees the committed snapshot and can load it.
    let mut lib = ChannelLibrary::open(&path).unwrap();
    assert!(lib.list().unwrap().iter().any(|s| s.label == "persisted"));
    lib.load(snap_id).unwrap();
    assert!(lib
        .get_current_channels()
        .unwrap()
        .iter()
        .any(|e| e.label == "q1"));
}

#[test]
fn config_overrides_apply_after_setup() {
    let mut lib = ChannelLibrary::in_memory().unwrap();
    two_qubit_setup(&mut lib);

    let config = StartupConfig::from_str(
        r#"
        channels:
          Holz1:
            power: -18.5
          q1:
            frequency: 5.203e9
        "#,
    )
    .unwrap();
    alsvid::config::apply(&mut lib, &config).unwrap();

    let src = lib.find_by_label("Holz1").unwrap().unwrap();
    assert_eq!(src.params["power"], -18.5);
    let q1 = lib.find_by_label("q1").unwrap().unwrap();
    assert_eq!(q1.params["frequency"], 5.203e9);
}

#[test]
fn unknown_snapshot_fails_fast() {
    let mut lib = ChannelLibrary::in_memory().unwrap();
    assert!(matches!(
        lib.load_by_id(999),
        Err(LibError::SnapshotNotFound(999))
    ));
}
