//! Alsvid — versioned channel library for quantum experiment control
//!
//! Alsvid maintains a persisted, named graph of typed channel entities
//! (qubits, physical I/O channels, markers, receivers, microwave
//! sources) describing how an experiment's signal paths map onto
//! physical instruments.
//!
//! # Core Components
//!
//! - **Clone engine** ([`clone_into`]): copy a set of interlinked
//!   entities into a new snapshot while rewriting every inter-entity
//!   reference to the corresponding copy
//! - **Channel library** ([`ChannelLibrary`]): the active workspace
//!   experiment code mutates, with `save_as`/`load` snapshot lifecycle
//!   and a label-keyed dictionary façade
//! - **Connectivity graph** ([`ConnectivityGraph`]): derived directed
//!   graph of qubit-to-qubit edges for routing and topology queries
//! - **Factories** ([`factory`]): fetch-or-create channel factories and
//!   instrument linking helpers; [`instrument`] adds APS2/X6 channel
//!   group builders
//!
//! # Example
//!
//! ```rust
//! use alsvid::{ChannelLibrary, factory};
//!
//! let mut lib = ChannelLibrary::in_memory().unwrap();
//!
//! let q1 = factory::new_qubit(&mut lib, "q1").unwrap();
//! let q2 = factory::new_qubit(&mut lib, "q2").unwrap();
//! factory::new_edge(&mut lib, q1.id, q2.id).unwrap();
//!
//! lib.build_connectivity_graph().unwrap();
//! // Edges are stored directed but looked up symmetrically.
//! let edge = factory::edge_factory(&lib, q2.id, q1.id).unwrap();
//! assert_eq!(edge.label, "q1-q2");
//!
//! // Export the workspace as an immutable snapshot.
//! let snap = lib.save_as("first_cal").unwrap();
//! assert_eq!(snap.label, "first_cal");
//! ```

pub mod clone;
pub mod config;
pub mod error;
pub mod factory;
pub mod graph;
pub mod instrument;
pub mod library;

pub use clone::{CloneOutput, clone_into};
pub use config::StartupConfig;
pub use error::{LibError, LibResult};
pub use graph::ConnectivityGraph;
pub use instrument::{Aps2, TriggerSource, X6};
pub use library::ChannelLibrary;

pub use alsvid_model::{
    ACTIVE_LABEL, Entity, EntityId, EntityKind, Params, RefField, SnapshotId, SnapshotMeta,
};
pub use alsvid_store::{ChannelStore, SqliteStore};
