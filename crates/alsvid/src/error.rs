//! Error handling for the channel library.

use thiserror::Error;

use alsvid_model::ModelError;
use alsvid_store::StoreError;

/// Result type for library operations.
pub type LibResult<T> = Result<T, LibError>;

/// Errors that can occur during channel library operations.
#[derive(Error, Debug)]
pub enum LibError {
    /// Snapshot not found for `load_by_id`.
    #[error("Snapshot not found: {0}")]
    SnapshotNotFound(i64),

    /// Label lookup against the active workspace missed.
    #[error("Channel not found: {0}")]
    ChannelNotFound(String),

    /// No edge connects the qubit pair in either direction.
    #[error("Edge ({source}, {target}) not found in connectivity graph")]
    EdgeNotFound { r#source: String, target: String },

    /// A second entity with the same label was about to enter the
    /// active workspace.
    #[error("Duplicate label in active workspace: {0}")]
    DuplicateLabel(String),

    /// A fetch-or-create factory found the label bound to a different
    /// entity kind.
    #[error("Label {label} is a {found}, expected {expected}")]
    KindMismatch {
        label: String,
        expected: String,
        found: String,
    },

    /// Marker channel index outside the instrument's range.
    #[error("Marker channel index out of range: m{0}")]
    MarkerOutOfRange(u8),

    /// Receiver channel index outside the digitizer's range.
    #[error("Receiver channel index out of range: {0}")]
    ReceiverOutOfRange(u8),

    /// `save()` called before any snapshot name was established.
    #[error("No save target: call save_as or load a snapshot first")]
    NoSaveTarget,

    /// Configuration document error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Persistence error.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Model error.
    #[error("Model error: {0}")]
    Model(#[from] ModelError),
}
