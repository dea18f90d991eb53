//! Error handling for the data model.

use thiserror::Error;

/// Result type for model operations.
pub type ModelResult<T> = Result<T, ModelError>;

/// Errors that can occur while decoding model types.
#[derive(Error, Debug)]
pub enum ModelError {
    /// Unknown entity kind discriminator.
    #[error("Unknown entity kind: {0}")]
    UnknownKind(String),

    /// Unknown reference field name.
    #[error("Unknown reference field: {0}")]
    UnknownRefField(String),

    /// A reference field is not part of the entity kind's schema.
    #[error("Field {field} is not a reference field of {kind}")]
    FieldNotInSchema { kind: String, field: String },
}
