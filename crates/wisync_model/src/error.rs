//! Error types for the work item model.

use crate::ids::RecordId;
use thiserror::Error;

/// Result type for model operations.
pub type ModelResult<T> = Result<T, ModelError>;

/// Errors raised when editing a record locally.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ModelError {
    /// The record has no field with this name.
    #[error("work item {id} has no field named {field}")]
    UnknownField {
        /// Record that was edited.
        id: RecordId,
        /// Field name that was requested.
        field: String,
    },

    /// The field cannot be written by a client.
    #[error("field {field} on work item {id} is not editable")]
    ReadOnlyField {
        /// Record that was edited.
        id: RecordId,
        /// Field name that was requested.
        field: String,
    },
}
