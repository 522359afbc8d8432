//! # wisync model
//!
//! Work item types shared by the wisync adapter and CLI.
//!
//! This crate provides:
//! - `RemoteRecord` and `RemoteField`, the store-owned mutable record
//! - `LocalSnapshot`, a revision-tagged copy of a record's field values
//! - `FieldDescriptor`, the fixed diagnostic view of one field
//! - `Project` and `ProjectData`
//!
//! This is a pure data crate with no I/O operations.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod descriptor;
mod error;
mod ids;
mod project;
mod record;
mod snapshot;
mod value;

pub use descriptor::FieldDescriptor;
pub use error::{ModelError, ModelResult};
pub use ids::{RecordId, Revision};
pub use project::{Project, ProjectData};
pub use record::{FieldStatus, RemoteField, RemoteRecord};
pub use snapshot::{LocalSnapshot, RecordRef};
pub use value::FieldValue;
