//! Local, revision-tagged copies of remote records.

use crate::ids::{RecordId, Revision};
use crate::record::RemoteRecord;
use crate::value::FieldValue;
use serde::Serialize;
use std::collections::BTreeMap;

/// Identity of the remote record a snapshot mirrors.
///
/// Holds no reference to the record itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct RecordRef {
    /// Work item id.
    pub id: RecordId,
    /// Revision the snapshot was taken at.
    pub revision: Revision,
}

/// Field values of one remote record at exactly one revision.
///
/// A snapshot is only ever built from a whole record and only ever replaced
/// wholesale, so its fields can never mix revisions.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LocalSnapshot {
    record: RecordRef,
    work_item_type: String,
    fields: BTreeMap<String, FieldValue>,
}

impl LocalSnapshot {
    /// Copies every field value of `record` at its current revision.
    pub fn from_record(record: &RemoteRecord) -> Self {
        Self {
            record: RecordRef {
                id: record.id,
                revision: record.revision,
            },
            work_item_type: record.work_item_type.clone(),
            fields: record.field_values(),
        }
    }

    /// Replaces all of this snapshot's content with `record`'s.
    pub fn replace_from(&mut self, record: &RemoteRecord) {
        *self = Self::from_record(record);
    }

    /// The mirrored record's identity.
    pub fn record_ref(&self) -> RecordRef {
        self.record
    }

    /// Work item id.
    pub fn id(&self) -> RecordId {
        self.record.id
    }

    /// Revision the snapshot reflects.
    pub fn revision(&self) -> Revision {
        self.record.revision
    }

    /// Work item type name.
    pub fn work_item_type(&self) -> &str {
        &self.work_item_type
    }

    /// Looks up a field value.
    pub fn field(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    /// All field values keyed by name.
    pub fn fields(&self) -> &BTreeMap<String, FieldValue> {
        &self.fields
    }
}
