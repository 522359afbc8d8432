//! Diagnostic description of record fields.

use crate::ids::{RecordId, Revision};
use crate::record::{FieldStatus, RemoteField, RemoteRecord};
use crate::value::FieldValue;
use serde::Serialize;

/// Metadata snapshot of one field, in the fixed shape used for audit logs.
///
/// Keys serialize in PascalCase so dumps line up with the store's own field
/// naming.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct FieldDescriptor {
    /// Owning work item id.
    pub work_item_id: RecordId,
    /// Owning work item revision.
    pub current_revision_work_item_rev: Revision,
    /// Owning work item type name.
    pub current_revision_work_item_type_name: String,
    /// Display name.
    pub name: String,
    /// Reference name.
    pub reference_name: String,
    /// Current value.
    pub value: FieldValue,
    /// Value before local edits.
    pub original_value: FieldValue,
    /// Value after server defaults are applied.
    pub value_with_server_default: FieldValue,
    /// Validation status.
    pub status: FieldStatus,
    /// Required flag.
    pub is_required: bool,
    /// Editable flag.
    pub is_editable: bool,
    /// Dirty flag.
    pub is_dirty: bool,
    /// Computed flag.
    pub is_computed: bool,
    /// Changed-by-user flag.
    pub is_changed_by_user: bool,
    /// Changed-in-revision flag.
    pub is_changed_in_revision: bool,
    /// Pattern match flag.
    pub has_pattern_match: bool,
    /// Limited-to-allowed-values flag.
    pub is_limited_to_allowed_values: bool,
    /// Whether an allowed values list exists.
    pub has_allowed_values_list: bool,
    /// Allowed values.
    pub allowed_values: Vec<String>,
    /// Allowed identities.
    pub identity_field_allowed_values: Vec<String>,
    /// Prohibited values.
    pub prohibited_values: Vec<String>,
}

impl FieldDescriptor {
    /// Describes one field of `record`.
    pub fn new(record: &RemoteRecord, field: &RemoteField) -> Self {
        Self {
            work_item_id: record.id,
            current_revision_work_item_rev: record.revision,
            current_revision_work_item_type_name: record.work_item_type.clone(),
            name: field.name.clone(),
            reference_name: field.reference_name.clone(),
            value: field.value.clone(),
            original_value: field.original_value.clone(),
            value_with_server_default: field.value_with_server_default(),
            status: field.status,
            is_required: field.is_required,
            is_editable: field.is_editable,
            is_dirty: field.is_dirty,
            is_computed: field.is_computed,
            is_changed_by_user: field.is_changed_by_user,
            is_changed_in_revision: field.is_changed_in_revision,
            has_pattern_match: field.has_pattern_match,
            is_limited_to_allowed_values: field.is_limited_to_allowed_values,
            has_allowed_values_list: field.has_allowed_values_list(),
            allowed_values: field.allowed_values.clone(),
            identity_field_allowed_values: field.identity_allowed_values.clone(),
            prohibited_values: field.prohibited_values.clone(),
        }
    }

    /// Describes every field of `record`, in field name order.
    pub fn describe(record: &RemoteRecord) -> Vec<Self> {
        record.fields.values().map(|f| Self::new(record, f)).collect()
    }

    /// Renders the descriptor as indented JSON.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
