//! Store-owned work item records.

use crate::error::{ModelError, ModelResult};
use crate::ids::{RecordId, Revision};
use crate::value::FieldValue;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Validation status of a field as reported by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FieldStatus {
    /// The value is acceptable.
    #[default]
    Valid,
    /// A required field is empty.
    InvalidEmpty,
    /// The value does not match the field's pattern or format.
    InvalidFormat,
    /// The value is not in the allowed values list.
    InvalidListValue,
    /// The value has the wrong type.
    InvalidType,
    /// The value exceeds the maximum length.
    InvalidTooLong,
    /// A computed field was written.
    InvalidComputedField,
    /// Any other rule violation.
    InvalidUnknown,
}

impl FieldStatus {
    /// Returns true unless the status is `Valid`.
    pub fn is_invalid(&self) -> bool {
        !matches!(self, FieldStatus::Valid)
    }
}

/// A single field on a remote record, with the metadata the store tracks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteField {
    /// Display name.
    pub name: String,
    /// Reference name (e.g. `System.Title`).
    pub reference_name: String,
    /// Current value, including local edits.
    #[serde(default)]
    pub value: FieldValue,
    /// Value at the record's revision, before local edits.
    #[serde(default)]
    pub original_value: FieldValue,
    /// Value the server will fill in when the field is left empty.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server_default: Option<FieldValue>,
    /// Validation status.
    #[serde(default)]
    pub status: FieldStatus,
    /// Whether the field must have a value.
    #[serde(default)]
    pub is_required: bool,
    /// Whether a client can write the field.
    #[serde(default = "default_true")]
    pub is_editable: bool,
    /// Whether the value differs from `original_value`.
    #[serde(default)]
    pub is_dirty: bool,
    /// Whether the server computes the value.
    #[serde(default)]
    pub is_computed: bool,
    /// Whether the value was set by a local edit.
    #[serde(default)]
    pub is_changed_by_user: bool,
    /// Whether the value changed in this revision.
    #[serde(default)]
    pub is_changed_in_revision: bool,
    /// Whether the value matches the field's pattern, if it has one.
    #[serde(default = "default_true")]
    pub has_pattern_match: bool,
    /// Whether only `allowed_values` may be stored.
    #[serde(default)]
    pub is_limited_to_allowed_values: bool,
    /// Allowed values list.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub allowed_values: Vec<String>,
    /// Allowed identities for identity fields.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub identity_allowed_values: Vec<String>,
    /// Values the field may never hold.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub prohibited_values: Vec<String>,
}

fn default_true() -> bool {
    true
}

impl RemoteField {
    /// Creates an editable, valid field whose reference name equals its name.
    pub fn new(name: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        let name = name.into();
        let value = value.into();
        Self {
            reference_name: name.clone(),
            name,
            original_value: value.clone(),
            value,
            server_default: None,
            status: FieldStatus::Valid,
            is_required: false,
            is_editable: true,
            is_dirty: false,
            is_computed: false,
            is_changed_by_user: false,
            is_changed_in_revision: false,
            has_pattern_match: true,
            is_limited_to_allowed_values: false,
            allowed_values: Vec::new(),
            identity_allowed_values: Vec::new(),
            prohibited_values: Vec::new(),
        }
    }

    /// Sets the reference name.
    pub fn with_reference_name(mut self, reference_name: impl Into<String>) -> Self {
        self.reference_name = reference_name.into();
        self
    }

    /// Marks the field as required.
    pub fn required(mut self) -> Self {
        self.is_required = true;
        self
    }

    /// Marks the field as computed and read-only.
    pub fn computed(mut self) -> Self {
        self.is_computed = true;
        self.is_editable = false;
        self
    }

    /// Sets the server default value.
    pub fn with_server_default(mut self, value: impl Into<FieldValue>) -> Self {
        self.server_default = Some(value.into());
        self
    }

    /// Restricts the field to the given values.
    pub fn with_allowed_values<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_values = values.into_iter().map(Into::into).collect();
        self.is_limited_to_allowed_values = true;
        self
    }

    /// The value the field will hold after a save: the current value, or the
    /// server default when the current value is empty.
    pub fn value_with_server_default(&self) -> FieldValue {
        match (&self.value, &self.server_default) {
            (v, Some(default)) if v.is_empty() => default.clone(),
            (v, _) => v.clone(),
        }
    }

    /// Whether the field carries an allowed values list.
    pub fn has_allowed_values_list(&self) -> bool {
        !self.allowed_values.is_empty()
    }

    /// Whether the current value satisfies the allowed values list.
    pub fn value_is_allowed(&self) -> bool {
        if !self.is_limited_to_allowed_values || self.value.is_empty() {
            return true;
        }
        let text = self.value.to_string();
        self.allowed_values.iter().any(|v| *v == text)
    }
}

/// A work item as held by the remote store.
///
/// Records are mutable: local edits go through [`RemoteRecord::set_value`]
/// and are pushed back with a save. The store decides whether the result is
/// valid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteRecord {
    /// Work item id.
    pub id: RecordId,
    /// Revision this record was read at.
    pub revision: Revision,
    /// Work item type name (e.g. `Bug`).
    pub work_item_type: String,
    /// Identity that made the last change, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub changed_by: Option<String>,
    /// Fields keyed by name.
    #[serde(default)]
    pub fields: BTreeMap<String, RemoteField>,
}

impl RemoteRecord {
    /// Creates a record with no fields.
    pub fn new(id: u32, revision: u32, work_item_type: impl Into<String>) -> Self {
        Self {
            id: RecordId(id),
            revision: Revision(revision),
            work_item_type: work_item_type.into(),
            changed_by: None,
            fields: BTreeMap::new(),
        }
    }

    /// Adds a field, replacing any field with the same name.
    pub fn with_field(mut self, field: RemoteField) -> Self {
        self.fields.insert(field.name.clone(), field);
        self
    }

    /// Adds a plain text field.
    pub fn with_value(self, name: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.with_field(RemoteField::new(name, value))
    }

    /// Looks up a field by name.
    pub fn field(&self, name: &str) -> Option<&RemoteField> {
        self.fields.get(name)
    }

    /// Returns the current value of a field.
    pub fn value(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name).map(|f| &f.value)
    }

    /// Current values of every field.
    pub fn field_values(&self) -> BTreeMap<String, FieldValue> {
        self.fields
            .iter()
            .map(|(name, field)| (name.clone(), field.value.clone()))
            .collect()
    }

    /// Edits a field locally. The change is not visible to the store until
    /// the record is saved.
    pub fn set_value(&mut self, name: &str, value: impl Into<FieldValue>) -> ModelResult<()> {
        let id = self.id;
        let field = self.fields.get_mut(name).ok_or_else(|| ModelError::UnknownField {
            id,
            field: name.to_string(),
        })?;
        if !field.is_editable || field.is_computed {
            return Err(ModelError::ReadOnlyField {
                id,
                field: name.to_string(),
            });
        }
        field.value = value.into();
        field.is_dirty = field.value != field.original_value;
        field.is_changed_by_user = true;
        Ok(())
    }

    /// Whether any field has unsaved edits.
    pub fn is_dirty(&self) -> bool {
        self.fields.values().any(|f| f.is_dirty)
    }

    /// Fields the store flagged invalid, or that break their own constraints.
    pub fn invalid_fields(&self) -> impl Iterator<Item = &RemoteField> {
        self.fields.values().filter(|f| {
            f.status.is_invalid()
                || (f.is_required && f.value_with_server_default().is_empty())
                || !f.value_is_allowed()
        })
    }
}
