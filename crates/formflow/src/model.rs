// File: src/model.rs
// Purpose: Persistent model declarations and the mapping from clean records to rows

use crate::error::{DefinitionError, PersistenceError, PersistenceResult};
use crate::field::{FieldKind, FieldSpec};
use crate::hasher;
use crate::record::CleanRecord;
use crate::value::Value;
use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;
use std::collections::HashSet;

/// A value as it sits in a storage column
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum StoredValue {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
}

impl StoredValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            StoredValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            StoredValue::Integer(n) => Some(*n),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, StoredValue::Null)
    }
}

/// Storage class of a column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Integer,
    Real,
    Text,
}

impl ColumnType {
    pub fn for_kind(kind: &FieldKind) -> Self {
        match kind {
            FieldKind::Integer(_) | FieldKind::Boolean | FieldKind::TriState => ColumnType::Integer,
            FieldKind::Float(_) => ColumnType::Real,
            _ => ColumnType::Text,
        }
    }
}

/// One-way transformation applied before a value is stored
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transform {
    /// Argon2id
    Hash,
}

/// A model column: the field it validates as, plus storage options
#[derive(Debug, Clone)]
pub struct ColumnSpec {
    pub field: FieldSpec,
    pub unique: bool,
    pub nullable: bool,
    pub default: Option<StoredValue>,
    /// Whether model-derived forms may include this column
    pub editable: bool,
    pub transform: Option<Transform>,
}

impl ColumnSpec {
    pub fn new(field: FieldSpec) -> Self {
        Self {
            field,
            unique: false,
            nullable: false,
            default: None,
            editable: true,
            transform: None,
        }
    }

    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    /// Column may hold NULL; the derived form field becomes optional
    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self.field.required = false;
        self
    }

    pub fn default(mut self, value: StoredValue) -> Self {
        self.default = Some(value);
        self
    }

    pub fn not_editable(mut self) -> Self {
        self.editable = false;
        self
    }

    pub fn hashed(mut self) -> Self {
        self.transform = Some(Transform::Hash);
        self
    }

    pub fn name(&self) -> &str {
        &self.field.name
    }

    pub fn column_type(&self) -> ColumnType {
        ColumnType::for_kind(&self.field.kind)
    }

    pub fn is_hashed(&self) -> bool {
        self.transform == Some(Transform::Hash)
    }
}

impl From<FieldSpec> for ColumnSpec {
    fn from(field: FieldSpec) -> Self {
        ColumnSpec::new(field)
    }
}

/// A persistent model: a table and its ordered columns
///
/// The column list is the allow-list for persistence: record fields without
/// a column are never written.
#[derive(Debug, Clone)]
pub struct ModelSpec {
    name: String,
    columns: Vec<ColumnSpec>,
}

impl ModelSpec {
    /// Declare a model; `name` is also its table name
    pub fn new(name: impl Into<String>, columns: Vec<ColumnSpec>) -> Result<Self, DefinitionError> {
        let name = name.into();
        let mut seen = HashSet::new();

        for column in &columns {
            column.field.check()?;

            if column.name() == "id" {
                return Err(DefinitionError::ReservedColumn { model: name });
            }
            if !seen.insert(column.name().to_string()) {
                return Err(DefinitionError::DuplicateField {
                    schema: name,
                    field: column.name().to_string(),
                });
            }
            if column.field.is_secret() && !column.is_hashed() {
                return Err(DefinitionError::PlaintextSecret {
                    model: name,
                    column: column.name().to_string(),
                });
            }
        }

        Ok(Self { name, columns })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn table(&self) -> &str {
        &self.name
    }

    pub fn columns(&self) -> &[ColumnSpec] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&ColumnSpec> {
        self.columns.iter().find(|c| c.name() == name)
    }

    /// Whether `name` is a column or the implicit `id`
    pub fn has_column(&self, name: &str) -> bool {
        name == "id" || self.column(name).is_some()
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(ColumnSpec::name).collect()
    }
}

/// A stored row of some model
#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    pub model: String,
    pub id: i64,
    pub values: Vec<(String, StoredValue)>,
}

impl Entity {
    pub fn get(&self, column: &str) -> Option<&StoredValue> {
        self.values
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
    }

    pub fn text(&self, column: &str) -> Option<&str> {
        self.get(column).and_then(StoredValue::as_str)
    }

    pub fn integer(&self, column: &str) -> Option<i64> {
        self.get(column).and_then(StoredValue::as_i64)
    }

    /// Boolean column; NULL and missing read as false
    pub fn flag(&self, column: &str) -> bool {
        self.integer(column).map(|n| n != 0).unwrap_or(false)
    }
}

impl Serialize for Entity {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.values.len() + 1))?;
        map.serialize_entry("id", &self.id)?;
        for (name, value) in &self.values {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// Storage form of a plain (non-secret) value
pub fn to_stored(value: &Value) -> StoredValue {
    match value {
        Value::Null | Value::TriState(None) => StoredValue::Null,
        Value::Integer(n) => StoredValue::Integer(*n),
        Value::Bool(b) | Value::TriState(Some(b)) => StoredValue::Integer(i64::from(*b)),
        Value::Float(n) => StoredValue::Real(*n),
        Value::Choices(items) => {
            StoredValue::Text(serde_json::Value::from(items.clone()).to_string())
        }
        Value::Secret(_) => StoredValue::Null,
        other => StoredValue::Text(other.to_string()),
    }
}

/// Storage value for one column, hashing it when the column asks for it
///
/// Returns `None` when the record carries nothing to write for the column
/// (a blank optional secret).
fn column_value(
    model: &ModelSpec,
    column: &ColumnSpec,
    value: &Value,
) -> PersistenceResult<Option<StoredValue>> {
    if column.is_hashed() {
        let plain = match value {
            Value::Secret(secret) => secret.expose(),
            Value::Text(text) => text.as_str(),
            _ => return Ok(Some(to_stored(value))),
        };
        if plain.is_empty() {
            return Ok(None);
        }
        return hasher::hash_password(plain).map(|hash| Some(StoredValue::Text(hash)));
    }

    if value.as_secret().is_some() {
        return Err(PersistenceError::UnhashedSecret {
            model: model.name().to_string(),
            column: column.name().to_string(),
        });
    }

    Ok(Some(to_stored(value)))
}

/// Full row for an insert, in column order
///
/// Columns absent from the record (or null there) fall back to their
/// default, then to NULL when nullable.
pub fn prepare_insert(
    model: &ModelSpec,
    record: &CleanRecord,
) -> PersistenceResult<Vec<(String, StoredValue)>> {
    let mut row = Vec::with_capacity(model.columns().len());

    for column in model.columns() {
        let provided = match record.get(column.name()) {
            Some(value) => column_value(model, column, value)?,
            None => None,
        }
        .filter(|stored| !stored.is_null());

        let stored = match (provided, &column.default) {
            (Some(stored), _) => stored,
            (None, Some(default)) => default.clone(),
            (None, None) if column.nullable => StoredValue::Null,
            (None, None) => {
                return Err(PersistenceError::MissingValue {
                    model: model.name().to_string(),
                    column: column.name().to_string(),
                })
            }
        };

        row.push((column.name().to_string(), stored));
    }

    Ok(row)
}

/// Changed columns for an update: only those the record carries
pub fn prepare_update(
    model: &ModelSpec,
    record: &CleanRecord,
) -> PersistenceResult<Vec<(String, StoredValue)>> {
    let mut row = Vec::new();

    for column in model.columns() {
        let Some(value) = record.get(column.name()) else {
            continue;
        };
        let Some(stored) = column_value(model, column, value)? else {
            continue;
        };
        if stored.is_null() && !column.nullable {
            return Err(PersistenceError::MissingValue {
                model: model.name().to_string(),
                column: column.name().to_string(),
            });
        }
        row.push((column.name().to_string(), stored));
    }

    Ok(row)
}
