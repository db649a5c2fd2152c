// File: src/schema.rs
// Purpose: Record schemas (ordered, uniquely named fields) and model-derived form metadata

use crate::error::DefinitionError;
use crate::field::{FieldSpec, Widget};
use crate::model::ModelSpec;
use std::collections::{HashMap, HashSet};

/// An ordered set of uniquely named fields
#[derive(Debug, Clone)]
pub struct RecordSchema {
    name: String,
    fields: Vec<FieldSpec>,
}

impl RecordSchema {
    /// Build a schema, rejecting duplicate names and misapplied constraints
    pub fn new(name: impl Into<String>, fields: Vec<FieldSpec>) -> Result<Self, DefinitionError> {
        let name = name.into();
        let mut seen = HashSet::new();

        for field in &fields {
            field.check()?;
            if !seen.insert(field.name.as_str()) {
                return Err(DefinitionError::DuplicateField {
                    schema: name,
                    field: field.name.clone(),
                });
            }
        }

        Ok(Self { name, fields })
    }

    /// Derive a schema from a model's columns, the way a model form does
    ///
    /// Fields come in `meta.fields` order (all editable columns when none are
    /// listed). A `declared` field replaces the model-derived one of the same
    /// name; declared fields the model lacks are appended.
    pub fn from_model(
        model: &ModelSpec,
        meta: &FormMeta,
        declared: Vec<FieldSpec>,
    ) -> Result<Self, DefinitionError> {
        let mut declared: Vec<Option<FieldSpec>> = declared.into_iter().map(Some).collect();
        let mut take_declared = |name: &str| {
            declared
                .iter_mut()
                .find(|slot| slot.as_ref().map(|f| f.name == name).unwrap_or(false))
                .and_then(Option::take)
        };

        let names: Vec<String> = match &meta.fields {
            Some(names) => names.clone(),
            None => model
                .columns()
                .iter()
                .filter(|c| c.editable)
                .map(|c| c.name().to_string())
                .collect(),
        };

        let mut fields = Vec::with_capacity(names.len());
        for name in &names {
            let field = match take_declared(name) {
                Some(field) => field,
                None => match model.column(name) {
                    Some(column) if column.editable => column.field.clone(),
                    _ => {
                        return Err(DefinitionError::UnknownColumn {
                            model: model.name().to_string(),
                            name: name.clone(),
                        })
                    }
                },
            };
            fields.push(meta.apply(field));
        }

        fields.extend(declared.into_iter().flatten().map(|f| meta.apply(f)));

        Self::new(model.name(), fields)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn field_names(&self) -> Vec<&str> {
        self.fields.iter().map(|f| f.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Presentation overrides for a model-derived form
#[derive(Debug, Clone, Default)]
pub struct FormMeta {
    /// Columns to include, in order; `None` means every editable column
    pub fields: Option<Vec<String>>,
    pub labels: HashMap<String, String>,
    pub widgets: HashMap<String, Widget>,
    pub help_texts: HashMap<String, String>,
    /// field -> error code -> message
    pub error_messages: HashMap<String, HashMap<String, String>>,
}

impl FormMeta {
    pub fn new(fields: &[&str]) -> Self {
        Self {
            fields: Some(fields.iter().map(|f| f.to_string()).collect()),
            ..Default::default()
        }
    }

    /// Include every editable column
    pub fn all() -> Self {
        Self::default()
    }

    pub fn label(mut self, field: &str, label: &str) -> Self {
        self.labels.insert(field.to_string(), label.to_string());
        self
    }

    pub fn widget(mut self, field: &str, widget: Widget) -> Self {
        self.widgets.insert(field.to_string(), widget);
        self
    }

    pub fn help_text(mut self, field: &str, text: &str) -> Self {
        self.help_texts.insert(field.to_string(), text.to_string());
        self
    }

    pub fn error_message(mut self, field: &str, code: &str, message: &str) -> Self {
        self.error_messages
            .entry(field.to_string())
            .or_default()
            .insert(code.to_string(), message.to_string());
        self
    }

    fn apply(&self, mut field: FieldSpec) -> FieldSpec {
        if let Some(label) = self.labels.get(&field.name) {
            field.label = Some(label.clone());
        }
        if let Some(widget) = self.widgets.get(&field.name) {
            field.widget = *widget;
        }
        if let Some(text) = self.help_texts.get(&field.name) {
            field.help_text = Some(text.clone());
        }
        if let Some(messages) = self.error_messages.get(&field.name) {
            field
                .error_messages
                .extend(messages.iter().map(|(k, v)| (k.clone(), v.clone())));
        }
        field
    }
}
