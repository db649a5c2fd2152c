// File: src/form.rs
// Purpose: The validation pass, and forms that add custom cleaning hooks to a schema

use crate::error::{DefinitionError, FieldError};
use crate::form_context::FormContext;
use crate::raw_input::RawInput;
use crate::record::{CleanRecord, ValidationErrors};
use crate::schema::RecordSchema;
use crate::validation::{message_for, validate_field};
use crate::value::Value;
use std::fmt;
use tracing::debug;

/// Post-validation hook for one field: may replace the value or reject it
pub type FieldCleaner = Box<dyn Fn(Value) -> Result<Value, String> + Send + Sync>;

/// Cross-field hook; sees the fields that validated and may add errors
pub type FormCleaner = Box<dyn Fn(&CleanRecord, &mut ValidationErrors) + Send + Sync>;

/// Validate raw input against a schema
///
/// Every field is checked in schema order and all errors are collected.
/// A clean record is returned only when no field failed.
pub fn run(schema: &RecordSchema, raw: &RawInput) -> Result<CleanRecord, ValidationErrors> {
    Form::new(schema.clone()).run(raw)
}

/// Outcome of handling one submission
#[derive(Debug)]
pub enum Submission<T> {
    /// Validation passed and the submission was processed
    Valid(T),
    /// Validation failed, contains errors and original form values
    Invalid(FormContext),
}

impl<T> Submission<T> {
    pub fn is_valid(&self) -> bool {
        matches!(self, Submission::Valid(_))
    }

    pub fn is_invalid(&self) -> bool {
        !self.is_valid()
    }

    /// Extract the processed value if validation passed
    pub fn ok(self) -> Option<T> {
        match self {
            Submission::Valid(value) => Some(value),
            Submission::Invalid(_) => None,
        }
    }

    /// Extract the form context if validation failed
    pub fn err(self) -> Option<FormContext> {
        match self {
            Submission::Valid(_) => None,
            Submission::Invalid(context) => Some(context),
        }
    }
}

/// A schema plus custom cleaning hooks
pub struct Form {
    schema: RecordSchema,
    field_cleaners: Vec<(String, FieldCleaner)>,
    form_cleaners: Vec<FormCleaner>,
}

impl Form {
    pub fn new(schema: RecordSchema) -> Self {
        Self {
            schema,
            field_cleaners: Vec::new(),
            form_cleaners: Vec::new(),
        }
    }

    /// Add a cleaner for one field, run after its built-in validation succeeds
    pub fn clean_field<F>(mut self, field: &str, cleaner: F) -> Result<Self, DefinitionError>
    where
        F: Fn(Value) -> Result<Value, String> + Send + Sync + 'static,
    {
        if self.schema.field(field).is_none() {
            return Err(DefinitionError::UnknownCleaner {
                field: field.to_string(),
            });
        }
        self.field_cleaners.push((field.to_string(), Box::new(cleaner)));
        Ok(self)
    }

    /// Add a form-wide cleaner, run after every field has been processed
    pub fn clean<F>(mut self, cleaner: F) -> Self
    where
        F: Fn(&CleanRecord, &mut ValidationErrors) + Send + Sync + 'static,
    {
        self.form_cleaners.push(Box::new(cleaner));
        self
    }

    pub fn schema(&self) -> &RecordSchema {
        &self.schema
    }

    pub fn name(&self) -> &str {
        self.schema.name()
    }

    /// Run the validation pass with this form's hooks
    pub fn run(&self, raw: &RawInput) -> Result<CleanRecord, ValidationErrors> {
        let mut record = CleanRecord::new();
        let mut errors = ValidationErrors::new();

        for field in self.schema.fields() {
            let cleaned = validate_field(field, raw.get(&field.name)).and_then(|value| {
                self.field_cleaners
                    .iter()
                    .filter(|(name, _)| *name == field.name)
                    .try_fold(value, |value, (_, cleaner)| {
                        cleaner(value).map_err(FieldError::Custom)
                    })
            });

            match cleaned {
                Ok(value) => record.insert(field.name.clone(), value),
                Err(error) => errors.add(field.name.clone(), message_for(field, &error)),
            }
        }

        for cleaner in &self.form_cleaners {
            cleaner(&record, &mut errors);
        }

        if errors.is_empty() {
            debug!(form = %self.name(), fields = record.len(), "validation passed");
            Ok(record)
        } else {
            debug!(form = %self.name(), errors = errors.len(), "validation failed");
            Err(errors)
        }
    }

    /// Like [`run`](Form::run), bundling errors with the submitted values
    pub fn run_with_context(&self, raw: &RawInput) -> Result<CleanRecord, FormContext> {
        self.run(raw)
            .map_err(|errors| FormContext::new(&self.schema, raw, errors))
    }
}

impl fmt::Debug for Form {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Form")
            .field("schema", &self.schema.name())
            .field("field_cleaners", &self.field_cleaners.len())
            .field("form_cleaners", &self.form_cleaners.len())
            .finish()
    }
}
