// File: src/form_context.rs
// Purpose: Errors plus submitted values of a failed form, for re-rendering

use crate::raw_input::RawInput;
use crate::record::ValidationErrors;
use crate::schema::RecordSchema;
use serde::Serialize;
use std::collections::HashMap;

/// Context for forms that includes validation errors and original values
///
/// Values of secret fields are blanked so they are never echoed back.
#[derive(Debug, Clone, Default, Serialize)]
pub struct FormContext {
    /// Field names to error messages
    pub errors: ValidationErrors,
    /// Original field values submitted
    pub values: HashMap<String, String>,
}

impl FormContext {
    /// Create a form context from a failed pass over `raw`
    pub fn new(schema: &RecordSchema, raw: &RawInput, errors: ValidationErrors) -> Self {
        let mut values = raw.to_text_map();
        for field in schema.fields().iter().filter(|f| f.is_secret()) {
            if let Some(value) = values.get_mut(&field.name) {
                value.clear();
            }
        }

        Self { errors, values }
    }

    /// Create empty form context
    pub fn empty() -> Self {
        Self::default()
    }

    /// Check if field has an error
    pub fn has_error(&self, field: &str) -> bool {
        self.errors.has_error(field)
    }

    /// Get first error message for a field
    pub fn get_error(&self, field: &str) -> Option<&str> {
        self.errors.get_error(field)
    }

    /// Check if there are any errors
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Get original value for a field
    pub fn get_value(&self, field: &str) -> Option<&str> {
        self.values.get(field).map(|s| s.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::FieldSpec;

    fn schema() -> RecordSchema {
        RecordSchema::new(
            "registration",
            vec![
                FieldSpec::text("name"),
                FieldSpec::email("email"),
                FieldSpec::secret("password"),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_form_context_errors() {
        let mut errors = ValidationErrors::new();
        errors.add("email", "invalid email: enter a valid email address");

        let context = FormContext::new(&schema(), &RawInput::new().with("email", "nope"), errors);

        assert!(context.has_error("email"));
        assert!(context.get_error("email").unwrap().starts_with("invalid email"));
        assert!(context.has_errors());
        assert_eq!(context.get_value("email"), Some("nope"));
    }

    #[test]
    fn test_secret_values_are_blanked() {
        let raw = RawInput::new()
            .with("name", "Sam")
            .with("password", "hunter22");

        let context = FormContext::new(&schema(), &raw, ValidationErrors::new());

        assert_eq!(context.get_value("name"), Some("Sam"));
        assert_eq!(context.get_value("password"), Some(""));
    }

    #[test]
    fn test_empty_form_context() {
        let context = FormContext::empty();
        assert!(!context.has_errors());
        assert!(context.get_error("any").is_none());
        assert!(context.get_value("any").is_none());
    }
}
