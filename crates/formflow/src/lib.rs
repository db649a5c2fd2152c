// Formflow - schema-driven form validation and model persistence
// Raw submissions in, clean records out, entities stored with hashed secrets

pub mod error;
pub mod value;
pub mod raw_input;

// Declaring forms and models
pub mod field;
pub mod schema;
pub mod model;
pub mod admin;
pub mod registry;

// Running submissions
pub mod validation;
pub mod record;
pub mod form;
pub mod form_context;
pub mod form_field;

// Storage and accounts
pub mod hasher;
pub mod database;
pub mod accounts;
pub mod config;

// Re-export core types
pub use error::{AccountError, DefinitionError, FieldError, PersistenceError};
pub use value::{Secret, UploadedFile, Value};
pub use raw_input::{RawInput, RawValue};
pub use field::{Choice, FieldKind, FieldSpec, Widget};
pub use schema::{FormMeta, RecordSchema};
pub use model::{ColumnSpec, Entity, ModelSpec, StoredValue};
pub use admin::{AdminSpec, ChangeList, ChangeListQuery};
pub use registry::Registry;
pub use record::{CleanRecord, ValidationErrors, NON_FIELD_ERRORS};
pub use form::{run, Form, Submission};
pub use form_context::FormContext;
pub use form_field::{FieldAttrs, FormField};
pub use database::{DatabaseType, ModelStore};
pub use accounts::{Accounts, RegistrationState, ResetLink};
pub use config::Config;

// Re-export the standalone validators
pub use formflow_validation as validators;
