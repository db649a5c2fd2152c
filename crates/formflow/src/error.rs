// File: src/error.rs
// Purpose: Error types for field validation, schema definition, persistence and accounts

use thiserror::Error;

/// A single field's value violates one of its constraints
///
/// Every variant has a stable [`code`](FieldError::code) so that schemas can
/// override the message per field (`error_messages`).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FieldError {
    #[error("This field is required.")]
    Required,

    #[error("too short: ensure this value has at least {min} characters (it has {actual})")]
    TooShort { min: usize, actual: usize },

    #[error("too long: ensure this value has at most {max} characters (it has {actual})")]
    TooLong { max: usize, actual: usize },

    #[error("invalid email: enter a valid email address")]
    InvalidEmail,

    #[error("Enter a whole number.")]
    InvalidInteger,

    #[error("Enter a number.")]
    InvalidNumber,

    #[error("value too small: ensure this value is greater than or equal to {min}")]
    TooSmall { min: String },

    #[error("value too large: ensure this value is less than or equal to {max}")]
    TooLarge { max: String },

    #[error("Ensure that there are no more than {max} digits in total.")]
    MaxDigits { max: u32 },

    #[error("Ensure that there are no more than {max} decimal places.")]
    MaxDecimalPlaces { max: u32 },

    #[error("Ensure that there are no more than {max} digits before the decimal point.")]
    MaxWholeDigits { max: u32 },

    #[error("{}", .message.as_deref().unwrap_or("invalid format"))]
    InvalidFormat { message: Option<String> },

    #[error("Select a valid choice. {value} is not one of the available choices.")]
    InvalidChoice { value: String },

    #[error("Enter a list of values.")]
    InvalidList,

    #[error("Enter a valid date.")]
    InvalidDate,

    #[error("Enter a valid time.")]
    InvalidTime,

    #[error("Enter a valid date/time.")]
    InvalidDateTime,

    #[error("Enter a valid URL.")]
    InvalidUrl,

    #[error("Enter a valid \u{201c}slug\u{201d} consisting of letters, numbers, underscores or hyphens.")]
    InvalidSlug,

    #[error("Enter a valid IP address.")]
    InvalidIp,

    #[error("No file was submitted.")]
    InvalidFile,

    #[error("The submitted file is empty.")]
    EmptyFile,

    #[error("File extension \u{201c}{extension}\u{201d} is not allowed.")]
    InvalidExtension { extension: String },

    #[error("The submitted file is larger than {max} bytes.")]
    FileTooLarge { max: u64 },

    #[error("Upload a valid image. The file you uploaded was either not an image or a corrupted image.")]
    InvalidImage,

    /// Raised by field or form cleaners
    #[error("{0}")]
    Custom(String),
}

impl FieldError {
    /// Stable identifier used to look up message overrides
    pub fn code(&self) -> &'static str {
        match self {
            FieldError::Required => "required",
            FieldError::TooShort { .. } => "too_short",
            FieldError::TooLong { .. } => "too_long",
            FieldError::InvalidEmail => "invalid_email",
            FieldError::InvalidInteger | FieldError::InvalidNumber => "invalid",
            FieldError::TooSmall { .. } => "too_small",
            FieldError::TooLarge { .. } => "too_large",
            FieldError::MaxDigits { .. } => "max_digits",
            FieldError::MaxDecimalPlaces { .. } => "max_decimal_places",
            FieldError::MaxWholeDigits { .. } => "max_whole_digits",
            FieldError::InvalidFormat { .. } => "invalid_format",
            FieldError::InvalidChoice { .. } => "invalid_choice",
            FieldError::InvalidList => "invalid_list",
            FieldError::InvalidDate | FieldError::InvalidTime | FieldError::InvalidDateTime => {
                "invalid"
            }
            FieldError::InvalidUrl => "invalid_url",
            FieldError::InvalidSlug => "invalid_slug",
            FieldError::InvalidIp => "invalid_ip",
            FieldError::InvalidFile => "invalid_file",
            FieldError::EmptyFile => "empty_file",
            FieldError::InvalidExtension { .. } => "invalid_extension",
            FieldError::FileTooLarge { .. } => "file_too_large",
            FieldError::InvalidImage => "invalid_image",
            FieldError::Custom(_) => "custom",
        }
    }
}

/// A schema, model or admin declaration is inconsistent
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DefinitionError {
    #[error("field `{field}` is declared more than once in `{schema}`")]
    DuplicateField { schema: String, field: String },

    #[error("constraint `{constraint}` does not apply to field `{field}`")]
    InapplicableConstraint { field: String, constraint: &'static str },

    #[error("invalid pattern for field `{field}`: {reason}")]
    InvalidPattern { field: String, reason: String },

    #[error("`{name}` is not a field of `{schema}`")]
    UnknownField { schema: String, name: String },

    #[error("`{name}` is not a column of model `{model}`")]
    UnknownColumn { model: String, name: String },

    #[error("column `{column}` of model `{model}` is a secret and must be hashed")]
    PlaintextSecret { model: String, column: String },

    #[error("model `{model}` declares `id`, which is assigned by storage")]
    ReservedColumn { model: String },

    #[error("cleaner registered for unknown field `{field}`")]
    UnknownCleaner { field: String },

    #[error("model `{name}` is not registered")]
    UnknownModel { name: String },
}

/// Storing a clean record failed; nothing was written
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("a `{model}` with this value already exists")]
    Conflict { model: String },

    #[error("column `{column}` of `{model}` has no value and no default")]
    MissingValue { model: String, column: String },

    #[error("failed to hash secret value")]
    Hashing,

    #[error("secret value for column `{column}` of `{model}` would be stored unhashed")]
    UnhashedSecret { model: String, column: String },

    #[error("`{model}` with id {id} does not exist")]
    NotFound { model: String, id: i64 },

    #[error("`{column}` is not a column of `{model}`")]
    UnknownColumn { model: String, column: String },

    #[error("stored value for column `{column}` is malformed")]
    MalformedRow { column: String },
}

impl PersistenceError {
    /// Map a driver error, recognising uniqueness violations
    pub fn from_sqlx(model: &str, err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::Database(db) if db.is_unique_violation() => PersistenceError::Conflict {
                model: model.to_string(),
            },
            _ => PersistenceError::Database(err),
        }
    }
}

/// Account flow failures
#[derive(Debug, Error)]
pub enum AccountError {
    /// Unknown email, wrong password, or inactive account; deliberately vague
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("The password reset link is invalid or has expired")]
    InvalidResetToken,

    #[error("cannot move registration from {from} to {to}")]
    InvalidTransition { from: &'static str, to: &'static str },

    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}

pub type PersistenceResult<T> = Result<T, PersistenceError>;
pub type AccountResult<T> = Result<T, AccountError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_carry_the_keywords() {
        assert!(FieldError::TooLarge { max: "10".into() }
            .to_string()
            .starts_with("value too large"));
        assert!(FieldError::TooShort { min: 4, actual: 3 }
            .to_string()
            .starts_with("too short"));
        assert!(FieldError::TooLong { max: 5, actual: 6 }
            .to_string()
            .starts_with("too long"));
        assert!(FieldError::InvalidEmail.to_string().starts_with("invalid email"));
    }

    #[test]
    fn test_format_message_falls_back() {
        assert_eq!(FieldError::InvalidFormat { message: None }.to_string(), "invalid format");
        assert_eq!(
            FieldError::InvalidFormat { message: Some("Phone number must be 9-15 digits".into()) }
                .to_string(),
            "Phone number must be 9-15 digits"
        );
    }

    #[test]
    fn test_codes() {
        assert_eq!(FieldError::Required.code(), "required");
        assert_eq!(FieldError::TooLarge { max: "1".into() }.code(), "too_large");
        assert_eq!(FieldError::Custom("x".into()).code(), "custom");
    }
}
