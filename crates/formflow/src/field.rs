// File: src/field.rs
// Purpose: Field definitions: a kind with its constraint payload, plus display metadata

use crate::error::DefinitionError;
use formflow_validation::{anchored_regex, Decimal, IpProtocol};
use regex::Regex;
use std::collections::HashMap;

/// Optional character-length bounds
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Length {
    pub min: Option<usize>,
    pub max: Option<usize>,
}

/// Optional inclusive value bounds
#[derive(Debug, Clone, PartialEq)]
pub struct Bounds<T> {
    pub min: Option<T>,
    pub max: Option<T>,
}

impl<T> Default for Bounds<T> {
    fn default() -> Self {
        Self { min: None, max: None }
    }
}

/// Digit limits for decimal fields
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Precision {
    pub max_digits: Option<u32>,
    pub decimal_places: Option<u32>,
}

/// One allowed value of a choice field and its human label
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Choice {
    pub value: String,
    pub label: String,
}

impl Choice {
    pub fn new(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
        }
    }
}

/// Upload restrictions
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileRules {
    pub allowed_extensions: Option<Vec<String>>,
    pub max_size: Option<u64>,
    pub allow_empty: bool,
}

/// What a field holds, together with the rules for that kind
#[derive(Debug, Clone)]
pub enum FieldKind {
    Text(Length),
    Email(Length),
    Url(Length),
    Slug(Length),
    /// Passwords and other values that must never be echoed or stored in clear
    Secret(Length),
    /// Text that must fully match `regex`
    Pattern {
        regex: Regex,
        message: Option<String>,
        length: Length,
    },
    Integer(Bounds<i64>),
    Float(Bounds<f64>),
    Decimal {
        precision: Precision,
        bounds: Bounds<Decimal>,
    },
    Date,
    Time,
    DateTime,
    Boolean,
    TriState,
    Choice(Vec<Choice>),
    MultiChoice(Vec<Choice>),
    File(FileRules),
    Image(FileRules),
    IpAddress(IpProtocol),
}

impl FieldKind {
    /// Short name, used in logs and definition errors
    pub fn name(&self) -> &'static str {
        match self {
            FieldKind::Text(_) => "text",
            FieldKind::Email(_) => "email",
            FieldKind::Url(_) => "url",
            FieldKind::Slug(_) => "slug",
            FieldKind::Secret(_) => "secret",
            FieldKind::Pattern { .. } => "pattern",
            FieldKind::Integer(_) => "integer",
            FieldKind::Float(_) => "float",
            FieldKind::Decimal { .. } => "decimal",
            FieldKind::Date => "date",
            FieldKind::Time => "time",
            FieldKind::DateTime => "datetime",
            FieldKind::Boolean => "boolean",
            FieldKind::TriState => "tri_state",
            FieldKind::Choice(_) => "choice",
            FieldKind::MultiChoice(_) => "multi_choice",
            FieldKind::File(_) => "file",
            FieldKind::Image(_) => "image",
            FieldKind::IpAddress(_) => "ip_address",
        }
    }

    fn length_mut(&mut self) -> Option<&mut Length> {
        match self {
            FieldKind::Text(length)
            | FieldKind::Email(length)
            | FieldKind::Url(length)
            | FieldKind::Slug(length)
            | FieldKind::Secret(length)
            | FieldKind::Pattern { length, .. } => Some(length),
            _ => None,
        }
    }

    /// Widget used when none is configured
    pub fn default_widget(&self) -> Widget {
        match self {
            FieldKind::Text(_) | FieldKind::Slug(_) | FieldKind::Pattern { .. } => Widget::TextInput,
            FieldKind::Email(_) => Widget::EmailInput,
            FieldKind::Url(_) => Widget::UrlInput,
            FieldKind::Secret(_) => Widget::PasswordInput,
            FieldKind::Integer(_) | FieldKind::Float(_) | FieldKind::Decimal { .. } => {
                Widget::NumberInput
            }
            FieldKind::Date => Widget::DateInput,
            FieldKind::Time => Widget::TimeInput,
            FieldKind::DateTime => Widget::DateTimeInput,
            FieldKind::Boolean => Widget::CheckboxInput,
            FieldKind::TriState => Widget::NullBooleanSelect,
            FieldKind::Choice(_) => Widget::Select,
            FieldKind::MultiChoice(_) => Widget::SelectMultiple,
            FieldKind::File(_) | FieldKind::Image(_) => Widget::FileInput,
            FieldKind::IpAddress(_) => Widget::TextInput,
        }
    }
}

/// Rendering hint for the caller's templates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Widget {
    TextInput,
    Textarea,
    EmailInput,
    UrlInput,
    PasswordInput,
    NumberInput,
    DateInput,
    TimeInput,
    DateTimeInput,
    /// `<input type="datetime-local">`
    DateTimeLocalInput,
    CheckboxInput,
    NullBooleanSelect,
    Select,
    SelectMultiple,
    RadioSelect,
    FileInput,
    HiddenInput,
}

/// A named, typed field of a form or record
#[derive(Debug, Clone)]
pub struct FieldSpec {
    pub name: String,
    pub kind: FieldKind,
    pub required: bool,
    pub label: Option<String>,
    pub widget: Widget,
    pub help_text: Option<String>,
    /// Message overrides keyed by error code ("required", "too_long", ...)
    pub error_messages: HashMap<String, String>,
    misapplied: Vec<&'static str>,
}

impl FieldSpec {
    /// Create a required field of the given kind
    pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        let widget = kind.default_widget();
        Self {
            name: name.into(),
            kind,
            required: true,
            label: None,
            widget,
            help_text: None,
            error_messages: HashMap::new(),
            misapplied: Vec::new(),
        }
    }

    pub fn text(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Text(Length::default()))
    }

    pub fn email(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Email(Length::default()))
    }

    pub fn url(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Url(Length::default()))
    }

    pub fn slug(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Slug(Length::default()))
    }

    pub fn secret(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Secret(Length::default()))
    }

    /// Regex-constrained text; the pattern must match the whole value
    pub fn pattern(name: impl Into<String>, pattern: &str) -> Result<Self, DefinitionError> {
        let name = name.into();
        let regex = anchored_regex(pattern).map_err(|e| DefinitionError::InvalidPattern {
            field: name.clone(),
            reason: e.to_string(),
        })?;

        Ok(Self::new(
            name,
            FieldKind::Pattern {
                regex,
                message: None,
                length: Length::default(),
            },
        ))
    }

    pub fn integer(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Integer(Bounds::default()))
    }

    pub fn float(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Float(Bounds::default()))
    }

    pub fn decimal(name: impl Into<String>) -> Self {
        Self::new(
            name,
            FieldKind::Decimal {
                precision: Precision::default(),
                bounds: Bounds::default(),
            },
        )
    }

    pub fn date(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Date)
    }

    pub fn time(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Time)
    }

    pub fn datetime(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::DateTime)
    }

    pub fn boolean(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Boolean)
    }

    /// Yes / no / unknown; never fails as "required"
    pub fn tri_state(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::TriState)
    }

    pub fn choice(name: impl Into<String>, choices: Vec<Choice>) -> Self {
        Self::new(name, FieldKind::Choice(choices))
    }

    pub fn multi_choice(name: impl Into<String>, choices: Vec<Choice>) -> Self {
        Self::new(name, FieldKind::MultiChoice(choices))
    }

    pub fn file(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::File(FileRules::default()))
    }

    pub fn image(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Image(FileRules::default()))
    }

    pub fn ip_address(name: impl Into<String>, protocol: IpProtocol) -> Self {
        Self::new(name, FieldKind::IpAddress(protocol))
    }

    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn widget(mut self, widget: Widget) -> Self {
        self.widget = widget;
        self
    }

    pub fn help_text(mut self, text: impl Into<String>) -> Self {
        self.help_text = Some(text.into());
        self
    }

    /// Override the message for an error code
    pub fn error_message(mut self, code: impl Into<String>, message: impl Into<String>) -> Self {
        self.error_messages.insert(code.into(), message.into());
        self
    }

    pub fn min_length(mut self, min: usize) -> Self {
        match self.kind.length_mut() {
            Some(length) => length.min = Some(min),
            None => self.misapplied.push("min_length"),
        }
        self
    }

    pub fn max_length(mut self, max: usize) -> Self {
        match self.kind.length_mut() {
            Some(length) => length.max = Some(max),
            None => self.misapplied.push("max_length"),
        }
        self
    }

    /// Lower bound for integer, float and decimal fields
    pub fn min_value(mut self, min: f64) -> Self {
        if !self.set_bound(min, true) {
            self.misapplied.push("min_value");
        }
        self
    }

    /// Upper bound for integer, float and decimal fields
    pub fn max_value(mut self, max: f64) -> Self {
        if !self.set_bound(max, false) {
            self.misapplied.push("max_value");
        }
        self
    }

    fn set_bound(&mut self, bound: f64, lower: bool) -> bool {
        match &mut self.kind {
            FieldKind::Integer(bounds) if bound.fract() == 0.0 => {
                let slot = if lower { &mut bounds.min } else { &mut bounds.max };
                *slot = Some(bound as i64);
                true
            }
            FieldKind::Float(bounds) => {
                let slot = if lower { &mut bounds.min } else { &mut bounds.max };
                *slot = Some(bound);
                true
            }
            FieldKind::Decimal { bounds, .. } => match bound.to_string().parse::<Decimal>() {
                Ok(decimal) => {
                    let slot = if lower { &mut bounds.min } else { &mut bounds.max };
                    *slot = Some(decimal);
                    true
                }
                Err(_) => false,
            },
            _ => false,
        }
    }

    /// Digit limits for decimal fields
    pub fn precision(mut self, max_digits: u32, decimal_places: u32) -> Self {
        match &mut self.kind {
            FieldKind::Decimal { precision, .. } => {
                precision.max_digits = Some(max_digits);
                precision.decimal_places = Some(decimal_places);
            }
            _ => self.misapplied.push("precision"),
        }
        self
    }

    /// Message shown when a pattern field does not match
    pub fn pattern_message(mut self, text: impl Into<String>) -> Self {
        match &mut self.kind {
            FieldKind::Pattern { message, .. } => *message = Some(text.into()),
            _ => self.misapplied.push("pattern_message"),
        }
        self
    }

    pub fn allowed_extensions(mut self, extensions: &[&str]) -> Self {
        match &mut self.kind {
            FieldKind::File(rules) | FieldKind::Image(rules) => {
                rules.allowed_extensions =
                    Some(extensions.iter().map(|e| e.to_ascii_lowercase()).collect());
            }
            _ => self.misapplied.push("allowed_extensions"),
        }
        self
    }

    pub fn max_file_size(mut self, bytes: u64) -> Self {
        match &mut self.kind {
            FieldKind::File(rules) | FieldKind::Image(rules) => rules.max_size = Some(bytes),
            _ => self.misapplied.push("max_file_size"),
        }
        self
    }

    /// Label to display: the configured one, else derived from the name
    pub fn display_label(&self) -> String {
        self.label
            .clone()
            .unwrap_or_else(|| label_from_name(&self.name))
    }

    /// Reject constraint setters that did not fit this field's kind
    pub fn check(&self) -> Result<(), DefinitionError> {
        match self.misapplied.first() {
            Some(constraint) => Err(DefinitionError::InapplicableConstraint {
                field: self.name.clone(),
                constraint,
            }),
            None => Ok(()),
        }
    }

    pub fn is_secret(&self) -> bool {
        matches!(self.kind, FieldKind::Secret(_))
    }
}

/// "first_name" -> "First name", "rollNo" -> "Roll no"
pub fn label_from_name(name: &str) -> String {
    let mut words = String::with_capacity(name.len() + 2);
    for (i, c) in name.chars().enumerate() {
        if c == '_' {
            words.push(' ');
        } else if c.is_uppercase() && i > 0 {
            words.push(' ');
            words.extend(c.to_lowercase());
        } else {
            words.push(c);
        }
    }

    let mut chars = words.trim().chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
