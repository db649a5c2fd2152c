// File: src/form_field.rs
// Purpose: HTML5 attribute hints derived from field definitions

use crate::field::{FieldKind, FieldSpec, Widget};
use crate::schema::RecordSchema;
use std::collections::BTreeMap;

/// Attributes a template needs to render one input
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldAttrs {
    /// HTML5 native attributes (e.g., "required", "minlength", "type")
    pub html5_attrs: BTreeMap<String, String>,
    /// Field label for display
    pub label: String,
    pub help_text: Option<String>,
}

impl FieldAttrs {
    /// Derive attributes from a field definition
    pub fn from_field(field: &FieldSpec) -> Self {
        let mut attrs = BTreeMap::new();
        let mut set = |key: &str, value: String| {
            attrs.insert(key.to_string(), value);
        };

        if let Some(input_type) = input_type(field.widget) {
            set("type", input_type.to_string());
        }
        if field.required && !matches!(field.kind, FieldKind::TriState) {
            set("required", String::new());
        }

        match &field.kind {
            FieldKind::Text(length)
            | FieldKind::Email(length)
            | FieldKind::Url(length)
            | FieldKind::Slug(length)
            | FieldKind::Secret(length) => {
                if let Some(min) = length.min {
                    set("minlength", min.to_string());
                }
                if let Some(max) = length.max {
                    set("maxlength", max.to_string());
                }
            }
            FieldKind::Pattern { regex, length, .. } => {
                set("pattern", regex.as_str().to_string());
                if let Some(min) = length.min {
                    set("minlength", min.to_string());
                }
                if let Some(max) = length.max {
                    set("maxlength", max.to_string());
                }
            }
            FieldKind::Integer(bounds) => {
                if let Some(min) = bounds.min {
                    set("min", min.to_string());
                }
                if let Some(max) = bounds.max {
                    set("max", max.to_string());
                }
            }
            FieldKind::Float(bounds) => {
                set("step", "any".to_string());
                if let Some(min) = bounds.min {
                    set("min", min.to_string());
                }
                if let Some(max) = bounds.max {
                    set("max", max.to_string());
                }
            }
            FieldKind::Decimal { precision, bounds } => {
                let step = match precision.decimal_places {
                    Some(0) => "1".to_string(),
                    Some(places) => format!("0.{}1", "0".repeat(places as usize - 1)),
                    None => "any".to_string(),
                };
                set("step", step);
                if let Some(min) = &bounds.min {
                    set("min", min.to_string());
                }
                if let Some(max) = &bounds.max {
                    set("max", max.to_string());
                }
            }
            FieldKind::MultiChoice(_) => set("multiple", String::new()),
            FieldKind::Image(_) => set("accept", "image/*".to_string()),
            FieldKind::File(rules) => {
                if let Some(extensions) = &rules.allowed_extensions {
                    let accept: Vec<String> = extensions.iter().map(|e| format!(".{}", e)).collect();
                    set("accept", accept.join(","));
                }
            }
            _ => {}
        }

        Self {
            html5_attrs: attrs,
            label: field.display_label(),
            help_text: field.help_text.clone(),
        }
    }

    /// Render HTML5 attributes as a string
    pub fn render_html5_attrs(&self) -> String {
        self.html5_attrs
            .iter()
            .map(|(k, v)| {
                if v.is_empty() {
                    k.clone()
                } else {
                    format!("{}=\"{}\"", k, escape_attr(v))
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Schemas that can describe their inputs to a template
pub trait FormField {
    /// Get field attributes for the specified field name
    fn field_attrs(&self, field_name: &str) -> Option<FieldAttrs>;

    /// Get all field names
    fn field_names(&self) -> Vec<&str>;
}

impl FormField for RecordSchema {
    fn field_attrs(&self, field_name: &str) -> Option<FieldAttrs> {
        self.field(field_name).map(FieldAttrs::from_field)
    }

    fn field_names(&self) -> Vec<&str> {
        RecordSchema::field_names(self)
    }
}

fn input_type(widget: Widget) -> Option<&'static str> {
    match widget {
        Widget::TextInput | Widget::DateTimeInput => Some("text"),
        Widget::EmailInput => Some("email"),
        Widget::UrlInput => Some("url"),
        Widget::PasswordInput => Some("password"),
        Widget::NumberInput => Some("number"),
        Widget::DateInput => Some("date"),
        Widget::TimeInput => Some("time"),
        Widget::DateTimeLocalInput => Some("datetime-local"),
        Widget::CheckboxInput => Some("checkbox"),
        Widget::RadioSelect => Some("radio"),
        Widget::FileInput => Some("file"),
        Widget::HiddenInput => Some("hidden"),
        Widget::Textarea | Widget::Select | Widget::SelectMultiple | Widget::NullBooleanSelect => {
            None
        }
    }
}

fn escape_attr(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('"', "&quot;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::Choice;

    #[test]
    fn test_text_attrs() {
        let attrs = FieldAttrs::from_field(&FieldSpec::text("first_name").min_length(4).max_length(70));
        assert_eq!(
            attrs.render_html5_attrs(),
            r#"maxlength="70" minlength="4" required type="text""#
        );
        assert_eq!(attrs.label, "First name");
    }

    #[test]
    fn test_optional_password() {
        let attrs = FieldAttrs::from_field(&FieldSpec::secret("password").optional());
        assert_eq!(attrs.html5_attrs.get("type").map(String::as_str), Some("password"));
        assert!(!attrs.html5_attrs.contains_key("required"));
    }

    #[test]
    fn test_numeric_attrs() {
        let rating = FieldAttrs::from_field(&FieldSpec::integer("rating").min_value(0.0).max_value(10.0));
        assert_eq!(rating.html5_attrs["min"], "0");
        assert_eq!(rating.html5_attrs["max"], "10");

        let price = FieldAttrs::from_field(&FieldSpec::decimal("price").precision(5, 2));
        assert_eq!(price.html5_attrs["step"], "0.01");
    }

    #[test]
    fn test_widget_override() {
        let field = FieldSpec::datetime("appointment_datetime").widget(Widget::DateTimeLocalInput);
        let attrs = FieldAttrs::from_field(&field);
        assert_eq!(attrs.html5_attrs["type"], "datetime-local");
    }

    #[test]
    fn test_choice_and_tri_state() {
        let interests = FieldAttrs::from_field(&FieldSpec::multi_choice(
            "interests",
            vec![Choice::new("tech", "Technology")],
        ));
        assert!(interests.html5_attrs.contains_key("multiple"));
        assert!(!interests.html5_attrs.contains_key("type"));

        let agree = FieldAttrs::from_field(&FieldSpec::tri_state("agree_terms"));
        assert!(!agree.html5_attrs.contains_key("required"));
    }

    #[test]
    fn test_pattern_is_escaped() {
        let field = FieldSpec::pattern("code", r#"[a-z"]+"#).unwrap();
        let rendered = FieldAttrs::from_field(&field).render_html5_attrs();
        assert!(rendered.contains("&quot;"));
    }

    #[test]
    fn test_schema_lookup() {
        let schema = RecordSchema::new("s", vec![FieldSpec::email("email")]).unwrap();
        assert_eq!(schema.field_attrs("email").unwrap().html5_attrs["type"], "email");
        assert!(schema.field_attrs("missing").is_none());
        assert_eq!(FormField::field_names(&schema), vec!["email"]);
    }
}
